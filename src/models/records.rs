//! Protocol-agnostic records returned by the five operations

use crate::types::RecordKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: Option<i32>,
}

/// A track (the backend calls these "musics")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub artist: String,
}

/// A collection of tracks (the backend calls these "playlists")
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// One record of an operation result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    User(User),
    Track(Track),
    Collection(Collection),
}

impl Record {
    pub fn id(&self) -> i64 {
        match self {
            Record::User(u) => u.id,
            Record::Track(t) => t.id,
            Record::Collection(c) => c.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Record::User(u) => &u.name,
            Record::Track(t) => &t.name,
            Record::Collection(c) => &c.name,
        }
    }

    /// Decode a JSON object into the record shape `kind` expects
    pub fn from_json(kind: RecordKind, value: serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            RecordKind::User => Record::User(serde_json::from_value(value)?),
            RecordKind::Track => Record::Track(serde_json::from_value(value)?),
            RecordKind::Collection => Record::Collection(serde_json::from_value(value)?),
        })
    }

    /// Decode a JSON array (or `null`, meaning empty) into records
    pub fn list_from_json(kind: RecordKind, value: serde_json::Value) -> Result<Vec<Self>, String> {
        match value {
            serde_json::Value::Null => Ok(Vec::new()),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|item| Self::from_json(kind, item).map_err(|e| format!("Malformed record: {}", e)))
                .collect(),
            other => Err(format!("Expected a JSON array, got {}", json_type_name(&other))),
        }
    }

    /// Decode a record from text-valued fields, as found in XML payloads
    pub fn from_text_fields(kind: RecordKind, fields: &BTreeMap<String, String>) -> Result<Self, String> {
        let id = fields
            .get("id")
            .ok_or_else(|| "Record is missing an id".to_string())?
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("Invalid record id: {}", e))?;
        let name = fields.get("name").cloned().unwrap_or_default();

        Ok(match kind {
            RecordKind::User => {
                let age = match fields.get("age").map(|a| a.trim()) {
                    Some(a) if !a.is_empty() => {
                        Some(a.parse::<i32>().map_err(|e| format!("Invalid user age: {}", e))?)
                    }
                    _ => None,
                };
                Record::User(User { id, name, age })
            }
            RecordKind::Track => Record::Track(Track {
                id,
                name,
                artist: fields.get("artist").cloned().unwrap_or_default(),
            }),
            RecordKind::Collection => Record::Collection(Collection { id, name }),
        })
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_from_json() {
        let value = json!([{"id": 1, "name": "Ana", "age": 31}, {"id": 2, "name": "Bruno"}]);
        let records = Record::list_from_json(RecordKind::User, value).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], Record::User(User { id: 1, name: "Ana".into(), age: Some(31) }));
        assert_eq!(records[1], Record::User(User { id: 2, name: "Bruno".into(), age: None }));
    }

    #[test]
    fn test_null_is_empty() {
        assert!(Record::list_from_json(RecordKind::Track, serde_json::Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_non_array_is_rejected() {
        let err = Record::list_from_json(RecordKind::Track, json!({"id": 1})).unwrap_err();
        assert!(err.contains("an object"));
    }

    #[test]
    fn test_missing_id_is_rejected() {
        assert!(Record::list_from_json(RecordKind::Collection, json!([{"name": "x"}])).is_err());
    }

    #[test]
    fn test_from_text_fields() {
        let mut fields = BTreeMap::new();
        fields.insert("id".to_string(), " 4 ".to_string());
        fields.insert("name".to_string(), "Intro".to_string());
        fields.insert("artist".to_string(), "Someone".to_string());

        let record = Record::from_text_fields(RecordKind::Track, &fields).unwrap();
        assert_eq!(record.id(), 4);
        assert_eq!(record.name(), "Intro");

        fields.insert("id".to_string(), "four".to_string());
        assert!(Record::from_text_fields(RecordKind::Track, &fields).is_err());
    }

    #[test]
    fn test_untagged_serialization() {
        let record = Record::Collection(Collection { id: 9, name: "Road trip".into() });
        assert_eq!(serde_json::to_value(&record).unwrap(), json!({"id": 9, "name": "Road trip"}));
    }
}
