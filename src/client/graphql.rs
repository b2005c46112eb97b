//! GraphQL adapter: one POSTed query document per operation

use super::{build_http_client, transport_message, ProtocolAdapter};
use crate::{
    error::{ClientError, RemoteCallError, Result},
    models::{config::GraphQlConfig, Record},
    types::{Operation, Protocol},
};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};

const USERS_QUERY: &str = "query GetUsers { users { id name age } }";
const TRACKS_QUERY: &str = "query GetMusics { musics { id name artist } }";
const USER_COLLECTIONS_QUERY: &str =
    "query GetUserPlaylists($userId: Int!) { user(id: $userId) { playlists { id name } } }";
const COLLECTION_ITEMS_QUERY: &str =
    "query GetPlaylistMusics($playlistId: Int!) { playlist(id: $playlistId) { musics { id name artist } } }";
const COLLECTIONS_BY_ITEM_QUERY: &str =
    "query GetMusicPlaylists($musicId: Int!) { music(id: $musicId) { playlists { id name } } }";
const HEALTH_QUERY: &str = "query HealthCheck { users { id } }";

#[derive(Debug, Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
    #[serde(skip_serializing_if = "Value::is_null")]
    variables: Value,
}

/// A query document, its variables and where its records sit in `data`
struct QuerySpec {
    query: &'static str,
    variables: Value,
    path: &'static [&'static str],
}

pub struct GraphQlAdapter {
    client: Client,
    url: String,
}

impl GraphQlAdapter {
    pub fn new(config: &GraphQlConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(Protocol::GraphQl, config.timeout_ms)?,
            url: config.url.clone(),
        })
    }

    fn query_for(operation: &Operation) -> QuerySpec {
        match *operation {
            Operation::ListUsers => QuerySpec {
                query: USERS_QUERY,
                variables: Value::Null,
                path: &["users"],
            },
            Operation::ListTracks => QuerySpec {
                query: TRACKS_QUERY,
                variables: Value::Null,
                path: &["musics"],
            },
            Operation::ListUserCollections { user_id } => QuerySpec {
                query: USER_COLLECTIONS_QUERY,
                variables: json!({ "userId": user_id }),
                path: &["user", "playlists"],
            },
            Operation::ListCollectionItems { collection_id } => QuerySpec {
                query: COLLECTION_ITEMS_QUERY,
                variables: json!({ "playlistId": collection_id }),
                path: &["playlist", "musics"],
            },
            Operation::ListCollectionsByItem { item_id } => QuerySpec {
                query: COLLECTIONS_BY_ITEM_QUERY,
                variables: json!({ "musicId": item_id }),
                path: &["music", "playlists"],
            },
        }
    }

    /// POST a document and return its `data` member
    async fn execute(
        &self,
        operation: &'static str,
        query: &str,
        variables: Value,
    ) -> std::result::Result<Value, RemoteCallError> {
        let fail = |message: String| RemoteCallError::new(Protocol::GraphQl, operation, message);
        tracing::debug!(url = %self.url, operation, "GraphQL request");

        let response = self
            .client
            .post(&self.url)
            .json(&GraphQlRequest { query, variables })
            .send()
            .await
            .map_err(|e| fail(transport_message(&e)))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| fail(transport_message(&e)))?;
        let payload: Value = match serde_json::from_slice(&body) {
            Ok(payload) => payload,
            Err(_) if !status.is_success() => return Err(fail(format!("HTTP {}", status))),
            Err(e) => return Err(fail(format!("Invalid JSON response: {}", e))),
        };

        // Errors win over the status code; servers answer 200 with an errors array
        if let Some(first) = payload
            .get("errors")
            .and_then(Value::as_array)
            .and_then(|errors| errors.first())
        {
            let message = first
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(fail(format!("GraphQL error: {}", message)));
        }
        if !status.is_success() {
            return Err(fail(format!("HTTP {}", status)));
        }

        Ok(payload.get("data").cloned().unwrap_or(Value::Null))
    }
}

/// Walk `path` through `data`; a null or missing step means no records
fn select(data: Value, path: &[&str]) -> Value {
    path.iter().fold(data, |value, key| match value {
        Value::Object(mut map) => map.remove(*key).unwrap_or(Value::Null),
        _ => Value::Null,
    })
}

#[async_trait]
impl ProtocolAdapter for GraphQlAdapter {
    fn protocol(&self) -> Protocol {
        Protocol::GraphQl
    }

    async fn call(&self, operation: Operation) -> std::result::Result<Vec<Record>, ClientError> {
        let spec = Self::query_for(&operation);
        let data = self.execute(operation.name(), spec.query, spec.variables).await?;

        Ok(Record::list_from_json(operation.record_kind(), select(data, spec.path))
            .map_err(|e| RemoteCallError::new(Protocol::GraphQl, operation.name(), e))?)
    }

    async fn health_check(&self) -> std::result::Result<(), ClientError> {
        self.execute("health_check", HEALTH_QUERY, Value::Null).await?;
        Ok(())
    }
}
