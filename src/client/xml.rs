//! Minimal XML element tree for WSDL documents and SOAP envelopes

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;

/// An element with namespace prefixes stripped from its name and attributes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
    /// Concatenated text content directly inside this element
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Parse a document and return its root element
    pub fn parse(xml: &str) -> Result<XmlElement, String> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(start)) => stack.push(Self::open(&start)?),
                Ok(Event::Empty(start)) => {
                    let element = Self::open(&start)?;
                    Self::close(element, &mut stack, &mut root);
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| "unbalanced closing tag".to_string())?;
                    Self::close(element, &mut stack, &mut root);
                }
                Ok(Event::Text(text)) => {
                    if let Some(current) = stack.last_mut() {
                        let text = text.unescape().map_err(|e| format!("invalid text: {}", e))?;
                        current.text.push_str(&text);
                    }
                }
                Ok(Event::CData(data)) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(format!("malformed XML at byte {}: {}", reader.error_position(), e))
                }
            }
        }

        if !stack.is_empty() {
            return Err("unexpected end of document".to_string());
        }
        root.ok_or_else(|| "document has no root element".to_string())
    }

    fn open(start: &BytesStart<'_>) -> Result<XmlElement, String> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let mut attributes = BTreeMap::new();

        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| format!("invalid attribute on <{}>: {}", name, e))?;
            if attribute.key.as_namespace_binding().is_some() {
                continue;
            }
            let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
            let value = attribute
                .unescape_value()
                .map_err(|e| format!("invalid attribute value on <{}>: {}", name, e))?;
            attributes.insert(key, value.into_owned());
        }

        Ok(XmlElement {
            name,
            attributes,
            ..XmlElement::default()
        })
    }

    fn close(element: XmlElement, stack: &mut [XmlElement], root: &mut Option<XmlElement>) {
        match stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None => {
                if root.is_none() {
                    *root = Some(element);
                }
            }
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// First direct child with the given local name
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// First element with the given name in document order, self included
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    /// Every element with the given name in document order, self included
    pub fn find_all<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        self.collect(name, &mut found);
        found
    }

    fn collect<'a>(&'a self, name: &str, found: &mut Vec<&'a XmlElement>) {
        if self.name == name {
            found.push(self);
        }
        for child in &self.children {
            child.collect(name, found);
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_stripped_and_text_unescaped() {
        let root = XmlElement::parse(
            r#"<?xml version="1.0"?>
            <soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
              <soap:Body>
                <tns:Result xmlns:tns="urn:x" kind="list">
                  <tns:name>Rock &amp; Roll</tns:name>
                  <tns:empty/>
                  <tns:raw><![CDATA[<b>bold</b>]]></tns:raw>
                </tns:Result>
              </soap:Body>
            </soap:Envelope>"#,
        )
        .unwrap();

        assert_eq!(root.name, "Envelope");
        let result = root.find("Result").unwrap();
        assert_eq!(result.attribute("kind"), Some("list"));
        assert_eq!(result.attribute("tns"), None);
        assert_eq!(result.child("name").unwrap().text, "Rock & Roll");
        assert!(result.child("empty").unwrap().is_leaf());
        assert_eq!(result.child("raw").unwrap().text, "<b>bold</b>");
    }

    #[test]
    fn test_find_all_in_document_order() {
        let root = XmlElement::parse("<a><b id=\"1\"/><c><b id=\"2\"/></c><b id=\"3\"/></a>").unwrap();
        let ids: Vec<_> = root.find_all("b").iter().filter_map(|b| b.attribute("id")).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(root.children_named("b").count(), 2);
    }

    #[test]
    fn test_malformed_documents_rejected() {
        assert!(XmlElement::parse("<a><b></a>").is_err());
        assert!(XmlElement::parse("<a>").is_err());
        assert!(XmlElement::parse("just text").is_err());
    }
}
