//! REST adapter: one JSON GET per operation

use super::{build_http_client, transport_message, ProtocolAdapter};
use crate::{
    error::{ClientError, RemoteCallError, Result},
    models::{config::RestConfig, Record},
    types::{Operation, Protocol},
};
use async_trait::async_trait;
use reqwest::Client;

pub struct RestAdapter {
    client: Client,
    base_url: String,
}

impl RestAdapter {
    pub fn new(config: &RestConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(Protocol::Rest, config.timeout_ms)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Path template for an operation, relative to the base URL
    pub fn path_for(operation: &Operation) -> String {
        match operation {
            Operation::ListUsers => "/user".to_string(),
            Operation::ListTracks => "/music".to_string(),
            Operation::ListUserCollections { user_id } => format!("/user/{}/playlists", user_id),
            Operation::ListCollectionItems { collection_id } => {
                format!("/playlist/{}/musics", collection_id)
            }
            Operation::ListCollectionsByItem { item_id } => format!("/music/{}/playlists", item_id),
        }
    }
}

#[async_trait]
impl ProtocolAdapter for RestAdapter {
    fn protocol(&self) -> Protocol {
        Protocol::Rest
    }

    async fn call(&self, operation: Operation) -> std::result::Result<Vec<Record>, ClientError> {
        let fail = |message: String| RemoteCallError::new(Protocol::Rest, operation.name(), message);
        let url = format!("{}{}", self.base_url, Self::path_for(&operation));
        tracing::debug!(%url, "REST request");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| fail(transport_message(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(format!("HTTP {}", status)).into());
        }

        let body = response.bytes().await.map_err(|e| fail(transport_message(&e)))?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        let value: serde_json::Value =
            serde_json::from_slice(&body).map_err(|e| fail(format!("Invalid JSON response: {}", e)))?;
        Ok(Record::list_from_json(operation.record_kind(), value).map_err(fail)?)
    }
}
