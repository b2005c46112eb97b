//! Unified multi-protocol client

pub mod graphql;
pub mod grpc;
pub mod lazy;
pub mod rest;
pub mod soap;
pub mod xml;


use crate::{
    error::{AppError, ClientError, Result},
    models::{config::timeout_of, ClientConfig, HealthReport, Record},
    types::{Operation, Protocol},
};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

pub use graphql::GraphQlAdapter;
pub use grpc::{ChannelStubLoader, GrpcAdapter, GrpcStubLoader, GrpcStubs};
pub use lazy::LazyConnection;
pub use rest::RestAdapter;
pub use soap::{HttpWsdlLoader, ServiceDescription, SoapAdapter, WsdlLoader};

/// One wire protocol's translation of the logical operations
#[async_trait]
pub trait ProtocolAdapter: Send + Sync {
    fn protocol(&self) -> Protocol;

    /// Run one operation and normalize its records or its failure
    async fn call(&self, operation: Operation) -> std::result::Result<Vec<Record>, ClientError>;

    /// Cheapest call proving the protocol answers
    async fn health_check(&self) -> std::result::Result<(), ClientError> {
        self.call(Operation::ListUsers).await.map(|_| ())
    }
}

/// Anything that can run an operation over a chosen protocol
#[async_trait]
pub trait RemoteCaller: Send + Sync {
    async fn call(&self, protocol: Protocol, operation: Operation) -> std::result::Result<Vec<Record>, ClientError>;
}

/// Build the HTTP client an adapter uses for every request
pub(crate) fn build_http_client(protocol: Protocol, timeout_ms: u64) -> Result<Client> {
    Client::builder()
        .timeout(timeout_of(timeout_ms))
        .user_agent(concat!("protocol-bench/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::internal(format!("Failed to create {} HTTP client: {}", protocol, e)))
}

/// Describe a transport failure without reqwest's URL noise
pub(crate) fn transport_message(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timed out".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else if error.is_decode() {
        format!("could not read response body: {}", error)
    } else {
        error.to_string()
    }
}

/// The four adapters behind one `(protocol, operation)` interface
pub struct UnifiedClient {
    rest: Arc<dyn ProtocolAdapter>,
    graphql: Arc<dyn ProtocolAdapter>,
    soap: Arc<dyn ProtocolAdapter>,
    grpc: Arc<dyn ProtocolAdapter>,
    /// Upper bound on each protocol's health check, in `Protocol::ALL` order
    health_timeouts: [Duration; 4],
}

impl UnifiedClient {
    /// Build the real adapters; SOAP and gRPC connect on first use
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut client = Self::from_adapters(
            Arc::new(RestAdapter::new(&config.rest)?),
            Arc::new(GraphQlAdapter::new(&config.graphql)?),
            Arc::new(SoapAdapter::new(&config.soap)?),
            Arc::new(GrpcAdapter::new(&config.grpc)),
        );
        client.health_timeouts = [
            timeout_of(config.rest.timeout_ms),
            timeout_of(config.graphql.timeout_ms),
            timeout_of(config.soap.timeout_ms),
            timeout_of(config.grpc.timeout_ms),
        ];
        Ok(client)
    }

    /// Compose a client from existing adapters
    pub fn from_adapters(
        rest: Arc<dyn ProtocolAdapter>,
        graphql: Arc<dyn ProtocolAdapter>,
        soap: Arc<dyn ProtocolAdapter>,
        grpc: Arc<dyn ProtocolAdapter>,
    ) -> Self {
        Self {
            rest,
            graphql,
            soap,
            grpc,
            health_timeouts: [crate::defaults::DEFAULT_TIMEOUT; 4],
        }
    }

    /// Bound every health check by the same timeout
    pub fn with_health_timeout(mut self, health_timeout: Duration) -> Self {
        self.health_timeouts = [health_timeout; 4];
        self
    }

    pub fn adapter(&self, protocol: Protocol) -> &Arc<dyn ProtocolAdapter> {
        match protocol {
            Protocol::Rest => &self.rest,
            Protocol::GraphQl => &self.graphql,
            Protocol::Soap => &self.soap,
            Protocol::Grpc => &self.grpc,
        }
    }

    async fn check_protocol(&self, protocol: Protocol, limit: Duration) -> bool {
        match timeout(limit, self.adapter(protocol).health_check()).await {
            Ok(Ok(())) => true,
            Ok(Err(error)) => {
                tracing::info!(%protocol, %error, "health check failed");
                false
            }
            Err(_) => {
                tracing::info!(%protocol, timeout_ms = limit.as_millis() as u64, "health check timed out");
                false
            }
        }
    }

    /// Check all four protocols in parallel; each result depends only on its own call
    pub async fn health_check(&self) -> HealthReport {
        let [rest, graphql, soap, grpc] = self.health_timeouts;
        let (rest, graphql, soap, grpc) = tokio::join!(
            self.check_protocol(Protocol::Rest, rest),
            self.check_protocol(Protocol::GraphQl, graphql),
            self.check_protocol(Protocol::Soap, soap),
            self.check_protocol(Protocol::Grpc, grpc),
        );
        HealthReport { rest, graphql, soap, grpc }
    }
}

#[async_trait]
impl RemoteCaller for UnifiedClient {
    async fn call(&self, protocol: Protocol, operation: Operation) -> std::result::Result<Vec<Record>, ClientError> {
        self.adapter(protocol).call(operation).await
    }
}
