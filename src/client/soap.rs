//! SOAP adapter: WSDL-described service, built on first use

use super::{build_http_client, lazy::LazyConnection, transport_message, xml::XmlElement, ProtocolAdapter};
use crate::{
    error::{ClientError, InitializationError, RemoteCallError, Result},
    models::{config::SoapConfig, Record},
    types::{Operation, Protocol, RecordKind},
};
use async_trait::async_trait;
use quick_xml::escape::escape;
use reqwest::Client;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

const ENVELOPE_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";

/// What the client needs from a WSDL document
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDescription {
    pub target_namespace: String,
    pub operations: BTreeSet<String>,
    /// Service address from `soap:address`, if declared
    pub address: Option<String>,
}

impl ServiceDescription {
    pub fn from_wsdl(document: &str) -> std::result::Result<Self, String> {
        let root = XmlElement::parse(document)?;
        if root.name != "definitions" {
            return Err(format!("expected a WSDL definitions element, found <{}>", root.name));
        }

        let target_namespace = root
            .attribute("targetNamespace")
            .ok_or_else(|| "WSDL has no targetNamespace".to_string())?
            .to_string();

        let operations: BTreeSet<String> = root
            .find_all("portType")
            .into_iter()
            .flat_map(|port_type| port_type.children_named("operation"))
            .filter_map(|operation| operation.attribute("name"))
            .map(str::to_string)
            .collect();
        if operations.is_empty() {
            return Err("WSDL declares no operations".to_string());
        }

        let address = root
            .find("service")
            .and_then(|service| service.find("address"))
            .and_then(|address| address.attribute("location"))
            .map(str::to_string);

        Ok(Self {
            target_namespace,
            operations,
            address,
        })
    }
}

/// Source of the service description
#[async_trait]
pub trait WsdlLoader: Send + Sync {
    async fn load(&self) -> std::result::Result<ServiceDescription, InitializationError>;
}

/// Fetches the WSDL over HTTP GET
pub struct HttpWsdlLoader {
    client: Client,
    wsdl_url: String,
}

impl HttpWsdlLoader {
    pub fn new(client: Client, wsdl_url: String) -> Self {
        Self { client, wsdl_url }
    }
}

#[async_trait]
impl WsdlLoader for HttpWsdlLoader {
    async fn load(&self) -> std::result::Result<ServiceDescription, InitializationError> {
        let fail = |message: String| InitializationError::new(Protocol::Soap, message);
        tracing::info!(url = %self.wsdl_url, "fetching WSDL");

        let response = self
            .client
            .get(&self.wsdl_url)
            .send()
            .await
            .map_err(|e| fail(format!("WSDL fetch failed: {}", transport_message(&e))))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fail(format!("WSDL fetch failed: HTTP {}", status)));
        }

        let document = response
            .text()
            .await
            .map_err(|e| fail(format!("WSDL fetch failed: {}", transport_message(&e))))?;
        ServiceDescription::from_wsdl(&document).map_err(|e| fail(format!("Invalid WSDL: {}", e)))
    }
}

/// A ready-to-call SOAP service
#[derive(Debug)]
struct SoapService {
    namespace: String,
    operations: BTreeSet<String>,
    endpoint: String,
}

/// Remote procedure, argument element and result field for an operation
fn procedure_for(operation: &Operation) -> (&'static str, Option<(&'static str, i64)>, &'static str) {
    match *operation {
        Operation::ListUsers => ("FindAllUsers", None, "users"),
        Operation::ListTracks => ("FindAllMusics", None, "musics"),
        Operation::ListUserCollections { user_id } => ("FindUserPlaylists", Some(("userId", user_id)), "playlists"),
        Operation::ListCollectionItems { collection_id } => {
            ("FindPlaylistMusics", Some(("playlistId", collection_id)), "musics")
        }
        Operation::ListCollectionsByItem { item_id } => {
            ("FindPlaylistsByMusic", Some(("musicId", item_id)), "playlists")
        }
    }
}

/// Build a SOAP 1.1 request envelope
pub fn build_envelope(namespace: &str, procedure: &str, argument: Option<(&str, i64)>) -> String {
    let body = match argument {
        Some((name, value)) => format!("<tns:{0}>{1}</tns:{0}>", name, value),
        None => String::new(),
    };
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<soap:Envelope xmlns:soap="{envelope}" xmlns:tns="{namespace}">"#,
            "<soap:Body><tns:{procedure}>{body}</tns:{procedure}></soap:Body>",
            "</soap:Envelope>"
        ),
        envelope = ENVELOPE_NS,
        namespace = escape(namespace),
        procedure = procedure,
        body = body,
    )
}

/// Extract the records of `field` from a response envelope
///
/// Records arrive either wrapped (`<users><item>..</item></users>`) or as
/// repeated field elements whose children are the record's fields.
pub fn parse_response(document: &str, field: &str, kind: RecordKind) -> std::result::Result<Vec<Record>, String> {
    let root = XmlElement::parse(document)?;
    let body = root
        .find("Body")
        .ok_or_else(|| "response has no SOAP Body".to_string())?;

    if let Some(fault) = body.find("Fault") {
        let message = fault
            .find("faultstring")
            .or_else(|| fault.find("Text"))
            .map(|e| e.text.trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| "unknown fault".to_string());
        return Err(format!("SOAP fault: {}", message));
    }

    let result = match body.children.first() {
        Some(result) => result,
        None => return Ok(Vec::new()),
    };

    let mut records = Vec::new();
    for container in result.children_named(field) {
        // A container carrying its own `id` is one repeated record; otherwise it wraps items
        if has_leaf_id(container) {
            records.push(Record::from_text_fields(kind, &leaf_fields(container))?);
        } else {
            for item in container.children.iter().filter(|child| has_leaf_id(child)) {
                records.push(Record::from_text_fields(kind, &leaf_fields(item))?);
            }
        }
    }
    Ok(records)
}

fn has_leaf_id(element: &XmlElement) -> bool {
    element.children.iter().any(|child| child.name == "id" && child.is_leaf())
}

fn leaf_fields(element: &XmlElement) -> BTreeMap<String, String> {
    element
        .children
        .iter()
        .filter(|child| child.is_leaf())
        .map(|child| (child.name.clone(), child.text.clone()))
        .collect()
}

pub struct SoapAdapter {
    client: Client,
    loader: Arc<dyn WsdlLoader>,
    endpoint_override: Option<String>,
    connection: LazyConnection<SoapService>,
}

impl SoapAdapter {
    pub fn new(config: &SoapConfig) -> Result<Self> {
        let client = build_http_client(Protocol::Soap, config.timeout_ms)?;
        let loader = Arc::new(HttpWsdlLoader::new(client.clone(), config.wsdl_url.clone()));
        Ok(Self::with_loader(config, client, loader))
    }

    /// Use a custom description source
    pub fn with_loader(config: &SoapConfig, client: Client, loader: Arc<dyn WsdlLoader>) -> Self {
        Self {
            client,
            loader,
            endpoint_override: config.endpoint.clone(),
            connection: LazyConnection::new(Protocol::Soap),
        }
    }

    async fn service(&self) -> std::result::Result<Arc<SoapService>, InitializationError> {
        self.connection
            .get_or_init(|| async {
                let description = self.loader.load().await?;
                let endpoint = self
                    .endpoint_override
                    .clone()
                    .or(description.address)
                    .ok_or_else(|| {
                        InitializationError::new(Protocol::Soap, "WSDL declares no service address and none is configured")
                    })?;
                Ok(SoapService {
                    namespace: description.target_namespace,
                    operations: description.operations,
                    endpoint,
                })
            })
            .await
    }
}

#[async_trait]
impl ProtocolAdapter for SoapAdapter {
    fn protocol(&self) -> Protocol {
        Protocol::Soap
    }

    async fn call(&self, operation: Operation) -> std::result::Result<Vec<Record>, ClientError> {
        let service = self.service().await?;
        let fail = |message: String| RemoteCallError::new(Protocol::Soap, operation.name(), message);

        let (procedure, argument, field) = procedure_for(&operation);
        if !service.operations.contains(procedure) {
            return Err(fail(format!("Operation {} is not declared by the service", procedure)).into());
        }

        let namespace = service.namespace.trim_end_matches('/');
        tracing::debug!(endpoint = %service.endpoint, procedure, "SOAP request");

        let response = self
            .client
            .post(&service.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", format!("\"{}/{}\"", namespace, procedure))
            .body(build_envelope(&service.namespace, procedure, argument))
            .send()
            .await
            .map_err(|e| fail(transport_message(&e)))?;

        let status = response.status();
        let document = response.text().await.map_err(|e| fail(transport_message(&e)))?;

        match parse_response(&document, field, operation.record_kind()) {
            Ok(records) if status.is_success() => Ok(records),
            Ok(_) => Err(fail(format!("HTTP {}", status)).into()),
            Err(message) if message.starts_with("SOAP fault") => Err(fail(message).into()),
            Err(_) if !status.is_success() => Err(fail(format!("HTTP {}", status)).into()),
            Err(message) => Err(fail(format!("Invalid SOAP response: {}", message)).into()),
        }
    }
}
