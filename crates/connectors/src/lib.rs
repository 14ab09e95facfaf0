pub mod api_client;
pub mod auth;
pub mod base;
pub mod client;
pub mod factory;
pub mod graphql;
pub mod registry;
pub mod rest;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use switchyard_core::{Envelope, JsonMap, Result};

pub use api_client::{ApiClient, IntentCall};
pub use auth::{Auth, KeyLocation};
pub use factory::{build_connector, create_graphql_connector, create_rest_connector};
pub use graphql::{GraphQlConnector, OperationKind};
pub use registry::ConnectorRegistry;
pub use rest::RestConnector;

/// `Ok(response)` or `Err(error envelope)`; connectors never surface a Rust error.
pub type ConnectorResult = std::result::Result<Envelope, Envelope>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectorKind {
    Rest,
    GraphQl,
}

impl ConnectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectorKind::Rest => "rest",
            ConnectorKind::GraphQl => "graphql",
        }
    }
}

impl fmt::Display for ConnectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully shaped outbound HTTP call, produced by `Connector::format_request`.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub query: JsonMap,
    pub body: Option<Value>,
    pub basic_auth: Option<(String, String)>,
}

impl OutboundRequest {
    pub fn new(method: Method, url: String) -> Self {
        Self {
            method,
            url,
            headers: BTreeMap::new(),
            query: JsonMap::new(),
            body: None,
            basic_auth: None,
        }
    }

    /// Query parameters as string pairs. Nulls are skipped, arrays repeat the
    /// key once per element, other non-string values use their JSON text.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for (key, value) in &self.query {
            match value {
                Value::Null => {}
                Value::Array(items) => pairs.extend(
                    items
                        .iter()
                        .filter(|item| !item.is_null())
                        .map(|item| (key.clone(), value_to_string(item))),
                ),
                other => pairs.push((key.clone(), value_to_string(other))),
            }
        }
        pairs
    }
}

pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Adapter between envelopes and one backend API.
#[async_trait]
pub trait Connector: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> ConnectorKind;

    fn base_url(&self) -> &str;

    /// Intents this connector can serve, sorted.
    fn intents(&self) -> Vec<String>;

    /// Optional human-readable description of an intent.
    fn describe(&self, _intent: &str) -> Option<String> {
        None
    }

    fn set_auth(&mut self, auth: Auth);

    /// Shape the outbound call for `envelope`. Fails with `Error::Config` when the
    /// intent has no registered mapping.
    fn format_request(&self, envelope: &Envelope) -> Result<OutboundRequest>;

    /// Wrap a raw backend result as a response to `original`.
    fn format_response(&self, raw: Value, original: &Envelope) -> Envelope;

    /// Format, send and translate back. Every failure becomes an error envelope.
    async fn process_request(&self, envelope: Envelope) -> ConnectorResult;
}
