use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use std::collections::BTreeMap;
use switchyard_core::{Envelope, Error, JsonMap, Result};
use tracing::debug;

use crate::auth::Auth;
use crate::base::{body_to_data, join_url, map_parameters, ConnectorBase};
use crate::{value_to_string, Connector, ConnectorKind, ConnectorResult, OutboundRequest};

#[derive(Debug, Clone, PartialEq)]
pub struct Endpoint {
    /// Path relative to the base URL; `{name}` segments are filled from parameters.
    pub template: String,
    pub method: Method,
    pub params_mapping: BTreeMap<String, String>,
    pub description: Option<String>,
}

/// Connector for plain HTTP/JSON APIs: one endpoint per intent.
pub struct RestConnector {
    base: ConnectorBase,
    endpoints: BTreeMap<String, Endpoint>,
}

impl RestConnector {
    pub fn new(name: &str, base_url: &str) -> Self {
        Self {
            base: ConnectorBase::new(name, base_url, ConnectorKind::Rest),
            endpoints: BTreeMap::new(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.base.set_client(client);
        self
    }

    pub fn register_endpoint(
        &mut self,
        intent: &str,
        endpoint: &str,
        method: Method,
        params_mapping: BTreeMap<String, String>,
    ) -> &mut Self {
        self.register(
            intent,
            Endpoint {
                template: endpoint.to_string(),
                method,
                params_mapping,
                description: None,
            },
        )
    }

    pub fn register(&mut self, intent: &str, endpoint: Endpoint) -> &mut Self {
        debug!(
            connector = %self.base.name,
            intent,
            endpoint = %endpoint.template,
            method = %endpoint.method,
            "Registered REST endpoint"
        );
        self.endpoints.insert(intent.to_string(), endpoint);
        self
    }

    async fn call(&self, envelope: &Envelope) -> Result<JsonMap> {
        let request = self.format_request(envelope)?;
        let body = self.base.send(request).await?;
        Ok(body_to_data(&body))
    }
}

#[async_trait]
impl Connector for RestConnector {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn kind(&self) -> ConnectorKind {
        ConnectorKind::Rest
    }

    fn base_url(&self) -> &str {
        &self.base.base_url
    }

    fn intents(&self) -> Vec<String> {
        self.endpoints.keys().cloned().collect()
    }

    fn describe(&self, intent: &str) -> Option<String> {
        self.endpoints.get(intent)?.description.clone()
    }

    fn set_auth(&mut self, auth: Auth) {
        self.base.set_auth(auth);
    }

    fn format_request(&self, envelope: &Envelope) -> Result<OutboundRequest> {
        let intent = &envelope.payload.intent;
        let endpoint = self.endpoints.get(intent).ok_or_else(|| {
            Error::Config(format!("No endpoint registered for intent '{}'", intent))
        })?;

        let mut params = map_parameters(&envelope.payload.parameters, &endpoint.params_mapping);

        // Path parameters are consumed by the template.
        let mut path = endpoint.template.clone();
        let names: Vec<String> = params.keys().cloned().collect();
        for name in names {
            let placeholder = format!("{{{}}}", name);
            if path.contains(&placeholder) {
                if let Some(value) = params.remove(&name) {
                    path = path.replace(&placeholder, &value_to_string(&value));
                }
            }
        }

        let mut request = self
            .base
            .outbound(endpoint.method.clone(), join_url(&self.base.base_url, &path));

        if endpoint.method == Method::GET || endpoint.method == Method::DELETE {
            request.query = params;
        } else {
            request.body = Some(Value::Object(params));
        }

        if let Some((key_name, key_value)) = self.base.auth.query_param() {
            request.query.insert(key_name, Value::String(key_value));
        }

        Ok(request)
    }

    fn format_response(&self, raw: Value, original: &Envelope) -> Envelope {
        let data = match raw {
            Value::Object(map) => map,
            other => body_to_data(&other.to_string()),
        };
        Envelope::create_response(original, data, self.base.response_metadata())
    }

    async fn process_request(&self, envelope: Envelope) -> ConnectorResult {
        match self.call(&envelope).await {
            Ok(data) => Ok(self.format_response(Value::Object(data), &envelope)),
            Err(e) => Err(self.base.error_envelope(&envelope, &e)),
        }
    }
}
