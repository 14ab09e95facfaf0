use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use switchyard_core::{to_map, Envelope, Error, Result};
use tracing::debug;

use crate::auth::Auth;
use crate::base::{map_parameters, ConnectorBase};
use crate::{Connector, ConnectorKind, ConnectorResult, OutboundRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Query => "query",
            OperationKind::Mutation => "mutation",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub document: String,
    pub params_mapping: BTreeMap<String, String>,
    pub description: Option<String>,
}

/// Connector for a single GraphQL endpoint. Every intent is one query or one
/// mutation, posted to `base_url`.
pub struct GraphQlConnector {
    base: ConnectorBase,
    queries: BTreeMap<String, Operation>,
    mutations: BTreeMap<String, Operation>,
}

impl GraphQlConnector {
    pub fn new(name: &str, base_url: &str) -> Self {
        Self {
            base: ConnectorBase::new(name, base_url, ConnectorKind::GraphQl),
            queries: BTreeMap::new(),
            mutations: BTreeMap::new(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.base.set_client(client);
        self
    }

    pub fn register_query(
        &mut self,
        intent: &str,
        query: &str,
        params_mapping: BTreeMap<String, String>,
    ) -> &mut Self {
        self.register(intent, OperationKind::Query, Operation {
            document: query.to_string(),
            params_mapping,
            description: None,
        })
    }

    pub fn register_mutation(
        &mut self,
        intent: &str,
        mutation: &str,
        params_mapping: BTreeMap<String, String>,
    ) -> &mut Self {
        self.register(intent, OperationKind::Mutation, Operation {
            document: mutation.to_string(),
            params_mapping,
            description: None,
        })
    }

    pub fn register(
        &mut self,
        intent: &str,
        kind: OperationKind,
        operation: Operation,
    ) -> &mut Self {
        debug!(
            connector = %self.base.name,
            intent,
            kind = kind.as_str(),
            "Registered GraphQL operation"
        );
        let table = match kind {
            OperationKind::Query => &mut self.queries,
            OperationKind::Mutation => &mut self.mutations,
        };
        table.insert(intent.to_string(), operation);
        self
    }

    /// The operation serving `intent`; the query table is consulted first.
    pub fn operation_for(&self, intent: &str) -> Option<(OperationKind, &Operation)> {
        if let Some(op) = self.queries.get(intent) {
            return Some((OperationKind::Query, op));
        }
        self.mutations
            .get(intent)
            .map(|op| (OperationKind::Mutation, op))
    }

    async fn call(&self, envelope: &Envelope) -> Result<Value> {
        let request = self.format_request(envelope)?;
        let body = self.base.send(request).await?;
        let result: Value = serde_json::from_str(&body)?;

        if let Some(errors) = result.get("errors") {
            let errors = match errors {
                Value::Array(list) => list.clone(),
                other => vec![other.clone()],
            };
            return Err(Error::GraphQl(errors));
        }
        Ok(result)
    }
}

#[async_trait]
impl Connector for GraphQlConnector {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn kind(&self) -> ConnectorKind {
        ConnectorKind::GraphQl
    }

    fn base_url(&self) -> &str {
        &self.base.base_url
    }

    fn intents(&self) -> Vec<String> {
        let mut intents: Vec<String> = self
            .queries
            .keys()
            .chain(self.mutations.keys())
            .cloned()
            .collect();
        intents.sort();
        intents.dedup();
        intents
    }

    fn describe(&self, intent: &str) -> Option<String> {
        self.operation_for(intent)?.1.description.clone()
    }

    fn set_auth(&mut self, auth: Auth) {
        self.base.set_auth(auth);
    }

    fn format_request(&self, envelope: &Envelope) -> Result<OutboundRequest> {
        let intent = &envelope.payload.intent;
        let (_, operation) = self.operation_for(intent).ok_or_else(|| {
            Error::Config(format!("No query or mutation registered for intent '{}'", intent))
        })?;

        let variables = map_parameters(&envelope.payload.parameters, &operation.params_mapping);

        let mut request = self.base.outbound(Method::POST, self.base.base_url.clone());
        request
            .headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        if let Some((key_name, key_value)) = self.base.auth.query_param() {
            request.query.insert(key_name, Value::String(key_value));
        }
        request.body = Some(json!({
            "query": operation.document,
            "variables": Value::Object(variables),
        }));
        Ok(request)
    }

    fn format_response(&self, raw: Value, original: &Envelope) -> Envelope {
        let data = match raw.get("data") {
            Some(Value::Object(map)) => map.clone(),
            None | Some(Value::Null) => Default::default(),
            Some(other) => to_map(json!({ "result": other })),
        };
        Envelope::create_response(original, data, self.base.response_metadata())
    }

    async fn process_request(&self, envelope: Envelope) -> ConnectorResult {
        match self.call(&envelope).await {
            Ok(result) => Ok(self.format_response(result, &envelope)),
            Err(e) => Err(self.base.error_envelope(&envelope, &e)),
        }
    }
}
