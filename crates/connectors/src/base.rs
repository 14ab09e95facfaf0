use reqwest::{Client, Url};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use switchyard_core::{to_map, Envelope, Error, JsonMap, Result};
use tracing::{debug, warn};

use crate::auth::Auth;
use crate::client::default_http_client;
use crate::{ConnectorKind, OutboundRequest};

/// State shared by every connector variant: identity, credentials and the
/// HTTP client the connector owns.
pub struct ConnectorBase {
    pub name: String,
    pub base_url: String,
    pub kind: ConnectorKind,
    pub auth: Auth,
    client: Client,
}

impl ConnectorBase {
    pub fn new(name: &str, base_url: &str, kind: ConnectorKind) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.to_string(),
            kind,
            auth: Auth::None,
            client: default_http_client(),
        }
    }

    pub fn set_client(&mut self, client: Client) {
        self.client = client;
    }

    pub fn set_auth(&mut self, auth: Auth) {
        debug!(connector = %self.name, auth = ?auth, "Configured auth");
        self.auth = auth;
    }

    /// Outbound call skeleton with the auth headers and basic credentials applied.
    pub fn outbound(&self, method: reqwest::Method, url: String) -> OutboundRequest {
        let mut request = OutboundRequest::new(method, url);
        request.headers = self.auth.headers();
        request.basic_auth = self.auth.basic_credentials();
        request
    }

    pub fn response_metadata(&self) -> JsonMap {
        to_map(json!({
            "api_name": self.name,
            "api_type": self.kind.as_str(),
        }))
    }

    pub fn error_envelope(&self, request: &Envelope, error: &Error) -> Envelope {
        warn!(
            connector = %self.name,
            intent = %request.payload.intent,
            code = %error.code(),
            error = %error,
            "Connector call failed"
        );
        Envelope::create_error(request, error.code(), error.to_string(), error.details())
    }

    /// Send the call and return the raw body of a 2xx reply.
    pub async fn send(&self, request: OutboundRequest) -> Result<String> {
        debug!(
            connector = %self.name,
            method = %request.method,
            url = %request.url,
            "Sending outbound request"
        );

        let mut builder = self.client.request(request.method.clone(), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.query.is_empty() {
            builder = builder.query(&request.query_pairs());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some((username, password)) = &request.basic_auth {
            builder = builder.basic_auth(username, Some(password));
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        let url = redacted_url(response.url());
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(Error::Http {
                message: format!("{} for url: {}", status, url),
                status: Some(status.as_u16()),
                body: Some(text),
                timeout: false,
            });
        }
        Ok(text)
    }
}

/// URL text safe for error messages: query, fragment and password removed,
/// since query-located API keys live in the query string.
fn redacted_url(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.set_fragment(None);
    let _ = url.set_password(None);
    url.to_string()
}

fn transport_error(e: reqwest::Error) -> Error {
    let url = e.url().map(redacted_url);
    let status = e.status().map(|s| s.as_u16());
    let timeout = e.is_timeout();
    let e = e.without_url();
    let message = match url {
        Some(url) => format!("{} for url: {}", e, url),
        None => e.to_string(),
    };
    Error::Http {
        message,
        status,
        body: None,
        timeout,
    }
}

/// Apply a parameter mapping: mapped names are renamed, unmapped names pass
/// through. An unmapped name that collides with a mapped target overwrites it.
pub fn map_parameters(parameters: &JsonMap, mapping: &BTreeMap<String, String>) -> JsonMap {
    let mut mapped = JsonMap::new();
    for (incoming, api_name) in mapping {
        if let Some(value) = parameters.get(incoming) {
            mapped.insert(api_name.clone(), value.clone());
        }
    }
    for (name, value) in parameters {
        if !mapping.contains_key(name) {
            mapped.insert(name.clone(), value.clone());
        }
    }
    mapped
}

/// Join a base URL and a relative endpoint with exactly one slash.
pub fn join_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

/// Parse a backend body: JSON objects as-is, other JSON wrapped under
/// `result`, non-JSON text under `text`.
pub fn body_to_data(body: &str) -> JsonMap {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(other) => to_map(json!({ "result": other })),
        Err(_) => to_map(json!({ "text": body })),
    }
}
