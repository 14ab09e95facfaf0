use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

/// String-keyed JSON object used for parameters, data and metadata.
pub type JsonMap = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Request,
    Response,
    Error,
    Event,
    Notification,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Request => "request",
            MessageType::Response => "response",
            MessageType::Error => "error",
            MessageType::Event => "event",
            MessageType::Notification => "notification",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error codes the gateway itself produces. Handlers are free to use their own
/// codes; `create_error` accepts any string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    RouteNotFound,
    NoResponse,
    ApiRequestError,
    ProcessingError,
    GraphqlError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::RouteNotFound => "ROUTE_NOT_FOUND",
            ErrorCode::NoResponse => "NO_RESPONSE",
            ErrorCode::ApiRequestError => "API_REQUEST_ERROR",
            ErrorCode::ProcessingError => "PROCESSING_ERROR",
            ErrorCode::GraphqlError => "GRAPHQL_ERROR",
        }
    }
}

impl AsRef<str> for ErrorCode {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub intent: String,
    #[serde(default)]
    pub parameters: JsonMap,
    #[serde(default)]
    pub data: JsonMap,
    #[serde(default)]
    pub metadata: JsonMap,
}

/// The unit exchanged between the client facade, the router and connectors.
///
/// Envelopes are built through the factory functions below and are not
/// modified once they leave the builder chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub message_id: String,
    pub message_type: MessageType,
    pub source: String,
    pub destination: String,
    pub timestamp: f64,
    pub correlation_id: Option<String>,
    pub payload: Payload,
}

fn now_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

impl Envelope {
    fn new(message_type: MessageType, source: &str, destination: &str, payload: Payload) -> Self {
        Self {
            message_id: uuid::Uuid::new_v4().to_string(),
            message_type,
            source: source.to_string(),
            destination: destination.to_string(),
            timestamp: now_seconds(),
            correlation_id: None,
            payload,
        }
    }

    /// Start a request envelope. Attach parameters, data and metadata with the
    /// `with_*` builders.
    pub fn request(source: &str, destination: &str, intent: &str) -> Self {
        Self::new(
            MessageType::Request,
            source,
            destination,
            Payload {
                intent: intent.to_string(),
                ..Payload::default()
            },
        )
    }

    pub fn create_request(
        source: &str,
        destination: &str,
        intent: &str,
        parameters: JsonMap,
        data: JsonMap,
        metadata: JsonMap,
        correlation_id: Option<String>,
    ) -> Self {
        let mut env = Self::request(source, destination, intent)
            .with_parameters(parameters)
            .with_data(data)
            .with_metadata(metadata);
        env.correlation_id = correlation_id;
        env
    }

    pub fn event(source: &str, destination: &str, intent: &str) -> Self {
        Self::new(
            MessageType::Event,
            source,
            destination,
            Payload {
                intent: intent.to_string(),
                ..Payload::default()
            },
        )
    }

    pub fn notification(source: &str, destination: &str, intent: &str) -> Self {
        Self::new(
            MessageType::Notification,
            source,
            destination,
            Payload {
                intent: intent.to_string(),
                ..Payload::default()
            },
        )
    }

    /// Response to `request`: addressing swapped, intent and parameters echoed,
    /// correlated to the request id.
    pub fn create_response(request: &Envelope, data: JsonMap, metadata: JsonMap) -> Self {
        let mut env = Self::new(
            MessageType::Response,
            &request.destination,
            &request.source,
            Payload {
                intent: request.payload.intent.clone(),
                parameters: request.payload.parameters.clone(),
                data,
                metadata,
            },
        );
        env.correlation_id = Some(request.message_id.clone());
        env
    }

    pub fn create_error(
        request: &Envelope,
        error_code: impl AsRef<str>,
        error_message: impl Into<String>,
        details: JsonMap,
    ) -> Self {
        let data = json!({
            "error_code": error_code.as_ref(),
            "error_message": error_message.into(),
            "details": Value::Object(details),
        });
        let data = match data {
            Value::Object(map) => map,
            _ => JsonMap::new(),
        };

        let mut env = Self::new(
            MessageType::Error,
            &request.destination,
            &request.source,
            Payload {
                intent: request.payload.intent.clone(),
                parameters: request.payload.parameters.clone(),
                data,
                metadata: JsonMap::new(),
            },
        );
        env.correlation_id = Some(request.message_id.clone());
        env
    }

    pub fn with_parameters(mut self, parameters: JsonMap) -> Self {
        self.payload.parameters = parameters;
        self
    }

    pub fn with_data(mut self, data: JsonMap) -> Self {
        self.payload.data = data;
        self
    }

    pub fn with_metadata(mut self, metadata: JsonMap) -> Self {
        self.payload.metadata = metadata;
        self
    }

    pub fn intent(&self) -> &str {
        &self.payload.intent
    }

    pub fn is_request(&self) -> bool {
        self.message_type == MessageType::Request
    }

    pub fn is_error(&self) -> bool {
        self.message_type == MessageType::Error
    }

    pub fn error_code(&self) -> Option<&str> {
        if !self.is_error() {
            return None;
        }
        self.payload.data.get("error_code").and_then(|v| v.as_str())
    }

    pub fn error_message(&self) -> Option<&str> {
        if !self.is_error() {
            return None;
        }
        self.payload.data.get("error_message").and_then(|v| v.as_str())
    }

    pub fn error_details(&self) -> Option<&JsonMap> {
        if !self.is_error() {
            return None;
        }
        self.payload.data.get("details").and_then(|v| v.as_object())
    }
}

/// Convert a JSON value into a map, for callers that build payloads with `json!`.
/// Anything other than an object yields an empty map.
pub fn to_map(value: Value) -> JsonMap {
    match value {
        Value::Object(map) => map,
        _ => JsonMap::new(),
    }
}
