use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::message::ErrorCode;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport failure or non-2xx reply from a backend API.
    #[error("HTTP error: {message}")]
    Http {
        message: String,
        status: Option<u16>,
        body: Option<String>,
        timeout: bool,
    },

    /// The backend answered with a GraphQL `errors` list.
    #[error("GraphQL operation failed")]
    GraphQl(Vec<Value>),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn http(message: impl Into<String>) -> Self {
        Error::Http {
            message: message.into(),
            status: None,
            body: None,
            timeout: false,
        }
    }

    /// Short, stable name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Http { .. } => "http",
            Error::GraphQl(_) => "graphql",
            Error::Validation(_) => "validation",
            Error::NotFound(_) => "not_found",
            Error::Other(_) => "other",
        }
    }

    /// Error code this failure is reported under when it crosses a connector boundary.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Http { .. } => ErrorCode::ApiRequestError,
            Error::GraphQl(_) => ErrorCode::GraphqlError,
            _ => ErrorCode::ProcessingError,
        }
    }

    pub fn details(&self) -> Map<String, Value> {
        let details = match self {
            Error::Http {
                status,
                body,
                timeout,
                ..
            } => {
                let mut d = json!({
                    "status_code": status,
                    "response_text": body,
                });
                if *timeout {
                    d["timeout"] = json!(true);
                }
                d
            }
            Error::GraphQl(errors) => json!({ "errors": errors }),
            other => json!({ "error_kind": other.kind() }),
        };
        match details {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
