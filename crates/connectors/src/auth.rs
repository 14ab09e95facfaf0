use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use switchyard_core::{AuthType, Error, JsonMap, Result};

use crate::value_to_string;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyLocation {
    #[default]
    Header,
    Query,
}

/// Credentials a connector attaches to every outbound call.
#[derive(Clone, PartialEq, Default)]
pub enum Auth {
    #[default]
    None,
    ApiKey {
        key_name: String,
        key_value: String,
        location: KeyLocation,
    },
    Basic {
        username: String,
        password: String,
    },
    Bearer {
        token: String,
    },
    /// Pre-issued access token; refreshing it is the caller's business.
    OAuth {
        access_token: String,
        token_type: String,
    },
    /// Static headers sent as-is.
    Custom {
        headers: BTreeMap<String, String>,
    },
}

fn param_str(params: &JsonMap, key: &str, default: &str) -> String {
    match params.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => default.to_string(),
        Some(other) => other.to_string(),
    }
}

impl Auth {
    /// Build credentials from the `auth_type` / `auth_params` pair of a connector
    /// registration. Missing values fall back to empty strings.
    pub fn from_params(auth_type: AuthType, params: &JsonMap) -> Result<Self> {
        let auth = match auth_type {
            AuthType::None => Auth::None,
            AuthType::ApiKey => {
                let location = match param_str(params, "key_location", "header").as_str() {
                    "header" => KeyLocation::Header,
                    "query" => KeyLocation::Query,
                    other => {
                        return Err(Error::Config(format!(
                            "Unsupported key_location '{}' (expected 'header' or 'query')",
                            other
                        )))
                    }
                };
                Auth::ApiKey {
                    key_name: param_str(params, "key_name", "api_key"),
                    key_value: param_str(params, "key_value", ""),
                    location,
                }
            }
            AuthType::Basic => Auth::Basic {
                username: param_str(params, "username", ""),
                password: param_str(params, "password", ""),
            },
            AuthType::Bearer => Auth::Bearer {
                token: param_str(params, "token", ""),
            },
            AuthType::Oauth => Auth::OAuth {
                access_token: param_str(params, "access_token", ""),
                token_type: param_str(params, "token_type", "Bearer"),
            },
            AuthType::Custom => {
                let headers = match params.get("headers") {
                    Some(Value::Object(map)) => map
                        .iter()
                        .map(|(k, v)| (k.clone(), value_to_string(v)))
                        .collect(),
                    Some(_) => {
                        return Err(Error::Config(
                            "custom auth expects 'headers' to be an object".to_string(),
                        ))
                    }
                    None => BTreeMap::new(),
                };
                Auth::Custom { headers }
            }
        };
        Ok(auth)
    }

    pub fn auth_type(&self) -> AuthType {
        match self {
            Auth::None => AuthType::None,
            Auth::ApiKey { .. } => AuthType::ApiKey,
            Auth::Basic { .. } => AuthType::Basic,
            Auth::Bearer { .. } => AuthType::Bearer,
            Auth::OAuth { .. } => AuthType::Oauth,
            Auth::Custom { .. } => AuthType::Custom,
        }
    }

    /// Headers this auth contributes to every call.
    pub fn headers(&self) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        match self {
            Auth::ApiKey {
                key_name,
                key_value,
                location: KeyLocation::Header,
            } => {
                headers.insert(key_name.clone(), key_value.clone());
            }
            Auth::Bearer { token } => {
                headers.insert("Authorization".to_string(), format!("Bearer {}", token));
            }
            Auth::OAuth {
                access_token,
                token_type,
            } => {
                headers.insert(
                    "Authorization".to_string(),
                    format!("{} {}", token_type, access_token),
                );
            }
            Auth::Custom { headers: custom } => {
                headers.extend(custom.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            _ => {}
        }
        headers
    }

    /// The `(name, value)` pair to add to the query string, for query-located API keys.
    pub fn query_param(&self) -> Option<(String, String)> {
        match self {
            Auth::ApiKey {
                key_name,
                key_value,
                location: KeyLocation::Query,
            } => Some((key_name.clone(), key_value.clone())),
            _ => None,
        }
    }

    pub fn basic_credentials(&self) -> Option<(String, String)> {
        match self {
            Auth::Basic { username, password } => Some((username.clone(), password.clone())),
            _ => None,
        }
    }
}

// Secrets stay out of logs.
impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::None => f.write_str("Auth::None"),
            Auth::ApiKey {
                key_name, location, ..
            } => f
                .debug_struct("Auth::ApiKey")
                .field("key_name", key_name)
                .field("location", location)
                .finish_non_exhaustive(),
            Auth::Basic { username, .. } => f
                .debug_struct("Auth::Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            Auth::Bearer { .. } => f.write_str("Auth::Bearer { .. }"),
            Auth::OAuth { token_type, .. } => f
                .debug_struct("Auth::OAuth")
                .field("token_type", token_type)
                .finish_non_exhaustive(),
            Auth::Custom { headers } => f
                .debug_struct("Auth::Custom")
                .field("header_names", &headers.keys().collect::<Vec<_>>())
                .finish(),
        }
    }
}
