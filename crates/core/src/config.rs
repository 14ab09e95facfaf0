use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::warn;

use crate::error::{Error, Result};
use crate::message::{to_map, JsonMap};
use crate::paths::Paths;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorType {
    #[default]
    Rest,
    Graphql,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthType {
    #[default]
    None,
    ApiKey,
    Basic,
    Oauth,
    Bearer,
    Custom,
}

impl AuthType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthType::None => "none",
            AuthType::ApiKey => "api_key",
            AuthType::Basic => "basic",
            AuthType::Oauth => "oauth",
            AuthType::Bearer => "bearer",
            AuthType::Custom => "custom",
        }
    }
}

/// A REST endpoint bound to one intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub endpoint: String,
    #[serde(default = "default_method")]
    pub method: String,
    /// Incoming parameter name -> API-side name.
    #[serde(default)]
    pub params_mapping: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_method() -> String {
    "GET".to_string()
}

/// A GraphQL query or mutation bound to one intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationConfig {
    pub query: String,
    #[serde(default)]
    pub params_mapping: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectorConfig {
    pub name: String,
    pub base_url: String,
    #[serde(default, rename = "type")]
    pub connector_type: ConnectorType,
    #[serde(default)]
    pub auth_type: AuthType,
    #[serde(default)]
    pub auth_params: JsonMap,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub endpoints: BTreeMap<String, EndpointConfig>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub queries: BTreeMap<String, OperationConfig>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mutations: BTreeMap<String, OperationConfig>,
    /// None = follow the global proxy, Some("") = force a direct connection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    /// Overrides `network.request_timeout_secs` for this connector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl ConnectorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::Validation("connector name must not be empty".to_string()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::Validation(format!(
                "connector '{}': base_url must start with http:// or https://",
                self.name
            )));
        }
        match self.connector_type {
            ConnectorType::Rest => {
                if !self.queries.is_empty() || !self.mutations.is_empty() {
                    return Err(Error::Validation(format!(
                        "connector '{}': REST connectors take endpoints, not queries or mutations",
                        self.name
                    )));
                }
            }
            ConnectorType::Graphql => {
                if !self.endpoints.is_empty() {
                    return Err(Error::Validation(format!(
                        "connector '{}': GraphQL connectors take queries/mutations, not endpoints",
                        self.name
                    )));
                }
                let shared = self.queries.keys().find(|k| self.mutations.contains_key(*k));
                if let Some(intent) = shared {
                    return Err(Error::Validation(format!(
                        "connector '{}': intent '{}' is registered as both query and mutation",
                        self.name, intent
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    #[serde(default)]
    pub no_proxy: Vec<String>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            no_proxy: Vec::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Source id stamped on requests issued by the CLI client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_source: Option<String>,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub connectors: Vec<ConnectorConfig>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(paths: &Paths) -> Result<Self> {
        let config_path = paths.config_file();
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for connector in &self.connectors {
            connector.validate()?;
            if !seen.insert(connector.name.as_str()) {
                warn!(
                    connector = %connector.name,
                    "Duplicate connector name in config, last entry wins"
                );
            }
        }
        Ok(())
    }

    pub fn get_connector(&self, name: &str) -> Option<&ConnectorConfig> {
        self.connectors.iter().rev().find(|c| c.name == name)
    }

    /// Starter configuration with the weather and news demo APIs.
    pub fn sample() -> Self {
        let weather = ConnectorConfig {
            name: "weather".to_string(),
            base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            connector_type: ConnectorType::Rest,
            auth_type: AuthType::ApiKey,
            auth_params: to_map(json!({
                "key_name": "appid",
                "key_value": "demo_key",
                "key_location": "query"
            })),
            endpoints: BTreeMap::from([(
                "query".to_string(),
                EndpointConfig {
                    endpoint: "weather".to_string(),
                    method: "GET".to_string(),
                    params_mapping: BTreeMap::from([
                        ("city".to_string(), "q".to_string()),
                        ("units".to_string(), "units".to_string()),
                    ]),
                    description: Some("Current weather for a city".to_string()),
                },
            )]),
            queries: BTreeMap::new(),
            mutations: BTreeMap::new(),
            proxy: None,
            timeout_secs: None,
        };

        let news = ConnectorConfig {
            name: "news".to_string(),
            base_url: "https://newsapi.org/v2".to_string(),
            connector_type: ConnectorType::Rest,
            auth_type: AuthType::ApiKey,
            auth_params: to_map(json!({
                "key_name": "apiKey",
                "key_value": "demo_key",
                "key_location": "query"
            })),
            endpoints: BTreeMap::from([(
                "query".to_string(),
                EndpointConfig {
                    endpoint: "top-headlines".to_string(),
                    method: "GET".to_string(),
                    params_mapping: BTreeMap::from([
                        ("country".to_string(), "country".to_string()),
                        ("category".to_string(), "category".to_string()),
                        ("query".to_string(), "q".to_string()),
                    ]),
                    description: Some("Top headlines by country, category or keyword".to_string()),
                },
            )]),
            queries: BTreeMap::new(),
            mutations: BTreeMap::new(),
            proxy: None,
            timeout_secs: None,
        };

        Self {
            client_source: Some("cli".to_string()),
            network: NetworkConfig::default(),
            connectors: vec![weather, news],
        }
    }
}
