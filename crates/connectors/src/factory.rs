use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;
use switchyard_core::{
    AuthType, ConnectorConfig, ConnectorType, Error, JsonMap, NetworkConfig, Result,
};
use tracing::debug;

use crate::auth::Auth;
use crate::client::build_http_client;
use crate::graphql::{GraphQlConnector, Operation, OperationKind};
use crate::rest::{Endpoint, RestConnector};
use crate::Connector;

/// REST connector with credentials applied and no endpoints yet.
pub fn create_rest_connector(
    name: &str,
    base_url: &str,
    auth_type: AuthType,
    auth_params: &JsonMap,
) -> Result<RestConnector> {
    let mut connector = RestConnector::new(name, base_url);
    connector.set_auth(Auth::from_params(auth_type, auth_params)?);
    Ok(connector)
}

/// GraphQL connector with credentials applied and no operations yet.
pub fn create_graphql_connector(
    name: &str,
    base_url: &str,
    auth_type: AuthType,
    auth_params: &JsonMap,
) -> Result<GraphQlConnector> {
    let mut connector = GraphQlConnector::new(name, base_url);
    connector.set_auth(Auth::from_params(auth_type, auth_params)?);
    Ok(connector)
}

fn parse_method(connector: &str, intent: &str, method: &str) -> Result<Method> {
    Method::from_bytes(method.trim().to_uppercase().as_bytes()).map_err(|_| {
        Error::Config(format!(
            "connector '{}': intent '{}' has invalid HTTP method '{}'",
            connector, intent, method
        ))
    })
}

/// Build a ready-to-register connector from its config entry.
pub fn build_connector(
    cfg: &ConnectorConfig,
    network: &NetworkConfig,
) -> Result<Arc<dyn Connector>> {
    cfg.validate()?;

    let timeout = Duration::from_secs(cfg.timeout_secs.unwrap_or(network.request_timeout_secs));
    let client = build_http_client(cfg.proxy.as_deref(), network, &cfg.base_url, timeout);

    let connector: Arc<dyn Connector> = match cfg.connector_type {
        ConnectorType::Rest => {
            let mut rest =
                create_rest_connector(&cfg.name, &cfg.base_url, cfg.auth_type, &cfg.auth_params)?
                    .with_client(client);
            for (intent, ep) in &cfg.endpoints {
                rest.register(
                    intent,
                    Endpoint {
                        template: ep.endpoint.clone(),
                        method: parse_method(&cfg.name, intent, &ep.method)?,
                        params_mapping: ep.params_mapping.clone(),
                        description: ep.description.clone(),
                    },
                );
            }
            Arc::new(rest)
        }
        ConnectorType::Graphql => {
            let mut gql =
                create_graphql_connector(&cfg.name, &cfg.base_url, cfg.auth_type, &cfg.auth_params)?
                    .with_client(client);
            let tables = [
                (OperationKind::Query, &cfg.queries),
                (OperationKind::Mutation, &cfg.mutations),
            ];
            for (kind, table) in tables {
                for (intent, op) in table {
                    gql.register(
                        intent,
                        kind,
                        Operation {
                            document: op.query.clone(),
                            params_mapping: op.params_mapping.clone(),
                            description: op.description.clone(),
                        },
                    );
                }
            }
            Arc::new(gql)
        }
    };

    debug!(
        connector = %cfg.name,
        kind = %connector.kind(),
        timeout_secs = timeout.as_secs(),
        "Built connector from config"
    );
    Ok(connector)
}
