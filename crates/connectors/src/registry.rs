use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use switchyard_core::{Config, Envelope, Result};
use switchyard_router::{Handler, Router, WILDCARD_INTENT};
use tracing::{info, warn};

use crate::factory::build_connector;
use crate::Connector;

/// Router destination a connector is bound to.
pub fn destination_for(name: &str) -> String {
    format!("api.{}", name)
}

/// Wildcard route handler that hands every envelope to one connector.
struct ConnectorHandler {
    connector: Arc<dyn Connector>,
}

#[async_trait]
impl Handler for ConnectorHandler {
    async fn handle(&self, envelope: Envelope) -> Option<Envelope> {
        let intent = envelope.payload.intent.clone();
        let reply = match self.connector.process_request(envelope).await {
            Ok(response) => response,
            Err(error) => error,
        };
        info!(
            connector = %self.connector.name(),
            intent = %intent,
            message_type = %reply.message_type,
            "Connector call finished"
        );
        Some(reply)
    }
}

#[derive(Default)]
struct RegistryState {
    by_name: HashMap<String, Arc<dyn Connector>>,
    order: Vec<String>,
}

/// Owns the live connectors and binds each one to the router at `api.<name>`.
pub struct ConnectorRegistry {
    router: Arc<Router>,
    state: RwLock<RegistryState>,
}

impl ConnectorRegistry {
    pub fn new(router: Arc<Router>) -> Self {
        Self {
            router,
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Store the connector and route `api.<name>` / `*` to it. A connector
    /// already registered under the same name is replaced.
    pub fn register_connector(&self, connector: Arc<dyn Connector>) {
        let name = connector.name().to_string();
        {
            let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
            if state.by_name.insert(name.clone(), connector.clone()).is_some() {
                warn!(connector = %name, "Connector already registered, overwriting");
            } else {
                state.order.push(name.clone());
            }
        }

        self.router.register_handler(
            &destination_for(&name),
            WILDCARD_INTENT,
            Arc::new(ConnectorHandler {
                connector: connector.clone(),
            }),
        );
        info!(
            connector = %name,
            kind = %connector.kind(),
            base_url = %connector.base_url(),
            "Registered connector"
        );
    }

    pub fn get_connector(&self, name: &str) -> Option<Arc<dyn Connector>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.by_name.get(name).cloned()
    }

    /// Registered connector names, in first-registration order.
    pub fn list_connectors(&self) -> Vec<String> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.order.clone()
    }

    /// Build and register every connector in `config`. Returns how many were registered.
    pub fn load_from_config(&self, config: &Config) -> Result<usize> {
        let mut count = 0;
        for entry in &config.connectors {
            let connector = build_connector(entry, &config.network)?;
            self.register_connector(connector);
            count += 1;
        }
        info!(count, "Loaded connectors from config");
        Ok(count)
    }
}
