use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde_json::json;
use switchyard_core::{to_map, Envelope, ErrorCode};
use tracing::{debug, info, warn};

use crate::middleware::{Flow, Middleware};

/// Intent key matched when a destination has no exact entry for an intent.
pub const WILDCARD_INTENT: &str = "*";

/// Receives an envelope for a `(destination, intent)` pair and produces the reply.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, envelope: Envelope) -> Option<Envelope>;
}

#[async_trait]
impl<F> Handler for F
where
    F: Fn(Envelope) -> Option<Envelope> + Send + Sync,
{
    async fn handle(&self, envelope: Envelope) -> Option<Envelope> {
        (self)(envelope)
    }
}

type RouteTable = HashMap<String, HashMap<String, Arc<dyn Handler>>>;

/// Destination + intent dispatch table with an ordered middleware pipeline.
///
/// Tables sit behind locks so registration may happen after startup; no lock
/// is held while a handler runs.
#[derive(Default)]
pub struct Router {
    routes: RwLock<RouteTable>,
    middleware: RwLock<Vec<Arc<dyn Middleware>>>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_handler(&self, destination: &str, intent: &str, handler: Arc<dyn Handler>) {
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        let intents = routes.entry(destination.to_string()).or_default();
        if intents.insert(intent.to_string(), handler).is_some() {
            warn!(destination, intent, "Overwriting existing route handler");
        } else {
            debug!(destination, intent, "Registered route handler");
        }
    }

    pub fn register_middleware(&self, middleware: Arc<dyn Middleware>) {
        let mut pipeline = self.middleware.write().unwrap_or_else(PoisonError::into_inner);
        pipeline.push(middleware);
        info!(position = pipeline.len(), "Registered middleware");
    }

    /// Known destinations, sorted.
    pub fn destinations(&self) -> Vec<String> {
        let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = routes.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether `route` would find a handler (exact or wildcard) for the pair.
    pub fn has_route(&self, destination: &str, intent: &str) -> bool {
        self.resolve(destination, intent).is_some()
    }

    fn resolve(&self, destination: &str, intent: &str) -> Option<Arc<dyn Handler>> {
        let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
        let intents = routes.get(destination)?;
        intents
            .get(intent)
            .or_else(|| intents.get(WILDCARD_INTENT))
            .cloned()
    }

    /// Run the middleware pipeline, then dispatch.
    ///
    /// Returns `None` when a middleware drops the envelope, or when nothing is
    /// registered for a non-request envelope. An unroutable request yields a
    /// `ROUTE_NOT_FOUND` error envelope.
    pub async fn route(&self, envelope: Envelope) -> Option<Envelope> {
        let pipeline: Vec<Arc<dyn Middleware>> = self
            .middleware
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut envelope = envelope;
        for mw in &pipeline {
            match mw.process(envelope) {
                Flow::Continue(next) => envelope = next,
                Flow::Drop => return None,
            }
        }

        let destination = envelope.destination.clone();
        let intent = envelope.payload.intent.clone();

        let Some(handler) = self.resolve(&destination, &intent) else {
            if envelope.is_request() {
                warn!(destination = %destination, intent = %intent, "No route for request");
                let details = to_map(json!({ "available_destinations": self.destinations() }));
                return Some(Envelope::create_error(
                    &envelope,
                    ErrorCode::RouteNotFound,
                    format!(
                        "No handler found for destination '{}' and intent '{}'",
                        destination, intent
                    ),
                    details,
                ));
            }
            debug!(
                destination = %destination,
                intent = %intent,
                message_type = %envelope.message_type,
                "No route, discarding"
            );
            return None;
        };

        debug!(destination = %destination, intent = %intent, "Dispatching envelope");
        handler.handle(envelope).await
    }
}
