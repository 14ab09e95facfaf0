use std::collections::HashSet;

use serde_json::Value;
use switchyard_core::{Envelope, JsonMap};
use tracing::debug;

/// Outcome of one middleware step.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Hand the (possibly rewritten) envelope to the next step.
    Continue(Envelope),
    /// Stop routing; the caller of `route` receives nothing.
    Drop,
}

/// Pre-dispatch transform/filter, run in registration order.
pub trait Middleware: Send + Sync {
    fn process(&self, envelope: Envelope) -> Flow;
}

impl<F> Middleware for F
where
    F: Fn(Envelope) -> Flow + Send + Sync,
{
    fn process(&self, envelope: Envelope) -> Flow {
        self(envelope)
    }
}

/// Drops envelopes addressed to destinations outside the policy.
///
/// An empty allow list admits every destination that is not denied.
#[derive(Debug, Clone, Default)]
pub struct DestinationPolicy {
    allow: HashSet<String>,
    deny: HashSet<String>,
}

impl DestinationPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(mut self, destination: &str) -> Self {
        self.allow.insert(destination.to_string());
        self
    }

    pub fn deny(mut self, destination: &str) -> Self {
        self.deny.insert(destination.to_string());
        self
    }

    pub fn permits(&self, destination: &str) -> bool {
        if self.deny.contains(destination) {
            return false;
        }
        self.allow.is_empty() || self.allow.contains(destination)
    }
}

impl Middleware for DestinationPolicy {
    fn process(&self, envelope: Envelope) -> Flow {
        if self.permits(&envelope.destination) {
            Flow::Continue(envelope)
        } else {
            debug!(
                destination = %envelope.destination,
                message_id = %envelope.message_id,
                "Envelope dropped by destination policy"
            );
            Flow::Drop
        }
    }
}

/// Adds fixed metadata entries to every envelope. Keys already present on the
/// envelope are left alone.
#[derive(Debug, Clone, Default)]
pub struct MetadataStamp {
    entries: JsonMap,
}

impl MetadataStamp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: Value) -> Self {
        self.entries.insert(key.to_string(), value);
        self
    }
}

impl Middleware for MetadataStamp {
    fn process(&self, envelope: Envelope) -> Flow {
        let mut metadata = envelope.payload.metadata.clone();
        for (key, value) in &self.entries {
            if !metadata.contains_key(key) {
                metadata.insert(key.clone(), value.clone());
            }
        }
        Flow::Continue(envelope.with_metadata(metadata))
    }
}

/// Logs every envelope passing through the pipeline at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceMiddleware;

impl Middleware for TraceMiddleware {
    fn process(&self, envelope: Envelope) -> Flow {
        debug!(
            message_id = %envelope.message_id,
            message_type = %envelope.message_type,
            source = %envelope.source,
            destination = %envelope.destination,
            intent = %envelope.payload.intent,
            "Routing envelope"
        );
        Flow::Continue(envelope)
    }
}
