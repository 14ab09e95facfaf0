//! Destination + intent dispatch for switchyard envelopes.

pub mod middleware;
pub mod router;

pub use middleware::{DestinationPolicy, Flow, MetadataStamp, Middleware, TraceMiddleware};
pub use router::{Handler, Router, WILDCARD_INTENT};
