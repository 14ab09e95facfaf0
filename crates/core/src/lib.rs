pub mod config;
pub mod error;
pub mod message;
pub mod paths;

pub use config::{
    AuthType, Config, ConnectorConfig, ConnectorType, EndpointConfig, NetworkConfig,
    OperationConfig,
};
pub use error::{Error, Result};
pub use message::{to_map, Envelope, ErrorCode, JsonMap, MessageType, Payload};
pub use paths::Paths;
