pub mod call;
pub mod config_cmd;
pub mod connectors;
pub mod status;
