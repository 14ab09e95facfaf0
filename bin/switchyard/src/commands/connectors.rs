use std::sync::Arc;
use switchyard_connectors::ConnectorRegistry;
use switchyard_core::{Config, Paths};
use switchyard_router::Router;

/// Build every configured connector and list what it serves.
pub async fn run() -> anyhow::Result<()> {
    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;

    let registry = ConnectorRegistry::new(Arc::new(Router::new()));
    registry.load_from_config(&config)?;

    let names = registry.list_connectors();
    if names.is_empty() {
        println!("No connectors configured in {}", paths.config_file().display());
        return Ok(());
    }

    for name in names {
        let Some(connector) = registry.get_connector(&name) else {
            continue;
        };
        println!("{} ({}) {}", name, connector.kind(), connector.base_url());
        for intent in connector.intents() {
            match connector.describe(&intent) {
                Some(description) => println!("  - {:<16} {}", intent, description),
                None => println!("  - {}", intent),
            }
        }
    }
    Ok(())
}
