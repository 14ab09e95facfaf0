use switchyard_core::{Config, ConnectorType, Paths};

pub async fn run() -> anyhow::Result<()> {
    let paths = Paths::new();

    println!("switchyard status");
    println!("=================");
    println!();

    let config_path = paths.config_file();
    let config_exists = config_path.exists();
    println!(
        "Config:     {} {}",
        config_path.display(),
        if config_exists { "✓" } else { "✗ (not found)" }
    );

    if !config_exists {
        println!();
        println!("Run `switchyard config init` to create a starter configuration.");
        return Ok(());
    }

    let config = Config::load(&config_path)?;

    println!("Timeout:    {}s", config.network.request_timeout_secs);
    println!(
        "Proxy:      {}",
        config.network.proxy.as_deref().unwrap_or("(environment)")
    );
    println!();

    println!("Connectors ({}):", config.connectors.len());
    if config.connectors.is_empty() {
        println!("  (none)");
    }
    for connector in &config.connectors {
        let (kind, intents) = match connector.connector_type {
            ConnectorType::Rest => ("rest", connector.endpoints.len()),
            ConnectorType::Graphql => (
                "graphql",
                connector.queries.len() + connector.mutations.len(),
            ),
        };
        println!("  {:<14} {:<8} {} intent(s)", connector.name, kind, intents);
    }

    Ok(())
}
