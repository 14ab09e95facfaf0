use anyhow::Context;
use std::sync::Arc;
use switchyard_connectors::{ApiClient, ConnectorRegistry};
use switchyard_core::{Config, JsonMap, Paths};
use switchyard_router::{Router, TraceMiddleware};

fn parse_object(flag: &str, raw: Option<&str>) -> anyhow::Result<JsonMap> {
    let Some(raw) = raw else {
        return Ok(JsonMap::new());
    };
    let value: serde_json::Value =
        serde_json::from_str(raw).with_context(|| format!("--{} is not valid JSON", flag))?;
    match value {
        serde_json::Value::Object(map) => Ok(map),
        _ => anyhow::bail!("--{} must be a JSON object", flag),
    }
}

pub async fn run(
    api: &str,
    intent: &str,
    params: Option<&str>,
    data: Option<&str>,
) -> anyhow::Result<()> {
    let parameters = parse_object("params", params)?;
    let data = parse_object("data", data)?;

    let paths = Paths::new();
    let config = Config::load_or_default(&paths)?;

    let router = Arc::new(Router::new());
    router.register_middleware(Arc::new(TraceMiddleware));
    let registry = ConnectorRegistry::new(router.clone());
    registry.load_from_config(&config)?;

    let client = match config.client_source.as_deref() {
        Some(source) => ApiClient::with_source(router, source),
        None => ApiClient::new(router),
    };

    let reply = client
        .call_api(api, intent, parameters, data, JsonMap::new())
        .await;
    println!("{}", serde_json::to_string_pretty(&reply)?);

    if let Some(code) = reply.error_code() {
        anyhow::bail!(
            "{}: {}",
            code,
            reply.error_message().unwrap_or("request failed")
        );
    }
    Ok(())
}
