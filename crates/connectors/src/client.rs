use reqwest::{Client, Proxy};
use std::time::Duration;
use switchyard_core::NetworkConfig;
use tracing::{debug, info, warn};

/// Which proxy, if any, a connector's HTTP client should use.
#[derive(Debug, PartialEq)]
enum ProxyChoice {
    Use(String),
    /// Ignore every proxy, environment variables included.
    Direct,
    /// Leave reqwest to read HTTPS_PROXY / HTTP_PROXY.
    Environment,
}

/// Host matching against `no_proxy` rules: exact host, `*.suffix` (subdomains
/// only) and `.suffix` (the domain and its subdomains).
fn host_bypasses_proxy(host: &str, rules: &[String]) -> bool {
    let host = host.to_lowercase();
    rules.iter().any(|rule| {
        let rule = rule.trim().to_lowercase();
        if rule.is_empty() {
            false
        } else if let Some(suffix) = rule.strip_prefix("*.") {
            host.ends_with(&format!(".{}", suffix))
        } else if let Some(suffix) = rule.strip_prefix('.') {
            host == suffix || host.ends_with(&format!(".{}", suffix))
        } else {
            host == rule
        }
    })
}

/// Host part of a URL, without scheme, userinfo or port.
fn url_host(url: &str) -> Option<String> {
    let rest = url.split_once("://").map(|(_, r)| r).unwrap_or(url);
    let authority = rest.split('/').next()?;
    let host_port = authority.rsplit('@').next()?;
    let host = if let Some(v6) = host_port.strip_prefix('[') {
        v6.split(']').next()?
    } else {
        host_port.split(':').next()?
    };
    if host.is_empty() {
        None
    } else {
        Some(host.to_string())
    }
}

/// Connector setting first (`Some("")` forces direct), then the global proxy
/// unless the host is exempt, then the environment.
fn choose_proxy(
    connector_proxy: Option<&str>,
    network: &NetworkConfig,
    base_url: &str,
) -> ProxyChoice {
    match connector_proxy {
        Some("") => return ProxyChoice::Direct,
        Some(p) => return ProxyChoice::Use(p.to_string()),
        None => {}
    }

    match network.proxy.as_deref() {
        Some(global) if !global.is_empty() => {
            let exempt = url_host(base_url)
                .map(|host| host_bypasses_proxy(&host, &network.no_proxy))
                .unwrap_or(false);
            if exempt {
                ProxyChoice::Direct
            } else {
                ProxyChoice::Use(global.to_string())
            }
        }
        _ => ProxyChoice::Environment,
    }
}

/// Build the HTTP client a connector owns for its lifetime.
pub fn build_http_client(
    connector_proxy: Option<&str>,
    network: &NetworkConfig,
    base_url: &str,
    timeout: Duration,
) -> Client {
    let mut builder = Client::builder()
        .timeout(timeout)
        .user_agent(concat!("switchyard/", env!("CARGO_PKG_VERSION")));

    match choose_proxy(connector_proxy, network, base_url) {
        ProxyChoice::Use(url) => match Proxy::all(&url) {
            Ok(proxy) => {
                info!(proxy = %url, base_url, "Connector using proxy");
                builder = builder.proxy(proxy);
            }
            Err(e) => {
                warn!(error = %e, proxy = %url, "Invalid proxy URL, connecting directly");
                builder = builder.no_proxy();
            }
        },
        ProxyChoice::Direct => {
            debug!(base_url, "Connector forced to direct connect");
            builder = builder.no_proxy();
        }
        ProxyChoice::Environment => {}
    }

    builder.build().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to build HTTP client, using default");
        Client::new()
    })
}

/// Client with the default timeout and no proxy overrides.
pub fn default_http_client() -> Client {
    let network = NetworkConfig::default();
    build_http_client(
        None,
        &network,
        "",
        Duration::from_secs(network.request_timeout_secs),
    )
}
