use reqwest::Method;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use switchyard_connectors::client::build_http_client;
use switchyard_connectors::{
    create_rest_connector, ApiClient, Auth, Connector, ConnectorRegistry, GraphQlConnector,
    IntentCall, RestConnector,
};
use switchyard_core::{to_map, AuthType, Config, JsonMap, MessageType, NetworkConfig};
use switchyard_router::{Flow, Router};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn direct_client(base_url: &str, timeout: Duration) -> reqwest::Client {
    build_http_client(Some(""), &NetworkConfig::default(), base_url, timeout)
}

fn mapping(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect()
}

fn setup() -> (Arc<Router>, ConnectorRegistry, ApiClient) {
    let router = Arc::new(Router::new());
    let registry = ConnectorRegistry::new(router.clone());
    let client = ApiClient::with_source(router.clone(), "test-client");
    (router, registry, client)
}

fn weather_connector(base_url: &str) -> RestConnector {
    let mut weather = RestConnector::new("weather", base_url)
        .with_client(direct_client(base_url, Duration::from_secs(5)));
    weather.register_endpoint("query", "weather", Method::GET, mapping(&[("city", "q")]));
    weather
}

#[tokio::test]
async fn test_weather_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "London"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"temp": 15})))
        .expect(1)
        .mount(&server)
        .await;

    let (_router, registry, client) = setup();
    registry.register_connector(Arc::new(weather_connector(&server.uri())));

    let reply = client
        .query("weather", "query", to_map(json!({"city": "London"})))
        .await;

    assert_eq!(reply.message_type, MessageType::Response);
    assert_eq!(reply.payload.data, to_map(json!({"temp": 15})));
    assert_eq!(reply.payload.intent, "query");
    assert_eq!(reply.source, "api.weather");
    assert_eq!(reply.destination, "test-client");
    assert_eq!(reply.payload.metadata["api_name"], json!("weather"));
}

#[tokio::test]
async fn test_query_api_key_sent_as_parameter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/top-headlines"))
        .and(query_param("country", "us"))
        .and(query_param("apiKey", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"articles": []})))
        .expect(1)
        .mount(&server)
        .await;

    let mut news = create_rest_connector(
        "news",
        &server.uri(),
        AuthType::ApiKey,
        &to_map(json!({"key_name": "apiKey", "key_value": "secret", "key_location": "query"})),
    )
    .unwrap()
    .with_client(direct_client(&server.uri(), Duration::from_secs(5)));
    news.register_endpoint("query", "top-headlines", Method::GET, BTreeMap::new());

    let (_router, registry, client) = setup();
    registry.register_connector(Arc::new(news));

    let reply = client
        .query("news", "query", to_map(json!({"country": "us"})))
        .await;
    assert_eq!(reply.message_type, MessageType::Response);
    assert_eq!(reply.payload.data["articles"], json!([]));
}

#[tokio::test]
async fn test_post_body_and_bearer_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/items"))
        .and(header("Authorization", "Bearer tok"))
        .and(body_json(json!({"name": "lamp"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 7})))
        .expect(1)
        .mount(&server)
        .await;

    let mut shop = RestConnector::new("shop", &server.uri())
        .with_client(direct_client(&server.uri(), Duration::from_secs(5)));
    shop.register_endpoint("create", "/items", Method::POST, BTreeMap::new());
    shop.set_auth(Auth::Bearer {
        token: "tok".to_string(),
    });

    let (_router, registry, client) = setup();
    registry.register_connector(Arc::new(shop));

    let reply = client
        .query("shop", "create", to_map(json!({"name": "lamp"})))
        .await;
    assert_eq!(reply.payload.data["id"], json!(7));
}

#[tokio::test]
async fn test_non_2xx_is_api_request_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(ResponseTemplate::new(404).set_body_string("city not found"))
        .mount(&server)
        .await;

    let (_router, registry, client) = setup();
    registry.register_connector(Arc::new(weather_connector(&server.uri())));

    let reply = client
        .query("weather", "query", to_map(json!({"city": "Atlantis"})))
        .await;
    assert_eq!(reply.message_type, MessageType::Error);
    assert_eq!(reply.error_code(), Some("API_REQUEST_ERROR"));
    let details = reply.error_details().unwrap();
    assert_eq!(details["status_code"], json!(404));
    assert_eq!(details["response_text"], json!("city not found"));
    assert!(reply.correlation_id.is_some());
}

#[tokio::test]
async fn test_timeout_is_flagged() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"temp": 1}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let mut weather = RestConnector::new("weather", &server.uri())
        .with_client(direct_client(&server.uri(), Duration::from_millis(200)));
    weather.register_endpoint("query", "weather", Method::GET, BTreeMap::new());

    let (_router, registry, client) = setup();
    registry.register_connector(Arc::new(weather));

    let reply = client.query("weather", "query", JsonMap::new()).await;
    assert_eq!(reply.error_code(), Some("API_REQUEST_ERROR"));
    let details = reply.error_details().unwrap();
    assert_eq!(details["timeout"], json!(true));
    assert_eq!(details["status_code"], json!(null));
}

#[tokio::test]
async fn test_non_object_and_text_bodies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2, 3])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/plain"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let mut svc = RestConnector::new("svc", &server.uri())
        .with_client(direct_client(&server.uri(), Duration::from_secs(5)));
    svc.register_endpoint("list", "list", Method::GET, BTreeMap::new());
    svc.register_endpoint("plain", "plain", Method::GET, BTreeMap::new());

    let (_router, registry, client) = setup();
    registry.register_connector(Arc::new(svc));

    let list = client.query("svc", "list", JsonMap::new()).await;
    assert_eq!(list.payload.data["result"], json!([1, 2, 3]));

    let plain = client.query("svc", "plain", JsonMap::new()).await;
    assert_eq!(plain.payload.data["text"], json!("ok"));
}

#[tokio::test]
async fn test_graphql_mutation_dispatch() {
    let server = MockServer::start().await;
    let star = "mutation($id: ID!) { addStar(input: {starrableId: $id}) { clientMutationId } }";
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_json(json!({"query": star, "variables": {"id": "R_1"}})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"addStar": {"clientMutationId": "m1"}}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let base_url = format!("{}/graphql", server.uri());
    let mut github = GraphQlConnector::new("github", &base_url)
        .with_client(direct_client(&base_url, Duration::from_secs(5)));
    github.register_mutation("star", star, mapping(&[("repo_id", "id")]));

    let (_router, registry, client) = setup();
    registry.register_connector(Arc::new(github));

    let call = IntentCall {
        api_name: "github".to_string(),
        intent: "star".to_string(),
        parameters: to_map(json!({"repo_id": "R_1"})),
        confidence: Some(0.8),
    };
    let reply = client.dispatch(&call).await;
    assert_eq!(reply.message_type, MessageType::Response);
    assert_eq!(reply.payload.data["addStar"]["clientMutationId"], json!("m1"));
    assert_eq!(reply.payload.metadata["api_type"], json!("graphql"));
}

#[tokio::test]
async fn test_graphql_errors_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{"message": "Field 'nope' doesn't exist"}]
        })))
        .mount(&server)
        .await;

    let mut github = GraphQlConnector::new("github", &server.uri())
        .with_client(direct_client(&server.uri(), Duration::from_secs(5)));
    github.register_query("viewer", "{ nope }", BTreeMap::new());

    let (_router, registry, client) = setup();
    registry.register_connector(Arc::new(github));

    let reply = client.query("github", "viewer", JsonMap::new()).await;
    assert_eq!(reply.error_code(), Some("GRAPHQL_ERROR"));
    let errors = &reply.error_details().unwrap()["errors"];
    assert_eq!(errors[0]["message"], json!("Field 'nope' doesn't exist"));
}

#[tokio::test]
async fn test_graphql_non_json_is_processing_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let mut github = GraphQlConnector::new("github", &server.uri())
        .with_client(direct_client(&server.uri(), Duration::from_secs(5)));
    github.register_query("viewer", "{ viewer { login } }", BTreeMap::new());

    let (_router, registry, client) = setup();
    registry.register_connector(Arc::new(github));

    let reply = client.query("github", "viewer", JsonMap::new()).await;
    assert_eq!(reply.error_code(), Some("PROCESSING_ERROR"));
    assert_eq!(reply.error_details().unwrap()["error_kind"], json!("json"));
}

#[tokio::test]
async fn test_unknown_connector_and_dropped_request() {
    let (router, _registry, client) = setup();

    let missing = client.query("nowhere", "query", JsonMap::new()).await;
    assert_eq!(missing.error_code(), Some("ROUTE_NOT_FOUND"));

    router.register_middleware(Arc::new(|_env: switchyard_core::Envelope| Flow::Drop));
    let dropped = client.query("nowhere", "query", JsonMap::new()).await;
    assert_eq!(dropped.error_code(), Some("NO_RESPONSE"));
}

#[tokio::test]
async fn test_config_loaded_connector_dispatches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("q", "Oslo"))
        .and(query_param("appid", "demo_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"temp": -3})))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = Config::sample();
    for entry in &mut config.connectors {
        entry.base_url = server.uri();
        entry.proxy = Some(String::new());
    }

    let (_router, registry, client) = setup();
    assert_eq!(registry.load_from_config(&config).unwrap(), 2);

    let reply = client
        .query("weather", "query", to_map(json!({"city": "Oslo"})))
        .await;
    assert_eq!(reply.payload.data["temp"], json!(-3));
}

#[tokio::test]
async fn test_null_and_list_query_values() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hits": 0})))
        .expect(1)
        .mount(&server)
        .await;

    let mut svc = RestConnector::new("search", &server.uri())
        .with_client(direct_client(&server.uri(), Duration::from_secs(5)));
    svc.register_endpoint("find", "search", Method::GET, BTreeMap::new());

    let (_router, registry, client) = setup();
    registry.register_connector(Arc::new(svc));

    let reply = client
        .query(
            "search",
            "find",
            to_map(json!({"units": null, "ids": [1, 2], "flag": true})),
        )
        .await;
    assert_eq!(reply.message_type, MessageType::Response);

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].url.query(), Some("flag=true&ids=1&ids=2"));
}

#[tokio::test]
async fn test_query_api_key_kept_out_of_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/top"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let mut news = create_rest_connector(
        "news",
        &server.uri(),
        AuthType::ApiKey,
        &to_map(json!({"key_name": "apiKey", "key_value": "TOPSECRET", "key_location": "query"})),
    )
    .unwrap()
    .with_client(direct_client(&server.uri(), Duration::from_secs(5)));
    news.register_endpoint("query", "top", Method::GET, BTreeMap::new());

    let (_router, registry, client) = setup();
    registry.register_connector(Arc::new(news));

    let reply = client
        .query("news", "query", to_map(json!({"country": "us"})))
        .await;
    assert_eq!(reply.error_code(), Some("API_REQUEST_ERROR"));
    let message = reply.error_message().unwrap();
    assert!(message.contains("401"));
    assert!(message.contains("/top"));
    assert!(!message.contains("TOPSECRET"));
    assert!(!message.contains("country"));
}

#[tokio::test]
async fn test_unreachable_host_message_has_no_query() {
    // Port 9 on localhost is normally closed; the connect fails fast.
    let base_url = "http://127.0.0.1:9";
    let mut news = create_rest_connector(
        "news",
        base_url,
        AuthType::ApiKey,
        &to_map(json!({"key_name": "apiKey", "key_value": "TOPSECRET", "key_location": "query"})),
    )
    .unwrap()
    .with_client(direct_client(base_url, Duration::from_secs(5)));
    news.register_endpoint("query", "top", Method::GET, BTreeMap::new());

    let (_router, registry, client) = setup();
    registry.register_connector(Arc::new(news));

    let reply = client.query("news", "query", JsonMap::new()).await;
    assert_eq!(reply.error_code(), Some("API_REQUEST_ERROR"));
    assert!(!reply.error_message().unwrap().contains("TOPSECRET"));
}

async fn assert_auth_on_wire(
    auth_type: AuthType,
    params: serde_json::Value,
    name: &str,
    value: &str,
) {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header(name, value))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let mut svc = create_rest_connector("profile", &server.uri(), auth_type, &to_map(params))
        .unwrap()
        .with_client(direct_client(&server.uri(), Duration::from_secs(5)));
    svc.register_endpoint("me", "me", Method::GET, BTreeMap::new());

    let (_router, registry, client) = setup();
    registry.register_connector(Arc::new(svc));

    let reply = client.query("profile", "me", JsonMap::new()).await;
    assert_eq!(reply.message_type, MessageType::Response, "{:?}", reply.payload.data);
    assert_eq!(reply.payload.data["ok"], json!(true));
}

#[tokio::test]
async fn test_basic_auth_on_wire() {
    // base64("alice:s3cret")
    assert_auth_on_wire(
        AuthType::Basic,
        json!({"username": "alice", "password": "s3cret"}),
        "Authorization",
        "Basic YWxpY2U6czNjcmV0",
    )
    .await;
}

#[tokio::test]
async fn test_header_api_key_on_wire() {
    assert_auth_on_wire(
        AuthType::ApiKey,
        json!({"key_name": "X-Api-Key", "key_value": "k-123"}),
        "X-Api-Key",
        "k-123",
    )
    .await;
}

#[tokio::test]
async fn test_oauth_token_type_on_wire() {
    assert_auth_on_wire(
        AuthType::Oauth,
        json!({"access_token": "abc", "token_type": "MAC"}),
        "Authorization",
        "MAC abc",
    )
    .await;
}

#[tokio::test]
async fn test_custom_headers_on_wire() {
    assert_auth_on_wire(
        AuthType::Custom,
        json!({"headers": {"X-Tenant": "acme", "X-Version": 2}}),
        "X-Tenant",
        "acme",
    )
    .await;
    assert_auth_on_wire(
        AuthType::Custom,
        json!({"headers": {"X-Tenant": "acme", "X-Version": 2}}),
        "X-Version",
        "2",
    )
    .await;
}
