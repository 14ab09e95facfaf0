use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use switchyard_core::{to_map, Envelope, ErrorCode, JsonMap};
use switchyard_router::Router;
use tracing::debug;

use crate::registry::destination_for;

/// An intent resolved by the natural-language layer, ready to dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentCall {
    pub api_name: String,
    pub intent: String,
    #[serde(default)]
    pub parameters: JsonMap,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Builds request envelopes and routes them, so callers never assemble payloads by hand.
pub struct ApiClient {
    source_id: String,
    router: Arc<Router>,
}

impl ApiClient {
    pub fn new(router: Arc<Router>) -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self::with_source(router, &format!("client.{}", &suffix[..8]))
    }

    pub fn with_source(router: Arc<Router>, source_id: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
            router,
        }
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Route a request to `api.<api_name>` and return the reply. When nothing
    /// comes back the caller gets a `NO_RESPONSE` error envelope.
    pub async fn call_api(
        &self,
        api_name: &str,
        intent: &str,
        parameters: JsonMap,
        data: JsonMap,
        metadata: JsonMap,
    ) -> Envelope {
        let request = Envelope::create_request(
            &self.source_id,
            &destination_for(api_name),
            intent,
            parameters,
            data,
            metadata,
            None,
        );
        debug!(
            source = %self.source_id,
            api = api_name,
            intent,
            message_id = %request.message_id,
            "Calling API"
        );

        match self.router.route(request.clone()).await {
            Some(reply) => reply,
            None => Envelope::create_error(
                &request,
                ErrorCode::NoResponse,
                format!("No response received from API '{}'", api_name),
                to_map(json!({ "api_name": api_name, "intent": intent })),
            ),
        }
    }

    pub async fn query(&self, api_name: &str, intent: &str, parameters: JsonMap) -> Envelope {
        self.call_api(api_name, intent, parameters, JsonMap::new(), JsonMap::new())
            .await
    }

    /// Dispatch an extracted intent; its confidence travels in the request metadata.
    pub async fn dispatch(&self, call: &IntentCall) -> Envelope {
        let mut metadata = JsonMap::new();
        if let Some(confidence) = call.confidence {
            metadata.insert("confidence".to_string(), json!(confidence));
        }
        self.call_api(
            &call.api_name,
            &call.intent,
            call.parameters.clone(),
            JsonMap::new(),
            metadata,
        )
        .await
    }
}
