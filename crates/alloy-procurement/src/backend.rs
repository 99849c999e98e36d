//! Where purchase requests go.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use alloy_core::config::ProcurementConfig;

use crate::error::ProcurementError;
use crate::request::PurchaseRequest;

/// Submits a purchase request and returns the assistant's raw reply.
#[async_trait]
pub trait ProcurementBackend: Send + Sync {
    async fn submit(&self, request: &PurchaseRequest) -> Result<Value, ProcurementError>;
}

/// Pick the backend for a configuration: HTTP when an endpoint is set,
/// otherwise log-only.
pub fn backend_from_config(
    config: &ProcurementConfig,
) -> Result<Box<dyn ProcurementBackend>, ProcurementError> {
    match &config.endpoint {
        Some(endpoint) => Ok(Box::new(HttpProcurementBackend::new(endpoint, config)?)),
        None => Ok(Box::new(LoggingBackend)),
    }
}

// =============================================================================
// HTTP
// =============================================================================

#[derive(Debug, Serialize)]
struct ConversationBody<'a> {
    message: Message<'a>,
    blocking: bool,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    content: String,
    mentions: Vec<Mention<'a>>,
    context: MessageContext<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Mention<'a> {
    configuration_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageContext<'a> {
    username: &'a str,
    timezone: &'a str,
    profile_picture_url: Option<&'a str>,
}

/// Posts the request to a conversational purchasing assistant.
#[derive(Debug)]
pub struct HttpProcurementBackend {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    agent_id: String,
    username: String,
    timezone: String,
}

impl HttpProcurementBackend {
    pub fn new(endpoint: &str, config: &ProcurementConfig) -> Result<Self, ProcurementError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key: config.api_key.clone(),
            agent_id: config.agent_id.clone(),
            username: config.username.clone(),
            timezone: config.timezone.clone(),
        })
    }

    fn body(&self, request: &PurchaseRequest) -> ConversationBody<'_> {
        ConversationBody {
            message: Message {
                content: request.prompt(),
                mentions: vec![Mention {
                    configuration_id: &self.agent_id,
                }],
                context: MessageContext {
                    username: &self.username,
                    timezone: &self.timezone,
                    profile_picture_url: None,
                },
            },
            blocking: true,
        }
    }
}

#[async_trait]
impl ProcurementBackend for HttpProcurementBackend {
    async fn submit(&self, request: &PurchaseRequest) -> Result<Value, ProcurementError> {
        tracing::debug!(endpoint = %self.endpoint, order_id = %request.order_id, "Posting purchase request");

        let mut http = self.client.post(&self.endpoint).json(&self.body(request));
        if let Some(api_key) = self.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            http = http.bearer_auth(api_key);
        }

        let response = http.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(ProcurementError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ProcurementError::InvalidResponse(e.to_string()))
    }
}

// =============================================================================
// Log-only
// =============================================================================

/// Logs the prompt instead of sending it. Used when no endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingBackend;

#[async_trait]
impl ProcurementBackend for LoggingBackend {
    async fn submit(&self, request: &PurchaseRequest) -> Result<Value, ProcurementError> {
        tracing::info!(
            order_id = %request.order_id,
            sku = %request.sku,
            quantity = request.quantity,
            "No procurement endpoint configured; purchase request logged only"
        );
        tracing::debug!(prompt = %request.prompt());
        Ok(serde_json::json!({ "logged": true, "sku": request.sku }))
    }
}
