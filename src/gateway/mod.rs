//! Low-level client for the Avinode marketplace API.
//!
//! No business logic lives here: the gateway authenticates, stamps the
//! per-call headers the upstream contract requires, retries transient
//! failures, and unwraps the optional `data` envelope. It never caches;
//! callers that need a payload twice within one resolution pass hold on
//! to it themselves.

pub mod ids;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tokio::time::{sleep, Duration};
use tracing::warn;

use crate::config::AvinodeConfig;
use crate::error::GatewayError;

#[async_trait]
pub trait MarketplaceApi: Send + Sync {
    async fn get_trip(&self, id: &str) -> Result<Value, GatewayError>;
    async fn get_rfq(&self, id: &str) -> Result<Value, GatewayError>;
    async fn get_quote(&self, id: &str) -> Result<Value, GatewayError>;
}

pub struct AvinodeGateway {
    http: Client,
    cfg: AvinodeConfig,
}

impl AvinodeGateway {
    /// Credentials are threaded in explicitly; nothing is read from the
    /// process environment here.
    pub fn new(cfg: AvinodeConfig) -> Self {
        Self {
            http: Client::new(),
            cfg,
        }
    }

    async fn fetch(&self, resource: &'static str, path: &str, id: &str) -> Result<Value, GatewayError> {
        let url = format!("{}{}", self.cfg.base_url.trim_end_matches('/'), path);

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;

            // Fresh timestamp on every attempt, per the upstream contract.
            let request = self
                .http
                .get(&url)
                .header("Content-Type", "application/json")
                .header("X-Avinode-ApiToken", self.cfg.api_token.as_str())
                .header("Authorization", format!("Bearer {}", self.cfg.auth_token))
                .header(
                    "X-Avinode-SentTimestamp",
                    Utc::now().format("%Y-%m-%dT%H:%M:%S.000Z").to_string(),
                )
                .header("X-Avinode-ApiVersion", self.cfg.api_version.as_str())
                .header("X-Avinode-Product", self.cfg.product.as_str())
                .header("X-Avinode-ActAsAccount", self.cfg.act_as_account.as_str());

            let reason = match request.send().await {
                Ok(res) => {
                    let status = res.status();
                    if status.is_success() {
                        let body: Value = res.json().await.map_err(|e| GatewayError::Unavailable {
                            reason: format!("invalid JSON body: {}", e),
                        })?;
                        return Ok(unwrap_envelope(body));
                    }
                    match status {
                        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                            return Err(GatewayError::Auth {
                                status: status.as_u16(),
                            });
                        }
                        StatusCode::NOT_FOUND => {
                            return Err(GatewayError::NotFound {
                                resource,
                                id: id.to_string(),
                            });
                        }
                        s if s.is_server_error() => format!("HTTP {}", s),
                        s => {
                            return Err(GatewayError::Unavailable {
                                reason: format!("unexpected HTTP {}", s),
                            });
                        }
                    }
                }
                Err(e) => e.to_string(),
            };

            if attempt >= self.cfg.retry_attempts {
                return Err(GatewayError::Unavailable {
                    reason: format!("{} {} failed after {} attempts: {}", resource, id, attempt, reason),
                });
            }

            warn!(
                target: "gateway",
                "⚠️ transient failure fetching {} {} (attempt {}): {}",
                resource, id, attempt, reason
            );
            sleep(Duration::from_millis(self.cfg.retry_backoff_ms * attempt as u64)).await;
        }
    }
}

#[async_trait]
impl MarketplaceApi for AvinodeGateway {
    async fn get_trip(&self, id: &str) -> Result<Value, GatewayError> {
        self.fetch("trip", &format!("/trips/{}", id), id).await
    }

    async fn get_rfq(&self, id: &str) -> Result<Value, GatewayError> {
        self.fetch("rfq", &format!("/rfqs/{}", id), id).await
    }

    async fn get_quote(&self, id: &str) -> Result<Value, GatewayError> {
        self.fetch(
            "quote",
            &format!("/quotes/{}?quotebreakdown=true&taildetails=true", id),
            id,
        )
        .await
    }
}

/// Some endpoints wrap the resource in `{"data": {...}}`, some return it
/// bare. Normalize to the inner object.
fn unwrap_envelope(mut body: Value) -> Value {
    match body.get_mut("data") {
        Some(data) if data.is_object() => data.take(),
        _ => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unwraps_data_envelope() {
        let wrapped = json!({"data": {"id": "atrip-1"}});
        assert_eq!(unwrap_envelope(wrapped), json!({"id": "atrip-1"}));
    }

    #[test]
    fn leaves_bare_payloads_alone() {
        let bare = json!({"id": "atrip-1", "data": "not-an-object"});
        assert_eq!(unwrap_envelope(bare.clone()), bare);
    }
}
