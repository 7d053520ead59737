use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

/// Inbound marketplace webhook. Only `eventType` is guaranteed; the
/// `data` block varies per event and is passed through untouched.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceWebhook {
    pub event_type: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl MarketplaceWebhook {
    /// Trip the event concerns, wherever the payload put it.
    pub fn trip_id(&self) -> Option<&str> {
        self.data
            .get("tripId")
            .or_else(|| self.data.get("trip_id"))
            .or_else(|| self.data.pointer("/trip/id"))
            .and_then(Value::as_str)
    }
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}
