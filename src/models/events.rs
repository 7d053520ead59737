use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppEvent {
    pub id: Uuid,
    pub event_type: EventType,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

impl AppEvent {
    pub fn new(event_type: EventType, payload: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            payload,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventType {
    /// An operator answered an RFQ; the trip should be re-resolved.
    #[serde(rename = "trip.quote_received")]
    QuoteReceived,
    /// Any other marketplace change worth a refresh.
    #[serde(rename = "trip.updated")]
    TripUpdated,
}
