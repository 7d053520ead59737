use anyhow::{anyhow, Result};
use tracing::error;

use crate::models::events::AppEvent;

pub fn extract_trip_id(event: &AppEvent) -> Result<String> {
    match event.payload.get("tripId").and_then(|v| v.as_str()) {
        Some(trip_id) if !trip_id.is_empty() => Ok(trip_id.to_string()),
        _ => {
            error!(
                event_id = %event.id,
                "❌ Missing or invalid tripId in event payload"
            );
            Err(anyhow!("Missing or invalid tripId in event payload"))
        }
    }
}
