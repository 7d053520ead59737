use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use tracing::{debug, error, info, warn};

use crate::events::publisher::publish_event;
use crate::models::events::{AppEvent, EventType};
use crate::models::webhook::{MarketplaceWebhook, WebhookAck};
use crate::state::AppState;
use crate::utils::signature::verify_signature;
use crate::workers::redis_event_worker::STREAM_NAME;

pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .route("/webhooks/avinode", post(webhook_handler))
        .with_state(app_state)
}

/// Acks fast and enqueues; the event worker does the re-resolution.
async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(secret) = &state.config.webhook.secret {
        let header = headers
            .get("x-avinode-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !verify_signature(secret, &body, header) {
            warn!(target: "webhook", "⚠️ Rejected webhook with bad signature");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "invalid signature"})),
            )
                .into_response();
        }
    }

    let payload: MarketplaceWebhook = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": format!("malformed payload: {}", e)})),
            )
                .into_response();
        }
    };

    info!(
        target: "webhook",
        "🟢 Received {} for trip {:?}",
        payload.event_type,
        payload.trip_id()
    );
    debug!(target: "webhook", "🔎 Webhook data: {:?}", payload.data);

    let event_type = match payload.event_type.as_str() {
        "TripRequestSellerResponse" | "TripRequestSellerQuote" => EventType::QuoteReceived,
        _ => EventType::TripUpdated,
    };

    match payload.trip_id() {
        Some(trip_id) => {
            let event = AppEvent::new(
                event_type,
                json!({"tripId": trip_id, "data": payload.data}),
            );
            match state.redis_pool.get().await {
                Ok(mut conn) => {
                    if let Err(e) = publish_event(&mut conn, STREAM_NAME, &event).await {
                        error!(target: "webhook", "❌ Failed to enqueue trip event: {:?}", e);
                    } else {
                        info!(target: "webhook", "✅ Enqueued refresh for trip {}", trip_id);
                    }
                }
                Err(e) => {
                    error!(target: "webhook", "❌ Redis pool unavailable: {:?}", e);
                }
            }
        }
        None => {
            warn!(target: "webhook", "⚠️ No tripId in webhook payload, nothing to refresh");
        }
    }

    // The marketplace retries on non-2xx; enqueue failures are logged,
    // not bounced back.
    Json(WebhookAck { received: true }).into_response()
}
