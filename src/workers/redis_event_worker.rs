//! Consumer-group worker draining the trip event stream.
//!
//! Webhook handlers ack fast and enqueue; this worker does the actual
//! re-resolution, so a slow upstream never blocks the webhook response.

use deadpool_redis::Connection;
use redis::{cmd, streams::StreamReadReply, RedisError, RedisResult};
use tokio::time::{sleep, Duration};
use tracing::{error, info};

use crate::events::handler::handle_event;
use crate::models::events::AppEvent;
use crate::state::AppState;

pub const STREAM_NAME: &str = "trip_events";
const GROUP_NAME: &str = "trip_engine";
const CONSUMER_NAME: &str = "resolver_1";

pub async fn start(state: AppState) {
    info!("Starting trip event worker...");

    loop {
        if let Err(e) = run_worker(state.clone()).await {
            error!("Trip event worker crashed: {:?}", e);
            sleep(Duration::from_secs(3)).await;
        }
    }
}

async fn run_worker(state: AppState) -> RedisResult<()> {
    let mut conn = get_conn(&state).await?;
    ensure_consumer_group(&mut conn, STREAM_NAME, GROUP_NAME).await?;

    info!("Trip event worker listening on stream '{}'", STREAM_NAME);

    loop {
        process_stream(&state).await?;
    }
}

async fn process_stream(state: &AppState) -> RedisResult<()> {
    let mut conn = get_conn(state).await?;

    let reply: StreamReadReply = cmd("XREADGROUP")
        .arg("GROUP")
        .arg(GROUP_NAME)
        .arg(CONSUMER_NAME)
        .arg("COUNT")
        .arg(10)
        .arg("BLOCK")
        .arg(5000)
        .arg("STREAMS")
        .arg(STREAM_NAME)
        .arg(">")
        .query_async(&mut conn)
        .await?;

    for stream in reply.keys {
        for message in stream.ids {
            if let Some(event) = parse_event(&message.map) {
                if let Err(e) = handle_event(state, event).await {
                    error!("Failed to handle trip event: {:?}", e);
                } else {
                    ack_message(&mut conn, &message.id).await?;
                }
            }
        }
    }

    Ok(())
}

async fn ensure_consumer_group(
    conn: &mut Connection,
    stream: &str,
    group: &str,
) -> RedisResult<()> {
    let result: RedisResult<()> = cmd("XGROUP")
        .arg("CREATE")
        .arg(stream)
        .arg(group)
        .arg("$")
        .arg("MKSTREAM")
        .query_async(conn)
        .await;

    match result {
        Ok(_) => {
            info!("Consumer group '{}' created on stream '{}'", group, stream);
            Ok(())
        }
        Err(e) if is_busy_group_error(&e) => {
            info!("Consumer group '{}' already exists", group);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn is_busy_group_error(err: &RedisError) -> bool {
    err.to_string().contains("BUSYGROUP")
}

async fn get_conn(state: &AppState) -> RedisResult<Connection> {
    state.redis_pool.get().await.map_err(|e| {
        RedisError::from((
            redis::ErrorKind::IoError,
            "deadpool get failed",
            e.to_string(),
        ))
    })
}

fn parse_event(map: &std::collections::HashMap<String, redis::Value>) -> Option<AppEvent> {
    let value = map.get("event")?;
    let json_str: String = redis::from_redis_value(value).ok()?;
    serde_json::from_str(&json_str).ok()
}

async fn ack_message(conn: &mut Connection, message_id: &str) -> RedisResult<()> {
    cmd("XACK")
        .arg(STREAM_NAME)
        .arg(GROUP_NAME)
        .arg(message_id)
        .query_async::<()>(conn)
        .await
}
