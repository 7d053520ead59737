use tokio::time::{sleep, Duration};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::state::AppState;
use crate::utils::cron::build_cron_expr;

mod refresh_sessions;

pub async fn start_cron_jobs(state: AppState) -> JobScheduler {
    let scheduler = JobScheduler::new().await.unwrap();

    /*
     * ------------------------------------------------------------
     * Initial delayed run after server restart
     * ------------------------------------------------------------
     */
    {
        let state = state.clone();
        tokio::spawn(async move {
            tracing::info!("🚀 Server restarted, waiting 5 seconds before first session refresh...");
            sleep(Duration::from_secs(5)).await;

            tracing::info!("📦 Running initial session refresh...");
            refresh_sessions::run(state).await;
        });
    }

    /*
     * ------------------------------------------------------------
     * refresh_sessions cron
     * ------------------------------------------------------------
     */

    let (desc, cron_expr) = build_cron_expr(state.config.cron.refresh_sessions.seconds);

    tracing::info!("📅 Scheduling session refresh cron: {} → {}", desc, cron_expr);

    scheduler
        .add(
            Job::new_async(&cron_expr, {
                let state = state.clone();
                move |_uuid, _l| {
                    let state = state.clone();
                    Box::pin(async move {
                        refresh_sessions::run(state).await;
                    })
                }
            })
            .unwrap(),
        )
        .await
        .unwrap();

    /*
     * ------------------------------------------------------------
     * Start scheduler
     * ------------------------------------------------------------
     */

    scheduler.start().await.unwrap();
    scheduler
}
