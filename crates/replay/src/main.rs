//! `frameproof-replay` -- replays a scripted review session.
//!
//! Reads a JSON script of reviewer inputs (playback, pointer, tool, note,
//! save, and submit steps), runs it through the review session against
//! Postgres or an in-memory store, and prints the final review as JSON on
//! stdout. Used to reproduce annotation bugs and to smoke-test a database.
//!
//! See [`frameproof_replay::config::ReplayConfig::from_env`] for the
//! environment variables.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use frameproof_core::store::InMemoryReviewStore;
use frameproof_db::PgReviewStore;
use frameproof_events::{ApprovalRelay, EventBus};
use frameproof_replay::approvals::RecordedApprovals;
use frameproof_replay::config::ReplayConfig;
use frameproof_replay::runner::{self, ReplayReport};
use frameproof_replay::{ReplayError, ReplayScript};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "frameproof_replay=info,frameproof_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ReplayConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "Invalid replay configuration");
        std::process::exit(1);
    });

    match run(config).await {
        Ok(report) => match serde_json::to_string_pretty(&report.review) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize review");
                std::process::exit(1);
            }
        },
        Err(e) => {
            tracing::error!(error = %e, "Replay failed");
            std::process::exit(1);
        }
    }
}

async fn run(config: ReplayConfig) -> Result<ReplayReport, ReplayError> {
    let script = ReplayScript::load(&config.script_path).await?;
    let backend = if config.database_url.is_some() {
        "postgres"
    } else {
        "memory"
    };
    tracing::info!(
        script = %config.script_path.display(),
        review_id = %script.review.id,
        steps = script.steps.len(),
        backend,
        "Starting replay",
    );

    let bus = Arc::new(EventBus::default());
    let approvals = RecordedApprovals::new();
    let relay = tokio::spawn(ApprovalRelay::run(approvals.clone(), bus.subscribe()));

    let report = execute(&config, &script, Arc::clone(&bus)).await;

    // The relay stops once every bus handle is gone.
    drop(bus);
    match relay.await {
        Ok(forwarded) => tracing::info!(forwarded, "Approval relay drained"),
        Err(e) => tracing::warn!(error = %e, "Approval relay task failed"),
    }
    for approval in approvals.entries() {
        tracing::info!(
            deliverable_id = %approval.deliverable_id,
            review_id = %approval.review_id,
            status = %approval.status,
            "Deliverable decision relayed"
        );
    }

    report
}

async fn execute(
    config: &ReplayConfig,
    script: &ReplayScript,
    bus: Arc<EventBus>,
) -> Result<ReplayReport, ReplayError> {
    let review_config = config.review.clone();
    match &config.database_url {
        Some(url) => {
            let pool = frameproof_db::create_pool(url).await?;
            frameproof_db::health_check(&pool).await?;
            frameproof_db::run_migrations(&pool).await?;
            runner::seed_postgres(&pool, &script.review).await?;
            runner::replay(script, PgReviewStore::new(pool), bus, review_config).await
        }
        None => {
            let store = InMemoryReviewStore::new();
            runner::seed_in_memory(&store, &script.review);
            runner::replay(script, store, bus, review_config).await
        }
    }
}
