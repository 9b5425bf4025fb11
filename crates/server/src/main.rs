// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::multiple_crate_versions)]

mod live;
mod routes;
mod session;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use clap::Parser;
use muster_api::{ApiError, BulkApprovalConfig, bootstrap_supervisor};
use muster_domain::SchedulingPolicy;
use muster_persistence::Persistence;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::live::{ChangeHub, LiveConfig, connect_with_hub};
use crate::routes::build_router;

/// Muster Server - HTTP server for operation admission and queues
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the `SQLite` database file. If not provided, uses in-memory database.
    #[arg(short, long)]
    database: Option<String>,

    /// Port to bind the server to
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    /// JSON file overriding the scheduling policy defaults
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Seeds a supervisor with this name when the roster is empty
    #[arg(long)]
    bootstrap_supervisor: Option<String>,
}

/// Application state shared across handlers.
///
/// The persistence adapter is wrapped in a Mutex: every unit of work holds
/// it for one read-then-write cycle.
#[derive(Clone)]
pub struct AppState {
    /// The persistence layer, publishing into `hub`.
    pub persistence: Arc<Mutex<Persistence>>,
    /// Quota and lead-time rules.
    pub policy: Arc<SchedulingPolicy>,
    /// Concurrency settings for bulk approval.
    pub bulk: BulkApprovalConfig,
    /// Live stream tuning.
    pub live: LiveConfig,
    /// Fan-out point for committed changes.
    pub hub: Arc<ChangeHub>,
}

impl AppState {
    /// Wires persistence, policy and the change hub together.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn build(
        database: Option<&str>,
        policy: SchedulingPolicy,
        live: LiveConfig,
    ) -> Result<Self, muster_persistence::PersistenceError> {
        let (persistence, hub) = connect_with_hub(database, live.buffer)?;
        Ok(Self {
            persistence: Arc::new(Mutex::new(persistence)),
            policy: Arc::new(policy),
            bulk: BulkApprovalConfig::default(),
            live,
            hub,
        })
    }
}

/// Loads the scheduling policy, falling back to defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read, is not valid JSON, or holds
/// an out-of-range value.
fn load_policy(path: Option<&Path>) -> Result<SchedulingPolicy, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        info!("Using default scheduling policy");
        return Ok(SchedulingPolicy::default());
    };

    info!(path = %path.display(), "Loading scheduling policy");
    let raw: String = std::fs::read_to_string(path)?;
    let policy: SchedulingPolicy = serde_json::from_str(&raw)?;
    policy.validate()?;
    Ok(policy)
}

async fn seed_supervisor(app_state: &AppState, name: &str) -> Result<(), ApiError> {
    let mut persistence = app_state.persistence.lock().await;
    match bootstrap_supervisor(&mut persistence, name, OffsetDateTime::now_utc()) {
        Ok(member) => {
            info!(member_id = member.member_id, name = %member.name, "Seeded supervisor");
            Ok(())
        }
        Err(ApiError::DomainRuleViolation { message, .. }) => {
            warn!(%message, "Skipping supervisor seed");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments
    let args: Args = Args::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Initializing Muster Server");

    let policy: SchedulingPolicy = load_policy(args.policy.as_deref())?;
    let app_state: AppState =
        AppState::build(args.database.as_deref(), policy, LiveConfig::default())?;

    if let Some(name) = &args.bootstrap_supervisor {
        seed_supervisor(&app_state, name).await?;
    }

    // Build router
    let app: Router = build_router(app_state);

    // Bind to address
    let addr: std::net::SocketAddr = format!("127.0.0.1:{}", args.port).parse()?;
    info!("Server listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
