use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use hearth_recurrence::{RecurrenceSpawner, SpawnOutcome};
use hearth_scheduler::{Schedule, SchedulerEngine};
use tracing::info;

mod app;
mod http;

/// Household task board — HTTP API plus background recurrence spawning.
#[derive(Parser)]
#[command(name = "hearth-gateway", version)]
struct Cli {
    /// Path to hearth.toml (default: ~/.hearth/hearth.toml).
    #[arg(long)]
    config: Option<String>,
    /// Override the SQLite database path from config.
    #[arg(long)]
    db: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hearth=info,hearth_gateway=info,tower_http=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config =
        hearth_core::config::HearthConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
            tracing::warn!("Config load failed ({}), using defaults", e);
            hearth_core::config::HearthConfig::default()
        });
    if let Some(db) = cli.db {
        config.database.path = db;
    }

    let db_path = config.database.path.clone();
    ensure_parent_dir(&db_path);
    info!(path = %db_path, "opening SQLite database");

    // run all schema migrations (idempotent)
    let db = open_conn(&db_path)?;
    hearth_store::db::init_db(&db)?;
    info!("database migrations complete");
    drop(db);

    // build subsystems — each gets its own connection for thread safety
    let tasks = hearth_store::TaskStore::new(open_conn(&db_path)?);
    let shopping = hearth_store::ShoppingStore::new(open_conn(&db_path)?);
    let users = hearth_store::UserStore::new(open_conn(&db_path)?);
    let spawner = Arc::new(RecurrenceSpawner::new(open_conn(&db_path)?)?);

    // scheduler: the spawn job owns its spawner handle; eager=true performs
    // the startup catch-up run for the current week (downtime recovery).
    let mut engine = SchedulerEngine::new();
    let job_spawner = Arc::clone(&spawner);
    engine.add_job(
        "recurrence_spawn",
        Schedule::Daily {
            hour: config.scheduler.spawn_hour,
            minute: config.scheduler.spawn_minute,
        },
        true,
        move || {
            match job_spawner.spawn_due_instances()? {
                SpawnOutcome::Spawned { monday, created } => {
                    info!(%monday, created, "recurrence spawn run finished");
                }
                // Claim conflicts and pre-migration windows already logged
                // at info by the spawner itself.
                SpawnOutcome::AlreadyClaimed { .. } | SpawnOutcome::SchemaNotReady => {}
            }
            Ok(())
        },
    );

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move { engine.run(shutdown_rx).await });

    let bind = config.server.bind.clone();
    let port = config.server.port;
    let state = Arc::new(app::AppState::new(config, tasks, shopping, users));
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("Hearth gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    // signal scheduler to stop
    let _ = shutdown_tx.send(true);
    Ok(())
}

/// Open a connection with the pragmas every subsystem needs. WAL keeps
/// concurrent worker processes from blocking each other on reads;
/// foreign_keys is per-connection in SQLite, so it is set here and not
/// only once at migration time.
fn open_conn(path: &str) -> anyhow::Result<rusqlite::Connection> {
    let conn = rusqlite::Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }
}
