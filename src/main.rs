//! mkswitch — keyboard switch catalog with a typed keyword vocabulary.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use mkswitch::db::CatalogDB;
use mkswitch::snowflake::IdWorker;
use mkswitch::{api, AppState};

#[derive(Parser)]
#[command(name = "mkswitch", version, about = "Keyboard switch catalog service")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3918", env = "MKS_PORT")]
    port: u16,

    /// SQLite database path
    #[arg(short, long, default_value = "mkswitch.db", env = "MKS_DB")]
    db: String,

    /// Snowflake worker id (0-31)
    #[arg(long, default_value = "0", env = "MKS_WORKER_ID")]
    worker_id: u64,

    /// Snowflake datacenter id (0-31)
    #[arg(long, default_value = "0", env = "MKS_DATACENTER_ID")]
    datacenter_id: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    if let Err(e) = run(args).await {
        error!(error = %e, "fatal");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let ids = IdWorker::new(args.worker_id, args.datacenter_id)?;
    let db = CatalogDB::open(&args.db)?.with_id_worker(ids);

    let api_key = std::env::var("MKS_API_KEY").ok().filter(|k| !k.is_empty());
    let auth_status = if api_key.is_some() { "enabled" } else { "disabled" };

    let app = api::router(AppState::new(db, api_key));

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = args.port,
        db = %args.db,
        worker_id = args.worker_id,
        datacenter_id = args.datacenter_id,
        auth = auth_status,
        "mkswitch starting"
    );

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutting down");
}
