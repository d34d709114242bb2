//! # Main: CLI Entry Point
//!
//! Parses the command line, initializes logging and dispatches to the server
//! or to a one-shot connectivity check.
//!
//! ## Subcommands
//!
//! - `serve`: start the HTTP API (`POST /api/workouts/complete` plus probes).
//! - `check`: connect to PostgreSQL, run the store health check and exit.
//!
//! ## Global Options
//!
//! - `--database-url` / `DATABASE_URL`: PostgreSQL connection (service role).
//! - `--jwt-secret` / `SUPABASE_JWT_SECRET`: HS256 secret for caller tokens.
//!   When unset, signatures are not verified (local development only).
//! - `--max-connections` / `DB_MAX_CONNECTIONS`: pool size (default 5).

use anyhow::Result;
use clap::{Parser, Subcommand};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use coachhub::api::{self, ServerConfig};
use coachhub::auth::AuthConfig;
use coachhub::completion::Dispatch;
use coachhub::db;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "coachhub",
    about = "Finalize workouts and advance client training programs"
)]
struct Cli {
    /// PostgreSQL connection URL (or set DATABASE_URL env var)
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Supabase JWT secret used to verify caller tokens
    #[arg(long, env = "SUPABASE_JWT_SECRET", global = true, hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Maximum number of pooled database connections
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5, global = true)]
    max_connections: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server
    Serve {
        /// Port to listen on
        #[arg(long, env = "PORT", default_value_t = 7001)]
        port: u16,
        /// Run goal sync and achievement checks after responding instead of before
        #[arg(long, env = "BACKGROUND_SIDE_EFFECTS")]
        background_side_effects: bool,
    },
    /// Verify database connectivity and exit
    Check,
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    // LOG_FORMAT=json for K8s, human-readable otherwise
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();
    let database_url = cli.database_url.as_deref().ok_or_else(|| {
        anyhow::anyhow!("DATABASE_URL is required (set via --database-url or env)")
    })?;

    match &cli.command {
        Commands::Serve {
            port,
            background_side_effects,
        } => {
            let config = ServerConfig {
                port: *port,
                max_connections: cli.max_connections,
                auth: AuthConfig::new(cli.jwt_secret.clone()),
                side_effects: if *background_side_effects {
                    Dispatch::Background
                } else {
                    Dispatch::Inline
                },
            };
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(api::run(database_url, config))
        }
        Commands::Check => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(async {
                let database = db::Database::connect(database_url, cli.max_connections).await?;
                database.ping().await?;
                tracing::info!("database reachable");
                println!("ok");
                Ok::<(), anyhow::Error>(())
            })
        }
    }
}
