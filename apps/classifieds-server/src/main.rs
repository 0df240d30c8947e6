use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use db::{ConnectOpts, DbHandle};
use runtime::{AppConfig, CliArgs};
use sea_orm_migration::MigratorTrait;

use classifieds::{
    config::ClassifiedsConfig,
    domain::service::Service,
    infra::storage::{
        migrations::Migrator,
        sea_orm_repo::{SeaOrmAdsRepository, SeaOrmUsersRepository},
    },
};

mod dsn;
mod ingress;
mod shutdown;

const MODULE_NAME: &str = "classifieds";

/// Classifieds Server - users and classified ads over HTTP
#[derive(Parser)]
#[command(name = "classifieds-server")]
#[command(about = "Classifieds Server - users and classified ads over HTTP")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory SQLite database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    if args.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Classifieds Server starting");

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config, args),
    }
}

fn connect_opts(config: &AppConfig) -> ConnectOpts {
    let db_config = config.database.as_ref();
    ConnectOpts {
        max_conns: db_config.and_then(|d| d.max_conns).or(Some(10)),
        acquire_timeout: Some(Duration::from_secs(5)),
        sqlite_busy_timeout: db_config
            .and_then(|d| d.busy_timeout_ms)
            .map(|ms| Duration::from_millis(u64::from(ms))),
        create_sqlite_dirs: true,
        ..Default::default()
    }
}

fn effective_dsn(config: &AppConfig, args: &CliArgs) -> Result<String> {
    let configured = match (&config.database, args.mock) {
        (_, true) => "",
        (Some(db), false) => db.url.as_str(),
        (None, false) => return Err(anyhow!("Database configuration is required")),
    };
    dsn::resolve_dsn(configured, args.mock, Path::new(&config.server.home_dir))
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    let module_cfg: ClassifiedsConfig = config.module_config(MODULE_NAME)?;

    let dsn = effective_dsn(&config, &args)?;
    let log_dsn = db::redact_credentials_in_dsn(Some(&dsn));
    tracing::info!("Connecting to database: {}", log_dsn);
    let db = DbHandle::connect(&dsn, connect_opts(&config))
        .await
        .with_context(|| format!("Failed to connect to database '{log_dsn}'"))?;
    tracing::info!("Connected DB backend: {:?}", db.engine());

    tracing::info!("Running classifieds database migrations");
    Migrator::up(db.seaorm(), None)
        .await
        .context("Database migrations failed")?;

    let conn = db.sea();
    let service = Arc::new(Service::new(
        Arc::new(SeaOrmUsersRepository::new(conn.clone())),
        Arc::new(SeaOrmAdsRepository::new(conn)),
        module_cfg.into(),
    ));
    let router = ingress::build_router(service, &config.server);

    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port))
            .await
            .with_context(|| {
                format!(
                    "Failed to bind address {}:{}",
                    config.server.host, config.server.port
                )
            })?;
    tracing::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = shutdown::wait_for_shutdown().await {
                tracing::error!("Shutdown signal handler failed: {}", e);
            }
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("HTTP server failed")?;

    db.close().await;
    tracing::info!("Classifieds Server stopped");
    Ok(())
}

fn check_config(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Checking configuration...");

    let _: ClassifiedsConfig = config.module_config(MODULE_NAME)?;
    let dsn = effective_dsn(&config, &args)?;
    let engine = DbHandle::detect(&dsn)?;

    tracing::info!("Configuration is valid");
    println!("Configuration check passed (database: {engine:?})");
    println!("{}", config.to_yaml()?);
    Ok(())
}
