use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{AppConfig, CliArgs, DatabaseConfig};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use axum::http::HeaderValue;
use commerce::domain::ports::PaymentProvider;
use commerce::infra::payment::{provider_from_config, MockPaymentProvider};
use commerce::infra::storage::{seed::seed_demo_data, Migrator};
use commerce::CommerceConfig;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// Expand a sqlite DSN into an absolute-path DSN using a base directory.
/// - Keeps "sqlite::memory:" as-is.
/// - Normalizes backslashes into forward slashes (important on Windows).
fn absolutize_sqlite_dsn(dsn: &str, base_dir: &Path, create_dirs: bool) -> Result<String> {
    if dsn.eq_ignore_ascii_case("sqlite::memory:") || dsn.eq_ignore_ascii_case("sqlite://:memory:")
    {
        return Ok("sqlite::memory:".to_string());
    }
    let db_path = dsn
        .strip_prefix("sqlite://")
        .ok_or_else(|| anyhow!("DSN must start with sqlite:// (got: {})", dsn))?;

    let (path_str, query) = match db_path.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (db_path, None),
    };

    let mut p = PathBuf::from(path_str);
    if p.as_os_str().is_empty() {
        return Err(anyhow!("Empty SQLite path in DSN"));
    }
    if p.is_relative() {
        p = base_dir.join(p);
    }

    if let Some(dir) = p.parent() {
        if create_dirs {
            std::fs::create_dir_all(dir)?;
        }
    }

    // Rebuild DSN with absolute path and normalized slashes
    let mut out = String::from("sqlite://");
    out.push_str(&p.to_string_lossy().replace('\\', "/"));
    // mode=rwc lets SQLite create the file on first run
    out.push('?');
    out.push_str(query.unwrap_or("mode=rwc"));
    Ok(out)
}

/// Detect DB backend from URL scheme (sqlite/postgres).
fn detect_from_dsn(cfg: &DatabaseConfig) -> Result<&'static str> {
    let raw = cfg.url.trim().to_owned();
    if raw.is_empty() {
        return Err(anyhow!("Database URL not configured"));
    }

    let url = Url::parse(&raw).map_err(|e| anyhow!("Invalid database DSN '{}': {}", raw, e))?;

    match url.scheme() {
        "sqlite" | "sqlite3" => Ok("sqlite"),
        "postgres" | "postgresql" => Ok("postgres"),
        other => Err(anyhow!("Unsupported database type: {}", other)),
    }
}

/// Storefront Server - e-commerce backend
#[derive(Parser)]
#[command(name = "storefront-server")]
#[command(about = "Storefront Server - e-commerce backend")]
#[command(version = "0.1.0")]
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

    /// Use an in-memory database and the mock payment provider
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
    /// Load demo accounts and products into the database
    Seed,
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

    // Apply CLI overrides (port / verbosity)
    config.apply_cli_overrides(&args);

    // Initialize logging
    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Storefront Server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config),
        Commands::Seed => seed_database(config, args).await,
    }
}

async fn connect_database(config: &AppConfig, mock: bool) -> Result<DatabaseConnection> {
    let db_config = config
        .database
        .clone()
        .ok_or_else(|| anyhow!("No database configuration found"))?;
    let _backend = detect_from_dsn(&db_config)?;

    let base_dir = PathBuf::from(&config.server.home_dir);

    // Use URL from config; override with in-memory SQLite when --mock is set
    let mut final_dsn = if mock {
        "sqlite::memory:".to_string()
    } else {
        db_config.url.trim().to_owned()
    };

    // Absolutize sqlite DSNs to avoid cwd issues
    if final_dsn.starts_with("sqlite://") {
        final_dsn = absolutize_sqlite_dsn(&final_dsn, &base_dir, true)?;
    }

    let mut opts = ConnectOptions::new(final_dsn.clone());
    opts.max_connections(db_config.max_conns.unwrap_or(10))
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    tracing::info!("Connecting to database: {}", final_dsn);
    let db = Database::connect(opts).await?;

    tracing::info!("Running migrations");
    Migrator::up(&db, None).await?;

    Ok(db)
}

fn commerce_config(config: &AppConfig) -> Result<CommerceConfig> {
    Ok(config
        .module_section::<CommerceConfig>("commerce")?
        .unwrap_or_default())
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    let db = connect_database(&config, args.mock).await?;
    let commerce_cfg = commerce_config(&config)?;

    if args.mock {
        // An in-memory database starts empty every run; make it usable.
        seed_demo_data(&db).await?;
    }

    let provider: Arc<dyn PaymentProvider> = if args.mock {
        tracing::info!("Mock mode: using mock payment provider");
        Arc::new(MockPaymentProvider::new(&commerce_cfg.stripe.currency))
    } else {
        provider_from_config(&commerce_cfg.stripe)?
    };

    let ctx = commerce::build_context(db, &commerce_cfg, provider);
    let app = commerce::api::rest::router(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

async fn seed_database(config: AppConfig, args: CliArgs) -> Result<()> {
    let db = connect_database(&config, args.mock).await?;
    seed_demo_data(&db).await?;
    println!("Database seeded");
    Ok(())
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration...");

    // Config loading already normalized & created home_dir; make sure the
    // commerce section and database DSN parse too.
    let _ = commerce_config(&config)?;
    if let Some(db_config) = &config.database {
        let _ = detect_from_dsn(db_config)?;
    }

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolutize_keeps_memory_dsn() {
        let out = absolutize_sqlite_dsn("sqlite::memory:", Path::new("/tmp"), false).unwrap();
        assert_eq!(out, "sqlite::memory:");
    }

    #[test]
    fn absolutize_joins_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let out =
            absolutize_sqlite_dsn("sqlite://database/storefront.db", dir.path(), true).unwrap();
        assert!(out.starts_with("sqlite://"));
        assert!(out.contains("database/storefront.db"));
        assert!(out.ends_with("?mode=rwc"));
        assert!(dir.path().join("database").is_dir());
    }

    #[test]
    fn absolutize_rejects_other_schemes() {
        assert!(absolutize_sqlite_dsn("postgres://x/y", Path::new("/tmp"), false).is_err());
    }

    #[test]
    fn detect_backend_from_dsn() {
        let cfg = |url: &str| DatabaseConfig {
            url: url.to_string(),
            max_conns: None,
            busy_timeout_ms: None,
        };
        assert_eq!(detect_from_dsn(&cfg("sqlite://db.sqlite")).unwrap(), "sqlite");
        assert_eq!(
            detect_from_dsn(&cfg("postgres://u:p@localhost/db")).unwrap(),
            "postgres"
        );
        assert!(detect_from_dsn(&cfg("mysql://localhost/db")).is_err());
        assert!(detect_from_dsn(&cfg("")).is_err());
    }
}
