mod args;
mod config;
mod dirs;

use std::io;
use std::net::{IpAddr, SocketAddr};

use app_api::{AppContext, ImportRequest};
use clap::Parser;
use http_api::HttpState;
use tracing::Level;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use verdant_app::{AppConfig, AppPaths, AppState, ensure_app_data_dir};

use crate::args::{Cli, Command, ServeArgs};
use crate::config::CliConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    let loaded = config::load_or_create(cli.config.as_deref()).map_err(io::Error::other)?;
    if loaded.created {
        tracing::info!(path = %loaded.file.display(), "created default config");
    }
    let config = loaded.config;

    let data_dir = dirs::resolve_data_dir(cli.data_dir.as_deref(), config.data_dir.as_deref())
        .map_err(io::Error::other)?;
    let paths = AppPaths::new(data_dir);
    ensure_app_data_dir(&paths).map_err(|err| io::Error::other(err.to_string()))?;
    tracing::info!(data_dir = %paths.app_data_dir.display(), "using data dir");

    let app_config = AppConfig::new(paths.db_path.clone(), paths.intensity_defaults_path.clone())
        .with_carbon(config.carbon.clone())
        .with_score_weights(config.score);
    let app_state = AppState::new(app_config);
    app_state
        .initialize()
        .map_err(|err| io::Error::other(format!("failed to initialize database: {}", err)))?;

    let context = AppContext {
        app_state,
        app_data_dir: paths.app_data_dir,
    };

    match cli.command {
        Some(Command::Migrate) => {
            let db = context.app_state.open_db()?;
            let applied = db.applied_migrations()?;
            tracing::info!(migrations = ?applied, "database is up to date");
            Ok(())
        }
        Some(Command::Import { path }) => {
            let request = ImportRequest {
                path: path.to_string_lossy().to_string(),
            };
            let stats = tokio::task::spawn_blocking(move || app_api::import_path(&context, request))
                .await??;
            for issue in &stats.issues {
                tracing::warn!(
                    file = %issue.file_path,
                    line = ?issue.line,
                    "{}",
                    issue.message
                );
            }
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
        Some(Command::Serve(args)) => serve(context, &config, args).await,
        None => serve(context, &config, ServeArgs::default()).await,
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .init();
}

async fn serve(
    context: AppContext,
    config: &CliConfig,
    args: ServeArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let port = args.port.unwrap_or(config.port);
    let bind = args.bind.unwrap_or_else(|| config.bind.clone());
    let ip: IpAddr = bind
        .parse()
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, format!("bind {}: {}", bind, err)))?;
    let ingest_token = args
        .ingest_token
        .or_else(|| config.ingest_token.clone())
        .filter(|token| !token.trim().is_empty());
    if ingest_token.is_none() {
        tracing::warn!("no ingest token configured; ingest routes accept unauthenticated requests");
    }

    let state = HttpState::new(context, ingest_token);
    let router = http_api::router(state);

    let (listener, actual_port, used_fallback) = bind_port(ip, port).await?;
    if used_fallback {
        tracing::warn!(configured = port, actual = actual_port, "configured port unavailable");
    }
    tracing::info!(addr = %SocketAddr::new(ip, actual_port), "verdantops listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shut down");
    Ok(())
}

async fn bind_port(ip: IpAddr, port: u16) -> Result<(tokio::net::TcpListener, u16, bool), io::Error> {
    if port == 0 {
        let listener = tokio::net::TcpListener::bind(SocketAddr::new(ip, 0)).await?;
        let actual_port = listener.local_addr()?.port();
        return Ok((listener, actual_port, false));
    }

    match tokio::net::TcpListener::bind(SocketAddr::new(ip, port)).await {
        Ok(listener) => Ok((listener, port, false)),
        Err(_) => {
            let listener = tokio::net::TcpListener::bind(SocketAddr::new(ip, 0)).await?;
            let actual_port = listener.local_addr()?.port();
            Ok((listener, actual_port, true))
        }
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
