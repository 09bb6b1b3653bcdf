//! `healthrec-server` entry point.

use anyhow::{anyhow, Context, Result};
use healthrec_api::{build_router, AppState, ServerConfig};
use healthrec_core::db::open_db;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServerConfig::from_env().context("failed to load configuration")?;

    let logging = match &config.log_dir {
        Some(dir) => {
            let dir = dir
                .to_str()
                .ok_or_else(|| anyhow!("HEALTHREC_LOG_DIR must be valid UTF-8"))?;
            healthrec_core::init_logging(&config.log_level, dir)
        }
        None => healthrec_core::init_stderr_logging(&config.log_level),
    };
    logging
        .map_err(|err| anyhow!(err))
        .context("failed to initialize logging")?;

    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open database `{}`", config.db_path.display()))?;
    let app = build_router(AppState::new(conn));

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("event=server_start module=api status=ok addr={addr}");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
