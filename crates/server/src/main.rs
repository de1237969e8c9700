use std::net::SocketAddr;

use saldo_core::Tuning;
use saldo_extract::StatementPipeline;
use saldo_oracle::OpenAiOracle;
use saldo_pdf::ShellTools;
use saldo_server::{create_router, AppState, ServerHandle, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::from_env()?;
    settings.ensure_dirs()?;

    let pipeline = StatementPipeline::new(
        ShellTools::from_env(),
        OpenAiOracle::from_env(),
        Tuning::default(),
        settings.scratch_dir(),
    );
    let state = AppState::new(pipeline, settings.uploads_dir());

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let mut server = ServerHandle::start(create_router(state), addr).await?;

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    server.stop().await;
    Ok(())
}
