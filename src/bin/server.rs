use std::sync::Arc;

use toolstream::provider::{OpenAiCompatibleClient, ProviderConfig};
use toolstream::server::{router, AppState};
use toolstream::{telemetry, Config, OrchestratorOptions, ResponseOrchestrator, ToolRegistry};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    telemetry::init_tracing();

    let config = Config::from_env()?;
    let provider = OpenAiCompatibleClient::new(ProviderConfig::from(&config))?;
    let orchestrator = ResponseOrchestrator::new(
        Arc::new(provider),
        Arc::new(ToolRegistry::with_reference_tools()),
        OrchestratorOptions::from(&config),
    );

    let app = router(AppState {
        orchestrator: Arc::new(orchestrator),
        ping_interval: config.ping_interval,
        app_name: config.app_name.clone(),
    });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        model = %config.model,
        "{} listening",
        config.app_name
    );

    axum::serve(listener, app).await?;
    Ok(())
}
