//! Service entrypoint: config, tracing, adapter wiring, axum server.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use career_intake::adapters::ai::{MockConversationProvider, OpenAIConfig, OpenAIProvider};
use career_intake::adapters::document::PdfResumeExtractor;
use career_intake::adapters::http::{api_router, AppState};
use career_intake::adapters::storage::{FileProfileStore, InMemoryProfileStore};
use career_intake::application::{ConversationOrchestrator, OrchestratorConfig};
use career_intake::config::{AiProvider, AppConfig, StorageBackend};
use career_intake::ports::{ConversationProvider, ProfileStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level)),
        )
        .init();

    config.validate()?;

    let store: Arc<dyn ProfileStore> = match config.storage.backend {
        StorageBackend::Memory => Arc::new(InMemoryProfileStore::new()),
        StorageBackend::File => Arc::new(FileProfileStore::new(&config.storage.data_dir)),
    };

    let provider: Arc<dyn ConversationProvider> = match config.ai.provider {
        AiProvider::Mock => Arc::new(MockConversationProvider::new()),
        AiProvider::OpenAI => {
            // validate() guarantees a key is present for this provider.
            let api_key = config.ai.openai_api_key.clone().unwrap_or_default();
            let openai_config = OpenAIConfig::new(api_key)
                .with_model(config.ai.model.clone())
                .with_base_url(config.ai.base_url.clone())
                .with_timeout(config.ai.timeout())
                .with_max_retries(config.ai.max_retries);
            Arc::new(OpenAIProvider::new(openai_config)?)
        }
    };

    let orchestrator = Arc::new(ConversationOrchestrator::new(
        store,
        provider,
        Arc::new(PdfResumeExtractor::new()),
        OrchestratorConfig {
            adapter_timeout: config.ai.timeout() + Duration::from_secs(5),
            shallow_answer_len: config.ai.shallow_answer_len,
        },
    ));

    let app = api_router(
        AppState::new(orchestrator, config.upload.max_bytes),
        config.server.request_timeout(),
        &config.server.cors_origins_list(),
    );

    let addr = config.server.socket_addr()?;
    info!(%addr, environment = ?config.server.environment, "starting career-intake server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
