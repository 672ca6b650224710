use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::chat::{ChatModel, ChatResponder, DocumentIndex, HostedChatModel};
use crate::config::Config;
use crate::forecast::{DayForecastService, ForecastEngine};

/// Process-wide read-only handles shared by every request
#[derive(Clone)]
pub struct AppState {
    pub forecasts: Arc<DayForecastService>,
    pub chat: Arc<ChatResponder>,
}

impl AppState {
    /// Build everything that is loaded once at start-up.
    ///
    /// A missing or unreadable model artifact is fatal. The document corpus
    /// and the LLM credential are optional.
    pub async fn new(cfg: &Config) -> Result<Self> {
        let model_path = cfg.forecast.model_path.clone();
        let engine = tokio::task::spawn_blocking(move || ForecastEngine::load(&model_path))
            .await?
            .with_context(|| {
                format!("failed to load model artifact {}", cfg.forecast.model_path.display())
            })?;
        if let Some(summary) = engine.summary() {
            info!(
                trees = summary.num_trees,
                features = summary.num_features,
                objective = %summary.objective,
                "load model ready"
            );
        }

        if !cfg.forecast.data_dir.is_dir() {
            warn!(dir = %cfg.forecast.data_dir.display(), "forecast data directory not found, every day will be unavailable");
        }
        let forecasts = Arc::new(DayForecastService::new(
            cfg.forecast.data_dir.clone(),
            Arc::new(engine),
        ));

        let llm = HostedChatModel::from_config(&cfg.chat).context("failed to build chat client")?;
        if !llm.has_credential() {
            warn!(
                env = %cfg.chat.api_key_env,
                "no chat API key set, the chatbot will only apologise"
            );
        }

        let index = match cfg.chat.docs_dir.clone() {
            Some(dir) => {
                let (size, overlap) = (cfg.chat.chunk_size, cfg.chat.chunk_overlap);
                tokio::task::spawn_blocking(move || DocumentIndex::build(&dir, size, overlap)).await?
            }
            None => None,
        };
        if index.is_none() {
            info!("grounded answers disabled, using general knowledge only");
        }

        let llm: Arc<dyn ChatModel> = Arc::new(llm);
        let chat = Arc::new(
            ChatResponder::new(llm, index, cfg.chat.top_k)
                .with_deadline(Duration::from_secs(cfg.chat.answer_timeout_seconds)),
        );

        Ok(Self { forecasts, chat })
    }

    pub fn from_parts(forecasts: Arc<DayForecastService>, chat: Arc<ChatResponder>) -> Self {
        Self { forecasts, chat }
    }
}
