//! Shared application state handed to every handler.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::Client;

use crate::auth::AuthService;
use crate::config::Settings;
use crate::error::ApiError;
use crate::generator::{local, provider, ProviderKind};
use crate::protocols::{ChatMessage, Model};
use crate::router::Backend;
use crate::session::{MemorySessionStore, SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub client: Client,
    pub sessions: Arc<dyn SessionStore>,
    pub auth: AuthService,
}

impl AppState {
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        let auth = AuthService::new(&settings);
        Ok(Self {
            settings,
            client,
            sessions: Arc::new(MemorySessionStore::new()),
            auth,
        })
    }

    /// Models the gateway serves: the built-in tutor aliases plus every
    /// provider with a configured credential.
    pub fn available_models(&self) -> Vec<Model> {
        let created = Utc::now().timestamp();
        let mut models = vec![
            Model {
                id: "gpt-4-tutor".to_string(),
                object: "model".to_string(),
                created,
                owned_by: "ai-tutor".to_string(),
            },
            Model {
                id: "local-tutor".to_string(),
                object: "model".to_string(),
                created,
                owned_by: "ai-tutor".to_string(),
            },
        ];
        for kind in [
            ProviderKind::Doubao,
            ProviderKind::DeepSeek,
            ProviderKind::Gemini,
        ] {
            if kind.is_configured(&self.settings) {
                models.push(Model {
                    id: kind.model_id().to_string(),
                    object: "model".to_string(),
                    created,
                    owned_by: kind.owned_by().to_string(),
                });
            }
        }
        models
    }

    /// Produce the completion text for a routed request.
    pub async fn generate_text(
        &self,
        backend: Backend,
        model: &str,
        messages: &[ChatMessage],
        temperature: f32,
        max_tokens: Option<u32>,
    ) -> Result<String, ApiError> {
        match backend {
            Backend::Local => Ok(local::generate(messages, temperature)),
            Backend::Provider(kind) => {
                provider::generate(
                    &self.client,
                    kind,
                    &self.settings,
                    model,
                    messages,
                    temperature,
                    max_tokens,
                )
                .await
            }
        }
    }
}
