use std::env;

/// Application settings loaded from environment variables.
///
/// Provider backends are considered configured only when their credential
/// is present and non-empty; routing silently falls back to the local
/// generator otherwise.
#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub log_level: String,
    pub default_model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
    /// Pause between streamed chunks, in milliseconds. Zero disables pacing.
    pub stream_delay_ms: u64,
    pub doubao_api_key: Option<String>,
    pub deepseek_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub jwt_secret: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            debug: false,
            log_level: "info".to_string(),
            default_model: "gpt-4-tutor".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            request_timeout_secs: 30,
            stream_delay_ms: 100,
            doubao_api_key: None,
            deepseek_api_key: None,
            gemini_api_key: None,
            jwt_secret: "your-secret-key-change-in-production".to_string(),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Settings::default();
        Settings {
            host: env_var("HOST").unwrap_or(defaults.host),
            port: env_var("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            debug: env_var("DEBUG")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.debug),
            log_level: env_var("LOG_LEVEL").unwrap_or(defaults.log_level),
            default_model: env_var("DEFAULT_MODEL").unwrap_or(defaults.default_model),
            temperature: env_var("TEMPERATURE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.temperature),
            max_tokens: env_var("MAX_TOKENS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_tokens),
            request_timeout_secs: env_var("REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            stream_delay_ms: env_var("STREAM_DELAY_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.stream_delay_ms),
            doubao_api_key: env_var("DOUBAO_API_KEY"),
            deepseek_api_key: env_var("DEEPSEEK_API_KEY"),
            gemini_api_key: env_var("GEMINI_API_KEY"),
            jwt_secret: env_var("JWT_SECRET").unwrap_or(defaults.jwt_secret),
        }
    }

    pub fn has_doubao(&self) -> bool {
        self.doubao_api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    pub fn has_deepseek(&self) -> bool {
        self.deepseek_api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    pub fn has_gemini(&self) -> bool {
        self.gemini_api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}
