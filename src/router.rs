//! Model routing: map a requested model id onto a generation backend.

use crate::config::Settings;
use crate::generator::ProviderKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Local,
    Provider(ProviderKind),
}

/// Select the backend for a requested model id.
///
/// A known provider model id routes to that provider only when its
/// credential is configured; everything else, including unknown ids,
/// falls back to the local generator. Routing never fails.
pub fn route(model: &str, settings: &Settings) -> Backend {
    match ProviderKind::from_model(model) {
        Some(kind) if kind.is_configured(settings) => Backend::Provider(kind),
        _ => Backend::Local,
    }
}
