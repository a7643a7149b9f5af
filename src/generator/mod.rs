pub mod local;
pub mod provider;

pub use provider::ProviderKind;
