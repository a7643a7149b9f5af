pub mod auth;
pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod protocols;
pub mod router;
pub mod server;
pub mod session;
pub mod state;
pub mod streaming;
