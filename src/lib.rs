//! Faucet admission gate library.

pub mod blockchain;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::FaucetConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
