pub mod config;
pub mod dk_fetch;
pub mod error;
pub mod export;
pub mod flatten;
pub mod http_client;
pub mod pipeline;
