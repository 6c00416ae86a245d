pub mod analytics;
pub mod artifact;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod months;
pub mod pipeline;

pub use error::{ExportError, Result};

/// Fmt subscriber at INFO, shared by every binary.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("a global tracing subscriber was already set");
    }
}
