//! A backend letting a front-end app load and save one JSON document, stored as a file in a
//! repository on a source-control host. The host's content versions guard against lost updates.

mod api;
mod config;
mod crypto;
mod document;
mod percent_encoding;
#[cfg(test)]
mod testing;
mod upstream;

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::{config::Config, upstream::ContentsClient};

/// The log filter used if `RUST_LOG` isn't set.
const DEFAULT_LOG_FILTER: &str = "info";

/// The state shared by all request handlers. Never changes after startup.
#[derive(Clone, Debug)]
pub(crate) struct AppState {
    /// The server's configuration.
    pub(crate) config: Arc<Config>,

    /// The client for the file holding the document.
    pub(crate) contents: Arc<ContentsClient>,
}

impl AppState {
    /// Constructs the state for a configuration.
    ///
    /// # Errors
    ///
    /// Fails if the storage provider's HTTP client can't be built.
    pub(crate) fn new(config: Config) -> Result<Self, reqwest::Error> {
        let contents = ContentsClient::new(&config.upstream)?;

        Ok(Self {
            config: Arc::new(config),
            contents: Arc::new(contents),
        })
    }
}

/// # Errors
///
/// See implementation.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reading the config first loads `.env`, which may set `RUST_LOG`.
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let address = config.address.clone();
    let state = AppState::new(config)?;

    info!(document = state.contents.url(), "Serving document...");

    let listener = TcpListener::bind(&address).await?;

    info!("Listening on {address}...");

    axum::serve(listener, api::routes::router(state)).await?;

    Ok(())
}
