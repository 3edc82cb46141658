use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::Client;

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Shared connection pool. Timeouts are set per request by each source.
pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .build()
            .context("failed to build http client")
    })
}
