//! Download of the raw source text

use crate::error::{Error, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::info;

/// Source of the raw delimited text
pub trait SourceFetcher {
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Plain blocking HTTP GET, no retries
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SourceFetcher for HttpFetcher {
    /// Fetch `url`; anything but HTTP 200 is an error
    fn fetch(&self, url: &str) -> Result<String> {
        info!(url, "downloading source");
        let response = self.client.get(url).send()?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::FetchStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response.text()?;
        info!(bytes = text.len(), "source downloaded");
        Ok(text)
    }
}
