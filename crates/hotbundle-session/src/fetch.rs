use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;

pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Blocking HTTP primitive. `Err` means the request never produced a
/// response; HTTP error statuses come back as `Ok`.
pub trait Fetcher: Send + Sync {
    fn get(&self, url: &str) -> Result<FetchResponse>;
    fn post_json(&self, url: &str, body: Vec<u8>) -> Result<u16>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hotbundle/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn get(&self, url: &str) -> Result<FetchResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("GET {url} failed"))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .with_context(|| format!("failed reading response body from {url}"))?;
        Ok(FetchResponse {
            status,
            body: body.to_vec(),
        })
    }

    fn post_json(&self, url: &str, body: Vec<u8>) -> Result<u16> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .with_context(|| format!("POST {url} failed"))?;
        Ok(response.status().as_u16())
    }
}
