//! HTTP fetch port. Kept narrow and `async_trait`-based so discovery logic is
//! testable without a live network, mirroring `riptide-fetch`'s
//! `HttpClient` port.

use async_trait::async_trait;

/// Identifies this crawler to both the server (`User-Agent` header) and the
/// robots.txt matcher (`robots.rs::is_allowed`), so the two stay in sync.
pub const USER_AGENT: &str = "legacy-discovery/0.1";

#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchedBody, String>;
}

/// Production fetcher backed by `reqwest`.
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent(USER_AGENT)
            .build()
            .expect("reqwest client builds with static config");
        Self { client }
    }
}

impl Default for ReqwestFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &str) -> Result<FetchedBody, String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| e.to_string())?;
        Ok(FetchedBody { status, body })
    }
}
