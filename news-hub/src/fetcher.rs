use crate::traits::Fetch;
use crate::types::{FetchConfig, HubError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// `reqwest`-backed fetcher. No retries: a failed request is reported once.
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String> {
        let start_time = Instant::now();
        debug!("Fetching {} (timeout {:?})", url, timeout);

        let response = self.client.get(url).timeout(timeout).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(HubError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        if let Some(content_length) = response.content_length() {
            let size_mb = content_length as usize / (1024 * 1024);
            if size_mb > self.config.max_feed_size_mb {
                return Err(HubError::FeedTooLarge { size_mb });
            }
        }

        let content = response.text().await?;
        let size_mb = content.len() / (1024 * 1024);
        if size_mb > self.config.max_feed_size_mb {
            return Err(HubError::FeedTooLarge { size_mb });
        }

        info!(
            "Fetched {} ({} bytes in {} ms)",
            url,
            content.len(),
            start_time.elapsed().as_millis()
        );
        Ok(content)
    }

    fn feed_timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_seconds)
    }

    fn child_timeout(&self) -> Duration {
        Duration::from_secs(self.config.child_timeout_seconds)
    }
}
