//! Portal session - one cookie-carrying client for the whole run.
//!
//! The portal ties its quota and bot heuristics to the session cookie, so the
//! same client is reused for every request.

use crate::crawler::config::PortalConfig;
use crate::crawler::error::CrawlError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::{Client, Response};
use tracing::{debug, info, warn};

pub struct PortalSession {
    client: Client,
    landing_url: String,
    download_url: String,
    timeout: std::time::Duration,
}

impl PortalSession {
    /// Build the client and load the landing page once to obtain a session cookie
    pub async fn bootstrap(config: &PortalConfig) -> Result<Self, CrawlError> {
        let landing_url = config.landing_url();

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static("ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7"),
        );
        let referer = HeaderValue::from_str(&landing_url)
            .map_err(|e| CrawlError::SessionBootstrap(format!("bad landing url: {}", e)))?;
        headers.insert(REFERER, referer);

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .cookie_store(true)
            .timeout(config.request_timeout)
            .build()?;

        info!("Initializing portal session");
        let response = client
            .get(&landing_url)
            .send()
            .await
            .map_err(|e| CrawlError::SessionBootstrap(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::SessionBootstrap(format!("HTTP {}", status)));
        }
        info!("Portal session ready");

        Ok(PortalSession {
            client,
            landing_url,
            download_url: config.download_url(),
            timeout: config.request_timeout,
        })
    }

    /// Reload the landing page to keep the session alive. Failures are only logged.
    pub async fn refresh(&self) {
        match self.client.get(&self.landing_url).send().await {
            Ok(resp) if resp.status().is_success() => debug!("Session refreshed"),
            Ok(resp) => warn!("Session refresh returned HTTP {}", resp.status()),
            Err(e) => warn!("Session refresh failed: {}", e),
        }
    }

    /// POST the download form over the shared session
    pub async fn post_download(&self, form: &[(&str, String)]) -> reqwest::Result<Response> {
        self.client
            .post(&self.download_url)
            .form(form)
            .timeout(self.timeout)
            .send()
            .await
    }
}
