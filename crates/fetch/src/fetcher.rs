use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use reqwest::Client;
use tracing::{debug, warn};

use sitecrawler_core::{CrawlError, FetchConfig, ResponseEnvelope};

use crate::proxy::ProxyRotator;

/// HTTP fetcher with retry/backoff and per-attempt proxy injection.
///
/// Retries are driven here rather than inside a single client instance,
/// because each attempt may go out through a different proxy.
pub struct Fetcher {
    config: FetchConfig,
    max_retries: u32,
    request_delay: Duration,
    proxy: Arc<ProxyRotator>,
}

impl Fetcher {
    pub fn new(config: FetchConfig, max_retries: u32, request_delay: Duration, proxy: Arc<ProxyRotator>) -> Self {
        Self { config, max_retries, request_delay, proxy }
    }

    fn build_client(&self, proxy_url: Option<&str>) -> Result<Client, CrawlError> {
        let mut builder = Client::builder()
            .timeout(self.config.timeout)
            .user_agent(self.config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(10));
        if let Some(url) = proxy_url {
            let proxy = reqwest::Proxy::all(url).map_err(|e| CrawlError::Proxy(e.to_string()))?;
            builder = builder.proxy(proxy);
        }
        builder.build().map_err(|e| CrawlError::Network(e.to_string()))
    }

    /// Buffered GET, suitable for HTML pages (the body is needed whole for
    /// hashing and parsing).
    pub async fn fetch(&self, url: &str) -> Result<ResponseEnvelope, CrawlError> {
        self.fetch_with(url, false).await
    }

    /// Streamed GET, suitable for file downloads; still returns the full
    /// body (callers persist it), but reads it in chunks so a single huge
    /// response doesn't require one giant allocation up front.
    pub async fn fetch_streamed(&self, url: &str) -> Result<ResponseEnvelope, CrawlError> {
        self.fetch_with(url, true).await
    }

    async fn fetch_with(&self, url: &str, stream: bool) -> Result<ResponseEnvelope, CrawlError> {
        let mut last_err = None;
        let scheme = url::Url::parse(url).map(|u| u.scheme().to_string()).unwrap_or_else(|_| "http".to_string());

        for attempt in 1..=self.max_retries {
            let proxy = self.proxy.acquire(&scheme).await;
            let client = match self.build_client(proxy.url.as_deref()) {
                Ok(c) => c,
                Err(e) => {
                    last_err = Some(e);
                    continue;
                }
            };

            let start = Instant::now();
            debug!(url, attempt, "fetch attempt");
            let resp = client
                .get(url)
                .header("Accept", "*/*")
                .header("Accept-Language", "en-US,en;q=0.5")
                .header("Connection", "keep-alive")
                .send()
                .await;

            match resp {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if status == 404 {
                        self.proxy.record_result(false);
                        return Err(CrawlError::Network(format!("404 not found: {url}")));
                    }
                    if (500..600).contains(&status) || (400..500).contains(&status) {
                        self.proxy.record_result(false);
                        last_err = Some(CrawlError::Network(format!("http error {status}")));
                        self.backoff(attempt).await;
                        continue;
                    }

                    let final_url = resp.url().to_string();
                    let mut headers = HashMap::new();
                    for (k, v) in resp.headers() {
                        if let Ok(val) = v.to_str() {
                            headers.insert(k.as_str().to_string(), val.to_string());
                        }
                    }
                    let content_type = headers.get("content-type").cloned();

                    let body = if stream {
                        self.read_streamed(resp).await?
                    } else {
                        resp.bytes()
                            .await
                            .map(|b| b.to_vec())
                            .map_err(|e| CrawlError::Network(e.to_string()))?
                    };

                    if body.len() > self.config.max_body_size {
                        return Err(CrawlError::BodyTooLarge {
                            size: body.len(),
                            max: self.config.max_body_size,
                        });
                    }

                    self.proxy.record_result(true);
                    return Ok(ResponseEnvelope {
                        requested_url: url.to_string(),
                        final_url,
                        status,
                        headers,
                        content_type,
                        body,
                        latency: start.elapsed(),
                    });
                }
                Err(e) => {
                    warn!(url, attempt, error = %e, "fetch attempt failed");
                    self.proxy.record_result(false);
                    last_err = Some(CrawlError::Network(e.to_string()));
                    self.backoff(attempt).await;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| CrawlError::Network("exhausted retries".to_string())))
    }

    async fn read_streamed(&self, resp: reqwest::Response) -> Result<Vec<u8>, CrawlError> {
        let mut buf = Vec::new();
        let mut stream = resp.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| CrawlError::Network(e.to_string()))?;
            buf.extend_from_slice(&chunk);
            if buf.len() > self.config.max_body_size {
                return Err(CrawlError::BodyTooLarge {
                    size: buf.len(),
                    max: self.config.max_body_size,
                });
            }
        }
        Ok(buf)
    }

    /// Linear backoff: `request_delay * attempt_number`.
    async fn backoff(&self, attempt: u32) {
        if attempt >= self.max_retries {
            return;
        }
        tokio::time::sleep(self.request_delay * attempt).await;
    }

    /// Global inter-batch politeness sleep.
    pub async fn politeness_sleep(&self) {
        tokio::time::sleep(self.request_delay).await;
    }
}
