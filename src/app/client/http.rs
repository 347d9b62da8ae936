//! Core HTTP operations with rate limiting and retry logic
//!
//! Requests are paced by a token bucket and transient failures (HTTP 429,
//! HTTP 503, connection errors) are retried with exponential backoff. Any
//! other status is returned to the caller unchanged.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{clock::DefaultClock, state::InMemoryState, Jitter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use url::Url;

use crate::constants::limits;
use crate::errors::{ConfigError, ConfigResult, RetrievalError, RetrievalResult};

/// HTTP operations handler with resilience patterns
#[derive(Debug)]
pub struct HttpHandler {
    client: Client,
    rate_limiter: RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>,
    max_retries: u32,
}

impl HttpHandler {
    /// Creates a new HttpHandler with the given client and rate limiting
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the rate limit is zero
    pub fn new(client: Client, rate_limit_rps: u32, max_retries: u32) -> ConfigResult<Self> {
        let rate_limiter = Self::build_rate_limiter(rate_limit_rps)?;
        Ok(Self {
            client,
            rate_limiter,
            max_retries,
        })
    }

    fn build_rate_limiter(
        rate_limit_rps: u32,
    ) -> ConfigResult<RateLimiter<governor::state::NotKeyed, InMemoryState, DefaultClock>> {
        let rps = NonZeroU32::new(rate_limit_rps).ok_or_else(|| ConfigError::InvalidValue {
            field: "rate_limit_rps".to_string(),
            value: rate_limit_rps.to_string(),
            reason: "Rate limit must be non-zero".to_string(),
        })?;
        Ok(RateLimiter::direct(Quota::per_second(rps)))
    }

    fn backoff(retries: u32) -> Duration {
        let factor = 2_u64.checked_pow(retries).unwrap_or(u64::MAX);
        Duration::from_millis(
            limits::RETRY_BASE_DELAY_MS
                .saturating_mul(factor)
                .min(limits::MAX_RETRY_DELAY_MS),
        )
    }

    /// Fetches the HTTP response with rate limiting and retry logic
    ///
    /// The returned response may carry any status other than 429 and 503;
    /// callers decide what a non-success status means for them.
    pub async fn get_response(&self, url: &Url) -> RetrievalResult<reqwest::Response> {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(100)))
            .await;

        let mut retries = 0;
        loop {
            match self.client.get(url.as_str()).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::TOO_MANY_REQUESTS
                        || status == StatusCode::SERVICE_UNAVAILABLE
                    {
                        if retries < self.max_retries {
                            retries += 1;
                            let delay = Self::backoff(retries);
                            tracing::warn!(
                                "{} returned {}. Backing off for {}ms",
                                url,
                                status.as_u16(),
                                delay.as_millis()
                            );
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                        return Err(if status == StatusCode::TOO_MANY_REQUESTS {
                            RetrievalError::RateLimitExceeded {
                                url: url.to_string(),
                            }
                        } else {
                            RetrievalError::ServerOverloaded {
                                url: url.to_string(),
                            }
                        });
                    }

                    tracing::debug!("Fetched response {} for {}", status.as_u16(), url);
                    return Ok(response);
                }
                Err(e) if retries < self.max_retries => {
                    retries += 1;
                    let delay = Self::backoff(retries);
                    tracing::warn!(
                        "Request to {} failed (attempt {}/{}): {}. Retrying in {}ms",
                        url,
                        retries,
                        self.max_retries,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::error!(
                        "Request to {} failed after {} retries: {}",
                        url,
                        self.max_retries,
                        e
                    );
                    return Err(RetrievalError::MaxRetriesExceeded {
                        url: url.to_string(),
                        max_retries: self.max_retries,
                    });
                }
            }
        }
    }

    /// Fetches a response and fails on any non-success status
    pub async fn get_success(&self, url: &Url) -> RetrievalResult<reqwest::Response> {
        let response = self.get_response(url).await?;
        if !response.status().is_success() {
            return Err(RetrievalError::ServerError {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }

    /// Fetches the text content of a web page
    pub async fn get_page(&self, url: &Url) -> RetrievalResult<String> {
        let response = self.get_success(url).await?;
        let text = response.text().await.map_err(|source| RetrievalError::Http {
            url: url.to_string(),
            source,
        })?;
        tracing::debug!("Fetched page {} ({} bytes)", url, text.len());
        Ok(text)
    }
}
