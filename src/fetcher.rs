use reqwest::{Client, StatusCode};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::config::ScraperConfig;
use crate::error::ScrapeError;

/// Single logical GET with the storefront's rate-limit handling.
#[derive(Clone, Debug)]
pub struct Fetcher {
    client: Client,
    config: ScraperConfig,
}

impl Fetcher {
    pub fn new(config: ScraperConfig) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(ScrapeError::ClientBuild)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    /// Returns the body of `url`. A 429 sleeps for the configured backoff and
    /// tries again until `max_attempts` requests were made; transport errors
    /// and any other non-200 status fail straight away.
    pub async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let max_attempts = self.config.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            debug!(url, attempt, "GET");
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|source| ScrapeError::Transport {
                    url: url.to_string(),
                    source,
                })?;

            match response.status() {
                StatusCode::OK => {
                    return response.text().await.map_err(|source| ScrapeError::Transport {
                        url: url.to_string(),
                        source,
                    });
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    if attempt < max_attempts {
                        warn!(
                            url,
                            attempt,
                            backoff = ?self.config.backoff,
                            "rate limited, retrying"
                        );
                        sleep(self.config.backoff).await;
                    }
                }
                status => {
                    return Err(ScrapeError::BadStatus {
                        url: url.to_string(),
                        status,
                    });
                }
            }
        }

        Err(ScrapeError::RetriesExhausted {
            url: url.to_string(),
            attempts: max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn fast_fetcher(base_url: &str) -> Fetcher {
        let config = ScraperConfig {
            backoff: Duration::from_millis(5),
            ..ScraperConfig::with_base_url(base_url)
        };
        Fetcher::new(config).unwrap()
    }

    #[tokio::test]
    async fn returns_body_on_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hello"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hi there"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fast_fetcher(&server.uri());
        let body = fetcher.fetch(&format!("{}/hello", server.uri())).await.unwrap();
        assert_eq!(body, "hi there");
    }

    #[tokio::test]
    async fn retries_rate_limit_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(4)
            .expect(4)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(200).set_body_string("finally"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fast_fetcher(&server.uri());
        let body = fetcher.fetch(&format!("{}/busy", server.uri())).await.unwrap();
        assert_eq!(body, "finally");
    }

    #[tokio::test]
    async fn waits_for_backoff_between_rate_limited_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(200).set_body_string("done"))
            .expect(1)
            .mount(&server)
            .await;

        let config = ScraperConfig {
            backoff: Duration::from_millis(100),
            ..ScraperConfig::with_base_url(server.uri())
        };
        let fetcher = Fetcher::new(config).unwrap();

        let started = Instant::now();
        let body = fetcher.fetch(&format!("{}/busy", server.uri())).await.unwrap();
        assert_eq!(body, "done");
        assert!(started.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn gives_up_after_five_rate_limited_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/busy"))
            .respond_with(ResponseTemplate::new(429))
            .expect(5)
            .mount(&server)
            .await;

        let fetcher = fast_fetcher(&server.uri());
        let url = format!("{}/busy", server.uri());
        let err = fetcher.fetch(&url).await.unwrap_err();
        match err {
            ScrapeError::RetriesExhausted { url: failed, attempts } => {
                assert_eq!(failed, url);
                assert_eq!(attempts, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn other_statuses_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fast_fetcher(&server.uri());
        let err = fetcher
            .fetch(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ScrapeError::BadStatus { status: StatusCode::NOT_FOUND, .. }
        ));
    }

    #[tokio::test]
    async fn transport_errors_propagate_immediately() {
        // Nothing listens on port 1.
        let fetcher = fast_fetcher("http://127.0.0.1:1");
        let err = fetcher.fetch("http://127.0.0.1:1/nope").await.unwrap_err();
        assert!(matches!(err, ScrapeError::Transport { .. }));
    }
}
