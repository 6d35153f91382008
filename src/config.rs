use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://itch.io";

/// Knobs for the fetch side of the scraper. Built once in `main` and handed
/// to the [`Fetcher`](crate::fetcher::Fetcher), so tests can point it at a
/// mock server and shrink the backoff.
#[derive(Clone, Debug)]
pub struct ScraperConfig {
    pub base_url: String,
    /// Attempts per request, counting the first one. Only 429s are retried.
    pub max_attempts: u32,
    pub backoff: Duration,
    /// A page reporting fewer items than this is the last one.
    pub last_page_threshold: usize,
    pub request_timeout: Duration,
    pub enrich_concurrency: usize,
    pub user_agent: String,
}

impl ScraperConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn enrich_concurrency(&self) -> usize {
        self.enrich_concurrency.max(1)
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_attempts: 5,
            backoff: Duration::from_secs(2),
            last_page_threshold: 30,
            request_timeout: Duration::from_secs(30),
            enrich_concurrency: 1,
            user_agent: concat!("freebies/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
