use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("failed to fetch data from {url} after {attempts} attempts (still rate limited)")]
    RetriesExhausted { url: String, attempts: u32 },
    #[error("failed to fetch data from {url}: status code {status}")]
    BadStatus { url: String, status: StatusCode },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("could not decode page envelope from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("could not build http client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}
