use futures::stream::{self, StreamExt};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};
use url::Url;

use crate::error::ScrapeError;
use crate::fetcher::Fetcher;
use crate::models::Listing;

lazy_static! {
    static ref END_DATE_BEFORE_NEXT_FIELD: Regex = Regex::new(r#"end_date".*","#).unwrap();
    static ref END_DATE_LAST_FIELD: Regex = Regex::new(r#"end_date".*"\}"#).unwrap();
    static ref DATE_PATTERN: Regex = Regex::new(r#"[0-9]+-[^"]*"#).unwrap();
}

/// Pulls the sale end date out of a sale page body. The field is looked up
/// as `end_date"…",` first and as `end_date"…"}` when it closes its object.
pub fn parse_end_date(body: &str) -> Option<String> {
    let fragment = END_DATE_BEFORE_NEXT_FIELD
        .find(body)
        .or_else(|| END_DATE_LAST_FIELD.find(body))?;
    DATE_PATTERN
        .find(fragment.as_str())
        .map(|date| date.as_str().to_string())
}

/// `{base}{link}` for relative sale links, the link itself when absolute.
pub fn sale_page_url(base_url: &str, sales_link: &str) -> Result<Url, ScrapeError> {
    if let Ok(absolute) = Url::parse(sales_link) {
        return Ok(absolute);
    }
    let raw = format!("{}/{}", base_url.trim_end_matches('/'), sales_link.trim_start_matches('/'));
    Url::parse(&raw).map_err(|source| ScrapeError::InvalidUrl { url: raw, source })
}

/// Fetches the sale page of `listing` and fills in its end date.
pub async fn enrich(fetcher: &Fetcher, listing: Listing) -> Result<Listing, ScrapeError> {
    if listing.sales_link.is_empty() {
        warn!(id = %listing.id, "listing has no sale link, end date left empty");
        return Ok(listing);
    }

    let url = sale_page_url(fetcher.config().base_url(), &listing.sales_link)?;
    let body = fetcher.fetch(url.as_str()).await?;
    let end_date = parse_end_date(&body);
    if end_date.is_none() {
        warn!(id = %listing.id, url = %url, "end date for the listing was not found");
    }
    Ok(listing.with_end_date(end_date))
}

/// Result of enriching a batch. `listings` holds every listing enriched
/// before `aborted_by`, in input order.
#[derive(Debug)]
pub struct Enriched {
    pub listings: Vec<Listing>,
    pub aborted_by: Option<ScrapeError>,
}

impl Enriched {
    pub fn into_result(self) -> Result<Vec<Listing>, ScrapeError> {
        match self.aborted_by {
            Some(err) => Err(err),
            None => Ok(self.listings),
        }
    }
}

/// Enriches `listings` keeping their order. Up to `enrich_concurrency`
/// sale pages are fetched at once; the first failure stops the batch.
pub async fn enrich_all(fetcher: &Fetcher, listings: Vec<Listing>) -> Enriched {
    let total = listings.len();
    let mut results = stream::iter(listings)
        .map(|listing| enrich(fetcher, listing))
        .buffered(fetcher.config().enrich_concurrency());

    let mut enriched = Vec::with_capacity(total);
    while let Some(result) = results.next().await {
        match result {
            Ok(listing) => enriched.push(listing),
            Err(err) => {
                info!(enriched = enriched.len(), total, "enrichment aborted");
                return Enriched {
                    listings: enriched,
                    aborted_by: Some(err),
                };
            }
        }
    }

    Enriched {
        listings: enriched,
        aborted_by: None,
    }
}
