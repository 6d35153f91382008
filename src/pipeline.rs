use serde_json::{json, Value};
use tracing::{info, warn};

use crate::enricher::enrich_all;
use crate::error::ScrapeError;
use crate::extractor::listings_from_page;
use crate::fetcher::Fetcher;
use crate::models::{error_to_json, Category, Listing};
use crate::paginator::fetch_category;

/// Every free listing currently on sale in `category`, with end dates.
///
/// Nothing is returned for the category if any page, or any sale page,
/// fails to load.
pub async fn scrape_category(fetcher: &Fetcher, category: Category) -> Result<Vec<Listing>, ScrapeError> {
    let pages = fetch_category(fetcher, category).await?;

    let mut listings = Vec::new();
    for page in &pages {
        let batch = listings_from_page(page);
        let enriched = enrich_all(fetcher, batch).await;
        if let Some(err) = &enriched.aborted_by {
            warn!(
                %category,
                page = page.page,
                enriched = listings.len() + enriched.listings.len(),
                error = %err,
                "dropping category after enrichment failure"
            );
        }
        listings.extend(enriched.into_result()?);
    }

    info!(%category, pages = pages.len(), listings = listings.len(), "category scraped");
    Ok(listings)
}

/// Renders a category outcome: the listing array, or `{"error": "..."}`.
pub fn result_to_json(result: &Result<Vec<Listing>, ScrapeError>) -> Value {
    match result {
        Ok(listings) => serde_json::to_value(listings).unwrap_or_else(|err| error_to_json(&err)),
        Err(err) => error_to_json(err),
    }
}

/// One output line: `{"category": "<slug>", "result": <listings or error>}`.
pub fn category_line(category: Category, result: &Result<Vec<Listing>, ScrapeError>) -> Value {
    json!({ "category": category.as_str(), "result": result_to_json(result) })
}
