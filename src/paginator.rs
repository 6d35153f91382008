use tracing::{info, warn};

use crate::error::ScrapeError;
use crate::fetcher::Fetcher;
use crate::models::{Category, Page};

pub fn category_page_url(base_url: &str, category: Category, page: u32) -> String {
    format!(
        "{}/{}/on-sale?format=json&page={}",
        base_url,
        category.as_str(),
        page
    )
}

pub async fn get_page(fetcher: &Fetcher, category: Category, page: u32) -> Result<Page, ScrapeError> {
    let url = category_page_url(fetcher.config().base_url(), category, page);
    let body = fetcher.fetch(&url).await?;
    serde_json::from_str::<Page>(&body).map_err(|source| ScrapeError::Decode { url, source })
}

/// Walks the on-sale pages of `category` from page 1 until one reports fewer
/// items than the configured threshold. Any failure discards the pages
/// already collected.
pub async fn fetch_category(fetcher: &Fetcher, category: Category) -> Result<Vec<Page>, ScrapeError> {
    let threshold = fetcher.config().last_page_threshold;
    let mut pages = Vec::new();
    let mut page_number = 0;
    loop {
        page_number += 1;
        let page = match get_page(fetcher, category, page_number).await {
            Ok(page) => page,
            Err(err) => {
                warn!(%category, page = page_number, discarded = pages.len(), "category fetch failed");
                return Err(err);
            }
        };
        info!(%category, page = page_number, num_items = page.num_items, "fetched on-sale page");

        let is_last_page = page.num_items < threshold;
        pages.push(page);
        if is_last_page {
            break;
        }
    }

    Ok(pages)
}
