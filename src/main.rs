use std::time::Duration;

use anyhow::Error;
use async_channel::{Receiver, Sender};
use clap::Parser;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::ScraperConfig;
use crate::fetcher::Fetcher;
use crate::logging::{init_logging, LogFormat};
use crate::models::Category;
use crate::pipeline::{category_line, scrape_category};

mod config;
mod enricher;
mod error;
mod extractor;
mod fetcher;
mod flatten;
mod logging;
mod models;
mod paginator;
mod pipeline;

/// Lists the items of an itch.io-style storefront that are currently 100% off.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Categories to scrape; all of them when omitted.
    #[clap(short, long, value_enum)]
    category: Vec<Category>,
    /// Categories scraped at the same time.
    #[clap(short, long, default_value_t = 1)]
    workers: usize,
    #[clap(long, env = "FREEBIES_BASE_URL", default_value = config::DEFAULT_BASE_URL)]
    base_url: String,
    /// Attempts per request when rate limited, counting the first.
    #[clap(long, env = "FREEBIES_MAX_ATTEMPTS", default_value_t = 5)]
    max_attempts: u32,
    #[clap(long, env = "FREEBIES_BACKOFF_MS", default_value_t = 2000)]
    backoff_ms: u64,
    #[clap(long, env = "FREEBIES_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,
    /// Sale pages fetched at once per category.
    #[clap(long, env = "FREEBIES_ENRICH_CONCURRENCY", default_value_t = 1)]
    enrich_concurrency: usize,
    #[clap(long, value_enum, env = "FREEBIES_LOG_FORMAT", default_value = "text")]
    log_format: LogFormat,
}

impl Args {
    fn scraper_config(&self) -> ScraperConfig {
        ScraperConfig {
            max_attempts: self.max_attempts,
            backoff: Duration::from_millis(self.backoff_ms),
            request_timeout: Duration::from_secs(self.timeout_secs),
            enrich_concurrency: self.enrich_concurrency,
            ..ScraperConfig::with_base_url(self.base_url.clone())
        }
    }

    fn categories(&self) -> Vec<Category> {
        if self.category.is_empty() {
            Category::ALL.to_vec()
        } else {
            self.category.clone()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args: Args = Args::parse();
    init_logging(args.log_format, "info")?;

    let fetcher = Fetcher::new(args.scraper_config())?;
    let categories = args.categories();

    let (category_send, category_recv) = async_channel::unbounded::<Category>();
    let (result_send, result_recv) = async_channel::unbounded::<(Category, serde_json::Value)>();

    let producer = produce_categories(categories.clone(), category_send);
    let mut consumers = consume_categories(&fetcher, category_recv, result_send, args.workers);

    consumers.insert(0, producer);
    for outcome in futures::future::join_all(consumers).await {
        outcome??;
    }

    let mut results = Vec::with_capacity(categories.len());
    while let Ok(result) = result_recv.try_recv() {
        results.push(result);
    }
    results.sort_by_key(|(category, _)| Category::ALL.iter().position(|c| c == category));

    for (_, line) in results {
        println!("{line}");
    }

    Ok(())
}

fn produce_categories(categories: Vec<Category>, category_send: Sender<Category>) -> JoinHandle<Result<(), Error>> {
    tokio::spawn(async move {
        for category in categories {
            category_send.send(category).await?;
        }
        category_send.close();
        Ok(())
    })
}

fn consume_categories(
    fetcher: &Fetcher,
    category_recv: Receiver<Category>,
    result_send: Sender<(Category, serde_json::Value)>,
    workers: usize,
) -> Vec<JoinHandle<Result<(), Error>>> {
    (0..workers.max(1))
        .map(|worker| {
            let recv = category_recv.clone();
            let send = result_send.clone();
            let fetcher = fetcher.clone();
            tokio::spawn(async move {
                while let Ok(category) = recv.recv().await {
                    info!(worker, %category, "scraping category");
                    let result = scrape_category(&fetcher, category).await;
                    match &result {
                        Ok(listings) => info!(worker, %category, listings = listings.len(), "category done"),
                        Err(err) => warn!(worker, %category, error = %err, "category failed"),
                    }
                    send.send((category, category_line(category, &result))).await?;
                }
                Ok(())
            })
        })
        .collect::<Vec<_>>()
}
