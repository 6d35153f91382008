//! Turns a flattened on-sale page into listings.
//!
//! Each listing starts at a `<div data-game_id=...>` and runs until the next
//! one. Listings whose sale tag is anything but `-100%` are dropped.

use tracing::debug;

use crate::flatten::{flatten, parse_markup, MarkupNode};
use crate::models::{Listing, Page, PartialListing, Platform};

pub const FREE_SALE_TAG: &str = "-100%";

const LISTING_ID_ATTR: &str = "data-game_id";
const LAZY_IMAGE_ATTR: &str = "data-lazy_src";
const BACKGROUND_IMAGE_ATTR: &str = "data-background_image";

enum ScanState {
    Skipping,
    Accumulating(PartialListing),
}

enum Rule {
    Genre,
    Author,
    Description,
    SaleTag,
    TitleLink,
    SalesLink,
}

fn rule_for(node: &MarkupNode) -> Option<Rule> {
    let class = node.attr("class")?;
    if node.is_element("div") {
        match class {
            "game_genre" => Some(Rule::Genre),
            "game_author" => Some(Rule::Author),
            "game_text" => Some(Rule::Description),
            "sale_tag" | "sale_tag reverse_sale" => Some(Rule::SaleTag),
            _ => None,
        }
    } else if node.is_element("a") {
        match class {
            "title game_link" => Some(Rule::TitleLink),
            "price_tag meta_tag sale" => Some(Rule::SalesLink),
            _ => None,
        }
    } else {
        None
    }
}

fn listing_id(node: &MarkupNode) -> Option<&str> {
    if !node.is_element("div") {
        return None;
    }
    node.attr(LISTING_ID_ATTR).filter(|id| !id.is_empty())
}

/// Text of the first child of `nodes[index]`, descending `depth` levels.
fn child_text(nodes: &[MarkupNode], index: usize, depth: usize) -> Option<&str> {
    let mut current = index;
    for _ in 0..depth {
        if nodes.get(current)?.child_count == 0 {
            return None;
        }
        current += 1;
    }
    nodes.get(current)?.text()
}

fn owned_text(nodes: &[MarkupNode], index: usize, depth: usize) -> String {
    child_text(nodes, index, depth).unwrap_or_default().to_string()
}

/// Applies one node to the listing being built. Returns `false` when the
/// sale tag rules the listing out.
fn accumulate(listing: &mut PartialListing, nodes: &[MarkupNode], index: usize) -> bool {
    let node = &nodes[index];

    if let Some(rule) = rule_for(node) {
        match rule {
            Rule::Genre => listing.genre = owned_text(nodes, index, 1),
            Rule::Author => listing.author = owned_text(nodes, index, 2),
            Rule::Description => listing.description = owned_text(nodes, index, 1),
            Rule::SaleTag => {
                let tag = child_text(nodes, index, 1).unwrap_or_default();
                if tag != FREE_SALE_TAG {
                    debug!(id = %listing.id, tag, "discarding listing, not free");
                    return false;
                }
            }
            Rule::TitleLink => {
                listing.link = node.attr("href").unwrap_or_default().to_string();
                listing.title = owned_text(nodes, index, 1);
            }
            Rule::SalesLink => {
                listing.sales_link = node.attr("href").unwrap_or_default().to_string();
            }
        }
        return true;
    }

    if node.is_element("img") {
        if let Some(src) = node.attr(LAZY_IMAGE_ATTR).filter(|src| !src.is_empty()) {
            listing.img_link = src.to_string();
        }
    } else if let Some(src) = node.attr(BACKGROUND_IMAGE_ATTR).filter(|src| !src.is_empty()) {
        listing.img_link = src.to_string();
    } else if node.is_element("span") {
        if let Some(platform) = node.attr("class").and_then(Platform::from_badge_class) {
            listing.platforms.push(platform);
        }
    }
    true
}

/// Scans `nodes` and returns the free listings in document order, end date
/// not yet set. `declared_item_count` only sizes the output.
pub fn extract(nodes: &[MarkupNode], declared_item_count: usize) -> Vec<Listing> {
    let mut listings = Vec::with_capacity(declared_item_count);
    let mut state = ScanState::Skipping;

    for index in 0..nodes.len() {
        if let Some(id) = listing_id(&nodes[index]) {
            if let ScanState::Accumulating(done) = state {
                listings.push(done.into_listing());
            }
            state = ScanState::Accumulating(PartialListing::new(id));
            continue;
        }

        state = match state {
            ScanState::Skipping => ScanState::Skipping,
            ScanState::Accumulating(mut listing) => {
                if accumulate(&mut listing, nodes, index) {
                    ScanState::Accumulating(listing)
                } else {
                    ScanState::Skipping
                }
            }
        };
    }

    if let ScanState::Accumulating(done) = state {
        listings.push(done.into_listing());
    }

    listings
}

/// Parses the markup carried by `page` and extracts its free listings.
pub fn listings_from_page(page: &Page) -> Vec<Listing> {
    let document = parse_markup(&page.content);
    let nodes = flatten(&document);
    let listings = extract(&nodes, page.num_items);
    debug!(
        page = page.page,
        num_items = page.num_items,
        free = listings.len(),
        "extracted listings"
    );
    listings
}
