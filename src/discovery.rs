//! Link discovery over an infinite-scroll listing page.
//!
//! The listing has no page count, so the only end-of-content signal is the
//! scrollable height going stale: five consecutive scroll passes without a
//! height change terminate collection even before the target count is hit.

use std::collections::HashSet;

use tracing::info;
use url::Url;

use crate::browser::PageDriver;
use crate::config::Config;
use crate::error::CrawlError;

const PRODUCT_LINK_SELECTOR: &str = "div#products div.product-tuple-listing a.dp-widget-link";
const SITE_BASE: &str = "https://www.snapdeal.com";

/// Collects up to `cfg.target_count` unique detail-page URLs in first-seen
/// order. A listing page that never shows a product link is fatal for the
/// run.
pub async fn collect_links<D: PageDriver>(
    driver: &D,
    cfg: &Config,
) -> Result<Vec<String>, CrawlError> {
    driver.navigate(&cfg.listing_url).map_err(CrawlError::PageLoad)?;
    driver
        .wait_for_selector(PRODUCT_LINK_SELECTOR, cfg.listing_wait)
        .map_err(CrawlError::PageLoad)?;

    let mut links: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut stagnant = 0u32;
    let mut last_height = driver.scroll_height().map_err(CrawlError::PageLoad)?;

    while links.len() < cfg.target_count && stagnant < cfg.stagnation_limit {
        driver.scroll_by(0, cfg.scroll_step).map_err(CrawlError::PageLoad)?;
        tokio::time::sleep(cfg.scroll_pause).await;

        let hrefs = driver
            .query_attr(PRODUCT_LINK_SELECTOR, "href")
            .map_err(CrawlError::PageLoad)?;
        for href in hrefs {
            if !href.contains("/product/") {
                continue;
            }
            let Some(link) = canonicalize(&href) else {
                continue;
            };
            if seen.insert(link.clone()) {
                links.push(link);
                if links.len() >= cfg.target_count {
                    break;
                }
            }
        }

        let height = driver.scroll_height().map_err(CrawlError::PageLoad)?;
        if height == last_height {
            stagnant += 1;
        } else {
            stagnant = 0;
        }
        last_height = height;

        info!(collected = links.len(), stagnant, "scroll pass finished");
    }

    Ok(links)
}

/// Absolute scheme+host+path form of a listing href, query and fragment
/// stripped.
fn canonicalize(href: &str) -> Option<String> {
    let absolute = if href.starts_with("http") {
        href.to_string()
    } else {
        format!("{SITE_BASE}{href}")
    };
    let mut url = Url::parse(&absolute).ok()?;
    url.set_query(None);
    url.set_fragment(None);
    Some(url.to_string())
}
