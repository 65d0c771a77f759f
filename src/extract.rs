//! Single detail-page extraction with a bounded retry budget.

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

use crate::browser::PageDriver;
use crate::config::Config;
use crate::error::CrawlError;
use crate::fields::{ProductRecord, RawFieldTable, ResolverConfig, Scraped};

const TITLE_SELECTOR: &str = ".pdp-e-i-head";

static TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse(TITLE_SELECTOR).unwrap());
static PRICE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("span.payBlkBig").unwrap());
static DESC_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".detailssubbox[itemprop='description']").unwrap());
static SPEC_ROW_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("table.product-spec tr").unwrap());
static SPEC_CELL_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());
static FEATURE_ITEM_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".spec-body.p-keyfeatures ul.dtls-list li").unwrap());
static FEATURE_TEXT_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse(".h-content").unwrap());

/// Extracts one ProductRecord, retrying failed attempts until the budget
/// runs out. Exhaustion yields `CrawlError::Extraction`; the caller drops
/// the URL and moves on. A shutdown request abandons the URL immediately
/// instead of retrying.
pub async fn extract_product<D: PageDriver>(
    driver: &D,
    url: &str,
    cfg: &Config,
    resolver: &ResolverConfig,
    cancelled: &AtomicBool,
) -> Result<ProductRecord, CrawlError> {
    let mut remaining = cfg.retry_budget;
    loop {
        match extract_once(driver, url, cfg, resolver) {
            Ok(record) => return Ok(record),
            Err(err) => {
                if cancelled.load(Ordering::Relaxed) {
                    return Err(CrawlError::Extraction {
                        url: url.to_string(),
                        reason: "abandoned on shutdown".to_string(),
                    });
                }
                if remaining == 0 {
                    return Err(CrawlError::Extraction {
                        url: url.to_string(),
                        reason: err.to_string(),
                    });
                }
                remaining -= 1;
                warn!(%url, error = %err, remaining, "extraction attempt failed, retrying");
                tokio::time::sleep(cfg.retry_pause).await;
            }
        }
    }
}

fn extract_once<D: PageDriver>(
    driver: &D,
    url: &str,
    cfg: &Config,
    resolver: &ResolverConfig,
) -> Result<ProductRecord> {
    driver.navigate(url)?;
    driver.wait_for_selector(TITLE_SELECTOR, cfg.detail_wait)?;

    let html = driver.content()?;
    let document = Html::parse_document(&html);

    let scraped = Scraped {
        title: select_text(&document, &TITLE_SEL),
        price: parse_price(&select_text(&document, &PRICE_SEL)),
        description: select_text(&document, &DESC_SEL),
    };

    let specs = collect_raw_fields(&document);
    debug!(%url, fields = specs.len(), "raw field table collected");

    Ok(resolver.resolve(&specs, &scraped, &cfg.keyword))
}

/// Specification-table rows plus "key: value" feature bullets, keyed by
/// lower-cased trimmed label. A repeated literal label overwrites.
fn collect_raw_fields(document: &Html) -> RawFieldTable {
    let mut specs = RawFieldTable::new();

    for row in document.select(&SPEC_ROW_SEL) {
        let mut cells = row.select(&SPEC_CELL_SEL);
        if let (Some(label), Some(value)) = (cells.next(), cells.next()) {
            let label = text_of(label).trim().to_lowercase();
            if !label.is_empty() {
                specs.insert(label, text_of(value).trim().to_string());
            }
        }
    }

    for item in document.select(&FEATURE_ITEM_SEL) {
        let Some(content) = item.select(&FEATURE_TEXT_SEL).next() else {
            continue;
        };
        let text = text_of(content);
        if let Some((label, value)) = text.split_once(':') {
            let label = label.trim().to_lowercase();
            if !label.is_empty() {
                specs.insert(label, value.trim().to_string());
            }
        }
    }

    specs
}

/// Strips currency and thousands markup and parses a decimal price.
/// Unparseable or absent text is `None`, never zero.
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned = text.replace("Rs.", "").replace(['₹', ','], "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

fn select_text(document: &Html, selector: &Selector) -> String {
    document
        .select(selector)
        .next()
        .map(text_of)
        .unwrap_or_default()
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}
