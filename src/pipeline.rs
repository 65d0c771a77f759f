//! Run orchestration: one browser session, discovery, paced extraction,
//! then the dataset merge. The browser handle lives exactly one run and is
//! released on every exit path, including errors.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::browser::{ChromeDriver, PageDriver};
use crate::config::Config;
use crate::dataset;
use crate::discovery;
use crate::error::CrawlError;
use crate::extract;
use crate::fields::{ProductRecord, ResolverConfig};

pub struct RunSummary {
    pub discovered: usize,
    pub extracted: usize,
    pub dataset_rows: usize,
}

pub async fn run(cfg: &Config, cancelled: Arc<AtomicBool>) -> Result<RunSummary, CrawlError> {
    let driver = ChromeDriver::launch().map_err(CrawlError::PageLoad)?;
    run_with_driver(&driver, cfg, cancelled).await
}

pub async fn run_with_driver<D: PageDriver>(
    driver: &D,
    cfg: &Config,
    cancelled: Arc<AtomicBool>,
) -> Result<RunSummary, CrawlError> {
    let resolver = ResolverConfig::with_regions(cfg.known_regions.clone());

    let links = discovery::collect_links(driver, cfg).await?;
    info!(discovered = links.len(), keyword = %cfg.keyword, "link discovery finished");

    let mut records: Vec<ProductRecord> = Vec::new();
    for (visited, url) in links.iter().enumerate() {
        if cancelled.load(Ordering::Relaxed) {
            // Completed work is still merged below.
            warn!(visited, collected = records.len(), "shutdown requested, stopping early");
            break;
        }
        match extract::extract_product(driver, url, cfg, &resolver, &cancelled).await {
            Ok(record) => records.push(record),
            Err(err) => warn!(%url, error = %err, "dropping url"),
        }
        tokio::time::sleep(cfg.pacing).await;
    }

    let extracted = records.len();
    let dataset_rows = dataset::merge_into(&cfg.output_path, &records)?;
    info!(
        extracted,
        discovered = links.len(),
        dataset_rows,
        path = %cfg.output_path.display(),
        "run finished"
    );

    Ok(RunSummary {
        discovered: links.len(),
        extracted,
        dataset_rows,
    })
}
