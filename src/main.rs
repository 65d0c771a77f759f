mod browser;
mod config;
mod dataset;
mod discovery;
mod error;
mod extract;
mod fields;
mod pipeline;
mod region;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dotenv::dotenv;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cfg = config::Config::from_env()?;
    info!(
        listing = %cfg.listing_url,
        keyword = %cfg.keyword,
        target = cfg.target_count,
        "starting crawl"
    );

    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let cancelled = cancelled.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received, finishing with what we have");
                cancelled.store(true, Ordering::Relaxed);
            }
        });
    }

    match pipeline::run(&cfg, cancelled).await {
        Ok(summary) => {
            info!(
                discovered = summary.discovered,
                extracted = summary.extracted,
                dataset_rows = summary.dataset_rows,
                "crawl complete"
            );
            Ok(())
        }
        Err(err) => {
            error!(error = %err, "crawl failed");
            Err(err.into())
        }
    }
}
