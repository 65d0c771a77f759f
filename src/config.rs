use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use url::Url;

const DEFAULT_LISTING_URL: &str = "https://www.snapdeal.com/search?keyword=rakhi";

const KNOWN_REGIONS: &[&str] = &[
    "Indore",
    "Rajasthan",
    "Assam",
    "Delhi",
    "Kolkata",
    "Surat",
    "Lucknow",
    "Tamil Nadu",
    "Mumbai",
    "Punjab",
    "Uttar Pradesh",
];

/// Process configuration. One `Config` covers one run: one listing URL,
/// one keyword, one output file.
#[derive(Debug, Clone)]
pub struct Config {
    pub listing_url: String,
    /// Search keyword derived from the listing URL, capitalized. Written
    /// into every record's `type` column.
    pub keyword: String,
    pub target_count: usize,
    pub output_path: PathBuf,
    /// Retries allowed per detail page after the initial attempt.
    pub retry_budget: u32,
    pub listing_wait: Duration,
    pub detail_wait: Duration,
    pub scroll_step: i64,
    pub scroll_pause: Duration,
    /// Consecutive no-growth scroll passes before discovery gives up.
    pub stagnation_limit: u32,
    /// Delay between detail page visits.
    pub pacing: Duration,
    /// Delay before re-attempting a failed extraction.
    pub retry_pause: Duration,
    pub known_regions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            keyword: "Rakhi".to_string(),
            target_count: 300,
            output_path: PathBuf::from("snapdeal_scraped_data.csv"),
            retry_budget: 2,
            listing_wait: Duration::from_secs(20),
            detail_wait: Duration::from_secs(15),
            scroll_step: 5000,
            scroll_pause: Duration::from_secs(2),
            stagnation_limit: 5,
            pacing: Duration::from_millis(1500),
            retry_pause: Duration::from_secs(2),
            known_regions: KNOWN_REGIONS.iter().map(|r| r.to_string()).collect(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();

        if let Ok(url) = env::var("LISTING_URL") {
            cfg.listing_url = url;
        }
        cfg.keyword = keyword_from_listing_url(&cfg.listing_url)?;

        if let Ok(v) = env::var("TARGET_PRODUCT_COUNT") {
            cfg.target_count = v
                .parse()
                .context("TARGET_PRODUCT_COUNT must be an integer")?;
        }
        if let Ok(v) = env::var("OUTPUT_PATH") {
            cfg.output_path = PathBuf::from(v);
        }
        if let Ok(v) = env::var("RETRY_BUDGET") {
            cfg.retry_budget = v.parse().context("RETRY_BUDGET must be an integer")?;
        }

        Ok(cfg)
    }
}

fn keyword_from_listing_url(listing_url: &str) -> Result<String> {
    let url = Url::parse(listing_url).context("LISTING_URL is not a valid URL")?;
    let Some(keyword) = url
        .query_pairs()
        .find(|(name, _)| name == "keyword")
        .map(|(_, value)| value.into_owned())
    else {
        bail!("LISTING_URL has no keyword= query parameter");
    };
    Ok(capitalize(&keyword))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_comes_from_query_parameter() {
        let keyword =
            keyword_from_listing_url("https://www.snapdeal.com/search?keyword=pickle&sort=plrty")
                .unwrap();
        assert_eq!(keyword, "Pickle");
    }

    #[test]
    fn listing_url_without_keyword_is_rejected() {
        assert!(keyword_from_listing_url("https://www.snapdeal.com/search").is_err());
    }

    #[test]
    fn capitalize_handles_empty_input() {
        assert_eq!(capitalize(""), "");
        assert_eq!(capitalize("rakhi"), "Rakhi");
    }
}
