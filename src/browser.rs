//! Browser capability seam. Everything the pipeline needs from a browser is
//! the `PageDriver` trait; `ChromeDriver` is the production implementation
//! over one headless Chrome session, and tests substitute scripted fakes.

use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use scraper::{Html, Selector};

pub trait PageDriver {
    fn navigate(&self, url: &str) -> Result<()>;
    fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()>;
    /// Values of `attr` across every element currently matching `selector`.
    fn query_attr(&self, selector: &str, attr: &str) -> Result<Vec<String>>;
    fn scroll_by(&self, dx: i64, dy: i64) -> Result<()>;
    fn scroll_height(&self) -> Result<i64>;
    /// Current DOM serialized to HTML.
    fn content(&self) -> Result<String>;
}

/// One browser process and one tab, both released when the driver drops.
/// Never reused across runs.
pub struct ChromeDriver {
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeDriver {
    pub fn launch() -> Result<Self> {
        let browser = Browser::new(LaunchOptions {
            headless: true,
            window_size: Some((1920, 1080)),
            args: vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-dev-shm-usage"),
            ],
            ..Default::default()
        })
        .context("failed to launch headless chrome")?;
        let tab = browser.new_tab().context("failed to open tab")?;
        Ok(Self {
            _browser: browser,
            tab,
        })
    }
}

impl PageDriver for ChromeDriver {
    fn navigate(&self, url: &str) -> Result<()> {
        self.tab.navigate_to(url)?;
        self.tab.wait_until_navigated()?;
        Ok(())
    }

    fn wait_for_selector(&self, selector: &str, timeout: Duration) -> Result<()> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .with_context(|| format!("timed out waiting for `{selector}`"))?;
        Ok(())
    }

    fn query_attr(&self, selector: &str, attr: &str) -> Result<Vec<String>> {
        let html = self.tab.get_content()?;
        let document = Html::parse_document(&html);
        let parsed = Selector::parse(selector)
            .map_err(|e| anyhow!("invalid selector `{selector}`: {e}"))?;
        Ok(document
            .select(&parsed)
            .filter_map(|element| element.value().attr(attr).map(str::to_string))
            .collect())
    }

    fn scroll_by(&self, dx: i64, dy: i64) -> Result<()> {
        self.tab
            .evaluate(&format!("window.scrollBy({dx}, {dy});"), false)?;
        Ok(())
    }

    fn scroll_height(&self) -> Result<i64> {
        let result = self.tab.evaluate("document.body.scrollHeight", false)?;
        result
            .value
            .as_ref()
            .and_then(|v| v.as_i64())
            .ok_or_else(|| anyhow!("scrollHeight did not evaluate to a number"))
    }

    fn content(&self) -> Result<String> {
        self.tab.get_content().context("failed to read page content")
    }
}
