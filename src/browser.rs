use headless_chrome::{Browser, LaunchOptions, Tab};
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::config::ScrapeConfig;

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Elements whose text content is never rendered.
const HIDDEN_TAGS: [&str; 3] = ["script", "style", "noscript"];

/// Extra headroom on top of the longest fixed wait before the browser
/// connection is considered idle.
const IDLE_HEADROOM: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("could not start browser: {0:#}")]
    Launch(anyhow::Error),
    #[error("navigation to {url} failed: {error:#}")]
    Navigation { url: String, error: anyhow::Error },
    #[error("script execution failed: {0:#}")]
    Script(anyhow::Error),
    #[error("could not read page content: {0:#}")]
    Content(anyhow::Error),
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("browser session already closed")]
    Closed,
}

// ============================================================================
// Page capability
// ============================================================================

/// An element as seen through a selector query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageElement {
    /// Visible text, whitespace collapsed.
    pub text: String,
    pub attributes: HashMap<String, String>,
}

impl PageElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// The handful of browser operations the scraper relies on.
pub trait PageDriver {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError>;

    fn scroll_to_bottom(&mut self) -> Result<(), DriverError>;

    /// All elements matching a CSS selector on the current page. `href`
    /// values come back absolute, resolved against the page URL.
    fn query_selector_all(&mut self, selector: &str) -> Result<Vec<PageElement>, DriverError>;

    /// Releases the underlying session. Called once when a run ends.
    fn shutdown(&mut self) {}
}

/// Runs a selector over an HTML document the way the live page would.
pub fn select_elements(
    html: &str,
    base_url: Option<&Url>,
    selector: &str,
) -> Result<Vec<PageElement>, DriverError> {
    let parsed = Selector::parse(selector).map_err(|e| DriverError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{:?}", e),
    })?;
    let document = Html::parse_document(html);

    let elements = document
        .select(&parsed)
        .map(|el| {
            let text = visible_text(el);

            let mut attributes: HashMap<String, String> = el
                .value()
                .attrs()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect();

            if let (Some(base), Some(href)) = (base_url, attributes.get_mut("href")) {
                if let Ok(resolved) = base.join(href.as_str()) {
                    *href = resolved.to_string();
                }
            }

            PageElement { text, attributes }
        })
        .collect();

    Ok(elements)
}

/// Text as a browser renders it: adjacent text nodes run together, hidden
/// subtrees are skipped, whitespace collapses to single spaces.
fn visible_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    push_visible_text(element, &mut raw);
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn push_visible_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) if el.name() == "br" => out.push(' '),
            Node::Element(el) if HIDDEN_TAGS.contains(&el.name()) => {}
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    push_visible_text(child, out);
                }
            }
            _ => {}
        }
    }
}

// ============================================================================
// Headless Chrome session
// ============================================================================

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    pub chrome_path: Option<PathBuf>,
    pub idle_timeout: Duration,
}

impl BrowserOptions {
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self {
            headless: config.headless,
            chrome_path: config.chrome_path.clone(),
            idle_timeout: config.page_delay() + config.scroll_delay() + IDLE_HEADROOM,
        }
    }
}

/// One Chrome process with a single tab, reused for every search.
pub struct ChromeSession {
    browser: Option<Browser>,
    tab: Option<Arc<Tab>>,
}

impl ChromeSession {
    pub fn launch(options: &BrowserOptions) -> Result<Self, DriverError> {
        let args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-gpu"),
        ];

        let launch_options = LaunchOptions {
            headless: options.headless,
            window_size: Some((1920, 1080)),
            path: options.chrome_path.clone(),
            idle_browser_timeout: options.idle_timeout,
            args,
            ..Default::default()
        };

        let browser = Browser::new(launch_options).map_err(DriverError::Launch)?;
        let tab = browser.new_tab().map_err(DriverError::Launch)?;
        info!(headless = options.headless, "Browser session started");

        Ok(Self {
            browser: Some(browser),
            tab: Some(tab),
        })
    }

    fn tab(&self) -> Result<&Arc<Tab>, DriverError> {
        self.tab.as_ref().ok_or(DriverError::Closed)
    }
}

impl PageDriver for ChromeSession {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        debug!(%url, "Navigating");
        self.tab()?
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map(|_| ())
            .map_err(|error| DriverError::Navigation {
                url: url.to_string(),
                error,
            })
    }

    fn scroll_to_bottom(&mut self) -> Result<(), DriverError> {
        self.tab()?
            .evaluate(SCROLL_TO_BOTTOM, false)
            .map(|_| ())
            .map_err(DriverError::Script)
    }

    fn query_selector_all(&mut self, selector: &str) -> Result<Vec<PageElement>, DriverError> {
        let tab = self.tab()?;
        let html = tab.get_content().map_err(DriverError::Content)?;
        let base_url = Url::parse(&tab.get_url()).ok();
        select_elements(&html, base_url.as_ref(), selector)
    }

    fn shutdown(&mut self) {
        self.tab.take();
        if self.browser.take().is_some() {
            info!("Browser session closed");
        }
    }
}
