#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use brandscout::browser::{select_elements, DriverError, PageDriver, PageElement};
use brandscout::progress::ProgressSink;
use brandscout::sites::{FallbackMode, SiteProfile, TermSeparator};
use url::Url;

const BLANK_PAGE: &str = "<html></html>";

/// What the fake browser did, shared with the test after the driver is moved
/// into the pipeline.
#[derive(Debug, Default)]
pub struct DriverLog {
    pub visited: Vec<String>,
    pub scrolls: usize,
    pub shut_down: bool,
}

/// Serves canned HTML per URL through the same selector code the real
/// session uses.
pub struct FakeBrowser {
    pages: HashMap<String, String>,
    broken: HashSet<String>,
    current: Option<String>,
    log: Rc<RefCell<DriverLog>>,
}

impl FakeBrowser {
    pub fn new() -> (Self, Rc<RefCell<DriverLog>>) {
        let log = Rc::new(RefCell::new(DriverLog::default()));
        let browser = Self {
            pages: HashMap::new(),
            broken: HashSet::new(),
            current: None,
            log: Rc::clone(&log),
        };
        (browser, log)
    }

    pub fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn broken(mut self, url: &str) -> Self {
        self.broken.insert(url.to_string());
        self
    }
}

impl PageDriver for FakeBrowser {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.log.borrow_mut().visited.push(url.to_string());
        if self.broken.contains(url) {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                error: anyhow::anyhow!("net::ERR_CONNECTION_RESET"),
            });
        }
        self.current = Some(url.to_string());
        Ok(())
    }

    fn scroll_to_bottom(&mut self) -> Result<(), DriverError> {
        self.log.borrow_mut().scrolls += 1;
        Ok(())
    }

    fn query_selector_all(&mut self, selector: &str) -> Result<Vec<PageElement>, DriverError> {
        let Some(url) = &self.current else {
            return Ok(vec![]);
        };
        let html = self.pages.get(url).map_or(BLANK_PAGE, String::as_str);
        let base = Url::parse(url).ok();
        select_elements(html, base.as_ref(), selector)
    }

    fn shutdown(&mut self) {
        self.log.borrow_mut().shut_down = true;
    }
}

#[derive(Clone, Default)]
pub struct RecordingProgress {
    pub updates: Rc<RefCell<Vec<(f64, String)>>>,
    pub finished: Rc<RefCell<Option<String>>>,
}

impl ProgressSink for RecordingProgress {
    fn update(&self, fraction: f64, message: &str) {
        let entry = (fraction, message.to_string());
        self.updates.borrow_mut().push(entry);
    }

    fn finish(&self, message: &str) {
        *self.finished.borrow_mut() = Some(message.to_string());
    }
}

/// Single-site profile on `x.test` with a `+` separator.
pub fn test_site(brand_in_url: bool) -> SiteProfile {
    SiteProfile {
        name: "X".to_string(),
        url_template: "https://x.test/search?q={search_term}".to_string(),
        separator: TermSeparator::Literal("+".to_string()),
        link_selector: r#"a[href*="/item/"]"#.to_string(),
        fallback_selectors: vec![],
        fallback_mode: FallbackMode::UnionAll,
        domain_substring: "x.test".to_string(),
        brand_must_appear_in_url: brand_in_url,
    }
}
