use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::sites::Site;

pub const THRESHOLD_RANGE: RangeInclusive<u8> = 70..=100;
pub const MAX_LINKS_RANGE: RangeInclusive<usize> = 1..=50;
pub const SCROLL_DELAY_RANGE: RangeInclusive<u64> = 1..=10;
pub const PAGE_DELAY_RANGE: RangeInclusive<u64> = 3..=15;

/// Threshold used when fuzzy matching is switched off.
pub const EXACT_THRESHOLD: u8 = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown site '{0}' (expected alibaba, dhgate or made-in-china)")]
    UnknownSite(String),
    #[error("at least one site must be selected")]
    NoSites,
    #[error("fuzzy threshold {0} is outside 70..=100")]
    Threshold(u8),
    #[error("max links per site {0} is outside 1..=50")]
    MaxLinks(usize),
    #[error("scroll delay {0}s is outside 1..=10")]
    ScrollDelay(u64),
    #[error("page load delay {0}s is outside 3..=15")]
    PageDelay(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuzzySettings {
    pub enabled: bool,
    /// Percentage, meaningful only when `enabled`.
    pub threshold: u8,
}

impl FuzzySettings {
    pub fn enabled(threshold: u8) -> Self {
        Self {
            enabled: true,
            threshold,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            threshold: EXACT_THRESHOLD,
        }
    }
}

/// Everything the scraping core needs for one run.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub sites: BTreeSet<Site>,
    pub fuzzy: FuzzySettings,
    pub max_links_per_site: usize,
    pub scroll_delay_secs: u64,
    pub page_delay_secs: u64,
    pub headless: bool,
    pub chrome_path: Option<PathBuf>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            sites: Site::ALL.into_iter().collect(),
            fuzzy: FuzzySettings::enabled(80),
            max_links_per_site: 12,
            scroll_delay_secs: 3,
            page_delay_secs: 5,
            headless: true,
            chrome_path: None,
        }
    }
}

impl ScrapeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sites.is_empty() {
            return Err(ConfigError::NoSites);
        }
        if !THRESHOLD_RANGE.contains(&self.fuzzy.threshold) {
            return Err(ConfigError::Threshold(self.fuzzy.threshold));
        }
        if !MAX_LINKS_RANGE.contains(&self.max_links_per_site) {
            return Err(ConfigError::MaxLinks(self.max_links_per_site));
        }
        if !SCROLL_DELAY_RANGE.contains(&self.scroll_delay_secs) {
            return Err(ConfigError::ScrollDelay(self.scroll_delay_secs));
        }
        if !PAGE_DELAY_RANGE.contains(&self.page_delay_secs) {
            return Err(ConfigError::PageDelay(self.page_delay_secs));
        }
        Ok(())
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_secs(self.page_delay_secs)
    }

    pub fn scroll_delay(&self) -> Duration {
        Duration::from_secs(self.scroll_delay_secs)
    }

    /// Rough upper bound on links per brand-keyword pair.
    pub fn expected_links_per_pair(&self) -> usize {
        self.sites.len() * self.max_links_per_site
    }
}

impl fmt::Display for ScrapeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.sites.iter().map(|s| s.name()).collect();
        writeln!(f, "Sites Selected:        {}", names.len())?;
        writeln!(f, "Sites:                 {}", names.join(", "))?;
        if self.fuzzy.enabled {
            writeln!(f, "Fuzzy Matching:        Enabled")?;
            writeln!(f, "Threshold:             {}%", self.fuzzy.threshold)?;
        } else {
            writeln!(f, "Fuzzy Matching:        Disabled")?;
            writeln!(f, "Threshold:             N/A")?;
        }
        writeln!(f, "Max Links/Site:        {}", self.max_links_per_site)?;
        let expected = self.expected_links_per_pair();
        write!(f, "Expected Links/Pair:   ~{expected}")
    }
}
