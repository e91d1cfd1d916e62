use once_cell::sync::Lazy;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;

// ============================================================================
// Site Profiles
// ============================================================================

/// How spaces in `brand keyword` are encoded for a site's search URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermSeparator {
    /// Lowercase the term and join words with `-`.
    Hyphen,
    /// Replace each space with this literal token, case untouched.
    Literal(String),
}

/// What to do when the primary selector finds nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackMode {
    /// Query every fallback selector and keep all results.
    #[default]
    UnionAll,
    /// Stop at the first fallback selector that finds anything.
    FirstNonEmpty,
}

/// Static description of one marketplace search page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteProfile {
    pub name: String,
    /// Contains `{search_term}` and `{page}` placeholders.
    pub url_template: String,
    pub separator: TermSeparator,
    pub link_selector: String,
    pub fallback_selectors: Vec<String>,
    pub fallback_mode: FallbackMode,
    /// Links whose href lacks this substring are dropped.
    pub domain_substring: String,
    /// Match the brand against the href instead of the link text.
    pub brand_must_appear_in_url: bool,
}

/// The supported marketplaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Site {
    Alibaba,
    DHgate,
    MadeInChina,
}

impl Site {
    pub const ALL: [Site; 3] = [Site::Alibaba, Site::DHgate, Site::MadeInChina];

    pub fn name(self) -> &'static str {
        match self {
            Site::Alibaba => "Alibaba",
            Site::DHgate => "DHgate",
            Site::MadeInChina => "Made-in-China",
        }
    }

    pub fn profile(self) -> &'static SiteProfile {
        &BUILTIN_PROFILES[self as usize]
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Site {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "alibaba" => Ok(Site::Alibaba),
            "dhgate" => Ok(Site::DHgate),
            "made-in-china" | "madeinchina" => Ok(Site::MadeInChina),
            other => Err(ConfigError::UnknownSite(other.to_string())),
        }
    }
}

const ALIBABA_SEARCH: &str =
    "https://www.alibaba.com/trade/search?SearchText={search_term}&page={page}";
const DHGATE_SEARCH: &str =
    "https://www.dhgate.com/wholesale/search.do?act=search&searchkey={search_term}&pageNum={page}";
const MADE_IN_CHINA_SEARCH: &str = concat!(
    "https://www.made-in-china.com/products-search/",
    "hot-china-products/{search_term}.html?page={page}"
);

// Indexed by `Site as usize`.
static BUILTIN_PROFILES: Lazy<[SiteProfile; 3]> = Lazy::new(|| {
    [
        SiteProfile {
            name: Site::Alibaba.name().to_string(),
            url_template: ALIBABA_SEARCH.to_string(),
            separator: TermSeparator::Literal("%20".to_string()),
            link_selector: r#"a[href*="/product-detail/"]"#.to_string(),
            fallback_selectors: vec![],
            fallback_mode: FallbackMode::UnionAll,
            domain_substring: "alibaba.com".to_string(),
            brand_must_appear_in_url: true,
        },
        SiteProfile {
            name: Site::DHgate.name().to_string(),
            url_template: DHGATE_SEARCH.to_string(),
            separator: TermSeparator::Literal("+".to_string()),
            link_selector: r#"a[href*="/product/"]"#.to_string(),
            fallback_selectors: vec![],
            fallback_mode: FallbackMode::UnionAll,
            domain_substring: "dhgate.com".to_string(),
            brand_must_appear_in_url: false,
        },
        SiteProfile {
            name: Site::MadeInChina.name().to_string(),
            url_template: MADE_IN_CHINA_SEARCH.to_string(),
            separator: TermSeparator::Hyphen,
            link_selector: r#"a[href*="/product/"]"#.to_string(),
            fallback_selectors: vec![
                r#"a[href*="/prod/"]"#.to_string(),
                ".item-link a".to_string(),
                ".product-item a".to_string(),
            ],
            fallback_mode: FallbackMode::UnionAll,
            domain_substring: "made-in-china.com".to_string(),
            brand_must_appear_in_url: false,
        },
    ]
});

/// Profiles for the active sites, in registry order.
pub fn active_profiles(active: &BTreeSet<Site>) -> Vec<SiteProfile> {
    Site::ALL
        .iter()
        .filter(|site| active.contains(site))
        .map(|site| site.profile().clone())
        .collect()
}
