use crate::browser::{DriverError, PageDriver, PageElement};
use crate::sites::{FallbackMode, SiteProfile};

/// A product link found on a result page, before brand filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateLink {
    pub href: String,
    pub display_text: String,
    pub title_attr: String,
    pub alt_attr: String,
}

impl CandidateLink {
    /// Text, title and alt joined by spaces, for text-based matching.
    pub fn combined_text(&self) -> String {
        [
            self.display_text.as_str(),
            self.title_attr.as_str(),
            self.alt_attr.as_str(),
        ]
        .join(" ")
    }
}

/// Collects candidate links from the loaded page.
///
/// Fallback selectors are consulted only when the primary selector finds
/// nothing. Links without an href, or outside the site's domain, are dropped.
pub fn extract<D: PageDriver + ?Sized>(
    driver: &mut D,
    profile: &SiteProfile,
) -> Result<Vec<CandidateLink>, DriverError> {
    let mut elements = driver.query_selector_all(&profile.link_selector)?;

    if elements.is_empty() {
        for selector in &profile.fallback_selectors {
            let found = driver.query_selector_all(selector)?;
            let stop = profile.fallback_mode == FallbackMode::FirstNonEmpty && !found.is_empty();
            elements.extend(found);
            if stop {
                break;
            }
        }
    }

    Ok(elements
        .into_iter()
        .filter_map(|el| to_candidate(el, &profile.domain_substring))
        .collect())
}

fn to_candidate(element: PageElement, domain: &str) -> Option<CandidateLink> {
    let href = element.attr("href").filter(|href| !href.is_empty())?;
    if !href.contains(domain) {
        return None;
    }

    Some(CandidateLink {
        href: href.to_string(),
        display_text: element.text.trim().to_string(),
        title_attr: element.attr("title").unwrap_or_default().to_string(),
        alt_attr: element.attr("alt").unwrap_or_default().to_string(),
    })
}
