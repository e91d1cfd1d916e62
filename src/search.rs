//! Site-specific search terms and result-page URLs.

use crate::sites::{SiteProfile, TermSeparator};

/// Only the first result page is ever requested.
pub const FIRST_PAGE: u32 = 1;

/// Joins brand and keyword with a space and encodes it for the site.
pub fn build_term(brand: &str, keyword: &str, separator: &TermSeparator) -> String {
    let term = format!("{} {}", brand, keyword);
    match separator {
        TermSeparator::Hyphen => term.replace(' ', "-").to_lowercase(),
        TermSeparator::Literal(token) => term.replace(' ', token),
    }
}

/// Result-page URL for `brand keyword` on the given site.
pub fn build_search_url(brand: &str, keyword: &str, profile: &SiteProfile) -> String {
    let term = build_term(brand, keyword, &profile.separator);
    // Page first, so a literal "{page}" inside the term is left alone.
    profile
        .url_template
        .replace("{page}", &FIRST_PAGE.to_string())
        .replace("{search_term}", &term)
}
