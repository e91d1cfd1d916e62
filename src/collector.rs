use std::collections::HashSet;

use crate::config::FuzzySettings;
use crate::extractor::CandidateLink;
use crate::matcher;
use crate::sites::SiteProfile;

/// Whether a candidate link belongs to the brand.
///
/// URL-matched sites are always gated on the brand. Text-matched sites accept
/// every candidate when fuzzy matching is off.
pub fn is_relevant(
    link: &CandidateLink,
    brand: &str,
    profile: &SiteProfile,
    fuzzy: &FuzzySettings,
) -> bool {
    if profile.brand_must_appear_in_url {
        return matcher::matches(&link.href, brand, fuzzy.threshold, fuzzy.enabled);
    }
    if !fuzzy.enabled {
        return true;
    }
    matcher::matches(&link.combined_text(), brand, fuzzy.threshold, true)
}

/// Unique relevant hrefs in page order, at most `cap` of them.
pub fn collect(
    candidates: &[CandidateLink],
    brand: &str,
    profile: &SiteProfile,
    fuzzy: &FuzzySettings,
    cap: usize,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut accepted = Vec::new();

    for link in candidates {
        if accepted.len() >= cap {
            break;
        }
        if is_relevant(link, brand, profile, fuzzy) && seen.insert(link.href.as_str()) {
            accepted.push(link.href.clone());
        }
    }

    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites::{FallbackMode, TermSeparator};

    fn profile(brand_in_url: bool) -> SiteProfile {
        SiteProfile {
            name: "Shop".to_string(),
            url_template: "https://shop.test/?q={search_term}".to_string(),
            separator: TermSeparator::Literal("+".to_string()),
            link_selector: "a".to_string(),
            fallback_selectors: vec![],
            fallback_mode: FallbackMode::UnionAll,
            domain_substring: "shop.test".to_string(),
            brand_must_appear_in_url: brand_in_url,
        }
    }

    fn link(href: &str, text: &str) -> CandidateLink {
        CandidateLink {
            href: href.to_string(),
            display_text: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn text_sites_match_on_text_title_and_alt() {
        let fuzzy = FuzzySettings::enabled(80);
        let by_alt = CandidateLink {
            href: "https://shop.test/p/1".to_string(),
            alt_attr: "ACME logo".to_string(),
            ..Default::default()
        };
        let unrelated = link("https://shop.test/acme/2", "Globex Shoes");
        let text_site = profile(false);

        assert!(is_relevant(&by_alt, "Acme", &text_site, &fuzzy));
        assert!(!is_relevant(&unrelated, "Acme", &text_site, &fuzzy));
    }

    #[test]
    fn url_sites_match_on_href() {
        let fuzzy = FuzzySettings::enabled(80);
        let url_site = profile(true);
        let in_url = link("https://shop.test/acme-shoes", "nothing");
        let in_text = link("https://shop.test/globex", "Acme");

        assert!(is_relevant(&in_url, "Acme", &url_site, &fuzzy));
        assert!(!is_relevant(&in_text, "Acme", &url_site, &fuzzy));
    }

    #[test]
    fn disabled_fuzzy_gates_only_url_sites() {
        let fuzzy = FuzzySettings::disabled();
        let unrelated = link("https://shop.test/globex", "Globex");
        assert!(is_relevant(&unrelated, "Acme", &profile(false), &fuzzy));
        assert!(!is_relevant(&unrelated, "Acme", &profile(true), &fuzzy));
        let upper = link("https://shop.test/ACME-1", "");
        assert!(is_relevant(&upper, "acme", &profile(true), &fuzzy));
    }

    #[test]
    fn duplicates_collapse_and_cap_holds() {
        let fuzzy = FuzzySettings::enabled(80);
        let candidates: Vec<_> = (0..20)
            .map(|i| format!("https://shop.test/p/{}", i % 7))
            .map(|href| link(&href, "Acme deal"))
            .collect();

        for cap in [1, 3, 7, 10, 50] {
            let accepted = collect(&candidates, "Acme", &profile(false), &fuzzy, cap);
            assert!(accepted.len() <= cap);
            assert_eq!(accepted.len(), cap.min(7));
        }

        let accepted = collect(&candidates, "Acme", &profile(false), &fuzzy, 2);
        assert_eq!(accepted, ["https://shop.test/p/0", "https://shop.test/p/1"]);
        assert!(collect(&[], "Acme", &profile(false), &fuzzy, 5).is_empty());
    }
}
