//! End-of-run summary of the collected links.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::pipeline::MatchResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total_urls: usize,
    pub brands: usize,
    pub sites: usize,
    pub keywords: usize,
    /// Rows per site, most first; ties by name.
    pub per_site: Vec<(String, usize)>,
}

impl RunSummary {
    pub fn from_rows(rows: &[MatchResult]) -> Self {
        let brands: HashSet<&str> = rows.iter().map(|r| r.brand.as_str()).collect();
        let keywords: HashSet<&str> = rows.iter().map(|r| r.keyword.as_str()).collect();

        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for row in rows {
            *counts.entry(row.site.as_str()).or_insert(0) += 1;
        }
        let mut per_site: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(site, n)| (site.to_string(), n))
            .collect();
        per_site.sort_by(|a, b| b.1.cmp(&a.1));

        Self {
            total_urls: rows.len(),
            brands: brands.len(),
            sites: per_site.len(),
            keywords: keywords.len(),
            per_site,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Results Summary ===")?;
        writeln!(f, "Total URLs:        {}", self.total_urls)?;
        writeln!(f, "Brands Processed:  {}", self.brands)?;
        writeln!(f, "Sites Used:        {}", self.sites)?;
        writeln!(f, "Keywords Used:     {}", self.keywords)?;
        for (site, count) in &self.per_site {
            writeln!(f, "  {site}: {count}")?;
        }
        write!(f, "=======================")
    }
}
