//! Brand-protection scraper for B2B marketplaces.
//!
//! Searches marketplace result pages for `brand keyword` queries, keeps the
//! product links that plausibly belong to the brand, and exports them as a
//! flat table.

pub mod browser;
pub mod collector;
pub mod config;
pub mod export;
pub mod extractor;
pub mod fetcher;
pub mod input;
pub mod matcher;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod search;
pub mod sites;

pub use config::ScrapeConfig;
pub use pipeline::{MatchResult, Pipeline, RunOutcome, RunState};
