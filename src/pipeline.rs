use chrono::{Local, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};

use crate::browser::{DriverError, PageDriver};
use crate::collector;
use crate::config::ScrapeConfig;
use crate::extractor;
use crate::fetcher::{self, Delays, FetchStatus};
use crate::input::BrandRecord;
use crate::progress::{NoProgress, ProgressSink};
use crate::search;
use crate::sites::SiteProfile;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("browser session failed to start: {0}")]
    SessionStart(#[source] DriverError),
}

/// One exported row: a product link accepted for a brand-keyword search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(rename = "Brand")]
    pub brand: String,
    #[serde(rename = "Keyword")]
    pub keyword: String,
    #[serde(rename = "Site")]
    pub site: String,
    #[serde(rename = "Product URL")]
    pub product_url: String,
    #[serde(rename = "Scraped At", with = "scraped_at")]
    pub scraped_at: NaiveDateTime,
}

impl MatchResult {
    pub fn scraped_at_text(&self) -> String {
        self.scraped_at.format(TIMESTAMP_FORMAT).to_string()
    }
}

mod scraped_at {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&text, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// A single brand × keyword × site search.
#[derive(Debug, Clone, Copy)]
pub struct SearchTask<'a> {
    pub brand: &'a str,
    pub keyword: &'a str,
    pub site: &'a SiteProfile,
}

impl SearchTask<'_> {
    fn row(&self, product_url: String) -> MatchResult {
        MatchResult {
            brand: self.brand.to_string(),
            keyword: self.keyword.to_string(),
            site: self.site.name.clone(),
            product_url,
            scraped_at: Local::now().naive_local().trunc_subsecs(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(Vec<MatchResult>),
    /// The run finished without accepting a single link.
    NoResults,
    /// Aborted between tasks; holds whatever was collected so far.
    Cancelled(Vec<MatchResult>),
}

enum TaskOutcome {
    Links(Vec<String>),
    Cancelled,
}

/// Drives every search task through one shared browser session.
pub struct Pipeline<'a> {
    config: &'a ScrapeConfig,
    sites: Vec<SiteProfile>,
    progress: Box<dyn ProgressSink + 'a>,
    cancel: CancellationToken,
    state: RunState,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a ScrapeConfig, sites: Vec<SiteProfile>) -> Self {
        Self {
            config,
            sites,
            progress: Box::new(NoProgress),
            cancel: CancellationToken::new(),
            state: RunState::Idle,
        }
    }

    pub fn with_progress(mut self, progress: impl ProgressSink + 'a) -> Self {
        self.progress = Box::new(progress);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn total_tasks(&self, brands: &[BrandRecord]) -> usize {
        brands.iter().map(|b| b.keywords.len()).sum::<usize>() * self.sites.len()
    }

    /// Runs every task in brand, keyword, site order.
    ///
    /// `launch` is called at most once, and only when there is work to do.
    /// The session it returns is shut down before this returns.
    pub async fn run<D, F>(
        &mut self,
        brands: &[BrandRecord],
        launch: F,
    ) -> Result<RunOutcome, PipelineError>
    where
        D: PageDriver,
        F: FnOnce() -> Result<D, DriverError>,
    {
        self.state = RunState::Running;

        let total = self.total_tasks(brands);
        if total == 0 {
            info!("Nothing to search");
            self.state = RunState::Completed;
            return Ok(RunOutcome::NoResults);
        }

        let mut driver = match launch() {
            Ok(driver) => driver,
            Err(e) => {
                error!(error = %e, "Could not start browser session");
                self.state = RunState::Failed;
                self.progress.finish("Failed");
                return Err(PipelineError::SessionStart(e));
            }
        };

        info!(tasks = total, sites = self.sites.len(), "Starting scrape");
        let (rows, cancelled) = self.run_tasks(&mut driver, brands, total).await;
        driver.shutdown();

        if cancelled {
            warn!(rows = rows.len(), "Run cancelled");
            self.state = RunState::Failed;
            self.progress.finish("Cancelled");
            return Ok(RunOutcome::Cancelled(rows));
        }

        self.state = RunState::Completed;
        info!(rows = rows.len(), "Scrape finished");
        if rows.is_empty() {
            self.progress.finish("No results");
            Ok(RunOutcome::NoResults)
        } else {
            self.progress.finish("Scraping completed!");
            Ok(RunOutcome::Completed(rows))
        }
    }

    async fn run_tasks<D: PageDriver>(
        &self,
        driver: &mut D,
        brands: &[BrandRecord],
        total: usize,
    ) -> (Vec<MatchResult>, bool) {
        let delays = Delays::from_config(self.config);
        let mut rows = Vec::new();
        let mut current = 0usize;

        for record in brands {
            for keyword in &record.keywords {
                for site in &self.sites {
                    if self.cancel.is_cancelled() {
                        return (rows, true);
                    }

                    let task = SearchTask {
                        brand: &record.brand,
                        keyword,
                        site,
                    };

                    current += 1;
                    let message = format!(
                        "Searching {} for '{} {}'...",
                        site.name, task.brand, task.keyword
                    );
                    let fraction = current as f64 / total as f64;
                    self.progress.update(fraction, &message);

                    let span = info_span!(
                        "task",
                        site = %site.name,
                        brand = %task.brand,
                        keyword = %task.keyword
                    );
                    let outcome = self.run_task(driver, &task, &delays).instrument(span).await;

                    match outcome {
                        Ok(TaskOutcome::Links(links)) => {
                            info!(
                                site = %site.name,
                                brand = %task.brand,
                                keyword = %task.keyword,
                                links = links.len(),
                                "Search done"
                            );
                            rows.extend(links.into_iter().map(|url| task.row(url)));
                        }
                        Ok(TaskOutcome::Cancelled) => return (rows, true),
                        Err(e) => {
                            warn!(
                                site = %site.name,
                                brand = %task.brand,
                                keyword = %task.keyword,
                                error = %e,
                                "Error scraping site, skipping"
                            );
                        }
                    }
                }
            }
        }

        (rows, false)
    }

    async fn run_task<D: PageDriver>(
        &self,
        driver: &mut D,
        task: &SearchTask<'_>,
        delays: &Delays,
    ) -> Result<TaskOutcome, DriverError> {
        let url = search::build_search_url(task.brand, task.keyword, task.site);

        if fetcher::fetch(driver, &url, delays, &self.cancel).await? == FetchStatus::Cancelled {
            return Ok(TaskOutcome::Cancelled);
        }

        let candidates = extractor::extract(driver, task.site)?;
        let links = collector::collect(
            &candidates,
            task.brand,
            task.site,
            &self.config.fuzzy,
            self.config.max_links_per_site,
        );
        Ok(TaskOutcome::Links(links))
    }
}
