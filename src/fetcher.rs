//! Loads a result page and waits for lazy content, using fixed delays only.

use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use crate::browser::{DriverError, PageDriver};
use crate::config::ScrapeConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delays {
    pub page_load: Duration,
    pub scroll: Duration,
}

impl Delays {
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self {
            page_load: config.page_delay(),
            scroll: config.scroll_delay(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Ready,
    /// The run was aborted during one of the waits.
    Cancelled,
}

/// Navigate, wait, scroll to the bottom, wait again.
pub async fn fetch<D: PageDriver + ?Sized>(
    driver: &mut D,
    url: &str,
    delays: &Delays,
    cancel: &CancellationToken,
) -> Result<FetchStatus, DriverError> {
    driver.navigate(url)?;
    if !wait(delays.page_load, cancel).await {
        return Ok(FetchStatus::Cancelled);
    }

    driver.scroll_to_bottom()?;
    if !wait(delays.scroll, cancel).await {
        return Ok(FetchStatus::Cancelled);
    }

    Ok(FetchStatus::Ready)
}

/// Sleeps for `duration`; returns false if cancelled first.
async fn wait(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = sleep(duration) => true,
        _ = cancel.cancelled() => false,
    }
}
