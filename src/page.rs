// SPDX-License-Identifier: PMPL-1.0-or-later
//! Browser page abstraction.
//!
//! The runner only needs three things from a browser tab: navigate, count
//! elements matching a selector, and evaluate a script returning JSON.
//! Whoever opens a page closes it.
//! [`crate::browser::ChromePage`] implements this over the DevTools protocol.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::error::{AuditError, Result};

/// A loaded browser tab
#[async_trait]
pub trait Page: Send + Sync {
    /// Navigate and wait for the load to finish
    async fn goto(&self, url: &str) -> Result<()>;

    /// Number of elements matching `selector`; an invalid selector counts as zero
    async fn count(&self, selector: &str) -> Result<usize>;

    /// Evaluate a script, awaiting a returned promise, and return its value
    /// as JSON (`Null` for `undefined`)
    async fn evaluate(&self, script: &str) -> Result<serde_json::Value>;

    /// Release the tab and any storage it owns
    async fn close(&self) -> Result<()>;
}

/// Opens isolated pages, one per scenario
#[async_trait]
pub trait PageFactory: Send + Sync {
    /// A page sharing no cookies or storage with any other open page
    async fn new_page(&self) -> Result<Box<dyn Page>>;
}

/// Polling strategy for [`wait_for`]
#[derive(Debug, Clone, Copy)]
pub struct WaitConfig {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl WaitConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }
}

/// Wait until `selector` matches at least one element.
///
/// Fails with `TargetNotFound` once the timeout elapses.
pub async fn wait_for(page: &dyn Page, selector: &str, config: WaitConfig) -> Result<usize> {
    let deadline = Instant::now() + config.timeout;

    loop {
        let found = page.count(selector).await?;
        if found > 0 {
            debug!("{} matched {} element(s)", selector, found);
            return Ok(found);
        }
        if Instant::now() >= deadline {
            return Err(AuditError::TargetNotFound(selector.to_string()));
        }
        sleep(config.poll_interval).await;
    }
}
