// SPDX-License-Identifier: PMPL-1.0-or-later
//! Audit runner: one axe-core invocation per call.
//!
//! The caller navigates, injects the engine and waits for any region it
//! wants to scan; the runner then probes, scans, filters and reports. Every
//! call is independent and never retried.

use tracing::{debug, info, warn};

use crate::engine;
use crate::error::{AuditError, Result};
use crate::options::AuditOptions;
use crate::page::Page;
use crate::report::Reporter;
use crate::result::AuditResult;
use crate::target::AuditTarget;

/// Runs audits and forwards results to reporters
#[derive(Default)]
pub struct AuditRunner {
    reporters: Vec<Box<dyn Reporter>>,
}

impl AuditRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reporter(mut self, reporter: impl Reporter + 'static) -> Self {
        self.reporters.push(Box::new(reporter));
        self
    }

    /// Audit `target` on an already-loaded page with the engine injected.
    ///
    /// `options = None` runs every applicable rule with no impact filter.
    pub async fn run(
        &self,
        page: &dyn Page,
        target: &AuditTarget,
        options: Option<&AuditOptions>,
    ) -> Result<AuditResult> {
        let default_options = AuditOptions::default();
        let options = options.unwrap_or(&default_options);

        if !engine::is_present(page).await? {
            return Err(AuditError::EngineUnavailable(
                "axe-core has not been injected into this page".to_string(),
            ));
        }

        if let Some(ref selector) = target.include {
            if page.count(selector).await? == 0 {
                return Err(AuditError::TargetNotFound(selector.clone()));
            }
        }

        debug!("Auditing {}", target);
        let mut result = engine::analyze(page, target, options).await?;

        let reported = result.len();
        result.violations.retain(|v| options.admits(v));
        if result.len() != reported {
            debug!("Filtered {} of {} violation(s)", reported - result.len(), reported);
        }

        info!(
            "Audit of {} found {} violation(s)",
            result.url.as_deref().unwrap_or("<page>"),
            result.len()
        );

        self.dispatch(&result);
        Ok(result)
    }

    /// Run an audit and fail with `AssertionFailed` if any violation remains
    pub async fn check(
        &self,
        page: &dyn Page,
        target: &AuditTarget,
        options: Option<&AuditOptions>,
    ) -> Result<AuditResult> {
        let result = self.run(page, target, options).await?;
        if result.is_empty() {
            Ok(result)
        } else {
            Err(AuditError::AssertionFailed { violations: result.violations })
        }
    }

    fn dispatch(&self, result: &AuditResult) {
        for reporter in &self.reporters {
            if let Err(e) = reporter.report(result) {
                warn!("Reporter {} failed: {}", reporter.name(), e);
            }
        }
    }
}
