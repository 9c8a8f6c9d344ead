// SPDX-License-Identifier: PMPL-1.0-or-later
//! Audit scenarios and the suite that runs them.
//!
//! A scenario is one page load, one engine injection, an optional
//! existence-wait, one audit and one assertion. Scenarios run concurrently,
//! each in its own page, and pass or fail independently.

use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::SuiteConfig;
use crate::engine::AxeEngine;
use crate::error::{AuditError, Result};
use crate::options::AuditOptions;
use crate::page::{wait_for, Page, PageFactory, WaitConfig};
use crate::result::{AuditResult, Impact};
use crate::runner::AuditRunner;
use crate::target::AuditTarget;

/// What a scenario asserts about its result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expectation {
    /// Fail on any reported violation
    #[default]
    NoViolations,
    /// Report violations without failing
    ReportOnly,
}

/// A named audit case
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub url: String,
    /// Selector to wait for after navigation, before auditing
    #[serde(default)]
    pub wait_for: Option<String>,
    #[serde(default)]
    pub target: AuditTarget,
    #[serde(default)]
    pub options: AuditOptions,
    #[serde(default)]
    pub expect: Expectation,
}

impl Scenario {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            wait_for: None,
            target: AuditTarget::page(),
            options: AuditOptions::default(),
            expect: Expectation::NoViolations,
        }
    }

    /// Scan only `selector`, waiting for it to exist first
    pub fn scoped_to(mut self, selector: &str) -> Self {
        self.wait_for = Some(selector.to_string());
        self.target = AuditTarget::selector(selector);
        self
    }

    pub fn with_options(mut self, options: AuditOptions) -> Self {
        self.options = options;
        self
    }

    pub fn report_only(mut self) -> Self {
        self.expect = Expectation::ReportOnly;
        self
    }

    /// The digital.gov reference suite: whole page, banner region, WCAG 2
    /// AAA and 2.2 AA rule sets, a second page, and an impact-filtered scan
    pub fn reference_suite() -> Vec<Scenario> {
        const HOME: &str = "https://digital.gov";
        const GUIDE: &str = "https://digital.gov/resources/how-test-websites-for-accessibility/";

        vec![
            Scenario::new("whole-page", HOME),
            Scenario::new("banner-region", HOME).scoped_to("[role=\"banner\"]"),
            Scenario::new("wcag2aaa", HOME).with_options(AuditOptions::new().with_tags(["wcag2aaa"])),
            Scenario::new("wcag22aa", HOME).with_options(AuditOptions::new().with_tags(["wcag22aa"])),
            Scenario::new("guide-wcag2aaa", GUIDE)
                .with_options(AuditOptions::new().with_tags(["wcag2aaa"])),
            Scenario::new("moderate-impact", HOME)
                .with_options(AuditOptions::new().with_included_impacts([Impact::Moderate])),
            Scenario::new("guide-terminal-log", GUIDE),
        ]
    }
}

/// Result of one scenario
#[derive(Debug)]
pub struct ScenarioOutcome {
    pub name: String,
    pub url: String,
    pub outcome: Result<AuditResult>,
    pub duration: Duration,
}

impl ScenarioOutcome {
    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Load, inject, wait, audit and assert for one scenario on `page`
pub async fn run_scenario(
    page: &dyn Page,
    engine: &AxeEngine,
    runner: &AuditRunner,
    scenario: &Scenario,
    wait: WaitConfig,
) -> Result<AuditResult> {
    page.goto(&scenario.url).await?;
    engine.inject(page).await?;

    if let Some(ref selector) = scenario.wait_for {
        wait_for(page, selector, wait).await?;
    }

    match scenario.expect {
        Expectation::NoViolations => {
            runner.check(page, &scenario.target, Some(&scenario.options)).await
        }
        Expectation::ReportOnly => runner.run(page, &scenario.target, Some(&scenario.options)).await,
    }
}

/// Runs scenarios concurrently, one isolated page each, closed when the
/// scenario finishes or times out
pub struct Suite {
    pages: Arc<dyn PageFactory>,
    engine: AxeEngine,
    runner: Arc<AuditRunner>,
    config: SuiteConfig,
}

impl Suite {
    pub fn new(
        pages: Arc<dyn PageFactory>,
        engine: AxeEngine,
        runner: AuditRunner,
        config: SuiteConfig,
    ) -> Self {
        Self {
            pages,
            engine,
            runner: Arc::new(runner),
            config,
        }
    }

    /// Run every scenario; outcomes are returned in input order
    pub async fn run(&self, scenarios: &[Scenario]) -> Vec<ScenarioOutcome> {
        let permits = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let wait = WaitConfig::with_timeout(Duration::from_secs(self.config.wait_timeout_secs));
        let timeout_secs = self.config.timeout_secs;
        let mut tasks = JoinSet::new();

        for (index, scenario) in scenarios.iter().cloned().enumerate() {
            let pages = Arc::clone(&self.pages);
            let engine = self.engine.clone();
            let runner = Arc::clone(&self.runner);
            let permits = Arc::clone(&permits);

            tasks.spawn(async move {
                let _permit = permits.acquire_owned().await;
                let started = Instant::now();

                let outcome = match pages.new_page().await {
                    Ok(page) => {
                        let audit = run_scenario(page.as_ref(), &engine, &runner, &scenario, wait);
                        let outcome =
                            match tokio::time::timeout(Duration::from_secs(timeout_secs), audit).await {
                                Ok(outcome) => outcome,
                                Err(_) => Err(AuditError::Timeout(timeout_secs)),
                            };
                        if let Err(e) = page.close().await {
                            warn!("Failed to close page for {}: {}", scenario.name, e);
                        }
                        outcome
                    }
                    Err(e) => Err(e),
                };

                match outcome {
                    Ok(ref result) => info!("PASS {} ({} violation(s))", scenario.name, result.len()),
                    Err(ref e) => error!("FAIL {}: {}", scenario.name, e),
                }

                (
                    index,
                    ScenarioOutcome {
                        name: scenario.name,
                        url: scenario.url,
                        outcome,
                        duration: started.elapsed(),
                    },
                )
            });
        }

        let mut outcomes: Vec<Option<ScenarioOutcome>> = scenarios.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(e) => error!("Scenario task aborted: {}", e),
            }
        }

        outcomes
            .into_iter()
            .zip(scenarios)
            .map(|(outcome, scenario)| {
                outcome.unwrap_or_else(|| ScenarioOutcome {
                    name: scenario.name.clone(),
                    url: scenario.url.clone(),
                    outcome: Err(AuditError::Browser("scenario task aborted".to_string())),
                    duration: Duration::ZERO,
                })
            })
            .collect()
    }
}
