// SPDX-License-Identifier: PMPL-1.0-or-later
//! Configuration management for axebot
//!
//! Loaded from a TOML file (default `axebot.toml`) with `AXEBOT__*`
//! environment overrides, e.g. `AXEBOT__ENGINE__URL`.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{AuditError, Result};
use crate::report::OutputFormat;
use crate::scenario::Scenario;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub suite: SuiteConfig,

    /// Audit scenarios run by `axebot run`
    #[serde(default)]
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrowserConfig {
    #[serde(default = "default_true")]
    pub headless: bool,

    /// Chrome sandbox; containers usually need it off
    #[serde(default = "default_true")]
    pub sandbox: bool,

    /// Path to a Chrome/Chromium binary (auto-detected if unset)
    #[serde(default)]
    pub executable: Option<PathBuf>,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,

    /// Timeout for individual DevTools requests (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: true,
            executable: None,
            window_width: default_window_width(),
            window_height: default_window_height(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_window_width() -> u32 {
    1280
}

fn default_window_height() -> u32 {
    1024
}

fn default_request_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    /// Local path to axe.min.js
    #[serde(default)]
    pub source: Option<PathBuf>,

    /// URL to fetch axe.min.js from when no local source is set
    #[serde(default = "default_engine_url")]
    pub url: Option<String>,

    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            source: None,
            url: default_engine_url(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

fn default_engine_url() -> Option<String> {
    Some("https://cdn.jsdelivr.net/npm/axe-core@4/axe.min.js".to_string())
}

fn default_fetch_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Also print the violation table for failing scenarios
    #[serde(default = "default_true")]
    pub terminal_table: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            terminal_table: true,
        }
    }
}

fn default_format() -> OutputFormat {
    OutputFormat::Text
}

#[derive(Debug, Deserialize, Clone)]
pub struct SuiteConfig {
    /// Scenarios audited at the same time, each in its own page
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Whole-scenario timeout (seconds)
    #[serde(default = "default_scenario_timeout")]
    pub timeout_secs: u64,

    /// How long `wait_for` polls for a scenario's region (seconds)
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_secs: u64,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            timeout_secs: default_scenario_timeout(),
            wait_timeout_secs: default_wait_timeout(),
        }
    }
}

fn default_concurrency() -> usize {
    2
}

fn default_scenario_timeout() -> u64 {
    120
}

fn default_wait_timeout() -> u64 {
    10
}

impl Config {
    /// Load configuration from file, then apply `AXEBOT__*` overrides.
    ///
    /// A missing file is not an error: defaults plus environment are used.
    pub fn load(path: &str) -> Result<Self> {
        let path = Path::new(path);

        if !path.exists() {
            tracing::warn!("Config file {} not found, using defaults", path.display());
        }

        let builder = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("AXEBOT")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        let parsed: Config = config.try_deserialize()?;
        parsed.validate()?;

        Ok(parsed)
    }

    fn validate(&self) -> Result<()> {
        if self.suite.concurrency == 0 {
            return Err(AuditError::Config("suite.concurrency must be at least 1".to_string()));
        }

        let mut seen = std::collections::HashSet::new();
        for scenario in &self.scenarios {
            if !seen.insert(scenario.name.as_str()) {
                return Err(AuditError::Config(format!(
                    "duplicate scenario name: {}",
                    scenario.name
                )));
            }
        }
        Ok(())
    }
}
