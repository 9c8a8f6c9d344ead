// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error types for axebot

use crate::result::Violation;
use thiserror::Error;

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, AuditError>;

/// Main error type for axebot
#[derive(Error, Debug)]
pub enum AuditError {
    /// The target selector matched no element at scan time
    #[error("Target not found: {0}")]
    TargetNotFound(String),

    /// axe-core could not be loaded or injected into the page context
    #[error("Accessibility engine unavailable: {0}")]
    EngineUnavailable(String),

    /// Caller-level assertion: the audit reported violations
    #[error("{} accessibility violation(s) detected: {}", .violations.len(), summarize(.violations))]
    AssertionFailed { violations: Vec<Violation> },

    #[error("Engine returned malformed results: {0}")]
    Engine(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Scenario timed out after {0}s")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl AuditError {
    /// Violations carried by an assertion failure, empty for every other error
    pub fn violations(&self) -> &[Violation] {
        match self {
            AuditError::AssertionFailed { violations } => violations,
            _ => &[],
        }
    }
}

impl From<config::ConfigError> for AuditError {
    fn from(err: config::ConfigError) -> Self {
        AuditError::Config(err.to_string())
    }
}

impl From<chromiumoxide::error::CdpError> for AuditError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AuditError::Browser(err.to_string())
    }
}

fn summarize(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| {
            let targets: Vec<String> = v.nodes.iter().map(|n| n.selector()).collect();
            format!("[{}] {} ({})", v.impact, v.id, targets.join(", "))
        })
        .collect::<Vec<_>>()
        .join("; ")
}
