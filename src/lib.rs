// SPDX-License-Identifier: PMPL-1.0-or-later
//! axebot - axe-core accessibility audits for live pages
//!
//! Drives headless Chrome, injects the axe-core engine into a loaded page,
//! runs a single audit and returns the violations for assertion. The rule
//! engine is opaque; axebot owns navigation, injection, scoping, option
//! filtering and reporting.
//!
//! ## Flow
//!
//! ```text
//! goto(url) → AxeEngine::inject → wait_for(region) → AuditRunner::run → Reporters
//! ```
//!
//! ## Modules
//!
//! - **page** / **browser**: the page seam and its Chrome implementation
//! - **engine**: loading, injecting and invoking axe-core
//! - **runner**: one audit per call, with impact/tag filtering
//! - **scenario**: named audit cases run concurrently in isolated pages
//! - **report**: text, table, JSON and SARIF output plus reporters

pub mod browser;
pub mod config;
pub mod engine;
pub mod error;
pub mod options;
pub mod page;
pub mod report;
pub mod result;
pub mod runner;
pub mod scenario;
pub mod target;

pub use config::Config;
pub use engine::AxeEngine;
pub use error::{AuditError, Result};
pub use options::{AuditOptions, FilterKind, RunOnly};
pub use page::{wait_for, Page, PageFactory, WaitConfig};
pub use result::{AuditResult, Impact, NodeResult, Violation};
pub use runner::AuditRunner;
pub use target::AuditTarget;
