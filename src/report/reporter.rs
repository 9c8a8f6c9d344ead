// SPDX-License-Identifier: PMPL-1.0-or-later
//! Pluggable consumers of audit results.
//!
//! Reporters only produce output. The runner calls every reporter after each
//! audit and logs reporter errors without touching the returned result.

use std::io::Write;
use std::sync::Mutex;
use tracing::{info, warn};

use super::{generate_report, OutputFormat};
use crate::result::AuditResult;

/// Side-effect-only consumer of an audit result
pub trait Reporter: Send + Sync {
    /// Name used when logging reporter failures
    fn name(&self) -> &str;

    /// Emit the result; must accept an empty result
    fn report(&self, result: &AuditResult) -> anyhow::Result<()>;
}

/// Emits one structured log event per violation
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn name(&self) -> &str {
        "tracing"
    }

    fn report(&self, result: &AuditResult) -> anyhow::Result<()> {
        let url = result.url.as_deref().unwrap_or("<page>");
        if result.is_empty() {
            info!(url, "No accessibility violations");
            return Ok(());
        }

        for violation in &result.violations {
            let targets: Vec<String> = violation.nodes.iter().map(|n| n.selector()).collect();
            warn!(
                url,
                rule = %violation.id,
                impact = %violation.impact,
                nodes = violation.nodes.len(),
                "{}: {}",
                violation.description,
                targets.join(", ")
            );
        }
        Ok(())
    }
}

/// Prints the violation count and a table of id, impact, description and
/// node count
pub struct TerminalReporter<W: Write + Send> {
    out: Mutex<W>,
}

impl TerminalReporter<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> TerminalReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> Reporter for TerminalReporter<W> {
    fn name(&self) -> &str {
        "terminal"
    }

    fn report(&self, result: &AuditResult) -> anyhow::Result<()> {
        let table = generate_report(result, OutputFormat::Table);
        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow::anyhow!("terminal writer lock poisoned"))?;
        out.write_all(table.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}

/// Writes the full report in a chosen format
pub struct FormatReporter<W: Write + Send> {
    format: OutputFormat,
    out: Mutex<W>,
}

impl<W: Write + Send> FormatReporter<W> {
    pub fn new(format: OutputFormat, out: W) -> Self {
        Self { format, out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> Reporter for FormatReporter<W> {
    fn name(&self) -> &str {
        "format"
    }

    fn report(&self, result: &AuditResult) -> anyhow::Result<()> {
        let report = generate_report(result, self.format);
        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow::anyhow!("report writer lock poisoned"))?;
        writeln!(out, "{}", report)?;
        out.flush()?;
        Ok(())
    }
}
