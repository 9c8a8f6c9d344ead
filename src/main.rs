// SPDX-License-Identifier: PMPL-1.0-or-later
//! axebot CLI - axe-core accessibility audits for live pages

use axebot::browser::ChromeSession;
use axebot::report::{
    generate_report, FormatReporter, OutputFormat, Reporter, TerminalReporter, TracingReporter,
};
use axebot::scenario::{Scenario, Suite};
use axebot::{
    wait_for, AuditOptions, AuditResult, AuditRunner, AuditTarget, AxeEngine, Config, Impact,
    Page, WaitConfig,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Accessibility audits with axe-core in headless Chrome
#[derive(Parser)]
#[command(name = "axebot")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "axebot.toml", global = true)]
    config: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Audit a single page
    Scan {
        /// Page to load
        url: String,

        /// Limit the scan to this selector
        #[arg(long)]
        include: Option<String>,

        /// Leave this selector out of the scan (repeatable)
        #[arg(long)]
        exclude: Vec<String>,

        /// Wait for the --include selector to exist before scanning
        #[arg(long, requires = "include")]
        wait: bool,

        /// Run only rules with this tag, e.g. wcag2aa (repeatable)
        #[arg(long, conflicts_with = "rule")]
        tag: Vec<String>,

        /// Run only this rule id (repeatable)
        #[arg(long)]
        rule: Vec<String>,

        /// Report only violations with this impact (repeatable)
        #[arg(long)]
        impact: Vec<ImpactArg>,

        /// Output format (defaults to the configured one)
        #[arg(long)]
        format: Option<FormatArg>,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Fail only on violations at or above this impact
        #[arg(long, conflicts_with = "report_only")]
        fail_on: Option<ImpactArg>,

        /// Exit successfully even when violations are found
        #[arg(long)]
        report_only: bool,
    },

    /// Run the configured scenarios
    Run {
        /// Only run scenarios with these names (repeatable)
        #[arg(long)]
        scenario: Vec<String>,
    },

    /// List the configured scenarios
    List,
}

/// Impact level CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ImpactArg {
    Minor,
    Moderate,
    Serious,
    Critical,
}

impl From<ImpactArg> for Impact {
    fn from(arg: ImpactArg) -> Self {
        match arg {
            ImpactArg::Minor => Impact::Minor,
            ImpactArg::Moderate => Impact::Moderate,
            ImpactArg::Serious => Impact::Serious,
            ImpactArg::Critical => Impact::Critical,
        }
    }
}

/// Output format CLI argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Human-readable text
    Text,
    /// Terminal table
    Table,
    /// Structured JSON
    Json,
    /// SARIF for IDE/CI
    Sarif,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Table => OutputFormat::Table,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Sarif => OutputFormat::Sarif,
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("axebot=debug")
    } else {
        EnvFilter::new("axebot=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Scan {
            url,
            include,
            exclude,
            wait,
            tag,
            rule,
            impact,
            format,
            output,
            fail_on,
            report_only,
        } => {
            let mut target = match include {
                Some(selector) => AuditTarget::selector(selector),
                None => AuditTarget::page(),
            };
            for selector in exclude {
                target = target.excluding(selector);
            }

            let mut options = AuditOptions::new();
            if !tag.is_empty() {
                options = options.with_tags(tag);
            } else if !rule.is_empty() {
                options = options.with_rules(rule);
            }
            if !impact.is_empty() {
                options = options.with_included_impacts(impact.into_iter().map(Impact::from));
            }

            let format = format.map(OutputFormat::from).unwrap_or(config.report.format);
            let result = scan(&config, &url, &target, &options, wait).await?;

            let writer: Box<dyn Write + Send> = match output {
                Some(ref path) => Box::new(std::fs::File::create(path)?),
                None => Box::new(std::io::stdout()),
            };
            let reporter = FormatReporter::new(format, writer);
            reporter.report(&result)?;
            if let Some(path) = output {
                eprintln!("Report written to {}", path.display());
            }

            let threshold = fail_on.map(Impact::from).unwrap_or(Impact::Minor);
            if !report_only && result.fails_at(threshold) {
                std::process::exit(1);
            }
        }

        Commands::Run { scenario } => {
            let mut scenarios = if config.scenarios.is_empty() {
                tracing::info!("No scenarios configured, running the reference suite");
                Scenario::reference_suite()
            } else {
                config.scenarios.clone()
            };
            if !scenario.is_empty() {
                scenarios.retain(|s| scenario.contains(&s.name));
            }
            if scenarios.is_empty() {
                anyhow::bail!("no scenarios matched {:?}", scenario);
            }

            if !run_suite(&config, &scenarios).await? {
                std::process::exit(1);
            }
        }

        Commands::List => {
            let scenarios = if config.scenarios.is_empty() {
                Scenario::reference_suite()
            } else {
                config.scenarios.clone()
            };
            for s in scenarios {
                println!("{:<20} {} [{}]", s.name, s.url, s.target);
            }
        }
    }

    Ok(())
}

/// Load the page, inject the engine and audit once
async fn scan(
    config: &Config,
    url: &str,
    target: &AuditTarget,
    options: &AuditOptions,
    wait: bool,
) -> anyhow::Result<AuditResult> {
    let engine = AxeEngine::load(&config.engine).await?;
    let session = ChromeSession::launch(&config.browser).await?;

    let page = match session.open_page().await {
        Ok(page) => page,
        Err(e) => {
            session.close().await?;
            return Err(e.into());
        }
    };
    let audit = async {
        page.goto(url).await?;
        engine.inject(&page).await?;
        if let (true, Some(selector)) = (wait, target.include.as_deref()) {
            let wait_config =
                WaitConfig::with_timeout(Duration::from_secs(config.suite.wait_timeout_secs));
            wait_for(&page, selector, wait_config).await?;
        }
        AuditRunner::new()
            .with_reporter(TracingReporter)
            .run(&page, target, Some(options))
            .await
    };
    let result = audit.await;
    page.close().await?;

    session.close().await?;
    Ok(result?)
}

/// Run scenarios and print a summary; returns whether all passed
async fn run_suite(config: &Config, scenarios: &[Scenario]) -> anyhow::Result<bool> {
    let engine = AxeEngine::load(&config.engine).await?;
    let session = Arc::new(ChromeSession::launch(&config.browser).await?);

    let mut runner = AuditRunner::new().with_reporter(TracingReporter);
    if config.report.terminal_table {
        runner = runner.with_reporter(TerminalReporter::stdout());
    }

    let suite = Suite::new(session.clone(), engine, runner, config.suite.clone());
    let outcomes = suite.run(scenarios).await;
    drop(suite);

    let mut failed = 0;
    for outcome in &outcomes {
        match outcome.outcome {
            Ok(_) => println!("PASS {} ({:.1}s)", outcome.name, outcome.duration.as_secs_f64()),
            Err(ref e) => {
                failed += 1;
                println!("FAIL {} ({}): {}", outcome.name, outcome.url, e);
                if !e.violations().is_empty() {
                    let result = AuditResult::new(e.violations().to_vec());
                    println!("{}", generate_report(&result, config.report.format));
                }
            }
        }
    }
    println!("\n{} passed, {} failed", outcomes.len() - failed, failed);

    match Arc::try_unwrap(session) {
        Ok(session) => session.close().await?,
        Err(_) => tracing::warn!("Browser still in use, leaving it to exit with the process"),
    }

    Ok(failed == 0)
}
