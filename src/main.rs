//! Spider-Audit main entry point
//!
//! This is the command-line interface for the Spider-Audit link and anchor auditor.

use clap::Parser;
use spider_audit::config::{load_config_with_hash, Config};
use spider_audit::crawler::run_audit;
use spider_audit::output::{
    print_report, JsonReportWriter, MarkdownReportWriter, Report, ReportWriter,
};
use spider_audit::url::{normalize_url, root_url};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable overriding `report.max-links-from`
const MAX_LINKS_FROM_ENV: &str = "MAX_LINKS_FROM";

/// Environment variable overriding `report.max-redirects-from`
const MAX_REDIRECTS_FROM_ENV: &str = "MAX_REDIRECTS_FROM";

/// Spider-Audit: a link and anchor integrity auditor
///
/// Spider-Audit crawls a site from a start URL, checks that every `#fragment` link
/// lands on an element that exists (after redirects), checks page titles, and
/// reports broken links. The exit status is the number of errors, capped at 255.
#[derive(Parser, Debug)]
#[command(name = "spider-audit")]
#[command(version)]
#[command(about = "A link and anchor integrity auditor", long_about = None)]
struct Cli {
    /// URL to start crawling from
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Write the full report as JSON to this path
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// Write only the report counts to the JSON output
    #[arg(long, requires = "json")]
    summary_only: bool,

    /// Write a markdown report to this path
    #[arg(long, value_name = "PATH")]
    markdown: Option<PathBuf>,

    /// Validate config and show what would be audited without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            match load_config_with_hash(path) {
                Ok((cfg, hash)) => {
                    tracing::info!("Configuration loaded successfully (hash: {})", hash);
                    cfg
                }
                Err(e) => {
                    tracing::error!("Failed to load configuration: {}", e);
                    return Err(e.into());
                }
            }
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };
    apply_env_overrides(&mut config);

    if cli.dry_run {
        handle_dry_run(&cli.url, &config)?;
        return Ok(ExitCode::SUCCESS);
    }

    let report = match run_audit(&cli.url, config).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Audit failed: {}", e);
            return Err(e.into());
        }
    };

    if !cli.quiet {
        print_report(&report, cli.verbose > 0);
    }

    let mut writers: Vec<Box<dyn ReportWriter>> = Vec::new();
    if let Some(path) = cli.json {
        writers.push(Box::new(
            JsonReportWriter::new(path).summary_only(cli.summary_only),
        ));
    }
    if let Some(path) = cli.markdown {
        writers.push(Box::new(MarkdownReportWriter::new(path)));
    }
    write_reports(&report, &writers)?;

    Ok(ExitCode::from(report.process_exit_code()))
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("spider_audit=info,warn"),
            1 => EnvFilter::new("spider_audit=debug,info"),
            2 => EnvFilter::new("spider_audit=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Applies provenance limits from the environment over the configuration
fn apply_env_overrides(config: &mut Config) {
    if let Some(limit) = env_limit(MAX_LINKS_FROM_ENV) {
        config.report.max_links_from = limit;
    }
    if let Some(limit) = env_limit(MAX_REDIRECTS_FROM_ENV) {
        config.report.max_redirects_from = limit;
    }
}

fn env_limit(name: &str) -> Option<usize> {
    let value = std::env::var(name).ok()?;
    match value.trim().parse() {
        Ok(limit) => {
            tracing::info!("Using {}={} from the environment", name, limit);
            Some(limit)
        }
        Err(e) => {
            tracing::warn!("Ignoring {}={:?}: {}", name, value, e);
            None
        }
    }
}

/// Handles the --dry-run mode: validates config and shows what would be audited
fn handle_dry_run(url: &str, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let seed = normalize_url(url)?;

    println!("=== Spider-Audit Dry Run ===\n");
    println!("Seed URL: {}", seed);
    println!("Root URL: {}", root_url(&seed));

    println!("\nCrawler Configuration:");
    println!("  Max concurrency: {}", config.crawler.max_concurrency);
    println!("  Interval: {}ms", config.crawler.interval_ms);
    println!("  Timeout: {}ms", config.crawler.timeout_ms);
    println!("  Max resource size: {} bytes", config.crawler.max_resource_size);
    println!("  User agent: {}", config.crawler.user_agent);
    println!("  Respect robots.txt: {}", config.crawler.respect_robots_txt);
    for path in &config.crawler.additional_paths {
        println!("  Additional path: {}", path);
    }

    println!("\nPolicies:");
    print_patterns("Exclude", &config.policy.exclude_patterns);
    print_patterns("Include", &config.policy.include_patterns);
    for (code, patterns) in &config.policy.http_warn_only_patterns {
        print_patterns(&format!("Warn only on {}", code), patterns);
    }
    print_patterns(
        "Warn only on missing hash",
        &config.policy.hash_not_found_warn_only_patterns,
    );
    if let Some(pattern) = &config.policy.title_pattern {
        println!("  Title pattern: {}", pattern);
    }

    println!("\nReport:");
    println!("  Max links from: {}", config.report.max_links_from);
    println!("  Max redirects from: {}", config.report.max_redirects_from);
    println!("  Include successes: {}", config.report.include_successes);

    println!("\n✓ Configuration is valid");

    Ok(())
}

fn print_patterns(label: &str, patterns: &[String]) {
    if patterns.is_empty() {
        return;
    }
    println!("  {} ({}):", label, patterns.len());
    for pattern in patterns {
        println!("    - {}", pattern);
    }
}

/// Writes the report to every requested sink
fn write_reports(
    report: &Report,
    writers: &[Box<dyn ReportWriter>],
) -> Result<(), Box<dyn std::error::Error>> {
    for writer in writers {
        if let Err(e) = writer.write_report(report) {
            tracing::error!("Failed to write {} report: {}", writer.name(), e);
            return Err(e.into());
        }
        tracing::info!("Wrote {} report", writer.name());
    }
    Ok(())
}
