//! RuhRoh CLI
//!
//! Command-line tool for checking chaos configuration files and trying their
//! rules against a sample `Catalog` service.

#![allow(clippy::print_stdout)]

mod catalog;
mod demo;

use std::path::{Path, PathBuf};

use application::Contract;
use clap::{Parser, Subcommand};
use domain::ServiceLifetime;
use infrastructure::{ChaosConfig, ConfigError, LoggingConfig, RuleConfig, init_logging};
use tracing::debug;

use crate::catalog::Catalog;

#[derive(Parser)]
#[command(name = "ruhroh-cli")]
#[command(author, version, about = "RuhRoh chaos injection CLI", long_about = None)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a configuration file and its rules for the sample catalog
    Check {
        /// Configuration file
        #[arg(short, long, default_value = "chaos.toml", env = "RUHROH_CONFIG")]
        config: PathBuf,
    },

    /// Apply the rules to the sample catalog and call every method
    Demo {
        /// Configuration file
        #[arg(short, long, default_value = "chaos.toml", env = "RUHROH_CONFIG")]
        config: PathBuf,

        /// Calls per method
        #[arg(short = 'n', long, default_value_t = 10)]
        calls: u32,

        /// Lifetime of the catalog registration (singleton, scoped, transient)
        #[arg(short, long, default_value_t = ServiceLifetime::Singleton)]
        lifetime: ServiceLifetime,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration, environment overrides included
    PrintConfig {
        /// Configuration file
        #[arg(short, long, default_value = "chaos.toml", env = "RUHROH_CONFIG")]
        config: PathBuf,
    },
}

/// Maps a verbosity count to a log filter string.
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Outcome of building one rule against the sample catalog
#[derive(Debug)]
struct RuleCheck<'a> {
    index: usize,
    rule: &'a RuleConfig,
    error: Option<String>,
}

/// Build every rule of `config`, collecting failures instead of stopping at the first
fn check_rules(config: &ChaosConfig) -> Vec<RuleCheck<'_>> {
    let descriptor = <dyn Catalog as Contract>::descriptor();
    config
        .rules
        .iter()
        .enumerate()
        .map(|(index, rule)| {
            let error = if rule.contract == descriptor.name() {
                rule.build::<dyn Catalog>(&descriptor, config.default_probability)
                    .err()
                    .map(|e| e.to_string())
            } else {
                Some(format!("Unknown contract '{}'", rule.contract))
            };
            RuleCheck { index, rule, error }
        })
        .collect()
}

fn load(path: &Path) -> Result<ChaosConfig, ConfigError> {
    debug!(path = %path.display(), "Loading chaos configuration");
    ChaosConfig::load_from(path)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&LoggingConfig {
        log_filter: log_filter_from_verbosity(cli.verbose).to_string(),
        json: cli.json_logs,
    })?;

    match cli.command {
        Commands::Check { config } => {
            let loaded = match load(&config).and_then(|c| c.validate().map(|()| c)) {
                Ok(loaded) => loaded,
                Err(e) => {
                    println!("❌ {}: {e}", config.display());
                    std::process::exit(1);
                },
            };

            println!("🔍 Checking {}", config.display());
            println!(
                "   Chaos: {}",
                if loaded.enabled { "enabled" } else { "disabled" }
            );
            println!("   Default probability: {}", loaded.default_probability);
            if let Some(max) = loaded.max_delay_ms {
                println!("   Max delay: {max}ms");
            }
            println!();

            let checks = check_rules(&loaded);
            let failures = checks.iter().filter(|c| c.error.is_some()).count();
            for check in &checks {
                match &check.error {
                    None => println!(
                        "✅ #{} {}.{}",
                        check.index, check.rule.contract, check.rule.method
                    ),
                    Some(e) => println!(
                        "❌ #{} {}.{}: {e}",
                        check.index, check.rule.contract, check.rule.method
                    ),
                }
            }

            println!();
            if failures > 0 {
                println!("❌ {failures} of {} rule(s) invalid", checks.len());
                std::process::exit(1);
            }
            println!("✅ {} rule(s) valid", checks.len());
        },

        Commands::Demo {
            config,
            calls,
            lifetime,
            json,
        } => {
            let loaded = load(&config)?;
            let reports = demo::run(&loaded, lifetime, calls).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
                return Ok(());
            }

            println!("🐒 Catalog ({lifetime}), {calls} call(s) per method");
            println!();
            println!(
                "   {:<12} {:>6} {:>9} {:>9} {:>7} {:>10}",
                "method", "calls", "ok", "injected", "failed", "mean"
            );
            for report in &reports {
                println!(
                    "   {:<12} {:>6} {:>9} {:>9} {:>7} {:>8}ms",
                    report.method,
                    report.calls,
                    report.succeeded,
                    report.injected,
                    report.failed,
                    report.mean_latency().as_millis()
                );
            }
        },

        Commands::PrintConfig { config } => {
            let loaded = load(&config)?;
            println!("{}", loaded.to_toml()?);
        },
    }

    Ok(())
}
