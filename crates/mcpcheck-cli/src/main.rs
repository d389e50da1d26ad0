//! mcpcheck CLI: conformance checks for MCP servers.

mod summary;

use anyhow::{Context, Result};
use clap::Parser;
use mcpcheck_compliance::{ComplianceSuite, default_catalog, plan};
use mcpcheck_config::CliOverrides;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "mcpcheck",
    version,
    about = "Run a conformance suite against an MCP server"
)]
struct Cli {
    /// Config file (overrides ./mcpcheck.toml and the global config)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Per-call timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Extra attempts for an initialize call that times out
    #[arg(long)]
    retries: Option<u32>,

    /// Forward the server's stderr and report dropped output lines
    #[arg(long)]
    debug: bool,

    /// Print the suite result as JSON instead of a summary
    #[arg(long)]
    json: bool,

    /// List the scenarios without starting a server
    #[arg(long)]
    list: bool,

    /// Enable verbose/debug logging
    #[arg(long)]
    verbose: bool,

    /// Server command and its arguments
    #[arg(last = true)]
    command: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(io::stderr)
        .init();

    if cli.list {
        let planned = plan(&default_catalog());
        if cli.json {
            let json = serde_json::to_string_pretty(&planned).context("Failed to serialize plan")?;
            println!("{json}");
        } else {
            print!("{}", summary::render_plan(&planned));
        }
        return Ok(ExitCode::SUCCESS);
    }

    let mut command = cli.command.into_iter();
    let config = mcpcheck_config::load(CliOverrides {
        config_path: cli.config,
        command: command.next(),
        args: command.collect(),
        timeout_ms: cli.timeout_ms,
        retries: cli.retries,
        debug: cli.debug,
    })
    .map_err(|e| anyhow::anyhow!("{e}"))?;

    tracing::info!("checking `{}`", config.target());
    let report = ComplianceSuite::new(config).run().await;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{json}");
    } else {
        print!("{}", summary::render(&report, cli.verbose));
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_follows_double_dash() {
        let cli = Cli::try_parse_from([
            "mcpcheck",
            "--timeout-ms",
            "5000",
            "--json",
            "--",
            "python3",
            "-u",
            "server.py",
        ])
        .unwrap();
        assert_eq!(cli.timeout_ms, Some(5000));
        assert!(cli.json);
        assert_eq!(cli.command, ["python3", "-u", "server.py"]);
    }

    #[test]
    fn list_needs_no_command() {
        let cli = Cli::try_parse_from(["mcpcheck", "--list"]).unwrap();
        assert!(cli.list);
        assert!(cli.command.is_empty());
    }

    #[test]
    fn command_is_optional() {
        let cli = Cli::try_parse_from(["mcpcheck", "--config", "ci.toml"]).unwrap();
        assert!(cli.command.is_empty());
        assert_eq!(cli.config, Some(PathBuf::from("ci.toml")));
    }
}
