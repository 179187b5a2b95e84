// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::{LevelFilter, debug, info};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

use nodecheck::checker::{CheckRequest, DEFAULT_CHECKER_PATH, DEFAULT_TIMEOUT_SECS, HealthChecker};
use nodecheck::config;
use nodecheck::report::{self, NodeOutcome, Report};

#[derive(Parser)]
#[command(name = "nodecheck", version, about = "Health checks for mesh network nodes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check every configured node and print a summary plus JSON report
    Run(RunArgs),
    /// Check a single node and print its raw status record as JSON
    Check(CheckArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Directory of per-node YAML files (defaults to NODECHECK_CONFIG_DIR)
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Path to the health-check executable
    #[arg(long, env = "NODECHECK_CHECKER", default_value = DEFAULT_CHECKER_PATH, value_name = "PATH")]
    checker: PathBuf,

    /// Timeout in seconds handed to the checker, for nodes that set none
    #[arg(short = 't', long, default_value_t = DEFAULT_TIMEOUT_SECS, value_name = "SECONDS")]
    timeout: u64,

    /// How many checkers may run at once
    #[arg(long, default_value_t = 1, value_name = "N")]
    concurrency: usize,

    /// Run the checker with -v and log at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Append log lines to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(Args)]
struct CheckArgs {
    /// Server address of the node, e.g. tcp://192.168.1.1:11010
    #[arg(short, long)]
    server: String,

    /// Network name the node belongs to
    #[arg(short, long)]
    network_name: String,

    /// Network secret
    #[arg(short = 'p', long)]
    network_secret: String,

    /// Timeout in seconds handed to the checker
    #[arg(short = 't', long, default_value_t = DEFAULT_TIMEOUT_SECS, value_name = "SECONDS")]
    timeout: u64,

    /// Path to the health-check executable
    #[arg(long, env = "NODECHECK_CHECKER", default_value = DEFAULT_CHECKER_PATH, value_name = "PATH")]
    checker: PathBuf,

    /// Run the checker with -v and log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let code = match cli.command {
        Command::Run(args) => {
            init_logging(args.verbose, args.log_file.as_deref())?;
            run(args).await?
        }
        Command::Check(args) => {
            init_logging(args.verbose, None)?;
            check_one(args).await?
        }
    };
    std::process::exit(code);
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        nodecheck_log::level_from_env()
    };
    match log_file {
        Some(path) => nodecheck_log::init_to_file(level, path)
            .with_context(|| format!("opening log file {}", path.display()))?,
        None => nodecheck_log::init(level)?,
    }
    debug!("nodecheck starting (version {})", env!("CARGO_PKG_VERSION"));
    Ok(())
}

async fn run(args: RunArgs) -> Result<i32> {
    let dir = args.config_dir.unwrap_or_else(config::config_dir);
    let nodes = config::load_nodes(&dir)?;
    info!(
        "loaded {} node definition(s) from {}",
        nodes.len(),
        dir.display()
    );

    let checker = Arc::new(HealthChecker::new(args.checker));
    let gate = Arc::new(Semaphore::new(args.concurrency.max(1)));

    let mut handles = Vec::with_capacity(nodes.len());
    for spec in nodes {
        let checker = Arc::clone(&checker);
        let gate = Arc::clone(&gate);
        let request = spec.to_request(args.timeout, args.verbose);
        handles.push(tokio::spawn(async move {
            let _permit = gate.acquire_owned().await.ok();
            info!("[{}] checking {}", spec.name, spec.server);
            let result = checker.check_node(&request).await;
            match &result {
                Ok(status) if status.online => {
                    info!("[{}] online ({} connections)", spec.name, status.connections)
                }
                Ok(_) => info!("[{}] offline", spec.name),
                Err(e) => info!("[{}] offline: {e}", spec.name),
            }
            NodeOutcome { spec, result }
        }));
    }

    // Outcomes keep the configured order no matter how checks interleave.
    let mut outcomes = Vec::with_capacity(handles.len());
    for handle in handles {
        outcomes.push(handle.await.context("node check task panicked")?);
    }

    let report = Report::from_outcomes(&outcomes);
    print!("{}", report::render_summary(&outcomes));
    println!();
    println!("JSON results:");
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serializing report")?
    );

    Ok(report.exit_code())
}

async fn check_one(args: CheckArgs) -> Result<i32> {
    let checker = HealthChecker::new(args.checker);
    let request = CheckRequest::new(args.server, args.network_name, args.network_secret)
        .with_timeout(args.timeout)
        .with_verbose(args.verbose);

    match checker.check_node(&request).await {
        Ok(status) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&status).context("serializing status")?
            );
            Ok(if status.online { 0 } else { 1 })
        }
        // The facade already logged the reason; stdout stays empty.
        Err(_) => Ok(1),
    }
}
