// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use log::{debug, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

/// Where a release build of the checker lands when built next to this crate.
pub const DEFAULT_CHECKER_PATH: &str = "./target/release/health-check";

/// Default `-t` value handed to the checker.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Wall-clock slack granted past the checker's own `-t` timeout, so a
/// well-behaved checker gets to report a timeout itself before it is killed.
const DEADLINE_GRACE_SECS: u64 = 5;

/// Number of whitespace-separated fields in the checker's stdout contract.
const STATUS_FIELDS: usize = 5;

/// One invocation of the checker against a single node.
#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub server: String,
    pub network_name: String,
    pub network_secret: String,
    pub timeout_secs: u64,
    pub verbose: bool,
}

impl CheckRequest {
    pub fn new(server: String, network_name: String, network_secret: String) -> Self {
        Self {
            server,
            network_name,
            network_secret,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            verbose: false,
        }
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Wall-clock limit for one run: the checker's own timeout plus slack.
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.saturating_add(DEADLINE_GRACE_SECS))
    }
}

/// Parsed status record from one checker run.
///
/// The checker prints a single line of five whitespace-separated integers,
/// `online connections bandwidth tier_bandwidth traffic`, where `online` is
/// 1 for a reachable node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeStatus {
    pub online: bool,
    pub connections: u64,
    pub bandwidth: u64,
    pub tier_bandwidth: u64,
    pub traffic: u64,
    /// Exit code of the checker process, -1 if it was killed by a signal.
    pub exit_code: i32,
}

#[derive(Debug, Error)]
pub enum CheckError {
    #[error("checker did not exit within {limit_secs}s")]
    TimedOut { limit_secs: u64 },
    #[error("expected 5 status fields, got {got}")]
    MalformedOutput { got: usize },
    #[error("status field {index} is not an integer: {token:?}")]
    InvalidToken { index: usize, token: String },
    #[error("failed to run checker: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Facade over the pre-compiled checker executable.
///
/// Spawns one checker process per [`HealthChecker::check_node`] call and
/// turns its stdout into a [`NodeStatus`]. The child never outlives the
/// call: a run past the request deadline is killed before the error is
/// returned.
pub struct HealthChecker {
    checker_path: PathBuf,
}

impl HealthChecker {
    pub fn new(checker_path: impl Into<PathBuf>) -> Self {
        Self {
            checker_path: checker_path.into(),
        }
    }

    pub fn checker_path(&self) -> &Path {
        &self.checker_path
    }

    /// Run one health check and parse the resulting status record.
    ///
    /// Fails when the checker cannot be launched, runs past the request
    /// deadline, or prints anything other than five integers. Each failure
    /// is logged with the node's server address before it is returned.
    pub async fn check_node(&self, request: &CheckRequest) -> Result<NodeStatus, CheckError> {
        let mut cmd = Command::new(&self.checker_path);
        cmd.arg("-s").arg(&request.server);
        cmd.arg("-n").arg(&request.network_name);
        cmd.arg("-p").arg(&request.network_secret);
        cmd.arg("-t").arg(request.timeout_secs.to_string());
        if request.verbose {
            cmd.arg("-v");
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            "[{}] running {} (timeout {}s)",
            request.server,
            self.checker_path.display(),
            request.timeout_secs
        );

        let child = cmd.spawn().map_err(|e| {
            warn!(
                "[{}] failed to launch {}: {e}",
                request.server,
                self.checker_path.display()
            );
            CheckError::Spawn(e)
        })?;

        let deadline = request.deadline();
        let output = match timeout(deadline, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| {
                warn!("[{}] checker failed: {e}", request.server);
                CheckError::Spawn(e)
            })?,
            Err(_) => {
                // The timed-out wait future owns the child handle; dropping
                // it here kills the checker and the runtime reaps it.
                warn!(
                    "[{}] checker did not exit within {}s, killing it",
                    request.server,
                    deadline.as_secs()
                );
                return Err(CheckError::TimedOut {
                    limit_secs: deadline.as_secs(),
                });
            }
        };

        let exit_code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            debug!("[{}] checker stderr: {}", request.server, stderr.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_status(&stdout, exit_code).map_err(|e| {
            warn!("[{}] {e} (stdout: {:?})", request.server, stdout.trim());
            e
        })
    }
}

/// Parse the five-integer status line, attaching the checker's exit code.
fn parse_status(stdout: &str, exit_code: i32) -> Result<NodeStatus, CheckError> {
    let fields: Vec<&str> = stdout.split_whitespace().collect();
    if fields.len() != STATUS_FIELDS {
        return Err(CheckError::MalformedOutput { got: fields.len() });
    }

    // The online flag may be any integer, but only 1 means online.
    let online = parse_field::<i64>(fields[0], 0)? == 1;

    Ok(NodeStatus {
        online,
        connections: parse_field(fields[1], 1)?,
        bandwidth: parse_field(fields[2], 2)?,
        tier_bandwidth: parse_field(fields[3], 3)?,
        traffic: parse_field(fields[4], 4)?,
        exit_code,
    })
}

fn parse_field<T: std::str::FromStr>(token: &str, index: usize) -> Result<T, CheckError> {
    token.parse().map_err(|_| CheckError::InvalidToken {
        index,
        token: token.to_string(),
    })
}
