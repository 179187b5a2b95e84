// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use nix::sys::signal;
use nix::unistd::Pid;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

/// Run the nodecheck binary with the given arguments, isolated from the
/// caller's environment.
pub fn run_nodecheck(args: &[&str]) -> Output {
    run_nodecheck_env(args, &[])
}

/// Like [`run_nodecheck`], with extra environment variables set.
pub fn run_nodecheck_env(args: &[&str], envs: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_nodecheck"));
    cmd.args(args)
        .env_remove("NODECHECK_CONFIG_DIR")
        .env_remove("NODECHECK_CHECKER")
        .env_remove("NODECHECK_LOG_LEVEL")
        .stdin(Stdio::null());
    for (key, value) in envs {
        cmd.env(key, value);
    }
    cmd.output().expect("failed to run nodecheck")
}

/// Write an executable stub checker into `dir` and return its path.
pub fn write_stub(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join("health-check");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("failed to write stub");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("failed to chmod stub");
    path
}

/// Write a node YAML file into `dir` under `<name>.yaml`.
pub fn write_node(dir: &Path, name: &str, yaml: &str) {
    let path = dir.join(format!("{name}.yaml"));
    std::fs::write(&path, yaml)
        .unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
}

/// Minimal node definition pointing at `server`.
pub fn node_yaml(server: &str) -> String {
    format!("server: {server}\nnetwork_name: testnet\nnetwork_secret: secret\n")
}

/// Everything stdout holds after the "JSON results:" marker, parsed as JSON.
pub fn report_json(stdout: &str) -> serde_json::Value {
    let marker = "JSON results:";
    let start = stdout.find(marker).expect("missing JSON marker") + marker.len();
    serde_json::from_str(&stdout[start..]).expect("invalid report JSON")
}

/// Check if a PID is still alive.
pub fn pid_is_alive(pid: u32) -> bool {
    signal::kill(Pid::from_raw(pid as i32), None).is_ok()
}

/// Wait until a PID is no longer alive, or timeout.
pub fn wait_for_pid_gone(pid: u32, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if !pid_is_alive(pid) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}
