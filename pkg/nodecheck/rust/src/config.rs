// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::checker::CheckRequest;

const DEFAULT_CONFIG_DIR: &str = "/etc/nodecheck/nodes.d";

/// A node definition loaded from one YAML file. The node name comes from
/// the filename, not the file contents.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeSpec {
    #[serde(skip)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub server: String,
    pub network_name: String,
    pub network_secret: String,
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub verbose: bool,
}

impl NodeSpec {
    /// Build the checker invocation for this node, filling unset fields
    /// from the run-level defaults.
    pub fn to_request(&self, default_timeout_secs: u64, verbose: bool) -> CheckRequest {
        CheckRequest::new(
            self.server.clone(),
            self.network_name.clone(),
            self.network_secret.clone(),
        )
        .with_timeout(self.timeout_secs.unwrap_or(default_timeout_secs))
        .with_verbose(self.verbose || verbose)
    }
}

pub fn config_dir() -> PathBuf {
    std::env::var("NODECHECK_CONFIG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_DIR))
}

/// Scan a directory for `*.yaml` files and parse each into a NodeSpec.
/// The node name is derived from the filename (without extension).
/// Files that fail to parse are logged and skipped.
pub fn load_nodes(dir: &Path) -> Result<Vec<NodeSpec>> {
    let mut nodes = Vec::new();

    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read node directory: {}", dir.display()))?;

    let mut yaml_files: Vec<_> = entries
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("skipping unreadable entry in {}: {e}", dir.display());
                None
            }
        })
        .filter(|e| {
            let is_yaml = e
                .path()
                .extension()
                .is_some_and(|ext| ext == "yaml" || ext == "yml");
            if !is_yaml {
                debug!("skipping non-YAML file: {}", e.path().display());
            }
            is_yaml
        })
        .collect();

    yaml_files.sort_by_key(|e| e.file_name());

    for entry in yaml_files {
        let path = entry.path();
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        match parse_node(&path) {
            Ok(mut node) => {
                node.name = name;
                nodes.push(node);
            }
            Err(e) => warn!("skipping {}: {e:#}", path.display()),
        }
    }

    Ok(nodes)
}

fn parse_node(path: &Path) -> Result<NodeSpec> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let node: NodeSpec =
        serde_yaml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
    Ok(node)
}
