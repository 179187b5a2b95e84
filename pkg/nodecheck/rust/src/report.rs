// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use colored::Colorize;
use serde::Serialize;
use std::fmt::{self, Write};
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;

use crate::checker::{CheckError, NodeStatus};
use crate::config::NodeSpec;

const BANNER: &str = "==================================================";

const CHECK_TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");

/// Health of a node as carried in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeHealth {
    Online,
    Offline,
}

impl NodeHealth {
    pub fn is_online(self) -> bool {
        self == NodeHealth::Online
    }
}

impl fmt::Display for NodeHealth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeHealth::Online => write!(f, "online"),
            NodeHealth::Offline => write!(f, "offline"),
        }
    }
}

/// What happened for one node: its definition plus the checker result.
#[derive(Debug)]
pub struct NodeOutcome {
    pub spec: NodeSpec,
    pub result: Result<NodeStatus, CheckError>,
}

impl NodeOutcome {
    /// Report health for this outcome. A failed check collapses to offline;
    /// the distinct reason is in the logs.
    pub fn health(&self) -> NodeHealth {
        match &self.result {
            Ok(status) if status.online => NodeHealth::Online,
            _ => NodeHealth::Offline,
        }
    }

    /// Connection count carried into the report, zero unless online.
    pub fn connections(&self) -> u64 {
        match &self.result {
            Ok(status) if status.online => status.connections,
            _ => 0,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NodeReport {
    pub node: String,
    pub status: NodeHealth,
    pub connections: u64,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub total: usize,
    pub online: usize,
    pub offline: usize,
}

/// The machine-readable run report, printed as pretty JSON after the
/// human-readable summary.
#[derive(Debug, Serialize)]
pub struct Report {
    pub timestamp: String,
    pub summary: Summary,
    pub nodes: Vec<NodeReport>,
}

impl Report {
    /// Build a report from per-node outcomes, stamped with the current UTC
    /// time in RFC 3339 form.
    pub fn from_outcomes(outcomes: &[NodeOutcome]) -> Self {
        let nodes: Vec<NodeReport> = outcomes
            .iter()
            .map(|o| NodeReport {
                node: o.spec.name.clone(),
                status: o.health(),
                connections: o.connections(),
            })
            .collect();
        let online = nodes.iter().filter(|n| n.status.is_online()).count();

        Report {
            timestamp: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
            summary: Summary {
                total: nodes.len(),
                online,
                offline: nodes.len() - online,
            },
            nodes,
        }
    }

    /// Process exit code for the run: success only when nothing is offline.
    pub fn exit_code(&self) -> i32 {
        if self.summary.offline == 0 { 0 } else { 1 }
    }
}

/// Render the human-readable block that precedes the JSON report.
pub fn render_summary(outcomes: &[NodeOutcome]) -> String {
    let checked_at = OffsetDateTime::now_utc()
        .format(&CHECK_TIME_FORMAT)
        .unwrap_or_default();

    let mut out = String::new();
    let _ = writeln!(out, "{BANNER}");
    let _ = writeln!(out, "Node health check");
    let _ = writeln!(out, "Check time: {checked_at}");
    let _ = writeln!(out, "{BANNER}");

    let mut online = 0;
    for outcome in outcomes {
        let _ = writeln!(out);
        let _ = writeln!(out, "Node: {}", outcome.spec.name);
        let _ = writeln!(out, "  Server: {}", outcome.spec.server);
        let _ = writeln!(out, "  Network: {}", outcome.spec.network_name);
        if outcome.health().is_online() {
            let _ = writeln!(out, "  Status: {}", "✓ online".green());
            let _ = writeln!(out, "  Connections: {}", outcome.connections());
            online += 1;
        } else {
            let _ = writeln!(out, "  Status: {}", "✗ offline".red());
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{BANNER}");
    let _ = writeln!(out, "Check complete");
    let _ = writeln!(out, "Total nodes: {}", outcomes.len());
    let _ = writeln!(out, "Online: {online}");
    let _ = writeln!(out, "Offline: {}", outcomes.len() - online);
    let _ = writeln!(out, "{BANNER}");
    out
}
