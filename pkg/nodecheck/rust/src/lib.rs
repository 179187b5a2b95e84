// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Health checks for mesh network nodes, driven through a pre-compiled
//! `health-check` executable.
//!
//! [`checker::HealthChecker`] wraps one checker invocation per node and
//! parses its five-integer stdout contract. [`config::load_nodes`] reads
//! per-node YAML definitions from a directory, and [`report`] folds the
//! per-node results into the human summary and the JSON report emitted by
//! the `nodecheck` binary.

pub mod checker;
pub mod config;
pub mod report;
