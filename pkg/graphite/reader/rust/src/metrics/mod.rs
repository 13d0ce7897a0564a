// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

//! Metric namespace discovery.
//!
//! - `node` - namespace records returned by `/metrics/find` and leaf flag decoding
//! - `finder` - the [`MetricsFinder`] port and an in-memory adapter
//! - `api` - the HTTP adapter for the Graphite metrics API
//! - `walker` - depth-first traversal of the namespace tree
//! - `namespace` - node-by-node navigation with a per-node child cache
//! - `reader` - facade tying a finder to the walker and the navigator

pub mod api;
pub mod finder;
pub mod namespace;
pub mod node;
pub mod reader;
pub mod walker;

pub use api::GraphiteMetricsApi;
pub use finder::{InMemoryFinder, MetricsFinder};
pub use namespace::{MetricNamespace, Resolved};
pub use node::{LeafFlagEncoding, MetricNode, NodeKind};
pub use reader::GraphiteMetricsReader;
pub use walker::{Walk, WalkFrame, child_query, list, walk};
