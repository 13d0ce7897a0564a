// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

//! Client library for Graphite.
//!
//! Reads time series from the `/render` endpoint into [`MetricFrame`]s and
//! explores the metric namespace through the `/metrics/*` endpoints.
//!
//! ## Architecture
//!
//! 1. **Metric discovery** (`metrics` module) - a [`MetricsFinder`] port with an
//!    HTTP adapter, a depth-first [`Walk`] over the namespace tree and a lazily
//!    cached [`MetricNamespace`] for node-by-node navigation.
//!
//! 2. **Rendering** (`render` module) - downloads CSV or JSON series, aligns them
//!    on a shared timestamp index and compacts the dotted metric names into
//!    multi-level column labels.

// Correctness
#![deny(clippy::indexing_slicing)]
#![deny(clippy::string_slice)]
#![deny(clippy::cast_possible_wrap)]
// Panicking code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unimplemented)]
#![deny(clippy::todo)]
// Debug code that shouldn't be in production
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]

pub mod config;
pub mod error;
mod http;
pub mod metrics;
pub mod render;

pub use config::{ReaderConfig, TlsVerify};
pub use error::{ReaderError, Result};
pub use metrics::{
    GraphiteMetricsApi, GraphiteMetricsReader, InMemoryFinder, LeafFlagEncoding, MetricNamespace,
    MetricNode, MetricsFinder, NodeKind, Resolved, Walk, WalkFrame,
};
pub use render::{
    ColumnLabel, GraphiteDataReader, MetricFrame, ReadOptions, ReadResult, RenderFormat, Targets,
};
