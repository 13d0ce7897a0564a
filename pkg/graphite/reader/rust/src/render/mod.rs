// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

//! Time series download from the Graphite `/render` endpoint.
//!
//! - `parse` - CSV and JSON render payloads into named series
//! - `frame` - timestamp-indexed table of series with multi-level column labels
//! - `labels` - compaction of dotted metric names into the segments that differ
//! - `client` - the render client and its target shapes

pub mod client;
pub mod frame;
pub mod labels;
pub mod parse;

pub use client::{GraphiteDataReader, ReadOptions, ReadResult, Targets};
pub use frame::{Column, ColumnLabel, MetricFrame, Series};
pub use labels::{compact, varying_positions};
pub use parse::RenderFormat;
