// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

use std::sync::Arc;

use super::api::GraphiteMetricsApi;
use super::finder::MetricsFinder;
use super::namespace::MetricNamespace;
use super::walker::{self, Walk};
use crate::config::ReaderConfig;
use crate::error::Result;

/// Explores the metric tree of a Graphite host, like `os.walk` over a filesystem.
///
/// Paths given here are absolute; [`MetricNamespace`] adds relative navigation on top.
#[derive(Clone)]
pub struct GraphiteMetricsReader {
    finder: Arc<dyn MetricsFinder>,
}

impl GraphiteMetricsReader {
    pub fn new(config: &ReaderConfig) -> Result<Self> {
        Ok(Self::with_finder(Arc::new(GraphiteMetricsApi::new(config)?)))
    }

    pub fn with_finder(finder: Arc<dyn MetricsFinder>) -> Self {
        Self { finder }
    }

    /// Depth-first walk yielding `(path, internal nodes, leaves)` per level.
    pub fn walk(&self, top: &str, start: Option<&str>, end: Option<&str>) -> Walk {
        walker::walk(self.finder.clone(), top, start, end)
    }

    /// Direct children of `path`.
    pub async fn list(
        &self,
        path: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Vec<String>> {
        walker::list(self.finder.clone(), path, start, end).await
    }

    /// Navigator bound to `base_path` ("" for the root).
    pub fn namespace(&self, base_path: &str) -> MetricNamespace {
        MetricNamespace::new(self.finder.clone(), base_path)
    }
}
