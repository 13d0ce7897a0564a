// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

//! HTTP adapter for the Graphite metrics API.
//!
//! - `/metrics/find` answers namespace queries for the walker
//! - `/metrics/expand` expands a query into matching paths
//! - `/metrics/index.json` lists every metric the server knows

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::finder::MetricsFinder;
use super::node::{LeafFlagEncoding, MetricNode};
use crate::config::ReaderConfig;
use crate::error::Result;
use crate::http;

const FIND_ENDPOINT: &str = "/metrics/find";
const EXPAND_ENDPOINT: &str = "/metrics/expand";
const INDEX_ENDPOINT: &str = "/metrics/index.json";

/// Client for the `/metrics/*` endpoints of one Graphite host.
#[derive(Clone)]
pub struct GraphiteMetricsApi {
    base_url: String,
    client: Client,
    leaf_encoding: LeafFlagEncoding,
}

#[derive(Debug, Deserialize)]
struct ExpandResponse {
    results: Vec<String>,
}

impl GraphiteMetricsApi {
    pub fn new(config: &ReaderConfig) -> Result<Self> {
        config.validate()?;
        let client = http::build_client(&config.tls_verify, config.timeout()?)?;
        Ok(Self::with_client(config.base_url(), client).with_leaf_encoding(config.leaf_flags))
    }

    /// Reuse an existing client and its connection pool.
    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            leaf_encoding: LeafFlagEncoding::default(),
        }
    }

    pub fn with_leaf_encoding(mut self, encoding: LeafFlagEncoding) -> Self {
        self.leaf_encoding = encoding;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Expand `query` into every matching path, sorted.
    pub async fn expand(&self, query: &str, leaves_only: bool) -> Result<Vec<String>> {
        let url = format!("{}{}", self.base_url, EXPAND_ENDPOINT);
        let mut params = vec![("query", query)];
        if leaves_only {
            params.push(("leavesOnly", "1"));
        }

        let body = http::get_text(&self.client, &url, &params).await?;
        let mut results = serde_json::from_str::<ExpandResponse>(&body)?.results;
        results.sort();
        results.dedup();
        Ok(results)
    }

    /// Every metric path known to the server, sorted.
    pub async fn index(&self) -> Result<Vec<String>> {
        let url = format!("{}{}", self.base_url, INDEX_ENDPOINT);
        let body = http::get_text(&self.client, &url, &[]).await?;
        let mut metrics: Vec<String> = serde_json::from_str(&body)?;
        metrics.sort();
        tracing::debug!(count = metrics.len(), "Fetched metrics index");
        Ok(metrics)
    }
}

#[async_trait]
impl MetricsFinder for GraphiteMetricsApi {
    async fn find(
        &self,
        query: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Vec<MetricNode>> {
        let url = format!("{}{}", self.base_url, FIND_ENDPOINT);
        let params = time_params(query, start, end);

        tracing::debug!(url = %url, query = %query, "Finding metrics");
        let body = http::get_text(&self.client, &url, &params).await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn leaf_encoding(&self) -> LeafFlagEncoding {
        self.leaf_encoding
    }
}

/// Query parameters for a find request; unset bounds are left out.
fn time_params<'a>(
    query: &'a str,
    start: Option<&'a str>,
    end: Option<&'a str>,
) -> Vec<(&'static str, &'a str)> {
    let mut params = vec![("query", query)];
    if let Some(start) = start {
        params.push(("from", start));
    }
    if let Some(end) = end {
        params.push(("until", end));
    }
    params
}
