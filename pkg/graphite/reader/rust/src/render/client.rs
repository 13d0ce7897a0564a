// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

//! Render client.
//!
//! ```no_run
//! # async fn demo() -> graphite_reader::Result<()> {
//! use graphite_reader::{GraphiteDataReader, ReadOptions, ReaderConfig, Targets};
//!
//! let reader = GraphiteDataReader::new(&ReaderConfig::new("https://graphite.example.com"))?;
//! let frame = reader
//!     .read(&Targets::from("servers.*.cpu"), &ReadOptions::default().range("-1h", "now"))
//!     .await?
//!     .into_frame();
//! # Ok(())
//! # }
//! ```

use futures::future::try_join_all;
use reqwest::Client;
use std::collections::BTreeMap;

use super::frame::MetricFrame;
use super::parse::RenderFormat;
use crate::config::ReaderConfig;
use crate::error::{ReaderError, Result};
use crate::http;

const RENDER_ENDPOINT: &str = "/render";

/// What to fetch in one [`GraphiteDataReader::read`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Targets {
    /// One target expression, which may itself match several series
    Single(String),
    /// Several targets joined into one frame
    Many(Vec<String>),
    /// Experimental: one frame per label
    Grouped(BTreeMap<String, String>),
}

impl From<&str> for Targets {
    fn from(target: &str) -> Self {
        Targets::Single(target.to_string())
    }
}

impl From<String> for Targets {
    fn from(target: String) -> Self {
        Targets::Single(target)
    }
}

impl From<Vec<String>> for Targets {
    fn from(targets: Vec<String>) -> Self {
        Targets::Many(targets)
    }
}

impl From<BTreeMap<String, String>> for Targets {
    fn from(groups: BTreeMap<String, String>) -> Self {
        Targets::Grouped(groups)
    }
}

impl Targets {
    /// Reject shapes the render endpoint cannot answer.
    pub fn validate(&self) -> Result<()> {
        let empty_target = |t: &String| t.trim().is_empty();
        match self {
            Targets::Single(target) if empty_target(target) => Err(unsupported("empty target")),
            Targets::Many(targets) if targets.is_empty() => Err(unsupported("no targets given")),
            Targets::Many(targets) if targets.iter().any(empty_target) => {
                Err(unsupported("empty target in target list"))
            }
            Targets::Grouped(groups) if groups.is_empty() => Err(unsupported("no target groups given")),
            Targets::Grouped(groups) if groups.values().any(empty_target) => {
                Err(unsupported("empty target in target group"))
            }
            _ => Ok(()),
        }
    }
}

fn unsupported(reason: &str) -> ReaderError {
    ReaderError::UnsupportedInput(reason.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Overrides the reader's default start when set
    pub start: Option<String>,
    pub end: Option<String>,
    /// Turn the metric names into multi-level labels and sort the columns
    pub create_multiindex: bool,
    /// Keep only the name segments that differ between columns
    pub remove_duplicates: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            create_multiindex: true,
            remove_duplicates: true,
        }
    }
}

impl ReadOptions {
    pub fn range(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start = Some(start.into());
        self.end = Some(end.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReadResult {
    Frame(MetricFrame),
    /// Frames keyed by group label, from [`Targets::Grouped`]
    Panel(BTreeMap<String, MetricFrame>),
}

impl ReadResult {
    pub fn into_frame(self) -> Option<MetricFrame> {
        match self {
            ReadResult::Frame(frame) => Some(frame),
            ReadResult::Panel(_) => None,
        }
    }

    pub fn into_panel(self) -> Option<BTreeMap<String, MetricFrame>> {
        match self {
            ReadResult::Panel(panel) => Some(panel),
            ReadResult::Frame(_) => None,
        }
    }
}

/// Reads series from the `/render` endpoint of one Graphite host.
#[derive(Clone)]
pub struct GraphiteDataReader {
    base_url: Option<String>,
    start: Option<String>,
    end: Option<String>,
    format: RenderFormat,
    client: Client,
}

impl GraphiteDataReader {
    pub fn new(config: &ReaderConfig) -> Result<Self> {
        config.validate()?;
        let client = http::build_client(&config.tls_verify, config.timeout()?)?;
        let mut reader = Self::with_client(Some(config.base_url()), client);
        reader.start = config.start.clone();
        reader.end = config.end.clone();
        reader.format = config.format;
        Ok(reader)
    }

    /// Reuse an existing client. A reader without URL fails on every read.
    pub fn with_client(base_url: Option<&str>, client: Client) -> Self {
        Self {
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
            start: None,
            end: None,
            format: RenderFormat::default(),
            client,
        }
    }

    pub fn start(&self) -> Option<&str> {
        self.start.as_deref()
    }

    pub fn set_start(&mut self, start: Option<String>) {
        self.start = start;
    }

    pub fn end(&self) -> Option<&str> {
        self.end.as_deref()
    }

    pub fn set_end(&mut self, end: Option<String>) {
        self.end = end;
    }

    pub fn format(&self) -> RenderFormat {
        self.format
    }

    pub fn set_format(&mut self, format: RenderFormat) {
        self.format = format;
    }

    pub async fn read(&self, targets: &Targets, options: &ReadOptions) -> Result<ReadResult> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| ReaderError::Config("no URL specified".to_string()))?;
        targets.validate()?;

        let url = format!("{base_url}{RENDER_ENDPOINT}");
        let start = options.start.as_deref().or(self.start.as_deref());
        let end = options.end.as_deref().or(self.end.as_deref());

        match targets {
            Targets::Single(target) => {
                let mut frame = self.download(&url, target, start, end).await?;
                self.finish(&mut frame, options);
                Ok(ReadResult::Frame(frame))
            }
            Targets::Many(targets) => {
                let frames = try_join_all(
                    targets
                        .iter()
                        .map(|target| self.download(&url, target, start, end)),
                )
                .await?;
                let mut frame = MetricFrame::concat(frames);
                self.finish(&mut frame, options);
                Ok(ReadResult::Frame(frame))
            }
            Targets::Grouped(groups) => {
                tracing::warn!(
                    groups = groups.len(),
                    "Reading grouped targets is experimental; the result shape may change"
                );
                let mut panel = BTreeMap::new();
                for (label, target) in groups {
                    let mut frame = self.download(&url, target, start, end).await?;
                    self.finish(&mut frame, options);
                    panel.insert(label.clone(), frame);
                }
                Ok(ReadResult::Panel(panel))
            }
        }
    }

    async fn download(
        &self,
        url: &str,
        target: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<MetricFrame> {
        let mut params = vec![("target", target), ("format", self.format.as_str())];
        if let Some(start) = start {
            params.push(("from", start));
        }
        if let Some(end) = end {
            params.push(("until", end));
        }

        tracing::debug!(url = %url, target = %target, format = %self.format, "Rendering target");
        let body = http::get_text(&self.client, url, &params).await?;
        let series = self.format.parse(&body)?;
        tracing::debug!(target = %target, series = series.len(), "Rendered target");
        Ok(MetricFrame::from_series(series))
    }

    fn finish(&self, frame: &mut MetricFrame, options: &ReadOptions) {
        if options.create_multiindex {
            frame.compact_labels(options.remove_duplicates);
        }
    }
}
