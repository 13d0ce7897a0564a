// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

//! Finder port for namespace metadata.
//! Implementations live next to it: the HTTP adapter in `api`, an in-memory one here.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::node::{LeafFlagEncoding, MetricNode};
use crate::error::Result;

/// Source of namespace metadata.
///
/// A query of `prefix.*` (or `*` at the root) must return exactly the direct
/// children of `prefix`. `start` and `end` are forwarded untouched.
#[async_trait]
pub trait MetricsFinder: Send + Sync {
    async fn find(
        &self,
        query: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Vec<MetricNode>>;

    /// Leaf flag values this finder's nodes are decoded with.
    fn leaf_encoding(&self) -> LeafFlagEncoding {
        LeafFlagEncoding::default()
    }
}

#[derive(Default)]
struct Tree {
    /// Direct children keyed by parent path ("" is the root)
    children: BTreeMap<String, Vec<MetricNode>>,
    queries: Vec<String>,
}

/// In-memory finder built from a list of metric paths.
///
/// Records every query it answers, which makes round-trip counts observable.
#[derive(Clone, Default)]
pub struct InMemoryFinder {
    tree: Arc<Mutex<Tree>>,
    encoding: LeafFlagEncoding,
}

impl InMemoryFinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tree where every path is a leaf and all its prefixes are internal nodes.
    pub fn from_paths<S: AsRef<str>>(paths: &[S]) -> Self {
        let finder = Self::new();
        for path in paths {
            finder.add_path(path.as_ref());
        }
        finder
    }

    pub fn with_encoding(mut self, encoding: LeafFlagEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn add_path(&self, path: &str) {
        let mut tree = self.lock();
        let segments: Vec<&str> = path.split('.').collect();
        let mut parent = String::new();
        for (depth, segment) in segments.iter().enumerate() {
            let id = if parent.is_empty() {
                (*segment).to_string()
            } else {
                format!("{parent}.{segment}")
            };
            let node = if depth + 1 == segments.len() {
                MetricNode::new_leaf(id.clone())
            } else {
                MetricNode::new_internal(id.clone())
            };
            let siblings = tree.children.entry(parent).or_default();
            if !siblings.contains(&node) {
                siblings.push(node);
            }
            parent = id;
        }
    }

    /// Append a raw node under `parent`, duplicates and odd flags included.
    pub fn push_node(&self, parent: &str, node: MetricNode) {
        self.lock()
            .children
            .entry(parent.to_string())
            .or_default()
            .push(node);
    }

    /// Queries answered so far, oldest first
    pub fn queries(&self) -> Vec<String> {
        self.lock().queries.clone()
    }

    pub fn query_count(&self) -> usize {
        self.lock().queries.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tree> {
        self.tree.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl MetricsFinder for InMemoryFinder {
    async fn find(
        &self,
        query: &str,
        _start: Option<&str>,
        _end: Option<&str>,
    ) -> Result<Vec<MetricNode>> {
        let mut tree = self.lock();
        tree.queries.push(query.to_string());

        let parent = if query == "*" {
            Some("")
        } else {
            query.strip_suffix(".*")
        };
        Ok(parent
            .and_then(|p| tree.children.get(p))
            .cloned()
            .unwrap_or_default())
    }

    fn leaf_encoding(&self) -> LeafFlagEncoding {
        self.encoding
    }
}
