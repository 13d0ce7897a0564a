// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

//! Node-by-node navigation of the metric namespace.
//!
//! A [`MetricNamespace`] is bound to one base path. The first lookup of a
//! child name fetches the node's direct children once; the listing is then
//! reused for the whole lifetime of the node, even if the server changes.

use std::sync::Arc;
use tokio::sync::OnceCell;

use super::finder::MetricsFinder;
use super::walker::{self, Walk};
use crate::error::Result;

/// Operations every namespace node answers to, listed before its children by [`MetricNamespace::names`].
pub const NAMESPACE_OPERATIONS: &[&str] = &["base_path", "list", "names", "resolve"];

/// Outcome of looking up a child name.
#[derive(Debug)]
pub enum Resolved {
    /// Full dotted path of a series
    Leaf(String),
    Internal(MetricNamespace),
    NotFound,
}

#[derive(Debug, Clone, Default)]
struct Children {
    leaves: Vec<String>,
    internal: Vec<String>,
}

pub struct MetricNamespace {
    finder: Arc<dyn MetricsFinder>,
    base_path: String,
    children: OnceCell<Children>,
}

impl std::fmt::Debug for MetricNamespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricNamespace")
            .field("base_path", &self.base_path)
            .field("children", &self.children.get())
            .finish()
    }
}

impl MetricNamespace {
    pub fn new(finder: Arc<dyn MetricsFinder>, base_path: impl Into<String>) -> Self {
        Self {
            finder,
            base_path: base_path.into(),
            children: OnceCell::new(),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Whether the child listing has been fetched yet.
    pub fn is_loaded(&self) -> bool {
        self.children.initialized()
    }

    /// Direct children of `base_path` + `path`, without touching the cache.
    pub async fn list(
        &self,
        path: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Vec<String>> {
        walker::list(self.finder.clone(), &join(&self.base_path, path), start, end).await
    }

    /// Look up a direct child by its bare name.
    pub async fn resolve(&self, name: &str) -> Result<Resolved> {
        let children = self.children().await?;
        let full = join(&self.base_path, name);

        if children.leaves.iter().any(|leaf| leaf == name) {
            Ok(Resolved::Leaf(full))
        } else if children.internal.iter().any(|node| node == name) {
            Ok(Resolved::Internal(MetricNamespace::new(
                self.finder.clone(),
                full,
            )))
        } else {
            Ok(Resolved::NotFound)
        }
    }

    /// Intrinsic operations followed by the cached leaf names, then internal names.
    pub async fn names(&self) -> Result<Vec<String>> {
        let children = self.children().await?;
        Ok(NAMESPACE_OPERATIONS
            .iter()
            .map(|op| op.to_string())
            .chain(children.leaves.iter().cloned())
            .chain(children.internal.iter().cloned())
            .collect())
    }

    async fn children(&self) -> Result<&Children> {
        self.children
            .get_or_try_init(|| self.fetch_children())
            .await
    }

    async fn fetch_children(&self) -> Result<Children> {
        let mut walk = Walk::new(self.finder.clone(), &self.base_path, None, None);
        let frame = match walk.next_frame().await {
            Some(frame) => frame?,
            None => return Ok(Children::default()),
        };
        drop(walk);

        let mut leaves: Vec<String> = frame.leaves.iter().map(|id| self.bare_name(id)).collect();
        let mut internal: Vec<String> = frame
            .internal
            .iter()
            .map(|id| self.bare_name(id))
            .collect();
        leaves.sort();
        internal.sort();

        tracing::debug!(
            base_path = %self.base_path,
            leaves = leaves.len(),
            internal = internal.len(),
            "Cached namespace children"
        );
        Ok(Children { leaves, internal })
    }

    fn bare_name(&self, id: &str) -> String {
        if self.base_path.is_empty() {
            return id.to_string();
        }
        id.strip_prefix(self.base_path.as_str())
            .and_then(|rest| rest.strip_prefix('.'))
            .unwrap_or(id)
            .to_string()
    }
}

fn join(base: &str, name: &str) -> String {
    match (base.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (false, true) => base.to_string(),
        (false, false) => format!("{base}.{name}"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::metrics::finder::InMemoryFinder;

    fn root(finder: &InMemoryFinder) -> MetricNamespace {
        MetricNamespace::new(Arc::new(finder.clone()), "")
    }

    #[test]
    fn test_join() {
        assert_eq!(join("", "a"), "a");
        assert_eq!(join("a.b", ""), "a.b");
        assert_eq!(join("a.b", "c"), "a.b.c");
    }

    #[tokio::test]
    async fn test_resolve_leaf_returns_full_path() {
        let finder = InMemoryFinder::from_paths(&["servers.web1.cpu"]);
        let ns = MetricNamespace::new(Arc::new(finder), "servers.web1");
        match ns.resolve("cpu").await.unwrap() {
            Resolved::Leaf(path) => assert_eq!(path, "servers.web1.cpu"),
            other => panic!("expected leaf, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_navigate_down_the_tree() {
        let finder = InMemoryFinder::from_paths(&["servers.web1.mem.used"]);
        let ns = root(&finder);

        let Resolved::Internal(servers) = ns.resolve("servers").await.unwrap() else {
            panic!("servers should be internal");
        };
        assert_eq!(servers.base_path(), "servers");
        assert!(!servers.is_loaded());

        let Resolved::Internal(web1) = servers.resolve("web1").await.unwrap() else {
            panic!("web1 should be internal");
        };
        let Resolved::Internal(mem) = web1.resolve("mem").await.unwrap() else {
            panic!("mem should be internal");
        };
        match mem.resolve("used").await.unwrap() {
            Resolved::Leaf(path) => assert_eq!(path, "servers.web1.mem.used"),
            other => panic!("expected leaf, got {other:?}"),
        }
        assert_eq!(
            finder.queries(),
            vec!["*", "servers.*", "servers.web1.*", "servers.web1.mem.*"]
        );
    }

    #[tokio::test]
    async fn test_cache_is_filled_once() {
        let finder = InMemoryFinder::from_paths(&["servers.web1.cpu"]);
        let ns = root(&finder);

        ns.resolve("servers").await.unwrap();
        ns.resolve("servers").await.unwrap();
        assert_eq!(finder.query_count(), 1);

        assert!(matches!(
            ns.resolve("missing").await.unwrap(),
            Resolved::NotFound
        ));
        assert_eq!(finder.query_count(), 1);
    }

    #[tokio::test]
    async fn test_cache_is_never_refreshed() {
        let finder = InMemoryFinder::from_paths(&["a.x"]);
        let ns = root(&finder);
        assert!(matches!(ns.resolve("a").await.unwrap(), Resolved::Internal(_)));

        finder.add_path("b.y");
        assert!(matches!(ns.resolve("b").await.unwrap(), Resolved::NotFound));

        // a fresh node sees the new branch
        let fresh = root(&finder);
        assert!(matches!(fresh.resolve("b").await.unwrap(), Resolved::Internal(_)));
    }

    #[tokio::test]
    async fn test_names_lists_operations_then_children() {
        let finder = InMemoryFinder::from_paths(&["h.cpu", "h.load", "h.disk.sda"]);
        let ns = MetricNamespace::new(Arc::new(finder), "h");
        assert_eq!(
            ns.names().await.unwrap(),
            vec!["base_path", "list", "names", "resolve", "cpu", "load", "disk"]
        );
    }

    #[tokio::test]
    async fn test_list_is_relative_and_uncached() {
        let finder = InMemoryFinder::from_paths(&["h.disk.sda", "h.disk.sdb", "h.cpu"]);
        let ns = MetricNamespace::new(Arc::new(finder.clone()), "h");

        let children = ns.list("disk", None, None).await.unwrap();
        assert_eq!(children, vec!["h.disk.sda", "h.disk.sdb"]);
        assert!(!ns.is_loaded());

        let own = ns.list("", None, None).await.unwrap();
        assert_eq!(own, vec!["h.cpu", "h.disk"]);
        assert_eq!(finder.queries(), vec!["h.disk.*", "h.*"]);
    }
}
