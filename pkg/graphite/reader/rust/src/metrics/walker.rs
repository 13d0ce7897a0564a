// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

//! Depth-first traversal of the metric namespace.
//!
//! A [`Walk`] keeps an explicit stack of paths still to expand. Each call to
//! [`Walk::next_frame`] issues exactly one `find` round-trip, so a consumer that
//! stops early never pays for the rest of the tree, and dropping the walk
//! releases everything it holds.

use futures::Stream;
use std::collections::HashSet;
use std::sync::Arc;

use super::finder::MetricsFinder;
use super::node::NodeKind;
use crate::error::Result;

/// One namespace level: a path and its direct children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkFrame {
    pub path: String,
    pub internal: HashSet<String>,
    pub leaves: HashSet<String>,
}

impl WalkFrame {
    /// Leaf and internal children together, sorted.
    pub fn children(&self) -> Vec<String> {
        let mut children: Vec<String> = self
            .leaves
            .iter()
            .chain(self.internal.iter())
            .cloned()
            .collect();
        children.sort();
        children.dedup();
        children
    }
}

/// The one-level wildcard query for the children of `path`.
pub fn child_query(path: &str) -> String {
    if path.is_empty() {
        "*".to_string()
    } else {
        format!("{path}.*")
    }
}

/// Lazy pre-order traversal rooted at one path.
///
/// Not restartable: walking the same path again re-issues every query.
pub struct Walk {
    finder: Arc<dyn MetricsFinder>,
    start: Option<String>,
    end: Option<String>,
    pending: Vec<String>,
}

impl Walk {
    pub fn new(
        finder: Arc<dyn MetricsFinder>,
        root: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Self {
        Self {
            finder,
            start: start.map(str::to_string),
            end: end.map(str::to_string),
            pending: vec![root.to_string()],
        }
    }

    /// Expand the next pending path.
    ///
    /// On error the remaining traversal is abandoned and later calls return `None`.
    pub async fn next_frame(&mut self) -> Option<Result<WalkFrame>> {
        let path = self.pending.pop()?;
        match self.expand(&path).await {
            Ok(frame) => {
                // Children go on top of the stack so they are visited before
                // any sibling of `path`.
                self.pending.extend(frame.internal.iter().cloned());
                Some(Ok(frame))
            }
            Err(e) => {
                self.pending.clear();
                Some(Err(e))
            }
        }
    }

    async fn expand(&self, path: &str) -> Result<WalkFrame> {
        let query = child_query(path);
        tracing::debug!(path = %path, query = %query, "Expanding namespace level");

        let nodes = self
            .finder
            .find(&query, self.start.as_deref(), self.end.as_deref())
            .await?;

        let encoding = self.finder.leaf_encoding();
        let mut internal = HashSet::new();
        let mut leaves = HashSet::new();
        for node in nodes {
            match node.kind(encoding)? {
                NodeKind::Internal => internal.insert(node.id),
                NodeKind::Leaf => leaves.insert(node.id),
            };
        }

        tracing::trace!(
            path = %path,
            internal = internal.len(),
            leaves = leaves.len(),
            "Namespace level expanded"
        );
        Ok(WalkFrame {
            path: path.to_string(),
            internal,
            leaves,
        })
    }

    /// Consume the whole traversal, stopping at the first error.
    pub async fn collect_frames(mut self) -> Result<Vec<WalkFrame>> {
        let mut frames = Vec::new();
        while let Some(frame) = self.next_frame().await {
            frames.push(frame?);
        }
        Ok(frames)
    }

    /// Adapt the walk into a stream of frames.
    pub fn into_stream(self) -> impl Stream<Item = Result<WalkFrame>> + Send {
        futures::stream::unfold(self, |mut walk| async move {
            walk.next_frame().await.map(|frame| (frame, walk))
        })
    }
}

/// Start a walk at `root` ("" for the top of the tree).
pub fn walk(
    finder: Arc<dyn MetricsFinder>,
    root: &str,
    start: Option<&str>,
    end: Option<&str>,
) -> Walk {
    Walk::new(finder, root, start, end)
}

/// Direct children of `path`, leaves and internal nodes alike.
///
/// Only the first frame is computed; the rest of the walk is dropped unread.
pub async fn list(
    finder: Arc<dyn MetricsFinder>,
    path: &str,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Vec<String>> {
    let mut walk = Walk::new(finder, path, start, end);
    let first = walk.next_frame().await;
    drop(walk);

    match first {
        Some(frame) => Ok(frame?.children()),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::ReaderError;
    use crate::metrics::finder::InMemoryFinder;
    use crate::metrics::node::{LeafFlagEncoding, MetricNode};
    use futures::StreamExt;
    use proptest::prelude::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sample_tree() -> InMemoryFinder {
        InMemoryFinder::from_paths(&[
            "servers.web1.cpu",
            "servers.web1.mem.used",
            "servers.web1.mem.free",
            "servers.web2.cpu",
            "carbon.agents.relay",
        ])
    }

    #[test]
    fn test_child_query() {
        assert_eq!(child_query(""), "*");
        assert_eq!(child_query("servers.web1"), "servers.web1.*");
    }

    #[tokio::test]
    async fn test_first_frame_is_root() {
        let finder = Arc::new(sample_tree());
        let mut walk = walk(finder.clone(), "", None, None);

        let frame = walk.next_frame().await.unwrap().unwrap();
        assert_eq!(frame.path, "");
        assert_eq!(frame.internal, set(&["servers", "carbon"]));
        assert!(frame.leaves.is_empty());
        assert_eq!(finder.queries(), vec!["*"]);
    }

    #[tokio::test]
    async fn test_full_walk_visits_every_internal_node_once() {
        let finder = Arc::new(sample_tree());
        let frames = walk(finder.clone(), "", None, None)
            .collect_frames()
            .await
            .unwrap();

        let mut paths: Vec<&str> = frames.iter().map(|f| f.path.as_str()).collect();
        paths.sort();
        assert_eq!(
            paths,
            vec![
                "",
                "carbon",
                "carbon.agents",
                "servers",
                "servers.web1",
                "servers.web1.mem",
                "servers.web2",
            ]
        );
        // one round-trip per visited internal node
        assert_eq!(finder.query_count(), frames.len());

        let mem = frames.iter().find(|f| f.path == "servers.web1.mem").unwrap();
        assert_eq!(
            mem.leaves,
            set(&["servers.web1.mem.used", "servers.web1.mem.free"])
        );
        assert!(mem.internal.is_empty());
    }

    #[tokio::test]
    async fn test_walk_from_subtree() {
        let finder = Arc::new(sample_tree());
        let frames = walk(finder.clone(), "servers.web1", None, None)
            .collect_frames()
            .await
            .unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].path, "servers.web1");
        assert_eq!(frames[0].leaves, set(&["servers.web1.cpu"]));
        assert_eq!(frames[0].internal, set(&["servers.web1.mem"]));
        assert_eq!(frames[1].path, "servers.web1.mem");
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_merged() {
        let finder = InMemoryFinder::new();
        finder.push_node("", MetricNode::new_leaf("a"));
        finder.push_node("", MetricNode::new_leaf("a"));
        finder.push_node("", MetricNode::new_internal("b"));
        finder.push_node("", MetricNode::new_internal("b"));

        let frames = walk(Arc::new(finder.clone()), "", None, None)
            .collect_frames()
            .await
            .unwrap();
        assert_eq!(frames[0].leaves, set(&["a"]));
        assert_eq!(frames[0].internal, set(&["b"]));
        // "b" is expanded once even though it was listed twice
        assert_eq!(finder.queries(), vec!["*", "b.*"]);
    }

    #[tokio::test]
    async fn test_early_stop_issues_no_more_queries() {
        let finder = Arc::new(sample_tree());
        let mut walk = walk(finder.clone(), "", None, None);
        walk.next_frame().await.unwrap().unwrap();
        walk.next_frame().await.unwrap().unwrap();
        drop(walk);

        assert_eq!(finder.query_count(), 2);
    }

    #[tokio::test]
    async fn test_walk_is_not_memoized() {
        let finder = Arc::new(sample_tree());
        walk(finder.clone(), "servers", None, None)
            .collect_frames()
            .await
            .unwrap();
        let first = finder.query_count();
        walk(finder.clone(), "servers", None, None)
            .collect_frames()
            .await
            .unwrap();
        assert_eq!(finder.query_count(), first * 2);
    }

    #[tokio::test]
    async fn test_malformed_flag_aborts_after_ancestors() {
        let finder = InMemoryFinder::from_paths(&["servers.web1.cpu"]);
        finder.push_node("servers.web1", MetricNode::with_flag("servers.web1.odd", json!(3)));
        let mut walk = walk(Arc::new(finder), "", None, None);

        assert_eq!(walk.next_frame().await.unwrap().unwrap().path, "");
        assert_eq!(walk.next_frame().await.unwrap().unwrap().path, "servers");
        let err = walk.next_frame().await.unwrap().unwrap_err();
        assert!(matches!(err, ReaderError::MalformedMetadata { .. }));
        assert!(walk.next_frame().await.is_none());
    }

    #[tokio::test]
    async fn test_finder_encoding_is_honoured() {
        let finder = InMemoryFinder::new().with_encoding(LeafFlagEncoding::Boolean);
        finder.push_node("", MetricNode::with_flag("a", json!(true)));
        finder.push_node("", MetricNode::with_flag("b", json!(1)));

        let err = walk(Arc::new(finder), "", None, None)
            .collect_frames()
            .await
            .unwrap_err();
        match err {
            ReaderError::MalformedMetadata { id, .. } => assert_eq!(id, "b"),
            other => unreachable!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_stream_yields_same_frames() {
        let finder = Arc::new(sample_tree());
        let frames: Vec<WalkFrame> = walk(finder.clone(), "carbon", None, None)
            .into_stream()
            .map(|f| f.unwrap())
            .collect()
            .await;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].path, "carbon");
        assert_eq!(frames[1].leaves, set(&["carbon.agents.relay"]));
    }

    #[tokio::test]
    async fn test_list_returns_immediate_children_only() {
        let finder = InMemoryFinder::from_paths(&["n.a", "n.b", "n.c.deep.er"]);
        let finder = Arc::new(finder);
        let children = list(finder.clone(), "n", None, None).await.unwrap();
        assert_eq!(children, vec!["n.a", "n.b", "n.c"]);
        assert_eq!(finder.queries(), vec!["n.*"]);
    }

    #[tokio::test]
    async fn test_list_of_leaf_is_empty() {
        let finder = Arc::new(InMemoryFinder::from_paths(&["n.a"]));
        assert!(list(finder, "n.a", None, None).await.unwrap().is_empty());
    }

    fn run_walk(paths: &[String]) -> Vec<WalkFrame> {
        let finder = Arc::new(InMemoryFinder::from_paths(paths));
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(walk(finder, "", None, None).collect_frames())
            .unwrap()
    }

    proptest! {
        #[test]
        fn prop_every_internal_node_visited_once_in_preorder(
            paths in prop::collection::vec("[a-c](\\.[a-c]){0,3}", 1..12)
        ) {
            let frames = run_walk(&paths);

            let mut expected: HashSet<String> = HashSet::from([String::new()]);
            for path in &paths {
                let segments: Vec<&str> = path.split('.').collect();
                for depth in 1..segments.len() {
                    expected.insert(segments[..depth].join("."));
                }
            }

            let mut position: HashMap<&str, usize> = HashMap::new();
            for (i, frame) in frames.iter().enumerate() {
                prop_assert!(position.insert(frame.path.as_str(), i).is_none());
            }
            let visited: HashSet<String> = position.keys().map(|p| p.to_string()).collect();
            prop_assert_eq!(visited, expected);

            for frame in &frames {
                for child in &frame.internal {
                    prop_assert!(position[frame.path.as_str()] < position[child.as_str()]);
                }
            }

            // every subtree occupies one contiguous run right after its root
            let is_descendant = |root: &str, path: &str| {
                root.is_empty() || path.strip_prefix(root).is_some_and(|rest| rest.starts_with('.'))
            };
            for (i, frame) in frames.iter().enumerate() {
                let size = frames
                    .iter()
                    .filter(|f| f.path != frame.path && is_descendant(&frame.path, &f.path))
                    .count();
                for (offset, f) in frames[i + 1..=i + size].iter().enumerate() {
                    prop_assert!(
                        is_descendant(&frame.path, &f.path),
                        "{} at {} interrupts the subtree of {:?}",
                        f.path,
                        i + 1 + offset,
                        frame.path
                    );
                }
            }
        }
    }
}
