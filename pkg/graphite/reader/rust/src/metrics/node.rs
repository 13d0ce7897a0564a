// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ReaderError, Result};

/// Whether a namespace node has children or holds a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Internal,
    Leaf,
}

/// Accepted encodings of the `leaf` flag in `/metrics/find` answers.
///
/// Graphite-web answers with `0`/`1`. Some compatible servers send booleans or
/// strings instead, so the accepted set is chosen explicitly per transport:
///
/// | encoding  | internal              | leaf                  |
/// |-----------|-----------------------|-----------------------|
/// | `integer` | `0`                   | `1`                   |
/// | `boolean` | `false`               | `true`                |
/// | `lenient` | `0`, `false`, `"0"`, `"false"` | `1`, `true`, `"1"`, `"true"` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeafFlagEncoding {
    #[default]
    Integer,
    Boolean,
    Lenient,
}

impl LeafFlagEncoding {
    /// Decode a raw flag, `None` if this encoding does not accept it.
    pub fn decode(&self, flag: &Value) -> Option<NodeKind> {
        match (self, flag) {
            (LeafFlagEncoding::Integer | LeafFlagEncoding::Lenient, Value::Number(n)) => {
                match n.as_u64() {
                    Some(0) => Some(NodeKind::Internal),
                    Some(1) => Some(NodeKind::Leaf),
                    _ => None,
                }
            }
            (LeafFlagEncoding::Boolean | LeafFlagEncoding::Lenient, Value::Bool(b)) => {
                Some(if *b { NodeKind::Leaf } else { NodeKind::Internal })
            }
            (LeafFlagEncoding::Lenient, Value::String(s)) => match s.as_str() {
                "0" | "false" => Some(NodeKind::Internal),
                "1" | "true" => Some(NodeKind::Leaf),
                _ => None,
            },
            _ => None,
        }
    }
}

/// One record of a `/metrics/find` answer.
///
/// `leaf` is kept raw; it is only interpreted against a [`LeafFlagEncoding`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricNode {
    /// Full dotted path
    pub id: String,
    pub leaf: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl MetricNode {
    pub fn new_internal(id: impl Into<String>) -> Self {
        Self::with_flag(id, Value::from(0))
    }

    pub fn new_leaf(id: impl Into<String>) -> Self {
        Self::with_flag(id, Value::from(1))
    }

    pub fn with_flag(id: impl Into<String>, leaf: Value) -> Self {
        let id = id.into();
        let text = id.rsplit('.').next().map(str::to_string);
        Self { id, leaf, text }
    }

    /// Classify the node, failing with `MalformedMetadata` on an unaccepted flag.
    pub fn kind(&self, encoding: LeafFlagEncoding) -> Result<NodeKind> {
        encoding
            .decode(&self.leaf)
            .ok_or_else(|| ReaderError::MalformedMetadata {
                id: self.id.clone(),
                flag: self.leaf.to_string(),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_integer_encoding() {
        let enc = LeafFlagEncoding::Integer;
        assert_eq!(enc.decode(&json!(0)), Some(NodeKind::Internal));
        assert_eq!(enc.decode(&json!(1)), Some(NodeKind::Leaf));
        assert_eq!(enc.decode(&json!(2)), None);
        assert_eq!(enc.decode(&json!(true)), None);
        assert_eq!(enc.decode(&json!("1")), None);
    }

    #[test]
    fn test_boolean_encoding() {
        let enc = LeafFlagEncoding::Boolean;
        assert_eq!(enc.decode(&json!(false)), Some(NodeKind::Internal));
        assert_eq!(enc.decode(&json!(true)), Some(NodeKind::Leaf));
        assert_eq!(enc.decode(&json!(1)), None);
    }

    #[test]
    fn test_lenient_encoding() {
        let enc = LeafFlagEncoding::Lenient;
        assert_eq!(enc.decode(&json!(0)), Some(NodeKind::Internal));
        assert_eq!(enc.decode(&json!(true)), Some(NodeKind::Leaf));
        assert_eq!(enc.decode(&json!("false")), Some(NodeKind::Internal));
        assert_eq!(enc.decode(&json!("1")), Some(NodeKind::Leaf));
        assert_eq!(enc.decode(&json!("yes")), None);
        assert_eq!(enc.decode(&json!(null)), None);
    }

    #[test]
    fn test_kind_reports_malformed_flag() {
        let node = MetricNode::with_flag("servers.web1", json!(7));
        let err = node.kind(LeafFlagEncoding::Integer).unwrap_err();
        match err {
            ReaderError::MalformedMetadata { id, flag } => {
                assert_eq!(id, "servers.web1");
                assert_eq!(flag, "7");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_deserialize_find_record() {
        let node: MetricNode = serde_json::from_str(
            r#"{"text": "cpu", "expandable": 0, "leaf": 1, "id": "servers.web1.cpu", "allowChildren": 0}"#,
        )
        .unwrap();
        assert_eq!(node.id, "servers.web1.cpu");
        assert_eq!(node.text.as_deref(), Some("cpu"));
        assert_eq!(node.kind(LeafFlagEncoding::Integer).unwrap(), NodeKind::Leaf);
    }
}
