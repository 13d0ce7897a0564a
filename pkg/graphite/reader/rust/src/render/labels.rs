// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

//! Column label compaction.
//!
//! Metric names fetched together usually share most of their dotted segments
//! (`servers.web1.cpu`, `servers.web2.cpu`). Compaction keeps only the segment
//! positions where at least two names disagree, so the columns above become
//! `web1` and `web2`.

use std::collections::BTreeSet;

use super::frame::ColumnLabel;

/// Split every name on `.` and right-pad with empty segments to the longest split.
pub fn padded_segments<S: AsRef<str>>(identifiers: &[S]) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = identifiers
        .iter()
        .map(|id| id.as_ref().split('.').map(str::to_string).collect())
        .collect();
    let max_length = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(max_length, String::new());
    }
    rows
}

/// Sorted positions at which any two rows disagree.
pub fn varying_positions(rows: &[Vec<String>]) -> Vec<usize> {
    let mut positions = BTreeSet::new();
    for (i, row) in rows.iter().enumerate() {
        for other in rows.iter().skip(i + 1) {
            for (pos, (a, b)) in row.iter().zip(other).enumerate() {
                if a != b && !positions.contains(&pos) {
                    positions.insert(pos);
                }
            }
        }
    }
    positions.into_iter().collect()
}

/// One multi-level label per identifier, in input order.
///
/// With `remove_duplicates` and at least two identifiers only the varying
/// positions survive; identical identifiers therefore all get the empty label.
/// Otherwise every padded segment is kept.
pub fn compact<S: AsRef<str>>(identifiers: &[S], remove_duplicates: bool) -> Vec<ColumnLabel> {
    let rows = padded_segments(identifiers);
    if !remove_duplicates || rows.len() < 2 {
        return rows.into_iter().map(ColumnLabel::new).collect();
    }

    let positions = varying_positions(&rows);
    rows.iter()
        .map(|row| {
            ColumnLabel::new(
                positions
                    .iter()
                    .filter_map(|&pos| row.get(pos).cloned())
                    .collect(),
            )
        })
        .collect()
}
