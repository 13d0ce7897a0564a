// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2025-present Datadog, Inc.

//! Timestamp-indexed table of metric series.

use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use super::labels;
use crate::error::{ReaderError, Result};

/// Format used when printing timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Multi-level column label, one level per kept metric name segment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ColumnLabel(Vec<String>);

impl ColumnLabel {
    pub fn new(levels: Vec<String>) -> Self {
        Self(levels)
    }

    /// Single-level label holding a whole metric name.
    pub fn flat(name: impl Into<String>) -> Self {
        Self(vec![name.into()])
    }

    pub fn levels(&self) -> &[String] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn level(&self, depth: usize) -> Option<&str> {
        self.0.get(depth).map(String::as_str)
    }

    /// Levels joined back with dots.
    pub fn dotted(&self) -> String {
        self.0.join(".")
    }
}

impl fmt::Display for ColumnLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dotted())
    }
}

impl<S: Into<String>> FromIterator<S> for ColumnLabel {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// A named series as decoded from a render payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub points: Vec<(NaiveDateTime, Option<f64>)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    label: ColumnLabel,
    /// One slot per index row, `None` where the series has no value
    values: Vec<Option<f64>>,
}

impl Column {
    pub fn label(&self) -> &ColumnLabel {
        &self.label
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }
}

/// Series aligned on a shared, sorted timestamp index.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetricFrame {
    index: Vec<NaiveDateTime>,
    columns: Vec<Column>,
}

impl MetricFrame {
    /// One column per series, labelled with the flat series name.
    ///
    /// Repeated timestamps within a series keep the last value.
    pub fn from_series(series: Vec<Series>) -> Self {
        let index = union_index(series.iter().flat_map(|s| s.points.iter().map(|(t, _)| *t)));
        let positions = positions(&index);

        let columns = series
            .into_iter()
            .map(|s| {
                let mut values = vec![None; index.len()];
                for (time, value) in s.points {
                    if let Some(slot) = positions.get(&time).and_then(|&i| values.get_mut(i)) {
                        *slot = value;
                    }
                }
                Column {
                    label: ColumnLabel::flat(s.name),
                    values,
                }
            })
            .collect();

        Self { index, columns }
    }

    /// Outer join of several frames on their timestamps, columns in frame order.
    pub fn concat(frames: Vec<MetricFrame>) -> Self {
        let index = union_index(frames.iter().flat_map(|f| f.index.iter().copied()));
        let positions = positions(&index);

        let mut columns = Vec::new();
        for frame in frames {
            for column in frame.columns {
                let mut values = vec![None; index.len()];
                for (time, value) in frame.index.iter().zip(column.values) {
                    if let Some(slot) = positions.get(time).and_then(|&i| values.get_mut(i)) {
                        *slot = value;
                    }
                }
                columns.push(Column {
                    label: column.label,
                    values,
                });
            }
        }

        Self { index, columns }
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn labels(&self) -> Vec<&ColumnLabel> {
        self.columns.iter().map(Column::label).collect()
    }

    pub fn column(&self, label: &ColumnLabel) -> Option<&Column> {
        self.columns.iter().find(|c| &c.label == label)
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn value(&self, row: usize, column: usize) -> Option<f64> {
        self.columns
            .get(column)
            .and_then(|c| c.values.get(row))
            .copied()
            .flatten()
    }

    /// Replace every column label, in column order.
    pub fn set_labels(&mut self, labels: Vec<ColumnLabel>) -> Result<()> {
        if labels.len() != self.columns.len() {
            return Err(ReaderError::UnsupportedInput(format!(
                "expected {} column labels, got {}",
                self.columns.len(),
                labels.len()
            )));
        }
        for (column, label) in self.columns.iter_mut().zip(labels) {
            column.label = label;
        }
        Ok(())
    }

    /// Stable sort of the columns by label.
    pub fn sort_columns(&mut self) {
        self.columns.sort_by(|a, b| a.label.cmp(&b.label));
    }

    /// Rewrite the labels down to the name segments that differ between columns,
    /// then sort the columns by their new label.
    pub fn compact_labels(&mut self, remove_duplicates: bool) {
        let names: Vec<String> = self.columns.iter().map(|c| c.label.dotted()).collect();
        let compacted = labels::compact(&names, remove_duplicates);
        for (column, label) in self.columns.iter_mut().zip(compacted) {
            column.label = label;
        }
        self.sort_columns();
    }

    /// Prepend a constant outermost level to every column label.
    pub fn add_index_level(&mut self, level: &str) -> Result<()> {
        if level.is_empty() {
            return Err(ReaderError::UnsupportedInput(
                "index level must be a non-empty string".to_string(),
            ));
        }
        for column in &mut self.columns {
            column.label.0.insert(0, level.to_string());
        }
        Ok(())
    }
}

fn union_index(times: impl Iterator<Item = NaiveDateTime>) -> Vec<NaiveDateTime> {
    times.collect::<BTreeSet<_>>().into_iter().collect()
}

fn positions(index: &[NaiveDateTime]) -> HashMap<NaiveDateTime, usize> {
    index.iter().enumerate().map(|(i, t)| (*t, i)).collect()
}

/// Tab-separated table: one header line per label level, then one line per timestamp.
impl fmt::Display for MetricFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // fully collapsed labels still get the timestamp caption
        let depth = self
            .columns
            .iter()
            .map(|c| c.label.depth())
            .max()
            .unwrap_or(0)
            .max(1);
        for level in 0..depth {
            let first = if level + 1 == depth { "timestamp" } else { "" };
            write!(f, "{first}")?;
            for column in &self.columns {
                write!(f, "\t{}", column.label.level(level).unwrap_or(""))?;
            }
            writeln!(f)?;
        }

        for (row, time) in self.index.iter().enumerate() {
            write!(f, "{}", time.format(TIMESTAMP_FORMAT))?;
            for column in &self.columns {
                match column.values.get(row).copied().flatten() {
                    Some(value) => write!(f, "\t{value}")?,
                    None => write!(f, "\t")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
