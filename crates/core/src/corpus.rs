use crate::datasets::Dataset;
use serde_json::Value;
use std::collections::HashSet;

/// Cleaned, deduplicated result table for one dataset.
///
/// Positions are dense 0-based indices, so indices handed out by the
/// similarity ranker map straight back into this table.
#[derive(Debug, Clone)]
pub struct Corpus<R> {
    rows: Vec<R>,
    dropped: usize,
    duplicates: usize,
}

impl<R: Dataset> Corpus<R> {
    /// Sanitize raw API records: drop rows that fail typed validation,
    /// then drop rows repeating an already-seen dedup key (first one wins,
    /// in input order).
    pub fn from_raw(records: Vec<Value>) -> Self {
        let mut rows = Vec::with_capacity(records.len());
        let mut seen = HashSet::with_capacity(records.len());
        let mut dropped = 0;
        let mut duplicates = 0;

        for record in records {
            let row: R = match serde_json::from_value(record) {
                Ok(row) => row,
                Err(_) => {
                    dropped += 1;
                    continue;
                }
            };

            if !seen.insert(row.dedup_key()) {
                duplicates += 1;
                continue;
            }

            rows.push(row);
        }

        Self {
            rows,
            dropped,
            duplicates,
        }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&R> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Records rejected for a missing or null mandatory field.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Records rejected as duplicates of an earlier row.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// The designated text column, in row order.
    pub fn texts(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.search_text().to_string())
            .collect()
    }

    /// Narrow the table in place; surviving rows are re-indexed densely.
    pub fn retain(&mut self, keep: impl FnMut(&R) -> bool) {
        self.rows.retain(keep);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }
}
