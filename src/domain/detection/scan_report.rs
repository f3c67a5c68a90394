// ============================================================
// SCAN RESULT TYPES
// ============================================================
// Running tally, bounded preview and the final report of one upload

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Number of rows that received one label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub count: usize,
}

/// Label frequencies accumulated over every chunk of one operation.
///
/// Labels are kept in the order they were first produced, which makes the
/// headline tie-break deterministic.
#[derive(Debug, Clone, Default)]
pub struct ResultTally {
    entries: Vec<LabelCount>,
    index: HashMap<String, usize>,
}

impl ResultTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, label: &str) {
        match self.index.get(label) {
            Some(&pos) => self.entries[pos].count += 1,
            None => {
                self.index.insert(label.to_string(), self.entries.len());
                self.entries.push(LabelCount {
                    label: label.to_string(),
                    count: 1,
                });
            }
        }
    }

    pub fn record_all<S: AsRef<str>>(&mut self, labels: &[S]) {
        for label in labels {
            self.record(label.as_ref());
        }
    }

    pub fn count(&self, label: &str) -> usize {
        self.index
            .get(label)
            .map(|&pos| self.entries[pos].count)
            .unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn into_entries(self) -> Vec<LabelCount> {
        self.entries
    }

    /// Most frequent label other than `baseline`.
    ///
    /// Equal counts resolve to the label seen first. Falls back to
    /// `baseline` when nothing else was predicted.
    pub fn headline(&self, baseline: &str) -> String {
        let mut best: Option<&LabelCount> = None;
        for entry in self.entries.iter().filter(|e| e.label != baseline) {
            if best.map_or(true, |b| entry.count > b.count) {
                best = Some(entry);
            }
        }
        best.map(|e| e.label.clone())
            .unwrap_or_else(|| baseline.to_string())
    }
}

/// First `limit` result rows of an operation; frozen once full.
#[derive(Debug, Clone)]
pub struct PreviewBuffer {
    rows: Vec<String>,
    limit: usize,
}

impl PreviewBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            rows: Vec::with_capacity(limit.min(1024)),
            limit,
        }
    }

    pub fn is_full(&self) -> bool {
        self.rows.len() >= self.limit
    }

    pub fn extend_from(&mut self, labels: &[String]) {
        if self.is_full() {
            return;
        }
        let room = self.limit - self.rows.len();
        self.rows.extend(labels.iter().take(room).cloned());
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<String> {
        self.rows
    }
}

/// Result of a completed upload-and-predict operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Most frequent non-baseline label
    pub headline_attack: String,

    /// Label counts in first-seen order
    pub summary: Vec<LabelCount>,

    /// First rows of the prediction output
    pub preview: Vec<String>,

    /// Number of input rows classified
    pub total_rows: usize,

    /// Number of chunks processed
    pub chunk_count: usize,

    /// Where the full prediction file was written
    pub output_path: PathBuf,

    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_counts_and_total() {
        let mut tally = ResultTally::new();
        tally.record_all(&["BENIGN", "DoS", "BENIGN"]);
        assert_eq!(tally.count("BENIGN"), 2);
        assert_eq!(tally.count("DoS"), 1);
        assert_eq!(tally.count("PortScan"), 0);
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn test_headline_ignores_baseline() {
        let mut tally = ResultTally::new();
        tally.record_all(&["BENIGN", "BENIGN", "BENIGN", "PortScan"]);
        assert_eq!(tally.headline("BENIGN"), "PortScan");
    }

    #[test]
    fn test_headline_falls_back_to_baseline() {
        let mut tally = ResultTally::new();
        assert_eq!(tally.headline("BENIGN"), "BENIGN");
        tally.record_all(&["BENIGN", "BENIGN"]);
        assert_eq!(tally.headline("BENIGN"), "BENIGN");
    }

    #[test]
    fn test_headline_tie_goes_to_first_seen() {
        let mut tally = ResultTally::new();
        tally.record_all(&["DDoS", "PortScan", "PortScan", "DDoS"]);
        assert_eq!(tally.headline("BENIGN"), "DDoS");
    }

    #[test]
    fn test_preview_freezes_at_limit() {
        let mut preview = PreviewBuffer::new(3);
        preview.extend_from(&["a".to_string(), "b".to_string()]);
        preview.extend_from(&["c".to_string(), "d".to_string()]);
        assert!(preview.is_full());
        preview.extend_from(&["e".to_string()]);
        assert_eq!(preview.into_rows(), vec!["a", "b", "c"]);
    }
}
