//! Per-item outcomes for batch operations that skip bad input and continue.

use std::fmt;

use serde::Serialize;

/// Why an item was left out of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    MissingBfe,
    MissingGeometry,
    UnsupportedGeometry(String),
    InvalidGeometry(String),
    UnknownElevation,
    NonAscii,
    Duplicate { of: String, score: u8 },
    FetchFailed(String),
    NoInfoBlock,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingBfe => write!(f, "no flood elevation value"),
            SkipReason::MissingGeometry => write!(f, "missing geometry"),
            SkipReason::UnsupportedGeometry(kind) => write!(f, "unsupported geometry type {kind}"),
            SkipReason::InvalidGeometry(msg) => write!(f, "invalid geometry: {msg}"),
            SkipReason::UnknownElevation => write!(f, "elevation unknown"),
            SkipReason::NonAscii => write!(f, "title is not plain ASCII"),
            SkipReason::Duplicate { of, score } => {
                write!(f, "duplicate of \"{of}\" (similarity {score})")
            }
            SkipReason::FetchFailed(msg) => write!(f, "fetch failed: {msg}"),
            SkipReason::NoInfoBlock => write!(f, "alert has no info block"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedItem {
    pub index: usize,
    pub label: Option<String>,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Outcome of handling one item of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    Accepted,
    Skipped(SkipReason),
}

/// Accepted count and the skipped items of a batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub accepted: usize,
    pub skipped: Vec<SkippedItem>,
}

impl IngestReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, index: usize, label: Option<&str>, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Accepted => self.accepted += 1,
            ItemOutcome::Skipped(reason) => {
                tracing::debug!(index, label, %reason, "skipped item");
                self.skipped.push(SkippedItem {
                    index,
                    label: label.map(str::to_string),
                    reason,
                });
            }
        }
    }

    pub fn accept(&mut self) {
        self.accepted += 1;
    }

    pub fn skip(&mut self, index: usize, label: Option<&str>, reason: SkipReason) {
        self.record(index, label, ItemOutcome::Skipped(reason));
    }

    pub fn total(&self) -> usize {
        self.accepted + self.skipped.len()
    }
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} accepted, {} skipped", self.accepted, self.skipped.len())
    }
}

/// Result of a flood dataset load.
pub type LoadReport = IngestReport;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts_outcomes_in_order() {
        let mut report = IngestReport::new();
        report.record(0, Some("a"), ItemOutcome::Accepted);
        report.record(1, Some("b"), ItemOutcome::Skipped(SkipReason::MissingBfe));
        report.record(2, None, ItemOutcome::Skipped(SkipReason::NonAscii));

        assert_eq!(report.accepted, 1);
        assert_eq!(report.total(), 3);
        assert_eq!(report.skipped[0].index, 1);
        assert_eq!(report.skipped[1].reason, SkipReason::NonAscii);
        assert_eq!(report.to_string(), "1 accepted, 2 skipped");
    }

    #[test]
    fn skipped_item_serializes_reason_inline() {
        let item = SkippedItem {
            index: 4,
            label: None,
            reason: SkipReason::Duplicate {
                of: "Flood warning".to_string(),
                score: 92,
            },
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["reason"], "duplicate");
        assert_eq!(value["detail"]["score"], 92);
    }
}
