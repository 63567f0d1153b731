//! Boundary with the external ingestion adapter.
//!
//! The adapter fetches commits and pull requests from the host (pagination,
//! rate limits, and concurrent per-PR enrichment included) and writes a
//! snapshot file. This module only materializes that file; it never touches
//! the network. Pull requests whose enrichment failed upstream arrive as
//! explicit failure entries and are filtered out before aggregation, with
//! the skipped count surfaced to the caller.

use crate::error::{RepopulseError, Result};
use crate::model::{DateRange, PullRequestRecord, RawCommit};
use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub fetched_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub commits: Vec<RawCommit>,
    #[serde(default)]
    pub pulls: Vec<PullEntry>,
}

/// Per-item result of the adapter's enrichment fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PullEntry {
    Fetched(Box<PullRequestRecord>),
    Failed(SkippedPull),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedPull {
    pub number: u64,
    pub error: String,
}

impl Snapshot {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            RepopulseError::Snapshot(format!("{}: {e}", path.as_ref().display()))
        })
    }

    /// Commits within `range`, in snapshot order.
    pub fn commits_in(&self, range: &DateRange) -> Vec<RawCommit> {
        self.commits
            .iter()
            .filter(|c| range.contains(&c.committed_at))
            .cloned()
            .collect()
    }

    /// Split pull entries into enriched records and skipped items. Skipped
    /// pulls are logged with their number so the gap is diagnosable.
    pub fn partition_pulls(&self) -> (Vec<PullRequestRecord>, Vec<SkippedPull>) {
        let mut fetched = Vec::with_capacity(self.pulls.len());
        let mut skipped = Vec::new();
        for entry in &self.pulls {
            match entry {
                PullEntry::Fetched(record) => fetched.push((**record).clone()),
                PullEntry::Failed(failure) => {
                    log::warn!(
                        "skipping pull request #{}: enrichment failed: {}",
                        failure.number,
                        failure.error
                    );
                    skipped.push(failure.clone());
                }
            }
        }
        (fetched, skipped)
    }
}

/// Load a snapshot, showing a spinner when attached to a terminal session.
pub fn load_snapshot<P: AsRef<Path>>(path: P, progress: bool) -> Result<Snapshot> {
    let spinner = if progress {
        let pb = ProgressBar::new_spinner();
        pb.set_message("Reading activity snapshot");
        pb.enable_steady_tick(Duration::from_millis(80));
        Some(pb)
    } else {
        None
    };

    let snapshot = Snapshot::load(path);

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_separates_failures() {
        let json = r#"{
            "owner": "acme",
            "repo": "widgets",
            "commits": [],
            "pulls": [
                {
                    "number": 1,
                    "title": "Add widget",
                    "state": "closed",
                    "created_at": "2024-03-01T10:00:00Z",
                    "author": "alice"
                },
                { "number": 2, "error": "HTTP 502 fetching reviews" }
            ]
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        let (fetched, skipped) = snapshot.partition_pulls();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].number, 1);
        assert_eq!(fetched[0].milestone, "None");
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].number, 2);
    }

    #[test]
    fn commits_in_filters_by_range() {
        let json = r#"{
            "commits": [
                { "sha": "a", "committed_at": "2024-01-01T00:00:00Z" },
                { "sha": "b", "committed_at": "2024-06-01T00:00:00Z" }
            ]
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();
        let range = crate::util::resolve_range(Some("2024-03-01"), None).unwrap();
        let commits = snapshot.commits_in(&range);
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].sha, "b");
        assert_eq!(commits[0].author_email, "unknown");
    }
}
