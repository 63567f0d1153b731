use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub const SCHEMA_VERSION: u32 = 1;

/// Synthetic author key carrying a day's total commit count.
pub const DAY_TOTAL_KEY: &str = "TOTAL@commits";

/// Email assigned to co-author trailers that cannot be parsed.
/// Sentinel identities are never merged with real ones.
pub const SENTINEL_EMAIL: &str = "unknown@invalid.com";

/// Fallback for commits or pull requests with no recorded author.
pub const UNKNOWN_AUTHOR: &str = "unknown";

fn default_unknown() -> String {
    UNKNOWN_AUTHOR.to_string()
}

fn default_milestone() -> String {
    "None".to_string()
}

/// One commit as ingested from the version-control host. Read-only input;
/// produced by the external ingestion adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCommit {
    pub sha: String,
    #[serde(default = "default_unknown")]
    pub author_name: String,
    #[serde(default = "default_unknown")]
    pub author_email: String,
    pub committed_at: DateTime<Utc>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub changed_files: u64,
    #[serde(default)]
    pub url: String,
}

impl RawCommit {
    pub fn author_email_or_unknown(&self) -> &str {
        if self.author_email.is_empty() {
            UNKNOWN_AUTHOR
        } else {
            &self.author_email
        }
    }

    pub fn author_name_or_unknown(&self) -> &str {
        if self.author_name.is_empty() {
            UNKNOWN_AUTHOR
        } else {
            &self.author_name
        }
    }

    /// Lines touched by this commit (additions + deletions).
    pub fn lines_changed(&self) -> u64 {
        self.additions + self.deletions
    }
}

/// A `(name, email)` pair parsed from a `Co-authored-by:` trailer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoAuthor {
    pub name: String,
    pub email: String,
}

impl CoAuthor {
    pub fn is_sentinel(&self) -> bool {
        self.email == SENTINEL_EMAIL
    }
}

/// Per-identity running aggregate, keyed by email before consolidation and
/// by the chosen primary email after it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorStats {
    pub email: String,
    pub name: String,
    /// Commits where this identity was the main author. Co-authored-only
    /// appearances do not count here.
    pub commits: u64,
    pub additions: u64,
    pub deletions: u64,
    /// Always equals `additions + deletions`.
    pub total: u64,
    pub biggest_commit: u64,
    pub biggest_commit_url: String,
    /// Lines of commits where this identity appeared as a co-author.
    pub co_authored_lines: u64,
    pub average_changes: f64,
    /// Project-wide average changes per commit, written onto every entry.
    pub group_average: f64,
    pub additions_deletions_ratio: f64,
}

impl AuthorStats {
    pub fn new(email: &str, name: &str) -> Self {
        Self {
            email: email.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Fold one main-authored commit into this entry.
    pub fn record_commit(&mut self, commit: &RawCommit) {
        self.additions += commit.additions;
        self.deletions += commit.deletions;
        self.total = self.additions + self.deletions;
        self.commits += 1;
        let changed = commit.lines_changed();
        if changed > self.biggest_commit {
            self.biggest_commit = changed;
            self.biggest_commit_url = commit.url.clone();
        }
    }

    /// Credit this identity with a commit it co-authored.
    pub fn record_co_authored(&mut self, lines: u64) {
        self.co_authored_lines += lines;
    }

    /// Write the derived fields after a full pass. The ratio is the raw
    /// `additions` value when there are no deletions (and 0 when there is
    /// nothing at all), never infinity.
    pub fn finalize(&mut self, group_average: f64) {
        self.average_changes = if self.commits == 0 {
            0.0
        } else {
            self.total as f64 / self.commits as f64
        };
        self.additions_deletions_ratio = if self.deletions > 0 {
            self.additions as f64 / self.deletions as f64
        } else if self.additions > 0 {
            self.additions as f64
        } else {
            0.0
        };
        self.group_average = group_average;
    }
}

/// One calendar day (`YYYY-MM-DD`, UTC) mapped to a commit count per author
/// email, plus the synthetic [`DAY_TOTAL_KEY`] entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayEntry {
    pub day: String,
    pub counts: BTreeMap<String, u64>,
}

/// Per-commit drill-down record for day-level detail views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitDetail {
    pub sha: String,
    pub day: String,
    pub committed_at: DateTime<Utc>,
    pub author_name: String,
    pub author_email: String,
    pub message: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrLabel {
    pub name: String,
    #[serde(default)]
    pub color: String,
}

/// One pull request, already enriched with reviews and comments by the
/// ingestion adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestRecord {
    pub number: u64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: String,
    #[serde(default = "default_milestone")]
    pub milestone: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub merged_at: Option<DateTime<Utc>>,
    #[serde(default = "default_unknown")]
    pub author: String,
    /// Number of reviews submitted on this PR.
    #[serde(default)]
    pub reviews: u64,
    /// Concatenated bodies of all review comments.
    #[serde(default)]
    pub review_comment_text: String,
    /// Issue-comment count.
    #[serde(default)]
    pub comments: u64,
    /// Count of `#<digits>` issue-reference tokens in the PR body.
    #[serde(default)]
    pub linked_issues: u64,
    /// Reviewer login -> number of reviews on this PR.
    #[serde(default)]
    pub reviewers: BTreeMap<String, u64>,
    /// Commenter login -> number of comments on this PR.
    #[serde(default)]
    pub commenters: BTreeMap<String, u64>,
    #[serde(default)]
    pub labels: Vec<PrLabel>,
}

impl PullRequestRecord {
    pub fn author_or_unknown(&self) -> &str {
        if self.author.is_empty() {
            UNKNOWN_AUTHOR
        } else {
            &self.author
        }
    }

    pub fn pr_ref(&self) -> PrRef {
        PrRef {
            number: self.number,
            title: self.title.clone(),
            url: self.url.clone(),
        }
    }
}

/// Lightweight handle used wherever a member is associated with a PR list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrRef {
    pub number: u64,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemberActivity {
    pub count: u64,
    pub prs: Vec<PrRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelUsage {
    pub count: u64,
    pub color: String,
}

/// Derived, non-persisted aggregate over a set of pull requests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PullRequestSummary {
    pub total_prs: u64,
    pub open_prs: u64,
    pub closed_prs: u64,
    pub merged_prs: u64,
    /// Mean hours from creation to merge over merged PRs; 0 when none.
    pub average_time_to_merge_hours: f64,
    pub prs_by_member: BTreeMap<String, MemberActivity>,
    /// Reviewer login -> review count plus the PRs reviewed. A reviewer is
    /// credited the number of reviews, not one per PR.
    pub reviews_by_member: BTreeMap<String, MemberActivity>,
    pub comments_by_member: BTreeMap<String, u64>,
    pub prs_with_review: u64,
    pub prs_without_review: u64,
    pub total_comments: u64,
    pub average_comments_per_pr: f64,
    pub prs_linked_to_issues: u64,
    pub percentage_linked_to_issues: f64,
    pub milestones: BTreeSet<String>,
    pub label_usage: BTreeMap<String, LabelUsage>,
    pub fast_merge_threshold_minutes: i64,
    /// PRs merged within the threshold of their creation, inclusive.
    pub fast_merged: Vec<PrRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorsOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub owner: String,
    pub repo: String,
    pub since: Option<String>,
    pub until: Option<String>,
    pub consolidated: bool,
    pub overall_commits: u64,
    pub overall_total: u64,
    pub group_average: f64,
    pub authors: Vec<AuthorStats>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub owner: String,
    pub repo: String,
    pub since: Option<String>,
    pub until: Option<String>,
    pub total_commits: u64,
    pub names: BTreeMap<String, String>,
    pub days: Vec<DayEntry>,
    pub details: Vec<CommitDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullsOutput {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub owner: String,
    pub repo: String,
    pub state: String,
    /// Pull requests dropped because their enrichment failed upstream.
    pub skipped_pulls: u64,
    pub summary: PullRequestSummary,
}

#[derive(Debug, Clone)]
pub struct DateRange {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new() -> Self {
        Self { since: None, until: None }
    }

    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn with_until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        if let Some(since) = self.since {
            if timestamp < &since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if timestamp > &until {
                return false;
            }
        }
        true
    }
}

impl Default for DateRange {
    fn default() -> Self {
        Self::new()
    }
}
