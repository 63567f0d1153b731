//! Combines the author, timeline, and pull-request aggregates into one
//! payload for the dashboard's report generator, and renders the payload as
//! Markdown. Chart images are uploaded by an external step; each section
//! carries an optional pass-through reference the core never interprets.

use crate::authors::{aggregate_authors, consolidate};
use crate::cli::{CommonArgs, StateFilter};
use crate::ingest::Snapshot;
use crate::model::{
    AuthorStats, DateRange, PullRequestSummary, DAY_TOTAL_KEY, SCHEMA_VERSION,
};
use crate::pulls::{filter_state, summarize_pulls};
use crate::store::{SnapshotStore, KIND_REPORT};
use crate::timeline::{aggregate_timeline, TimelineAggregate};
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reference to an externally uploaded chart image. Tolerated absent,
/// present-but-empty, or a URL; aggregates are unaffected either way.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartRef {
    #[serde(default)]
    pub include_image: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ChartRef {
    fn image_url(&self) -> Option<&str> {
        if !self.include_image {
            return None;
        }
        self.url.as_deref().filter(|u| !u.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartRef>,
}

impl<T> ReportSection<T> {
    fn new(data: T) -> Self {
        Self { data, chart: None }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub version: u32,
    pub generated_at: DateTime<Utc>,
    pub owner: String,
    pub repo: String,
    pub group_average: f64,
    pub authors: ReportSection<Vec<AuthorStats>>,
    pub timeline: ReportSection<TimelineAggregate>,
    pub pulls: ReportSection<PullRequestSummary>,
    pub skipped_pulls: u64,
}

pub fn assemble(
    snapshot: &Snapshot,
    range: &DateRange,
    fast_merge_minutes: i64,
) -> ReportData {
    let commits = snapshot.commits_in(range);

    let aggregate = consolidate(aggregate_authors(&commits).by_email);
    let mut authors: Vec<AuthorStats> = aggregate.by_email.values().cloned().collect();
    authors.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.email.cmp(&b.email)));

    let timeline = aggregate_timeline(&commits);

    let (fetched, skipped) = snapshot.partition_pulls();
    let pulls = summarize_pulls(
        &filter_state(fetched, StateFilter::All),
        fast_merge_minutes,
    );

    ReportData {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        owner: snapshot.owner.clone(),
        repo: snapshot.repo.clone(),
        group_average: aggregate.group_average,
        authors: ReportSection::new(authors),
        timeline: ReportSection::new(timeline),
        pulls: ReportSection::new(pulls),
        skipped_pulls: skipped.len() as u64,
    }
}

pub fn render_markdown(report: &ReportData) -> String {
    let mut md = String::new();

    md.push_str(&format!(
        "# Activity report for {}/{}\n\nGenerated {}\n",
        report.owner,
        report.repo,
        report.generated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    md.push_str("\n## Contributors\n\n");
    if let Some(url) = report.authors.chart.as_ref().and_then(ChartRef::image_url) {
        md.push_str(&format!("![Contribution distribution]({url})\n\n"));
    }
    md.push_str("| Name | Commits | Added | Deleted | Total | Avg/commit | Co-authored |\n");
    md.push_str("|---|---|---|---|---|---|---|\n");
    for a in &report.authors.data {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {:.1} | {} |\n",
            a.name, a.commits, a.additions, a.deletions, a.total, a.average_changes,
            a.co_authored_lines
        ));
    }
    md.push_str(&format!(
        "\nGroup average: {:.1} lines changed per commit\n",
        report.group_average
    ));

    let timeline = &report.timeline.data;
    md.push_str("\n## Commit timeline\n\n");
    if let Some(url) = report.timeline.chart.as_ref().and_then(ChartRef::image_url) {
        md.push_str(&format!("![Commit frequency]({url})\n\n"));
    }
    md.push_str(&format!("Total commits: {}\n", timeline.total_commits));
    if let (Some(first), Some(last)) = (timeline.days.first(), timeline.days.last()) {
        md.push_str(&format!("Active from {} to {}\n", first.day, last.day));
    }
    if let Some(busiest) = timeline
        .days
        .iter()
        .max_by_key(|d| d.counts.get(DAY_TOTAL_KEY).copied().unwrap_or(0))
    {
        md.push_str(&format!(
            "Busiest day: {} ({} commits)\n",
            busiest.day,
            busiest.counts.get(DAY_TOTAL_KEY).copied().unwrap_or(0)
        ));
    }

    let pulls = &report.pulls.data;
    md.push_str("\n## Pull requests\n\n");
    if let Some(url) = report.pulls.chart.as_ref().and_then(ChartRef::image_url) {
        md.push_str(&format!("![Pull request activity]({url})\n\n"));
    }
    md.push_str(&format!(
        "Total: {} (open {}, closed {}, merged {})\n\n",
        pulls.total_prs, pulls.open_prs, pulls.closed_prs, pulls.merged_prs
    ));
    md.push_str(&format!(
        "- {} of {} PRs received at least one review\n",
        pulls.prs_with_review, pulls.total_prs
    ));
    md.push_str(&format!(
        "- {:.1} comments per PR on average\n",
        pulls.average_comments_per_pr
    ));
    md.push_str(&format!(
        "- {:.0}% of PRs reference an issue\n",
        pulls.percentage_linked_to_issues
    ));
    md.push_str(&format!(
        "- Average time to merge: {:.1} hours\n",
        pulls.average_time_to_merge_hours
    ));
    if !pulls.fast_merged.is_empty() {
        md.push_str(&format!(
            "\n### Fast-merged (within {} minutes)\n\n",
            pulls.fast_merge_threshold_minutes
        ));
        for pr in &pulls.fast_merged {
            md.push_str(&format!("- #{} {}\n", pr.number, pr.title));
        }
    }
    if !pulls.label_usage.is_empty() {
        md.push_str("\n### Labels\n\n");
        for (name, usage) in &pulls.label_usage {
            md.push_str(&format!("- {} × {}\n", name, usage.count));
        }
    }
    if report.skipped_pulls > 0 {
        md.push_str(&format!(
            "\n> {} pull request(s) were skipped because their data could not be fetched.\n",
            report.skipped_pulls
        ));
    }

    md
}

pub fn exec(common: CommonArgs, json: bool, fast_merge_minutes: i64) -> anyhow::Result<()> {
    let snapshot = crate::ingest::load_snapshot(&common.input, false)
        .context("Failed to load activity snapshot")?;
    let range = crate::util::resolve_range(common.since.as_deref(), common.until.as_deref())
        .context("Failed to resolve date range")?;

    let report = assemble(&snapshot, &range, fast_merge_minutes);

    if let Some(cache) = common.cache.as_deref() {
        let mut store = SnapshotStore::open(cache).context("Failed to open snapshot store")?;
        store
            .save(&snapshot.owner, &snapshot.repo, KIND_REPORT, &report)
            .context("Failed to persist report payload")?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_markdown(&report));
    }

    Ok(())
}
