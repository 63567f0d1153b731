use crate::cli::{CommonArgs, StateFilter};
use crate::model::{
    LabelUsage, PullRequestRecord, PullRequestSummary, PullsOutput, SCHEMA_VERSION,
};
use crate::store::{SnapshotStore, KIND_PULLS};
use crate::util::hours_between;
use anyhow::Context;
use chrono::{Duration, Utc};
use console::style;

/// Keep only pull requests matching the requested state.
pub fn filter_state(pulls: Vec<PullRequestRecord>, state: StateFilter) -> Vec<PullRequestRecord> {
    match state {
        StateFilter::All => pulls,
        StateFilter::Open => pulls.into_iter().filter(|pr| pr.state == "open").collect(),
        StateFilter::Closed => pulls.into_iter().filter(|pr| pr.state != "open").collect(),
    }
}

/// Compute participation statistics over enriched pull requests.
///
/// Counting rules preserved from the dashboard's report semantics:
/// a reviewer is credited the number of reviews, not one per PR; when a PR
/// has any review-comment text its author gets exactly one extra comment
/// credit no matter how many review comments exist; `total_comments` sums
/// the issue-comment count and that one author credit per PR. The fast-merge
/// boundary is inclusive.
pub fn summarize_pulls(pulls: &[PullRequestRecord], threshold_minutes: i64) -> PullRequestSummary {
    let mut summary = PullRequestSummary {
        fast_merge_threshold_minutes: threshold_minutes,
        ..Default::default()
    };
    let mut merge_hours: Vec<f64> = Vec::new();

    for pr in pulls {
        summary.total_prs += 1;
        if pr.state == "open" {
            summary.open_prs += 1;
        } else {
            summary.closed_prs += 1;
        }

        let author = pr.author_or_unknown().to_string();
        let member = summary.prs_by_member.entry(author.clone()).or_default();
        member.count += 1;
        member.prs.push(pr.pr_ref());

        for (reviewer, count) in &pr.reviewers {
            let entry = summary
                .reviews_by_member
                .entry(reviewer.clone())
                .or_default();
            entry.count += count;
            entry.prs.push(pr.pr_ref());
        }

        for (commenter, count) in &pr.commenters {
            *summary
                .comments_by_member
                .entry(commenter.clone())
                .or_insert(0) += count;
        }

        summary.total_comments += pr.comments;
        if !pr.review_comment_text.is_empty() {
            *summary.comments_by_member.entry(author).or_insert(0) += 1;
            summary.total_comments += 1;
        }

        if pr.reviews > 0 {
            summary.prs_with_review += 1;
        } else {
            summary.prs_without_review += 1;
        }

        if pr.linked_issues > 0 {
            summary.prs_linked_to_issues += 1;
        }

        for label in &pr.labels {
            let entry = summary
                .label_usage
                .entry(label.name.clone())
                .or_insert_with(|| LabelUsage {
                    count: 0,
                    color: label.color.clone(),
                });
            entry.count += 1;
        }

        summary.milestones.insert(if pr.milestone.is_empty() {
            "None".to_string()
        } else {
            pr.milestone.clone()
        });

        if let Some(merged_at) = pr.merged_at {
            merge_hours.push(hours_between(&pr.created_at, &merged_at));
            if merged_at - pr.created_at <= Duration::minutes(threshold_minutes) {
                summary.fast_merged.push(pr.pr_ref());
            }
        }
    }

    summary.merged_prs = merge_hours.len() as u64;
    summary.average_time_to_merge_hours = if merge_hours.is_empty() {
        0.0
    } else {
        merge_hours.iter().sum::<f64>() / merge_hours.len() as f64
    };
    if summary.total_prs > 0 {
        summary.average_comments_per_pr =
            summary.total_comments as f64 / summary.total_prs as f64;
        summary.percentage_linked_to_issues =
            summary.prs_linked_to_issues as f64 / summary.total_prs as f64 * 100.0;
    }

    summary
}

pub fn exec(
    common: CommonArgs,
    json: bool,
    ndjson: bool,
    state: StateFilter,
    fast_merge_minutes: i64,
) -> anyhow::Result<()> {
    let snapshot = crate::ingest::load_snapshot(&common.input, !json && !ndjson)
        .context("Failed to load activity snapshot")?;

    let (fetched, skipped) = snapshot.partition_pulls();
    let pulls = filter_state(fetched, state);
    let summary = summarize_pulls(&pulls, fast_merge_minutes);

    let out = PullsOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        owner: snapshot.owner.clone(),
        repo: snapshot.repo.clone(),
        state: format!("{state:?}").to_lowercase(),
        skipped_pulls: skipped.len() as u64,
        summary,
    };

    if let Some(cache) = common.cache.as_deref() {
        let mut store = SnapshotStore::open(cache).context("Failed to open snapshot store")?;
        store
            .save(&snapshot.owner, &snapshot.repo, KIND_PULLS, &out)
            .context("Failed to persist pull-request summary")?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if ndjson {
        for pr in &pulls {
            println!("{}", serde_json::to_string(pr)?);
        }
    } else {
        output_summary(&out)?;
    }

    Ok(())
}

fn output_summary(out: &PullsOutput) -> anyhow::Result<()> {
    let s = &out.summary;

    println!("{}", style("Pull Request Summary").bold());
    println!("{}", "─".repeat(50));
    println!(
        "Total: {} (open: {}, closed: {}, merged: {})",
        style(s.total_prs).cyan(),
        s.open_prs,
        s.closed_prs,
        s.merged_prs
    );
    println!(
        "Review coverage: {} with review, {} without",
        style(s.prs_with_review).green(),
        style(s.prs_without_review).red()
    );
    println!("Average time to merge: {:.1}h", s.average_time_to_merge_hours);
    println!("Average comments per PR: {:.1}", s.average_comments_per_pr);
    println!(
        "Linked to issues: {} ({:.0}%)",
        s.prs_linked_to_issues, s.percentage_linked_to_issues
    );
    if out.skipped_pulls > 0 {
        println!(
            "{} {} pull request(s) skipped: enrichment failed upstream",
            style("Warning:").yellow(),
            out.skipped_pulls
        );
    }

    if !s.prs_by_member.is_empty() {
        println!("\n{}", style("PRs by member").bold());
        for (member, activity) in &s.prs_by_member {
            println!("  {:<25} {:>4}", member, activity.count);
        }
    }
    if !s.reviews_by_member.is_empty() {
        println!("\n{}", style("Reviews by member").bold());
        for (member, activity) in &s.reviews_by_member {
            println!("  {:<25} {:>4}", member, activity.count);
        }
    }
    if !s.fast_merged.is_empty() {
        println!(
            "\n{} (within {} min)",
            style("Fast-merged PRs").bold(),
            s.fast_merge_threshold_minutes
        );
        for pr in &s.fast_merged {
            println!("  #{} {}", pr.number, pr.title);
        }
    }
    Ok(())
}
