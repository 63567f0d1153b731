use crate::cli::CommonArgs;
use crate::coauthor::extract_co_authors;
use crate::model::{
    CommitDetail, DayEntry, RawCommit, TimelineOutput, DAY_TOTAL_KEY, SCHEMA_VERSION,
};
use crate::store::{SnapshotStore, KIND_TIMELINE};
use crate::util::day_key;
use anyhow::Context;
use chrono::Utc;
use console::style;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Day-bucketed commit activity plus the drill-down index.
///
/// Co-authors are credited in the per-day per-author counts here, unlike the
/// author aggregator where they never increment `commits`. "Who was active
/// that day" and "who wrote the code" answer different questions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimelineAggregate {
    pub days: Vec<DayEntry>,
    /// Email -> display name; the main author's name wins last-seen, a
    /// co-author's name is only recorded when nothing is known yet.
    pub names: BTreeMap<String, String>,
    pub total_commits: u64,
    pub details: Vec<CommitDetail>,
}

pub fn aggregate_timeline(commits: &[RawCommit]) -> TimelineAggregate {
    let mut day_map: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
    let mut day_totals: BTreeMap<String, u64> = BTreeMap::new();
    let mut names: BTreeMap<String, String> = BTreeMap::new();
    let mut details = Vec::with_capacity(commits.len());

    for commit in commits {
        let day = day_key(&commit.committed_at);
        let email = commit.author_email_or_unknown().to_string();
        let name = commit.author_name_or_unknown().to_string();

        *day_map
            .entry(day.clone())
            .or_default()
            .entry(email.clone())
            .or_insert(0) += 1;
        *day_totals.entry(day.clone()).or_insert(0) += 1;
        names.insert(email.clone(), name.clone());

        for coauthor in extract_co_authors(&commit.message) {
            *day_map
                .entry(day.clone())
                .or_default()
                .entry(coauthor.email.clone())
                .or_insert(0) += 1;
            names.entry(coauthor.email).or_insert(coauthor.name);
        }

        details.push(CommitDetail {
            sha: commit.sha.clone(),
            day: day.clone(),
            committed_at: commit.committed_at,
            author_name: name,
            author_email: email,
            message: commit.message.clone(),
            url: commit.url.clone(),
        });
    }

    let total_commits = day_totals.values().sum();
    for (day, total) in day_totals {
        if let Some(counts) = day_map.get_mut(&day) {
            counts.insert(DAY_TOTAL_KEY.to_string(), total);
        }
    }

    // BTreeMap iteration gives ascending day order; the zero-padded format
    // makes lexicographic order chronological.
    let days = day_map
        .into_iter()
        .map(|(day, counts)| DayEntry { day, counts })
        .collect();

    TimelineAggregate {
        days,
        names,
        total_commits,
        details,
    }
}

pub fn exec(common: CommonArgs, json: bool, ndjson: bool) -> anyhow::Result<()> {
    let snapshot = crate::ingest::load_snapshot(&common.input, !json && !ndjson)
        .context("Failed to load activity snapshot")?;
    let range = crate::util::resolve_range(common.since.as_deref(), common.until.as_deref())
        .context("Failed to resolve date range")?;

    let commits = snapshot.commits_in(&range);
    let aggregate = aggregate_timeline(&commits);

    let out = TimelineOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        owner: snapshot.owner.clone(),
        repo: snapshot.repo.clone(),
        since: common.since.clone(),
        until: common.until.clone(),
        total_commits: aggregate.total_commits,
        names: aggregate.names,
        days: aggregate.days,
        details: aggregate.details,
    };

    if let Some(cache) = common.cache.as_deref() {
        let mut store = SnapshotStore::open(cache).context("Failed to open snapshot store")?;
        store
            .save(&snapshot.owner, &snapshot.repo, KIND_TIMELINE, &out)
            .context("Failed to persist timeline")?;
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if ndjson {
        for day in &out.days {
            println!("{}", serde_json::to_string(day)?);
        }
    } else {
        output_activity(&out)?;
    }

    Ok(())
}

fn output_activity(out: &TimelineOutput) -> anyhow::Result<()> {
    if out.days.is_empty() {
        println!("No data to display");
        return Ok(());
    }

    let max_commits = out
        .days
        .iter()
        .filter_map(|d| d.counts.get(DAY_TOTAL_KEY))
        .max()
        .copied()
        .unwrap_or(1);

    println!("{}", style("Commit Activity").bold());
    println!("{}", "─".repeat(50));

    for day in &out.days {
        let total = day.counts.get(DAY_TOTAL_KEY).copied().unwrap_or(0);
        let intensity = ((total as f64 / max_commits as f64) * 5.0) as u32;
        let bar = match intensity {
            0 => " ",
            1 => "▁",
            2 => "▃",
            3 => "▅",
            4 => "▇",
            _ => "█",
        };
        let authors = day.counts.keys().filter(|k| *k != DAY_TOTAL_KEY).count();
        println!(
            "{} {} commits: {:>3}, authors: {:>2}",
            day.day,
            style(bar).green(),
            total,
            authors
        );
    }

    println!(
        "\n{} {} commits across {} days",
        style("Total:").bold(),
        out.total_commits,
        out.days.len()
    );
    Ok(())
}
