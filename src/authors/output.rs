use super::aggregate::AuthorAggregate;
use crate::cli::CommonArgs;
use crate::ingest::Snapshot;
use crate::model::{AuthorStats, AuthorsOutput, SCHEMA_VERSION};
use anyhow::Result;
use chrono::Utc;
use console::style;

/// Entries sorted by total lines descending, then email for stability.
pub fn sorted_entries(aggregate: &AuthorAggregate) -> Vec<AuthorStats> {
    let mut entries: Vec<AuthorStats> = aggregate.by_email.values().cloned().collect();
    entries.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.email.cmp(&b.email)));
    entries
}

pub fn build_output(
    aggregate: &AuthorAggregate,
    snapshot: &Snapshot,
    common: &CommonArgs,
    consolidated: bool,
) -> AuthorsOutput {
    AuthorsOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        owner: snapshot.owner.clone(),
        repo: snapshot.repo.clone(),
        since: common.since.clone(),
        until: common.until.clone(),
        consolidated,
        overall_commits: aggregate.overall_commits,
        overall_total: aggregate.overall_total,
        group_average: aggregate.group_average,
        authors: sorted_entries(aggregate),
    }
}

pub fn output_json(output: &AuthorsOutput) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}

pub fn output_ndjson(authors: &[AuthorStats]) -> Result<()> {
    for stats in authors {
        println!("{}", serde_json::to_string(stats)?);
    }
    Ok(())
}

pub fn output_table(output: &AuthorsOutput) -> Result<()> {
    println!(
        "{:<20} {:<30} {:>7} {:>8} {:>8} {:>8} {:>8} {:>8}",
        style("Name").bold(),
        style("Email").bold(),
        style("Commits").bold(),
        style("Added").bold(),
        style("Deleted").bold(),
        style("Total").bold(),
        style("Avg").bold(),
        style("CoAuth").bold()
    );
    println!("{}", "─".repeat(104));
    for stats in output.authors.iter().take(50) {
        println!(
            "{:<20} {:<30} {:>7} {:>8} {:>8} {:>8} {:>8.1} {:>8}",
            truncate(&stats.name, 20),
            truncate(&stats.email, 30),
            stats.commits,
            stats.additions,
            stats.deletions,
            stats.total,
            stats.average_changes,
            stats.co_authored_lines
        );
    }
    if output.authors.len() > 50 {
        println!("\n... and {} more entries", output.authors.len() - 50);
    }
    println!(
        "\n{} {:.1} lines over {} commits",
        style("Group average:").bold(),
        output.group_average,
        output.overall_commits
    );
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        s.to_string()
    }
}
