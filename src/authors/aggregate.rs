use crate::coauthor::extract_co_authors;
use crate::model::{AuthorStats, RawCommit};
use std::collections::HashMap;

/// Per-email statistics plus the project-wide totals derived from them.
#[derive(Debug, Clone, Default)]
pub struct AuthorAggregate {
    pub by_email: HashMap<String, AuthorStats>,
    pub overall_total: u64,
    pub overall_commits: u64,
    pub group_average: f64,
}

/// Fold the commit stream into per-author statistics.
///
/// Main authors accumulate additions/deletions and commit count; co-authors
/// named in trailers accumulate only `co_authored_lines`. Sentinel
/// co-authors (unparseable trailers) are skipped here.
pub fn aggregate_authors(commits: &[RawCommit]) -> AuthorAggregate {
    let mut by_email: HashMap<String, AuthorStats> = HashMap::new();

    for commit in commits {
        let email = commit.author_email_or_unknown().to_string();
        by_email
            .entry(email.clone())
            .or_insert_with(|| AuthorStats::new(&email, commit.author_name_or_unknown()))
            .record_commit(commit);

        let changed = commit.lines_changed();
        for coauthor in extract_co_authors(&commit.message) {
            if coauthor.is_sentinel() {
                continue;
            }
            by_email
                .entry(coauthor.email.clone())
                .or_insert_with(|| AuthorStats::new(&coauthor.email, &coauthor.name))
                .record_co_authored(changed);
        }
    }

    finalize(by_email)
}

/// Compute the project-wide totals and write the derived fields onto every
/// entry. Shared with the consolidator, which re-runs it over the merged set.
pub(crate) fn finalize(mut by_email: HashMap<String, AuthorStats>) -> AuthorAggregate {
    let overall_total: u64 = by_email.values().map(|s| s.total).sum();
    let overall_commits: u64 = by_email.values().map(|s| s.commits).sum();
    let group_average = if overall_commits == 0 {
        0.0
    } else {
        overall_total as f64 / overall_commits as f64
    };

    for stats in by_email.values_mut() {
        stats.finalize(group_average);
    }

    AuthorAggregate {
        by_email,
        overall_total,
        overall_commits,
        group_average,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn commit(
        sha: &str,
        name: &str,
        email: &str,
        additions: u64,
        deletions: u64,
        message: &str,
    ) -> RawCommit {
        RawCommit {
            sha: sha.to_string(),
            author_name: name.to_string(),
            author_email: email.to_string(),
            committed_at: Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap(),
            message: message.to_string(),
            additions,
            deletions,
            changed_files: 1,
            url: format!("https://example.com/commit/{sha}"),
        }
    }

    #[test]
    fn end_to_end_scenario_with_coauthor() {
        let commits = vec![
            commit(
                "c1",
                "Bob",
                "bob@x.com",
                10,
                0,
                "feat\n\nCo-authored-by: Carol <carol@y.com>",
            ),
            commit("c2", "Carol", "carol@y.com", 0, 5, "fix"),
        ];
        let aggregate = aggregate_authors(&commits);

        let bob = &aggregate.by_email["bob@x.com"];
        assert_eq!(bob.commits, 1);
        assert_eq!(bob.total, 10);
        assert_eq!(bob.co_authored_lines, 0);

        let carol = &aggregate.by_email["carol@y.com"];
        assert_eq!(carol.commits, 1);
        assert_eq!(carol.total, 5);
        assert_eq!(carol.co_authored_lines, 10);
    }

    #[test]
    fn total_invariant_holds_for_every_entry() {
        let commits = vec![
            commit("c1", "A", "a@x.com", 3, 4, ""),
            commit("c2", "A", "a@x.com", 10, 2, ""),
            commit("c3", "B", "b@x.com", 0, 0, ""),
        ];
        let aggregate = aggregate_authors(&commits);
        for stats in aggregate.by_email.values() {
            assert_eq!(stats.total, stats.additions + stats.deletions);
        }
    }

    #[test]
    fn biggest_commit_tracks_url() {
        let commits = vec![
            commit("small", "A", "a@x.com", 1, 1, ""),
            commit("big", "A", "a@x.com", 50, 30, ""),
            commit("mid", "A", "a@x.com", 20, 0, ""),
        ];
        let aggregate = aggregate_authors(&commits);
        let a = &aggregate.by_email["a@x.com"];
        assert_eq!(a.biggest_commit, 80);
        assert_eq!(a.biggest_commit_url, "https://example.com/commit/big");
    }

    #[test]
    fn empty_commit_still_counts() {
        let commits = vec![commit("c1", "A", "a@x.com", 0, 0, "")];
        let aggregate = aggregate_authors(&commits);
        let a = &aggregate.by_email["a@x.com"];
        assert_eq!(a.commits, 1);
        assert_eq!(a.average_changes, 0.0);
        assert_eq!(a.additions_deletions_ratio, 0.0);
    }

    #[test]
    fn missing_author_defaults_to_unknown() {
        let mut c = commit("c1", "", "", 1, 0, "");
        c.author_name.clear();
        c.author_email.clear();
        let aggregate = aggregate_authors(&[c]);
        assert!(aggregate.by_email.contains_key("unknown"));
    }

    #[test]
    fn ratio_is_raw_additions_without_deletions() {
        let commits = vec![commit("c1", "A", "a@x.com", 10, 0, "")];
        let aggregate = aggregate_authors(&commits);
        assert_eq!(aggregate.by_email["a@x.com"].additions_deletions_ratio, 10.0);
    }

    #[test]
    fn group_average_spans_all_entries() {
        let commits = vec![
            commit("c1", "A", "a@x.com", 10, 0, ""),
            commit("c2", "B", "b@x.com", 0, 20, ""),
        ];
        let aggregate = aggregate_authors(&commits);
        assert_eq!(aggregate.overall_total, 30);
        assert_eq!(aggregate.overall_commits, 2);
        assert_eq!(aggregate.group_average, 15.0);
        for stats in aggregate.by_email.values() {
            assert_eq!(stats.group_average, 15.0);
        }
    }

    #[test]
    fn sentinel_coauthor_gets_no_entry() {
        let commits = vec![commit(
            "c1",
            "A",
            "a@x.com",
            5,
            0,
            "x\n\nCo-authored-by: garbage",
        )];
        let aggregate = aggregate_authors(&commits);
        assert_eq!(aggregate.by_email.len(), 1);
    }

    #[test]
    fn duplicate_trailers_credit_twice() {
        let commits = vec![commit(
            "c1",
            "A",
            "a@x.com",
            4,
            0,
            "x\n\nCo-authored-by: B <b@x.com>\nCo-authored-by: B <b@x.com>",
        )];
        let aggregate = aggregate_authors(&commits);
        assert_eq!(aggregate.by_email["b@x.com"].co_authored_lines, 8);
    }
}
