//! Heuristic identity consolidation.
//!
//! Raw VCS emails are unreliable identity keys: the same student commits
//! from a personal address and a `noreply` address, or with name variants.
//! Two independent grouping passes merge entries that very likely belong to
//! one person: first by normalized email, then by normalized display name
//! over whatever the email pass left untouched. The two passes keep their
//! own tie-break rules on purpose; they are separately tunable heuristics.
//!
//! The heuristic has no failure mode. It can under-merge (distinct emails
//! and short or different names) and over-merge (two people with the same
//! normalized name); both are accepted limitations.

use super::aggregate::{finalize, AuthorAggregate};
use crate::model::{AuthorStats, SENTINEL_EMAIL};
use std::collections::{HashMap, HashSet};

/// Lower-case an email and fold host-specific aliases: Gmail ignores dots in
/// the local part, and `+suffix` tags are ignored everywhere.
pub fn normalize_email(email: &str) -> String {
    let lower = email.to_lowercase();
    let (local, domain) = match lower.split_once('@') {
        Some(parts) => parts,
        None => return lower,
    };
    let mut local = local.split('+').next().unwrap_or(local).to_string();
    if domain == "gmail.com" {
        local.retain(|c| c != '.');
    }
    format!("{local}@{domain}")
}

/// Lower-cased alphanumerics of a display name, or `None` when the result is
/// too short to be a meaningful join key.
pub fn normalize_name(name: &str) -> Option<String> {
    let normalized: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect();
    if normalized.chars().count() < 3 {
        None
    } else {
        Some(normalized)
    }
}

/// Merge per-email entries that plausibly represent the same person and
/// recompute the derived fields over the consolidated set.
///
/// Running this on its own output is a no-op: merged groups collapse to one
/// key per normalized email and per normalized name.
pub fn consolidate(by_email: HashMap<String, AuthorStats>) -> AuthorAggregate {
    let mut merged: HashMap<String, AuthorStats> = HashMap::new();
    let mut claimed: HashSet<String> = HashSet::new();

    // Pass 1: group by normalized email. Claims identities first, so a pair
    // sharing both normalized email and normalized name merges exactly once.
    let mut email_groups: HashMap<String, Vec<String>> = HashMap::new();
    for email in by_email.keys() {
        if email == SENTINEL_EMAIL {
            continue;
        }
        email_groups
            .entry(normalize_email(email))
            .or_default()
            .push(email.clone());
    }
    for (_, mut members) in email_groups {
        if members.len() > 1 {
            let entry = merge_group(&by_email, &mut members);
            claimed.extend(members);
            merged.insert(entry.email.clone(), entry);
        }
    }

    // Pass 2: group leftovers by normalized display name.
    let mut name_groups: HashMap<String, Vec<String>> = HashMap::new();
    for (email, stats) in &by_email {
        if email == SENTINEL_EMAIL || claimed.contains(email) {
            continue;
        }
        if let Some(key) = normalize_name(&stats.name) {
            name_groups.entry(key).or_default().push(email.clone());
        }
    }
    for (_, mut members) in name_groups {
        if members.len() > 1 {
            let entry = merge_group(&by_email, &mut members);
            claimed.extend(members);
            merged.insert(entry.email.clone(), entry);
        }
    }

    // Everything unclaimed passes through under its own email.
    for (email, stats) in by_email {
        if !claimed.contains(&email) {
            merged.insert(email, stats);
        }
    }

    finalize(merged)
}

/// Sum a group into a fresh entry. The primary email is the first member
/// after sorting non-`noreply` addresses first, then higher commit counts,
/// with the email itself as a deterministic final tie-break. The display
/// name is the longest non-empty name in the group.
fn merge_group(by_email: &HashMap<String, AuthorStats>, members: &mut Vec<String>) -> AuthorStats {
    members.sort_by(|a, b| {
        let a_noreply = a.contains("noreply");
        let b_noreply = b.contains("noreply");
        a_noreply
            .cmp(&b_noreply)
            .then_with(|| by_email[b].commits.cmp(&by_email[a].commits))
            .then_with(|| a.cmp(b))
    });

    let mut out = AuthorStats::new(&members[0], "");
    for email in members.iter() {
        let stats = &by_email[email];
        out.commits += stats.commits;
        out.additions += stats.additions;
        out.deletions += stats.deletions;
        out.total += stats.total;
        out.co_authored_lines += stats.co_authored_lines;
        if stats.biggest_commit > out.biggest_commit {
            out.biggest_commit = stats.biggest_commit;
            out.biggest_commit_url = stats.biggest_commit_url.clone();
        }
        if !stats.name.is_empty() && stats.name.len() > out.name.len() {
            out.name = stats.name.clone();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(email: &str, name: &str, commits: u64, additions: u64, deletions: u64) -> AuthorStats {
        let mut stats = AuthorStats::new(email, name);
        stats.commits = commits;
        stats.additions = additions;
        stats.deletions = deletions;
        stats.total = additions + deletions;
        stats.biggest_commit = additions + deletions;
        stats.biggest_commit_url = format!("https://example.com/{email}");
        stats
    }

    fn map(entries: Vec<AuthorStats>) -> HashMap<String, AuthorStats> {
        entries.into_iter().map(|s| (s.email.clone(), s)).collect()
    }

    #[test]
    fn gmail_dots_and_plus_tags_fold_together() {
        assert_eq!(normalize_email("j.doe+ci@gmail.com"), "jdoe@gmail.com");
        assert_eq!(normalize_email("jdoe@gmail.com"), "jdoe@gmail.com");
    }

    #[test]
    fn non_gmail_keeps_dots_but_drops_plus_tags() {
        assert_eq!(
            normalize_email("jdoe+ci@company.com"),
            normalize_email("jdoe@company.com")
        );
        assert_ne!(
            normalize_email("j.doe@company.com"),
            normalize_email("jdoe@company.com")
        );
    }

    #[test]
    fn short_names_are_not_join_keys() {
        assert_eq!(normalize_name("J."), None);
        assert_eq!(normalize_name("Jane Doe"), Some("janedoe".to_string()));
    }

    #[test]
    fn email_pass_merges_aliases() {
        let input = map(vec![
            entry("j.doe+ci@gmail.com", "Jane", 2, 10, 0),
            entry("jdoe@gmail.com", "Jane Doe", 5, 20, 5),
        ]);
        let aggregate = consolidate(input);
        assert_eq!(aggregate.by_email.len(), 1);
        let merged = &aggregate.by_email["jdoe@gmail.com"];
        assert_eq!(merged.commits, 7);
        assert_eq!(merged.total, 35);
        assert_eq!(merged.name, "Jane Doe");
    }

    #[test]
    fn name_pass_prefers_non_noreply_with_most_commits() {
        let input = map(vec![
            entry("alice@users.noreply.github.com", "Alice Smith", 3, 30, 0),
            entry("alice@gmail.com", "Alice Smith", 10, 100, 10),
        ]);
        let aggregate = consolidate(input);
        assert_eq!(aggregate.by_email.len(), 1);
        let merged = &aggregate.by_email["alice@gmail.com"];
        assert_eq!(merged.commits, 13);
        assert_eq!(merged.additions, 130);
    }

    #[test]
    fn distinct_identities_pass_through() {
        let input = map(vec![
            entry("alice@x.com", "Alice", 1, 5, 0),
            entry("bob@x.com", "Bob", 2, 7, 1),
        ]);
        let aggregate = consolidate(input);
        assert_eq!(aggregate.by_email.len(), 2);
        assert!(aggregate.by_email.contains_key("alice@x.com"));
        assert!(aggregate.by_email.contains_key("bob@x.com"));
    }

    #[test]
    fn commit_credit_is_conserved() {
        let input = map(vec![
            entry("a@gmail.com", "Ann Example", 4, 10, 2),
            entry("a+work@gmail.com", "Ann", 6, 3, 3),
            entry("ann@school.edu", "Ann Example", 5, 1, 1),
            entry("zed@school.edu", "Zed", 2, 9, 9),
        ]);
        let before: u64 = input.values().map(|s| s.commits).sum();
        let aggregate = consolidate(input);
        let after: u64 = aggregate.by_email.values().map(|s| s.commits).sum();
        assert_eq!(before, after);
    }

    #[test]
    fn consolidation_is_idempotent() {
        let input = map(vec![
            entry("a@gmail.com", "Ann Example", 4, 10, 2),
            entry("a+work@gmail.com", "Ann", 6, 3, 3),
            entry("bob@school.edu", "Bob Jones", 5, 1, 1),
        ]);
        let once = consolidate(input);
        let twice = consolidate(once.by_email.clone());
        assert_eq!(once.by_email.len(), twice.by_email.len());
        for (email, stats) in &once.by_email {
            assert_eq!(twice.by_email[email].commits, stats.commits);
            assert_eq!(twice.by_email[email].total, stats.total);
        }
    }

    #[test]
    fn sentinel_identity_never_merges() {
        let input = map(vec![
            entry(SENTINEL_EMAIL, "garbage", 0, 0, 0),
            entry("unknown@invalid.org", "garbage", 1, 2, 0),
        ]);
        let aggregate = consolidate(input);
        assert!(aggregate.by_email.contains_key(SENTINEL_EMAIL));
        assert!(aggregate.by_email.contains_key("unknown@invalid.org"));
    }

    #[test]
    fn biggest_commit_carries_its_url() {
        let input = map(vec![
            entry("a@gmail.com", "Ann Example", 1, 5, 0),
            entry("a+ci@gmail.com", "Ann Example", 1, 50, 0),
        ]);
        let aggregate = consolidate(input);
        let merged = aggregate.by_email.values().next().unwrap();
        assert_eq!(merged.biggest_commit, 50);
        assert_eq!(merged.biggest_commit_url, "https://example.com/a+ci@gmail.com");
    }

    #[test]
    fn derived_fields_recomputed_over_consolidated_set() {
        let input = map(vec![
            entry("a@gmail.com", "Ann Example", 2, 10, 0),
            entry("a+x@gmail.com", "Ann Example", 2, 30, 0),
        ]);
        let aggregate = consolidate(input);
        assert_eq!(aggregate.by_email.len(), 1);
        let merged = aggregate.by_email.values().next().unwrap();
        assert_eq!(merged.average_changes, 10.0);
        assert_eq!(aggregate.group_average, 10.0);
        assert_eq!(merged.additions_deletions_ratio, 40.0);
    }
}
