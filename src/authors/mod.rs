pub mod aggregate;
pub mod identity;
pub mod output;

pub use aggregate::{aggregate_authors, AuthorAggregate};
pub use identity::{consolidate, normalize_email, normalize_name};

use crate::cli::CommonArgs;
use crate::store::{SnapshotStore, KIND_AUTHORS};
use anyhow::Context;

pub fn exec(common: CommonArgs, json: bool, ndjson: bool, raw: bool) -> anyhow::Result<()> {
    let snapshot = crate::ingest::load_snapshot(&common.input, !json && !ndjson)
        .context("Failed to load activity snapshot")?;
    let range = crate::util::resolve_range(common.since.as_deref(), common.until.as_deref())
        .context("Failed to resolve date range")?;

    let commits = snapshot.commits_in(&range);
    let mut aggregate = aggregate_authors(&commits);
    if !raw {
        aggregate = consolidate(aggregate.by_email);
    }

    let out = output::build_output(&aggregate, &snapshot, &common, !raw);

    if let Some(cache) = common.cache.as_deref() {
        let mut store = SnapshotStore::open(cache).context("Failed to open snapshot store")?;
        store
            .save(&snapshot.owner, &snapshot.repo, KIND_AUTHORS, &out)
            .context("Failed to persist author statistics")?;
    }

    if json {
        output::output_json(&out)?;
    } else if ndjson {
        output::output_ndjson(&out.authors)?;
    } else {
        output::output_table(&out)?;
    }

    Ok(())
}
