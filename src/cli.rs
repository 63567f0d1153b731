use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "repopulse")]
#[command(about = "GitHub activity analytics for course projects: contributors, timelines, pull requests")]
#[command(version)]
pub struct Cli {
    #[clap(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone)]
pub struct CommonArgs {
    #[arg(long, help = "Path to the activity snapshot JSON written by the ingestion adapter")]
    pub input: PathBuf,

    #[arg(long, help = "Directory for the snapshot store database")]
    pub cache: Option<PathBuf>,

    #[arg(long, help = "Only count commits at or after this date (RFC3339, YYYY-MM-DD, or '<duration> ago')")]
    pub since: Option<String>,

    #[arg(long, help = "Only count commits at or before this date (RFC3339, YYYY-MM-DD, or '<duration> ago')")]
    pub until: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StateFilter {
    Open,
    Closed,
    All,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Per-author statistics with identity consolidation
    Authors {
        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as NDJSON")]
        ndjson: bool,

        #[arg(long, help = "Skip identity consolidation and keep raw per-email entries")]
        raw: bool,
    },
    /// Day-bucketed commit frequency and drill-down index
    Timeline {
        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as NDJSON")]
        ndjson: bool,
    },
    /// Pull-request participation statistics
    Prs {
        #[arg(long, help = "Output as JSON")]
        json: bool,

        #[arg(long, help = "Output as NDJSON (one record per pull request)")]
        ndjson: bool,

        #[arg(long, value_enum, default_value_t = StateFilter::All, help = "Pull request state filter")]
        state: StateFilter,

        #[arg(
            long,
            default_value_t = 5,
            value_parser = clap::value_parser!(i64).range(1..=60),
            help = "Fast-merge threshold in minutes"
        )]
        fast_merge_minutes: i64,
    },
    /// Combined report payload (Markdown by default)
    Report {
        #[arg(long, help = "Output as JSON instead of Markdown")]
        json: bool,

        #[arg(
            long,
            default_value_t = 5,
            value_parser = clap::value_parser!(i64).range(1..=60),
            help = "Fast-merge threshold in minutes"
        )]
        fast_merge_minutes: i64,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn execute(self) -> Result<()> {
        match self.command {
            Commands::Authors { json, ndjson, raw } => {
                crate::authors::exec(self.common, json, ndjson, raw)
            }
            Commands::Timeline { json, ndjson } => {
                crate::timeline::exec(self.common, json, ndjson)
            }
            Commands::Prs {
                json,
                ndjson,
                state,
                fast_merge_minutes,
            } => crate::pulls::exec(self.common, json, ndjson, state, fast_merge_minutes),
            Commands::Report {
                json,
                fast_merge_minutes,
            } => crate::report::exec(self.common, json, fast_merge_minutes),
        }
    }
}
