use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "revex")]
#[command(about = "Export work item revision history to local storage", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Storage root override (defaults to the configured workspace)
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    /// Config file override
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run an export against a JSONL capture of the remote system
    Export {
        /// Project the items belong to
        #[arg(long)]
        project: String,

        /// JSONL capture of work items, one item per line
        #[arg(long)]
        snapshot: PathBuf,

        /// Base selection query (defaults to all items in the project)
        #[arg(long)]
        query: Option<String>,

        /// Directory holding attachment payloads staged by id
        #[arg(long)]
        attachments: Option<PathBuf>,

        /// Append every progress snapshot to a CSV file
        #[arg(long)]
        progress_csv: Option<PathBuf>,

        /// Only print the final summary
        #[arg(long)]
        quiet: bool,
    },

    /// Summarize what has been exported so far
    Status {
        /// Emit watermarks as CSV on stdout
        #[arg(long)]
        csv: bool,
    },

    /// Inspect a persisted revision delta
    Show {
        /// Work item id
        item: i64,

        /// Revision index; omit to list exported revisions
        #[arg(long)]
        revision: Option<u32>,
    },
}
