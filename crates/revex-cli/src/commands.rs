use crate::args::{Cli, Commands};
use crate::handlers;
use anyhow::Result;
use revex_runtime::Config;

pub fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let storage = match &cli.storage {
        Some(dir) => dir.clone(),
        None => config.resolve_storage_dir()?,
    };

    match cli.command {
        Commands::Export {
            project,
            snapshot,
            query,
            attachments,
            progress_csv,
            quiet,
        } => handlers::export::handle(
            &storage,
            &config.chunker,
            project,
            snapshot,
            query,
            attachments,
            progress_csv,
            quiet,
        ),
        Commands::Status { csv } => handlers::status::handle(&storage, csv),
        Commands::Show { item, revision } => handlers::show::handle(&storage, item, revision),
    }
}
