mod compute;
mod report;
mod serve;

use std::path::Path;

use equindex_store::{PriceStore, StoreConfig};

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Open the store once; every command receives this handle.
pub fn open_store(db: Option<&Path>) -> Result<PriceStore, CliError> {
    let config = match db {
        Some(path) => StoreConfig::at_path(path),
        None => StoreConfig::default(),
    };
    Ok(PriceStore::open(config)?)
}

pub async fn run(cli: &Cli, store: PriceStore) -> Result<(), CliError> {
    match &cli.command {
        Command::Compute(args) => compute::run(args, &store).await,
        Command::Report(command) => report::run(command, &store),
        Command::Serve(args) => serve::run(args, store).await,
    }
}
