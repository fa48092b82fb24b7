use equindex_core::{SourceError, ValidationError};
use equindex_store::StoreError;
use thiserror::Error;

/// Failures that abort an index computation run.
///
/// Missing data for individual tickers is not an error; it is logged and
/// skipped inside the engine. These variants are the fatal cases.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("market data source failure: {0}")]
    Source(#[from] SourceError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
