use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] equindex_core::ValidationError),

    #[error(transparent)]
    Universe(#[from] equindex_core::UniverseError),

    #[error("transport setup failed: {0}")]
    Transport(#[from] equindex_core::HttpError),

    #[error(transparent)]
    Index(#[from] equindex_index::IndexError),

    #[error(transparent)]
    Report(#[from] equindex_report::ReportError),

    #[error(transparent)]
    Store(#[from] equindex_store::StoreError),

    #[error(transparent)]
    Web(#[from] equindex_web::WebError),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Universe(_) => 2,
            Self::Transport(_) => 7,
            Self::Index(_) => 3,
            Self::Report(_) => 4,
            Self::Web(_) => 6,
            Self::Store(_) => 10,
        }
    }
}
