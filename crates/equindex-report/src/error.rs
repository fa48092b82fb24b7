use equindex_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("unsupported report format '{format}' (expected 'pdf' or 'excel')")]
    FormatUnsupported { format: String },

    #[error("no {what} data found for the given inputs")]
    Empty { what: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("excel rendering failed: {0}")]
    Excel(#[from] rust_xlsxwriter::XlsxError),

    #[error("pdf rendering failed: {0}")]
    Pdf(String),
}
