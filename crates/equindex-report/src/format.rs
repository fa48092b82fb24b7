use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::ReportError;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Pdf,
    Excel,
}

impl ReportFormat {
    /// Parse a user-supplied format name; anything outside the supported
    /// set is rejected before any file is touched.
    pub fn parse(input: &str) -> Result<Self, ReportError> {
        match input.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "excel" | "xlsx" => Ok(Self::Excel),
            _ => Err(ReportError::FormatUnsupported {
                format: input.to_string(),
            }),
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Excel => "xlsx",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        Self::parse(input)
    }
}

impl Display for ReportFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pdf => f.write_str("pdf"),
            Self::Excel => f.write_str("excel"),
        }
    }
}
