//! Constituent universe loading.
//!
//! The universe is the candidate list the index selects its constituents
//! from. It lives in a plain text file, one ticker per line; blank lines
//! and `#` comments are ignored.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::{Symbol, ValidationError};

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("failed to read universe file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("universe file {path} line {line}: {source}")]
    InvalidSymbol {
        path: PathBuf,
        line: usize,
        #[source]
        source: ValidationError,
    },

    #[error("universe contains no symbols")]
    Empty,
}

/// Ordered, de-duplicated candidate ticker list.
#[derive(Debug, Clone)]
pub struct Universe {
    symbols: Vec<Symbol>,
}

impl Universe {
    pub fn from_symbols(symbols: Vec<Symbol>) -> Result<Self, UniverseError> {
        let mut seen = BTreeSet::new();
        let symbols: Vec<Symbol> = symbols
            .into_iter()
            .filter(|symbol| seen.insert(symbol.clone()))
            .collect();

        if symbols.is_empty() {
            return Err(UniverseError::Empty);
        }
        Ok(Self { symbols })
    }

    pub fn load(path: &Path) -> Result<Self, UniverseError> {
        let contents = fs::read_to_string(path).map_err(|source| UniverseError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let mut symbols = Vec::new();
        for (index, raw) in contents.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let symbol =
                Symbol::parse(line).map_err(|source| UniverseError::InvalidSymbol {
                    path: path.to_path_buf(),
                    line: index + 1,
                    source,
                })?;
            symbols.push(symbol);
        }

        Self::from_symbols(symbols)
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn loads_tickers_skipping_comments_and_blanks() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "# candidate list").unwrap();
        writeln!(file, "aapl").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "MSFT").unwrap();
        writeln!(file, "aapl").unwrap();

        let universe = Universe::load(file.path()).expect("universe");
        let symbols: Vec<&str> = universe.symbols().iter().map(Symbol::as_str).collect();
        assert_eq!(symbols, vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn rejects_file_with_bad_symbol() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        writeln!(file, "AAPL").unwrap();
        writeln!(file, "not a ticker").unwrap();

        let error = Universe::load(file.path()).expect_err("must fail");
        assert!(matches!(error, UniverseError::InvalidSymbol { line: 2, .. }));
    }

    #[test]
    fn rejects_empty_universe() {
        let error = Universe::from_symbols(Vec::new()).expect_err("must fail");
        assert!(matches!(error, UniverseError::Empty));
    }
}
