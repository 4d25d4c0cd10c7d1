//! Input discovery for station reading files
//!
//! An input may be a single file or a directory tree. Directories are walked
//! recursively and every CSV or Parquet file is returned in sorted order, so
//! repeated runs load readings in the same sequence.

use crate::error::{QcError, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// File formats the reader understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Csv,
    Parquet,
}

impl InputFormat {
    /// Detect the format from the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        if ext.eq_ignore_ascii_case("csv") {
            Some(Self::Csv)
        } else if ext.eq_ignore_ascii_case("parquet") {
            Some(Self::Parquet)
        } else {
            None
        }
    }
}

/// Find every readable input file at `path`
///
/// A file path must have a supported extension. A directory yields all
/// supported files beneath it, possibly none.
pub fn discover_inputs(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(QcError::InputNotFound {
            path: path.to_path_buf(),
        });
    }

    if path.is_file() {
        return match InputFormat::from_path(path) {
            Some(_) => Ok(vec![path.to_path_buf()]),
            None => Err(QcError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        };
    }

    debug!("Searching for input files in: {}", path.display());

    let mut files: Vec<PathBuf> = WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|p| InputFormat::from_path(p).is_some())
        .collect();
    files.sort();

    debug!("Found {} input files", files.len());
    Ok(files)
}
