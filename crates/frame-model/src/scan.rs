//! Frame directory scanning.

use std::path::{Path, PathBuf};

use crate::manifest::{FrameEntry, ManifestError};
use crate::naming::{FramePatterns, NamingConvention};

/// Numeric bounds and explicit exclusions applied to extracted frame numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameFilter {
    /// Inclusive lower bound; `None` is unbounded.
    pub start: Option<u32>,
    /// Inclusive upper bound; `None` is unbounded.
    pub end: Option<u32>,
    /// Frame numbers to drop.
    pub skip: Vec<u32>,
}

impl FrameFilter {
    pub fn in_range(&self, number: u32) -> bool {
        self.start.map_or(true, |start| number >= start)
            && self.end.map_or(true, |end| number <= end)
    }

    pub fn is_skipped(&self, number: u32) -> bool {
        self.skip.contains(&number)
    }

    pub fn admits(&self, number: u32) -> bool {
        self.in_range(number) && !self.is_skipped(number)
    }
}

/// Result of scanning a frame directory.
#[derive(Debug, Clone)]
pub struct FrameScan {
    /// Absolute directory that was scanned.
    pub directory: PathBuf,
    /// Convention detected from the first matching filename.
    pub convention: NamingConvention,
    /// Selected frames, ascending by number.
    pub frames: Vec<FrameEntry>,
    /// In-range frame numbers dropped because they were on the skip list.
    pub skipped: Vec<u32>,
}

/// Scan `directory` for frames, filter them, and sort by frame number.
///
/// The listing is sorted by filename before detection so the chosen
/// convention does not depend on filesystem order.
pub fn scan_directory(
    directory: &Path,
    patterns: &FramePatterns,
    filter: &FrameFilter,
) -> Result<FrameScan, ManifestError> {
    if !directory.is_dir() {
        return Err(ManifestError::NotADirectory {
            path: directory.to_path_buf(),
        });
    }

    let directory = directory
        .canonicalize()
        .map_err(|e| ManifestError::IoError {
            path: directory.to_path_buf(),
            source: e,
        })?;

    let mut names = list_file_names(&directory)?;
    names.sort();

    let convention = patterns
        .detect(names.iter().map(String::as_str))
        .ok_or_else(|| ManifestError::NoSupportedFiles {
            path: directory.clone(),
        })?;
    tracing::debug!(convention = %convention, files = names.len(), "Detected naming convention");

    let mut frames = Vec::new();
    let mut skipped = Vec::new();
    for name in &names {
        let Some(number) = patterns.frame_number(convention, name) else {
            continue;
        };

        if !filter.in_range(number) {
            continue;
        }

        if filter.is_skipped(number) {
            tracing::info!(frame = number, file = %name, "Skipping frame");
            skipped.push(number);
            continue;
        }

        frames.push(FrameEntry {
            number,
            path: directory.join(name),
        });
    }

    if frames.is_empty() {
        return Err(ManifestError::NoFramesInRange);
    }

    frames.sort();

    Ok(FrameScan {
        directory,
        convention,
        frames,
        skipped,
    })
}

fn list_file_names(directory: &Path) -> Result<Vec<String>, ManifestError> {
    let io_err = |e: std::io::Error| ManifestError::IoError {
        path: directory.to_path_buf(),
        source: e,
    };

    let mut names = Vec::new();
    for entry in std::fs::read_dir(directory).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        if entry.file_type().map_err(io_err)?.is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => tracing::debug!(name = ?raw, "Ignoring non UTF-8 filename"),
        }
    }
    Ok(names)
}
