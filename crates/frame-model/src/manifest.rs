//! Concat manifest format.
//!
//! One line per frame, consumed by ffmpeg's concat demuxer:
//!
//! ```text
//! file '/photos/night1/DSCF0851.JPG'
//! file '/photos/night1/DSCF0852.JPG'
//! ```
//!
//! A single quote inside a path is written as `'\''` (close quote, escaped
//! quote, reopen quote).

use std::path::{Path, PathBuf};

/// A frame selected from a directory: its extracted number and absolute path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct FrameEntry {
    pub number: u32,
    pub path: PathBuf,
}

/// An ordered list of frame paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConcatManifest {
    entries: Vec<PathBuf>,
}

impl ConcatManifest {
    pub fn new(entries: Vec<PathBuf>) -> Self {
        Self { entries }
    }

    /// Build a manifest from scanned frames, keeping their order.
    pub fn from_frames(frames: &[FrameEntry]) -> Self {
        Self {
            entries: frames.iter().map(|f| f.path.clone()).collect(),
        }
    }

    /// Parse manifest text. Lines that are not `file` directives are ignored.
    pub fn parse(text: &str) -> Self {
        let entries = text
            .lines()
            .filter_map(|line| line.trim().strip_prefix("file"))
            .filter(|rest| rest.starts_with(char::is_whitespace))
            .map(|rest| PathBuf::from(unquote(rest.trim())))
            .filter(|path| !path.as_os_str().is_empty())
            .collect();

        Self { entries }
    }

    /// Read and parse a manifest file.
    pub fn read(path: &Path) -> Result<Self, ManifestError> {
        let text = std::fs::read_to_string(path).map_err(|e| ManifestError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(Self::parse(&text))
    }

    /// Render manifest text, one `file '<path>'` line per entry.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            out.push_str("file ");
            out.push_str(&quote(&entry.to_string_lossy()));
            out.push('\n');
        }
        out
    }

    /// Write the manifest, replacing any existing file.
    pub fn write(&self, path: &Path) -> Result<(), ManifestError> {
        std::fs::write(path, self.render()).map_err(|e| ManifestError::IoError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn first(&self) -> Option<&Path> {
        self.entries.first().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Anchor relative entries at `base`, the way the concat demuxer
    /// resolves them against the manifest's own directory.
    pub fn resolve_against(&self, base: &Path) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|entry| {
                if entry.is_relative() {
                    base.join(entry)
                } else {
                    entry.clone()
                }
            })
            .collect();
        Self { entries }
    }

    /// Forward sequence followed by the reversed sequence, dropping the
    /// repeated last frame at the turn. `N` entries become `2N - 1`.
    pub fn boomerang(&self) -> Self {
        let mut entries = Vec::with_capacity(self.entries.len() * 2);
        entries.extend(self.entries.iter().cloned());
        entries.extend(self.entries.iter().rev().skip(1).cloned());
        Self { entries }
    }
}

/// Errors from scanning frame directories and handling manifests.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("No supported JPG filename patterns found in {path}")]
    NoSupportedFiles { path: PathBuf },

    #[error("No valid JPG files found in the specified range")]
    NoFramesInRange,

    #[error("I/O error at {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid frame pattern: {0}")]
    Pattern(#[from] regex::Error),
}

fn quote(path: &str) -> String {
    format!("'{}'", path.replace('\'', r"'\''"))
}

/// Undo concat-demuxer quoting: quoted runs are literal, and a backslash
/// outside quotes escapes the next character.
fn unquote(token: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut in_quotes = false;
    let mut chars = token.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => in_quotes = !in_quotes,
            '\\' if !in_quotes => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            _ => out.push(c),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest_of(names: &[&str]) -> ConcatManifest {
        ConcatManifest::new(names.iter().map(PathBuf::from).collect())
    }

    #[test]
    fn test_render_format() {
        let manifest = manifest_of(&["/a/DSCF0001.JPG", "/a/DSCF0002.JPG"]);
        assert_eq!(
            manifest.render(),
            "file '/a/DSCF0001.JPG'\nfile '/a/DSCF0002.JPG'\n"
        );
    }

    #[test]
    fn test_parse_ignores_other_lines() {
        let text = "ffconcat version 1.0\n# comment\nfile '/a/1.jpg'\nduration 0.04\n\nfile '/a/2.jpg'\nfilemode x\n";
        let manifest = ConcatManifest::parse(text);
        assert_eq!(
            manifest.entries(),
            &[PathBuf::from("/a/1.jpg"), PathBuf::from("/a/2.jpg")]
        );
    }

    #[test]
    fn test_quote_in_path_survives() {
        let manifest = manifest_of(&["/photos/Bob's night/DSCF0001.JPG"]);
        let text = manifest.render();
        assert_eq!(text, "file '/photos/Bob'\\''s night/DSCF0001.JPG'\n");
        assert_eq!(ConcatManifest::parse(&text), manifest);
    }

    #[test]
    fn test_parse_unquoted_path() {
        let manifest = ConcatManifest::parse("file /a/b\\ c.jpg\n");
        assert_eq!(manifest.first(), Some(Path::new("/a/b c.jpg")));
    }

    #[test]
    fn test_boomerang_drops_duplicate_turn_frame() {
        let manifest = manifest_of(&["1", "2", "3", "4"]);
        let boom = manifest.boomerang();
        assert_eq!(boom, manifest_of(&["1", "2", "3", "4", "3", "2", "1"]));
    }

    #[test]
    fn test_boomerang_single_and_empty() {
        assert_eq!(manifest_of(&["1"]).boomerang(), manifest_of(&["1"]));
        assert!(ConcatManifest::default().boomerang().is_empty());
    }

    #[test]
    fn test_from_frames_keeps_order() {
        let frames = vec![
            FrameEntry {
                number: 2,
                path: PathBuf::from("/x/DSCF0002.JPG"),
            },
            FrameEntry {
                number: 9,
                path: PathBuf::from("/x/DSCF0009.JPG"),
            },
        ];
        let manifest = ConcatManifest::from_frames(&frames);
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.first(), Some(Path::new("/x/DSCF0002.JPG")));
    }

    #[test]
    fn test_resolve_against_only_touches_relative_entries() {
        let manifest = ConcatManifest::parse(
            "file 'DSCF0001.JPG'\nfile 'sub/DSCF0002.JPG'\nfile '/abs/DSCF0003.JPG'\n",
        );
        let resolved = manifest.resolve_against(Path::new("/photos/night1"));
        assert_eq!(
            resolved.entries(),
            &[
                PathBuf::from("/photos/night1/DSCF0001.JPG"),
                PathBuf::from("/photos/night1/sub/DSCF0002.JPG"),
                PathBuf::from("/abs/DSCF0003.JPG"),
            ]
        );
    }

    #[test]
    fn test_write_and_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file_list.txt");
        std::fs::write(&path, "stale contents\n").unwrap();

        let manifest = manifest_of(&["/a/1.jpg", "/a/2.jpg"]);
        manifest.write(&path).unwrap();
        assert_eq!(ConcatManifest::read(&path).unwrap(), manifest);
    }

    #[test]
    fn test_read_missing_file_reports_path() {
        let err = ConcatManifest::read(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.txt"));
    }
}
