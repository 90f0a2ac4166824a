//! File selection and reading.
//!
//! The core never opens a dialog itself. It talks to a [`FilePicker`], which
//! the desktop shell backs with the native dialog and tests back with
//! [`PathPicker`].

use encoding_rs::{Encoding, UTF_8};
use serde::Serialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::csv_mmap::open_mmap_if_large;
use crate::error::{Result, ViewerError};

/// Restricts the dialog to delimited text files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileFilter {
    pub name: String,
    pub mime_types: Vec<String>,
    pub extensions: Vec<String>,
}

impl FileFilter {
    pub fn csv() -> Self {
        Self {
            name: "CSV".to_string(),
            mime_types: vec![
                "text/csv".to_string(),
                "text/comma-separated-values".to_string(),
            ],
            extensions: vec!["csv".to_string()],
        }
    }

    /// Patterns handed to a native picker: MIME types where the platform
    /// filters by content type, extensions otherwise.
    pub fn dialog_patterns(&self, by_mime: bool) -> Vec<&str> {
        let patterns = if by_mime {
            &self.mime_types
        } else {
            &self.extensions
        };
        patterns.iter().map(String::as_str).collect()
    }

    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

/// A local file chosen by the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FileRef {
    pub path: PathBuf,
    pub name: String,
}

impl FileRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PickOutcome {
    Chosen(FileRef),
    Cancelled,
}

pub trait FilePicker {
    /// Shows a file choice restricted to `filter`. Dismissing it is
    /// [`PickOutcome::Cancelled`], not an error.
    fn choose_file(&self, filter: &FileFilter) -> Result<PickOutcome>;

    fn read_file(&self, file: &FileRef) -> Result<String>;
}

fn decode_utf8(bytes: &[u8]) -> Option<String> {
    let body = match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) if encoding == UTF_8 => &bytes[bom_len..],
        _ => bytes,
    };
    UTF_8
        .decode_without_bom_handling_and_without_replacement(body)
        .map(Cow::into_owned)
}

/// Reads a whole file as UTF-8 text, mapping it into memory past
/// `mmap_threshold` bytes.
pub fn read_text_file(path: &Path, mmap_threshold: u64) -> Result<String> {
    let access_err = |err: std::io::Error| ViewerError::file_access(Some(path.to_path_buf()), err);
    let text = match open_mmap_if_large(path, mmap_threshold).map_err(access_err)? {
        Some(mmap) => {
            tracing::debug!(path = %path.display(), bytes = mmap.len(), "reading mapped file");
            decode_utf8(&mmap[..])
        }
        None => decode_utf8(&std::fs::read(path).map_err(access_err)?),
    };
    text.ok_or_else(|| ViewerError::file_access(Some(path.to_path_buf()), "file is not valid UTF-8"))
}

/// A picker that always "chooses" a preset path, or cancels when it has none.
/// Used for files passed on the command line.
pub struct PathPicker {
    path: Option<PathBuf>,
    mmap_threshold: u64,
}

impl PathPicker {
    pub fn new(path: Option<PathBuf>, mmap_threshold: u64) -> Self {
        Self {
            path,
            mmap_threshold,
        }
    }
}

impl FilePicker for PathPicker {
    fn choose_file(&self, _filter: &FileFilter) -> Result<PickOutcome> {
        Ok(match &self.path {
            Some(path) => PickOutcome::Chosen(FileRef::new(path)),
            None => PickOutcome::Cancelled,
        })
    }

    fn read_file(&self, file: &FileRef) -> Result<String> {
        read_text_file(&file.path, self.mmap_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::{read_text_file, FileFilter, FilePicker, FileRef, PathPicker, PickOutcome};
    use crate::csv_mmap::MMAP_MIN_BYTES;
    use crate::error::ViewerError;
    use std::path::Path;

    #[test]
    fn csv_filter_matches_extension_case_insensitively() {
        let filter = FileFilter::csv();
        assert!(filter.accepts(Path::new("/tmp/Data.CSV")));
        assert!(!filter.accepts(Path::new("/tmp/data.txt")));
        assert!(!filter.accepts(Path::new("/tmp/csv")));
    }

    #[test]
    fn dialog_patterns_pick_mime_types_or_extensions() {
        let filter = FileFilter::csv();
        assert_eq!(
            filter.dialog_patterns(true),
            ["text/csv", "text/comma-separated-values"]
        );
        assert_eq!(filter.dialog_patterns(false), ["csv"]);
    }

    #[test]
    fn reads_text_and_strips_bom() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("data.csv");
        std::fs::write(&path, b"\xEF\xBB\xBFname\nAlice\n").expect("write csv");

        let text = read_text_file(&path, MMAP_MIN_BYTES).expect("read");
        assert_eq!(text, "name\nAlice\n");

        let mapped = read_text_file(&path, 1).expect("read mapped");
        assert_eq!(mapped, text);
    }

    #[test]
    fn invalid_utf8_is_a_file_access_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("latin1.csv");
        std::fs::write(&path, b"name\ncaf\xE9\n").expect("write csv");

        let err = read_text_file(&path, MMAP_MIN_BYTES).unwrap_err();
        assert!(matches!(err, ViewerError::FileAccess { .. }));
    }

    #[test]
    fn missing_file_is_a_file_access_error() {
        let picker = PathPicker::new(None, MMAP_MIN_BYTES);
        let err = picker
            .read_file(&FileRef::new("/definitely/not/here.csv"))
            .unwrap_err();
        assert!(matches!(err, ViewerError::FileAccess { .. }));
    }

    #[test]
    fn path_picker_without_path_cancels() {
        let picker = PathPicker::new(None, MMAP_MIN_BYTES);
        assert_eq!(
            picker.choose_file(&FileFilter::csv()).expect("pick"),
            PickOutcome::Cancelled
        );

        let picker = PathPicker::new(Some("/tmp/a.csv".into()), MMAP_MIN_BYTES);
        match picker.choose_file(&FileFilter::csv()).expect("pick") {
            PickOutcome::Chosen(file) => assert_eq!(file.name, "a.csv"),
            PickOutcome::Cancelled => panic!("expected a file"),
        }
    }
}
