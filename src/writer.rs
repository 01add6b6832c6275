//! Writes output documents as 4-space indented JSON.
//!
//! Non-ASCII text is written as UTF-8, not escaped. Missing parent directories are created.

use crate::error::MergeError;
use crate::merge::OutputDocument;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{error, info};

const INDENT: &[u8] = b"    ";

pub fn to_json_string(document: &OutputDocument) -> Result<String, MergeError> {
    let mut out = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(INDENT));
    document.serialize(&mut serializer)?;
    String::from_utf8(out).map_err(|e| MergeError::Msg(format!("JSON output is not UTF-8: {e}")))
}

/// Write `document` to `path`, returning any I/O or serialization error.
pub fn write_document(document: &OutputDocument, path: &Path) -> Result<(), MergeError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut writer, PrettyFormatter::with_indent(INDENT));
    document.serialize(&mut serializer)?;
    writer.flush()?;
    Ok(())
}

/// Write `document` to `path`, logging the outcome instead of returning an error.
/// Returns whether the file was written.
pub fn save_document(document: &OutputDocument, path: &Path) -> bool {
    match write_document(document, path) {
        Ok(()) => {
            info!(path = %path.display(), "Data successfully saved");
            true
        }
        Err(e) => {
            error!(path = %path.display(), "Error saving JSON file: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::{GroupBy, MergedRecord};
    use crate::table::CompositeKey;
    use tempfile::TempDir;

    fn sample_document() -> OutputDocument {
        let mut record = MergedRecord::new();
        record.push("Country", "TÜR");
        record.push("Good/very good health", "68.5");
        let mut document = OutputDocument::new();
        document.insert(&CompositeKey::new("TÜR", "2020"), GroupBy::Year, record);
        document
    }

    #[test]
    fn test_four_space_indent_and_raw_unicode() {
        let json = to_json_string(&sample_document()).unwrap();
        let expected = "{\n    \"2020\": {\n        \"TÜR\": {\n            \"Country\": \"TÜR\",\n            \"Good/very good health\": \"68.5\"\n        }\n    }\n}";
        assert_eq!(json, expected);
    }

    #[test]
    fn test_write_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/nested/merged.json");
        write_document(&sample_document(), &path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, to_json_string(&sample_document()).unwrap());
        let parsed: OutputDocument = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, sample_document());
    }

    #[test]
    fn test_save_failure_is_reported_not_raised() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should go makes File::create fail.
        let path = dir.path().join("taken");
        fs::create_dir(&path).unwrap();

        assert!(write_document(&sample_document(), &path).is_err());
        assert!(!save_document(&sample_document(), &path));
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(to_json_string(&OutputDocument::new()).unwrap(), "{}");
    }
}
