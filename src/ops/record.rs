//! The RECORD file.
//!
//! Lists every file of a wheel as `path,sha256=<digest>,<size>` plus a final
//! entry for RECORD itself with empty hash and size.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::util::fs::{archive_name, walk_files, write_string};
use crate::util::hash::{file_digest, RECORD_ALGORITHM};

/// One hashed file in RECORD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEntry {
    /// `/`-separated path inside the wheel
    pub path: String,
    /// Unpadded url-safe base64 of the SHA256 digest
    pub digest: String,
    /// Size in bytes
    pub size: u64,
}

impl RecordEntry {
    fn to_line(&self) -> String {
        format!(
            "{},{}={},{}",
            csv_field(&self.path),
            RECORD_ALGORITHM,
            self.digest,
            self.size
        )
    }
}

/// Hash every file under `staging`, sorted by archive path.
///
/// An existing `{dist_info}/RECORD` is skipped.
pub fn collect_entries(staging: &Path, dist_info: &str) -> Result<Vec<RecordEntry>> {
    let record_path = record_path(dist_info);
    let mut entries = Vec::new();

    for file in walk_files(staging)? {
        let path = archive_name(staging, &file)?;
        if path == record_path {
            continue;
        }
        let (digest, size) = file_digest(&file)?;
        entries.push(RecordEntry { path, digest, size });
    }

    entries.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(entries)
}

/// Render RECORD content from hashed entries.
pub fn render_record(entries: &[RecordEntry], dist_info: &str) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.to_line());
        out.push('\n');
    }
    out.push_str(&csv_field(&record_path(dist_info)));
    out.push_str(",,\n");
    out
}

/// Hash the staging tree and write `{dist_info}/RECORD` into it.
pub fn write_record(staging: &Path, dist_info: &str) -> Result<PathBuf> {
    let entries = collect_entries(staging, dist_info)?;
    let path = staging.join(dist_info).join("RECORD");
    write_string(&path, &render_record(&entries, dist_info))?;
    tracing::debug!("Wrote RECORD with {} entries", entries.len() + 1);
    Ok(path)
}

fn record_path(dist_info: &str) -> String {
    format!("{}/RECORD", dist_info)
}

/// Quote a CSV field if it contains a separator or quote.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::hash::sha256_urlsafe;
    use tempfile::TempDir;

    const DIST_INFO: &str = "pkg-0.1.0.dist-info";

    fn stage() -> TempDir {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("pkg")).unwrap();
        std::fs::create_dir_all(tmp.path().join(DIST_INFO)).unwrap();
        std::fs::write(tmp.path().join("pkg/__init__.py"), "print('hi')\n").unwrap();
        std::fs::write(tmp.path().join("pkg/libpkg.so"), [0u8, 1, 2, 3]).unwrap();
        std::fs::write(tmp.path().join(DIST_INFO).join("WHEEL"), "Tag: x\n").unwrap();
        tmp
    }

    #[test]
    fn test_entries_cover_every_file() {
        let tmp = stage();
        let entries = collect_entries(tmp.path(), DIST_INFO).unwrap();
        let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "pkg-0.1.0.dist-info/WHEEL",
                "pkg/__init__.py",
                "pkg/libpkg.so"
            ]
        );
        assert_eq!(entries[2].size, 4);
        assert_eq!(entries[2].digest, sha256_urlsafe(&[0, 1, 2, 3]));
    }

    #[test]
    fn test_record_self_entry_is_last_and_empty() {
        let tmp = stage();
        let path = write_record(tmp.path(), DIST_INFO).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        let lines: Vec<_> = content.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(*lines.last().unwrap(), "pkg-0.1.0.dist-info/RECORD,,");
        for line in &lines[..3] {
            let parts: Vec<_> = line.split(',').collect();
            assert_eq!(parts.len(), 3);
            assert!(parts[1].starts_with("sha256="));
            assert!(!parts[1]["sha256=".len()..].contains('='));
        }
        assert!(content.ends_with('\n'));
    }

    #[test]
    fn test_rewriting_record_ignores_previous_record() {
        let tmp = stage();
        write_record(tmp.path(), DIST_INFO).unwrap();
        let entries = collect_entries(tmp.path(), DIST_INFO).unwrap();
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn test_paths_with_commas_are_quoted() {
        let entry = RecordEntry {
            path: "pkg/a,b.txt".to_string(),
            digest: "abc".to_string(),
            size: 1,
        };
        assert_eq!(entry.to_line(), "\"pkg/a,b.txt\",sha256=abc,1");
    }
}
