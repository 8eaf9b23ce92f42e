/// Test fixtures: `tests/<ID>.in`, `tests/<ID>.out` and `tests/<ID>.data`.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::exec::CpuError;

/// Directory (relative to the problem root) holding fixture files.
pub const TESTS_DIR: &str = "tests";

/// Shown in previews for fixture files that do not exist.
pub const MISSING_PLACEHOLDER: &str = "[None]";

/// Last preview line when a file is longer than the preview.
pub const TRUNCATED_PLACEHOLDER: &str = "[...]";

/// The files that make up a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestFile {
    Input,
    /// Expected output.
    Output,
    /// Auxiliary data for the checker.
    Data,
}

impl TestFile {
    #[must_use]
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Input => "in",
            Self::Output => "out",
            Self::Data => "data",
        }
    }
}

/// A registered test. Only the ID is stored; the contents live in fixture files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_custom_type", rename = "Test")]
pub struct TestCase {
    #[serde(rename = "ID")]
    pub id: String,
}

impl TestCase {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Path of `file`, relative to the problem root.
    #[must_use]
    pub fn relative_path(&self, file: TestFile) -> PathBuf {
        Path::new(TESTS_DIR).join(format!("{}.{}", self.id, file.suffix()))
    }

    #[must_use]
    pub fn path(&self, root: &Path, file: TestFile) -> PathBuf {
        root.join(self.relative_path(file))
    }

    #[must_use]
    pub fn exists(&self, root: &Path, file: TestFile) -> bool {
        self.path(root, file).is_file()
    }

    /// Size of `file` in bytes, or `None` if it does not exist.
    #[must_use]
    pub fn size(&self, root: &Path, file: TestFile) -> Option<u64> {
        std::fs::metadata(self.path(root, file)).ok().map(|m| m.len())
    }

    /// Overwrite `file` with `contents`.
    ///
    /// # Errors
    ///
    /// Returns `CpuError::Io` if the file cannot be written.
    pub fn write(
        &self,
        root: &Path,
        file: TestFile,
        contents: impl AsRef<[u8]>,
    ) -> Result<(), CpuError> {
        let path = self.path(root, file);
        std::fs::write(&path, contents).map_err(|e| CpuError::io("cannot write", path, e))
    }

    /// Create (or truncate) `file` for writing.
    ///
    /// # Errors
    ///
    /// Returns `CpuError::Io` if the file cannot be created.
    pub fn create(&self, root: &Path, file: TestFile) -> Result<std::fs::File, CpuError> {
        let path = self.path(root, file);
        std::fs::File::create(&path).map_err(|e| CpuError::io("cannot create", path, e))
    }

    /// Remove `file` if it exists.
    ///
    /// # Errors
    ///
    /// Returns `CpuError::Io` if an existing file cannot be removed.
    pub fn remove(&self, root: &Path, file: TestFile) -> Result<(), CpuError> {
        let path = self.path(root, file);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CpuError::io("cannot delete", path, e)),
        }
    }

    /// Open `file` for reading.
    ///
    /// # Errors
    ///
    /// Returns `CpuError::Io` if the file cannot be opened.
    pub fn open(&self, root: &Path, file: TestFile) -> Result<std::fs::File, CpuError> {
        let path = self.path(root, file);
        std::fs::File::open(&path).map_err(|e| CpuError::io("cannot open", path, e))
    }

    /// First `max_lines` lines of `file`, or [`MISSING_PLACEHOLDER`] if it does not exist.
    ///
    /// When the file is longer, the last shown line is [`TRUNCATED_PLACEHOLDER`].
    #[must_use]
    pub fn preview(&self, root: &Path, file: TestFile, max_lines: usize) -> String {
        preview_file(&self.path(root, file), max_lines)
    }

    /// One-line description, e.g. `Test 3 [1.2 kB | 10 B]`.
    #[must_use]
    pub fn summary(&self, root: &Path) -> String {
        let describe = |file| {
            self.size(root, file)
                .map_or_else(|| "None".to_owned(), humanize_size)
        };
        format!(
            "Test {} [{} | {}]",
            self.id,
            describe(TestFile::Input),
            describe(TestFile::Output)
        )
    }

    /// Remove every fixture file of this test. Missing files are skipped.
    ///
    /// # Errors
    ///
    /// Returns `CpuError::Io` if an existing file cannot be removed.
    pub fn delete_files(&self, root: &Path) -> Result<(), CpuError> {
        [TestFile::Input, TestFile::Output, TestFile::Data]
            .into_iter()
            .try_for_each(|file| self.remove(root, file))
    }
}

/// The smallest positive integer not already used as a test ID.
#[must_use]
pub fn next_unused_id(tests: &BTreeMap<String, TestCase>) -> String {
    (1u64..)
        .map(|n| n.to_string())
        .find(|id| !tests.contains_key(id))
        .unwrap_or_default()
}

/// Sort test IDs numerically where possible, others after them by name.
pub fn sort_ids(ids: &mut [String]) {
    ids.sort_by(|a, b| match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    });
}

/// Human-readable size in powers of 1024, e.g. `12 B`, `1.5 kB`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn humanize_size(bytes: u64) -> String {
    const UNITS: [&str; 8] = ["k", "M", "G", "T", "P", "E", "Z", "Y"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    for unit in UNITS {
        if value < 1024.0 {
            return format!("{value:.1} {unit}B");
        }
        value /= 1024.0;
    }
    format!("{value:.1} YB")
}

/// First `max_lines` lines of the file at `path`, marked as for [`TestCase::preview`].
#[must_use]
pub fn preview_file(path: &Path, max_lines: usize) -> String {
    match std::fs::read(path) {
        Ok(contents) => truncate_lines(&String::from_utf8_lossy(&contents), max_lines),
        Err(_) => MISSING_PLACEHOLDER.to_owned(),
    }
}

fn truncate_lines(contents: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = contents.lines().collect();
    if lines.len() <= max_lines {
        return lines.join("\n");
    }
    let mut shown: Vec<&str> = lines[..max_lines.saturating_sub(1)].to_vec();
    shown.push(TRUNCATED_PLACEHOLDER);
    shown.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(TESTS_DIR)).unwrap();
        dir
    }

    #[test]
    fn test_paths() {
        let t = TestCase::new("7");
        assert_eq!(t.relative_path(TestFile::Input), Path::new("tests/7.in"));
        assert_eq!(t.relative_path(TestFile::Output), Path::new("tests/7.out"));
        assert_eq!(t.relative_path(TestFile::Data), Path::new("tests/7.data"));
    }

    #[test]
    fn test_next_unused_id_fills_gaps() {
        let mut tests = BTreeMap::new();
        assert_eq!(next_unused_id(&tests), "1");
        for id in ["1", "2", "4"] {
            tests.insert(id.to_owned(), TestCase::new(id));
        }
        assert_eq!(next_unused_id(&tests), "3");
    }

    #[test]
    fn test_sort_ids_numerically() {
        let mut ids = vec!["10".to_owned(), "2".to_owned(), "b".to_owned(), "1".to_owned()];
        sort_ids(&mut ids);
        assert_eq!(ids, ["1", "2", "10", "b"]);
    }

    #[test]
    fn test_humanize_size() {
        assert_eq!(humanize_size(12), "12 B");
        assert_eq!(humanize_size(1536), "1.5 kB");
        assert_eq!(humanize_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_summary_and_preview() {
        let dir = problem_dir();
        let t = TestCase::new("1");
        t.write(dir.path(), TestFile::Input, "1\n2\n3\n4\n").unwrap();
        assert_eq!(t.summary(dir.path()), "Test 1 [8 B | None]");
        assert_eq!(t.preview(dir.path(), TestFile::Input, 3), "1\n2\n[...]");
        assert_eq!(t.preview(dir.path(), TestFile::Input, 4), "1\n2\n3\n4");
        assert_eq!(t.preview(dir.path(), TestFile::Output, 3), MISSING_PLACEHOLDER);
    }

    #[test]
    fn test_delete_files_skips_missing() {
        let dir = problem_dir();
        let t = TestCase::new("1");
        t.write(dir.path(), TestFile::Input, "x").unwrap();
        t.delete_files(dir.path()).unwrap();
        assert!(!t.exists(dir.path(), TestFile::Input));
    }

    #[test]
    fn test_record_format() {
        let t = TestCase::new("3");
        assert_eq!(
            serde_json::to_string(&t).unwrap(),
            r#"{"_custom_type":"Test","ID":"3"}"#
        );
        let back: TestCase = serde_json::from_str(r#"{"_custom_type":"Test","ID":"3"}"#).unwrap();
        assert_eq!(back, t);
    }
}
