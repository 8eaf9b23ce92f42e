/// Contest and problem manifests: the JSON files that record what cpu manages.
///
/// Manifests are read, changed and written back whole. There is no locking;
/// cpu is meant to be driven by one user at a time.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::debug;

use super::fixture::{TestCase, sort_ids};
use crate::exec::{CpuError, Executable};

/// The two kinds of cpu directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestKind {
    Contest,
    Problem,
}

impl ManifestKind {
    #[must_use]
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Contest => ".cpu.contest_manifest.json",
            Self::Problem => ".cpu.problem_manifest.json",
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Contest => "contest",
            Self::Problem => "problem",
        }
    }
}

/// Problem name to problem directory.
pub type ContestManifest = BTreeMap<String, PathBuf>;

/// Everything registered for one problem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemManifest {
    #[serde(default)]
    pub solutions: BTreeMap<String, Executable>,
    #[serde(default)]
    pub checkers: BTreeMap<String, Executable>,
    #[serde(default)]
    pub generators: BTreeMap<String, Executable>,
    #[serde(default)]
    pub tests: BTreeMap<String, TestCase>,
    /// Checker used by `test-solution`.
    #[serde(default)]
    pub default_checker: Option<String>,
}

impl ProblemManifest {
    /// Add entries from a shared manifest. Entries already present locally win.
    pub fn merge_global(&mut self, global: Self) {
        fn fill<T>(local: &mut BTreeMap<String, T>, shared: BTreeMap<String, T>) {
            for (name, value) in shared {
                local.entry(name).or_insert(value);
            }
        }
        fill(&mut self.solutions, global.solutions);
        fill(&mut self.checkers, global.checkers);
        fill(&mut self.generators, global.generators);
        fill(&mut self.tests, global.tests);
        if self.default_checker.is_none() {
            self.default_checker = global.default_checker;
        }
    }

    /// Test IDs in numeric order.
    #[must_use]
    pub fn test_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.tests.keys().cloned().collect();
        sort_ids(&mut ids);
        ids
    }
}

/// Which manifests exist in `dir`.
#[must_use]
pub fn find_manifests(dir: &Path) -> Vec<ManifestKind> {
    [ManifestKind::Contest, ManifestKind::Problem]
        .into_iter()
        .filter(|kind| dir.join(kind.file_name()).is_file())
        .collect()
}

/// Path of the `kind` manifest in `dir`, which must exist.
///
/// # Errors
///
/// Returns `CpuError::NotInCpuDirectory` if the manifest is absent.
pub fn require(dir: &Path, kind: ManifestKind) -> Result<PathBuf, CpuError> {
    let path = dir.join(kind.file_name());
    if path.is_file() {
        Ok(path)
    } else {
        Err(CpuError::NotInCpuDirectory {
            kind: kind.label(),
            manifest: kind.file_name(),
        })
    }
}

/// Read and decode a manifest file.
///
/// # Errors
///
/// Returns `CpuError::Io` if unreadable, `CpuError::InvalidManifest` if malformed.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, CpuError> {
    let text = std::fs::read_to_string(path).map_err(|e| CpuError::io("cannot read", path, e))?;
    serde_json::from_str(&text).map_err(|source| CpuError::InvalidManifest {
        path: path.to_path_buf(),
        source,
    })
}

/// Encode and write a manifest file (pretty-printed).
///
/// # Errors
///
/// Returns `CpuError::Io` if the file cannot be written.
pub fn save<T: Serialize>(value: &T, path: &Path) -> Result<(), CpuError> {
    let mut text = serde_json::to_string_pretty(value).map_err(|source| {
        CpuError::InvalidManifest {
            path: path.to_path_buf(),
            source,
        }
    })?;
    text.push('\n');
    std::fs::write(path, text).map_err(|e| CpuError::io("cannot write", path, e))?;
    debug!(path = %path.display(), "manifest saved");
    Ok(())
}

/// Load the manifest at `path`, apply `change`, and save it if `change` succeeds.
///
/// # Errors
///
/// Returns load/save errors, or whatever `change` returns (in which case the
/// file is left untouched).
pub fn modify<T, R>(
    path: &Path,
    change: impl FnOnce(&mut T) -> Result<R, CpuError>,
) -> Result<R, CpuError>
where
    T: Serialize + DeserializeOwned,
{
    let mut manifest: T = load(path)?;
    let result = change(&mut manifest)?;
    save(&manifest, path)?;
    Ok(result)
}

/// Load a problem manifest plus the optional shared manifest at `global_path`.
///
/// # Errors
///
/// Returns load errors for either file. A missing shared manifest is not an error.
pub fn load_problem_with_global(
    path: &Path,
    global_path: &Path,
) -> Result<ProblemManifest, CpuError> {
    let mut manifest: ProblemManifest = load(path)?;
    if global_path.is_file() {
        manifest.merge_global(load(global_path)?);
    }
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ProgramKind;

    #[test]
    fn test_problem_manifest_format() {
        let mut m = ProblemManifest::default();
        m.solutions.insert(
            "fast".to_owned(),
            Executable::new(ProgramKind::Solution, "fast", "fast.cpp"),
        );
        m.tests.insert("1".to_owned(), TestCase::new("1"));
        m.default_checker = Some("diff".to_owned());

        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["solutions"]["fast"]["_custom_type"], "Solution");
        assert_eq!(json["solutions"]["fast"]["src"], "fast.cpp");
        assert!(json["solutions"]["fast"]["exec_loc"].is_null());
        assert_eq!(json["tests"]["1"]["_custom_type"], "Test");
        assert_eq!(json["default_checker"], "diff");

        let back: ProblemManifest = serde_json::from_value(json).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn test_empty_object_is_empty_manifest() {
        let m: ProblemManifest = serde_json::from_str("{}").unwrap();
        assert_eq!(m, ProblemManifest::default());
    }

    #[test]
    fn test_merge_global_keeps_local() {
        let mut local = ProblemManifest::default();
        local.checkers.insert(
            "diff".to_owned(),
            Executable::new(ProgramKind::Checker, "diff", "mine.py"),
        );
        let mut global = ProblemManifest::default();
        global.checkers.insert(
            "diff".to_owned(),
            Executable::non_local("diff", "diff.py", "/opt/diff.py"),
        );
        global.checkers.insert(
            "tokens".to_owned(),
            Executable::non_local("tokens", "tokens.py", "/opt/tokens.py"),
        );
        global.default_checker = Some("tokens".to_owned());

        local.merge_global(global);
        assert_eq!(local.checkers["diff"].src, Path::new("mine.py"));
        assert!(local.checkers["tokens"].is_precompiled());
        assert_eq!(local.default_checker.as_deref(), Some("tokens"));
    }

    #[test]
    fn test_require_and_find() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_manifests(dir.path()).is_empty());
        assert!(matches!(
            require(dir.path(), ManifestKind::Problem),
            Err(CpuError::NotInCpuDirectory { kind: "problem", .. })
        ));
        save(&ProblemManifest::default(), &dir.path().join(ManifestKind::Problem.file_name()))
            .unwrap();
        assert_eq!(find_manifests(dir.path()), [ManifestKind::Problem]);
        assert!(require(dir.path(), ManifestKind::Problem).is_ok());
    }

    #[test]
    fn test_modify_saves_only_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ManifestKind::Contest.file_name());
        save(&ContestManifest::new(), &path).unwrap();

        modify(&path, |m: &mut ContestManifest| {
            m.insert("A".to_owned(), PathBuf::from("A/"));
            Ok(())
        })
        .unwrap();
        let err = modify(&path, |m: &mut ContestManifest| {
            m.insert("B".to_owned(), PathBuf::from("B/"));
            Err::<(), _>(CpuError::NoDefaultChecker)
        });
        assert!(err.is_err());

        let m: ContestManifest = load(&path).unwrap();
        assert_eq!(m.keys().collect::<Vec<_>>(), ["A"]);
    }

    #[test]
    fn test_global_manifest_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ManifestKind::Problem.file_name());
        save(&ProblemManifest::default(), &path).unwrap();
        let m = load_problem_with_global(&path, &dir.path().join("absent.json")).unwrap();
        assert!(m.checkers.is_empty());
    }

    #[test]
    fn test_invalid_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ManifestKind::Problem.file_name());
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            load::<ProblemManifest>(&path),
            Err(CpuError::InvalidManifest { .. })
        ));
    }
}
