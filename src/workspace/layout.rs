/// Contest and problem directory layout, and scaffolding new ones.
use std::path::{Path, PathBuf};

use tracing::info;

use super::config::{default_manifest_path, global_manifest_path};
use super::fixture::{TESTS_DIR, TestCase, TestFile};
use super::manifest::{self, ContestManifest, ManifestKind, ProblemManifest};
use crate::exec::{CheckerInputs, CpuError};

/// Compiled solutions.
pub const SOLUTIONS_DIR: &str = "programs/solutions";
/// Compiled checkers.
pub const CHECKERS_DIR: &str = "programs/checkers";
/// Compiled generators.
pub const GENERATORS_DIR: &str = "programs/generators";
/// Solution outputs written while judging.
pub const OUTPUTS_DIR: &str = "outputs";

/// A problem directory containing `.cpu.problem_manifest.json`.
#[derive(Debug, Clone)]
pub struct Problem {
    root: PathBuf,
    manifest_path: PathBuf,
}

impl Problem {
    /// Open the problem rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns `CpuError::NotInCpuDirectory` if `root` is not a problem directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, CpuError> {
        let root = root.into();
        let manifest_path = manifest::require(&root, ManifestKind::Problem)?;
        Ok(Self {
            root,
            manifest_path,
        })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The problem's own manifest, without shared programs.
    ///
    /// # Errors
    ///
    /// Returns manifest load errors.
    pub fn load(&self) -> Result<ProblemManifest, CpuError> {
        manifest::load(&self.manifest_path)
    }

    /// The problem manifest with the shared manifest from `config_dir` merged in.
    /// For reading only: saving it would copy shared programs into the problem.
    ///
    /// # Errors
    ///
    /// Returns manifest load errors.
    pub fn load_merged(&self, config_dir: &Path) -> Result<ProblemManifest, CpuError> {
        manifest::load_problem_with_global(&self.manifest_path, &global_manifest_path(config_dir))
    }

    /// Load, change and save the problem's own manifest.
    ///
    /// # Errors
    ///
    /// Returns manifest errors or the error returned by `change`.
    pub fn modify<R>(
        &self,
        change: impl FnOnce(&mut ProblemManifest) -> Result<R, CpuError>,
    ) -> Result<R, CpuError> {
        manifest::modify(&self.manifest_path, change)
    }

    /// Where a solution's judged output is written.
    #[must_use]
    pub fn output_path(&self, solution: &str) -> PathBuf {
        self.root
            .join(OUTPUTS_DIR)
            .join(format!("{solution}_out.txt"))
    }

    /// Checker arguments for `test` against the output in `solution_output`.
    #[must_use]
    pub fn checker_inputs(&self, test: &TestCase, solution_output: PathBuf) -> CheckerInputs {
        CheckerInputs {
            input: test.path(&self.root, TestFile::Input),
            expected_output: test.path(&self.root, TestFile::Output),
            data: test.path(&self.root, TestFile::Data),
            solution_output,
        }
    }
}

/// Default problem names: `A`..`Z`, then `AA`, `AB`, ...
#[must_use]
pub fn problem_names(count: usize) -> Vec<String> {
    (0..count).map(spreadsheet_name).collect()
}

fn spreadsheet_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        // `index % 26` always fits in a u8.
        #[allow(clippy::cast_possible_truncation)]
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.iter().rev().map(|&b| char::from(b)).collect()
}

/// Create an empty contest manifest in `root`.
///
/// # Errors
///
/// - `CpuError::ContestAlreadyExists` — `root` already holds a contest or problem
/// - `CpuError::Io` — the manifest cannot be written
pub fn create_contest(root: &Path) -> Result<(), CpuError> {
    if let Some(kind) = manifest::find_manifests(root).first() {
        return Err(CpuError::ContestAlreadyExists {
            kind: kind.label(),
            manifest: kind.file_name(),
        });
    }
    manifest::save(
        &ContestManifest::new(),
        &root.join(ManifestKind::Contest.file_name()),
    )?;
    info!(root = %root.display(), "contest created");
    Ok(())
}

/// Register problem `name` in the contest at `contest_root` and lay out its directory.
///
/// The initial problem manifest is `default_manifest.json` from `config_dir`
/// when present, otherwise empty.
///
/// # Errors
///
/// - `CpuError::NotInCpuDirectory` — `contest_root` is not a contest
/// - `CpuError::Io` — the directory already exists or cannot be created
pub fn create_problem(contest_root: &Path, name: &str, config_dir: &Path) -> Result<(), CpuError> {
    let contest_manifest = manifest::require(contest_root, ManifestKind::Contest)?;
    let dir = contest_root.join(name);
    std::fs::create_dir(&dir).map_err(|e| CpuError::io("cannot create", &dir, e))?;

    for sub in [
        SOLUTIONS_DIR,
        CHECKERS_DIR,
        GENERATORS_DIR,
        TESTS_DIR,
        OUTPUTS_DIR,
    ] {
        let path = dir.join(sub);
        std::fs::create_dir_all(&path).map_err(|e| CpuError::io("cannot create", &path, e))?;
    }

    let problem_manifest = dir.join(ManifestKind::Problem.file_name());
    let template = default_manifest_path(config_dir);
    if template.is_file() {
        std::fs::copy(&template, &problem_manifest)
            .map_err(|e| CpuError::io("cannot copy", &template, e))?;
    } else {
        manifest::save(&ProblemManifest::default(), &problem_manifest)?;
    }

    manifest::modify(&contest_manifest, |m: &mut ContestManifest| {
        m.insert(name.to_owned(), PathBuf::from(format!("{name}/")));
        Ok(())
    })?;
    info!(problem = name, "problem created");
    Ok(())
}
