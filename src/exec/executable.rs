/// Registered programs: compiling them and running the result.
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::commands::CommandTable;
use super::errors::CpuError;
use super::process::{
    ProcessOutcome, ProcessSpec, StdinSource, StdoutSink, describe_status, run_process,
};
use super::template::{TemplateVars, expand, expand_argv};

/// What a registered program is used for. Serialized as the record's type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgramKind {
    /// A plain program (generators).
    Executable,
    /// A program with a fixed, pre-built artifact outside the problem directory.
    NonLocalExecutable,
    Solution,
    Checker,
}

/// A source file registered with cpu, plus where its compiled artifact lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Executable {
    #[serde(rename = "_custom_type")]
    pub kind: ProgramKind,
    pub name: String,
    /// Source path, relative to the problem directory.
    pub src: PathBuf,
    /// Artifact path, relative to the problem directory. `None` until compiled.
    pub exec_loc: Option<PathBuf>,
}

/// I/O wiring and limits for one run.
#[derive(Debug, Default)]
pub struct RunOptions {
    /// Appended after the expanded run command.
    pub args: Vec<String>,
    pub stdin: StdinSource,
    pub stdout: StdoutSink,
    pub timeout: Option<Duration>,
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    /// Captured stdout bytes; `None` unless stdout was captured.
    pub stdout: Option<Vec<u8>>,
    /// Wall-clock time from spawn to exit.
    pub elapsed: Duration,
}

impl Executable {
    #[must_use]
    pub fn new(kind: ProgramKind, name: impl Into<String>, src: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            name: name.into(),
            src: src.into(),
            exec_loc: None,
        }
    }

    /// A program whose artifact already exists and is never rebuilt.
    #[cfg(test)]
    #[must_use]
    pub fn non_local(
        name: impl Into<String>,
        src: impl Into<PathBuf>,
        exec_loc: impl Into<PathBuf>,
    ) -> Self {
        Self {
            exec_loc: Some(exec_loc.into()),
            ..Self::new(ProgramKind::NonLocalExecutable, name, src)
        }
    }

    /// Source extension without the dot (empty if none).
    #[must_use]
    pub fn extension(&self) -> &str {
        self.src
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
    }

    /// Whether the artifact is provided up front instead of compiled.
    #[must_use]
    pub fn is_precompiled(&self) -> bool {
        self.kind == ProgramKind::NonLocalExecutable
    }

    fn src_display(&self) -> String {
        self.src.display().to_string()
    }

    /// Compile the source with the configured command and record the artifact.
    ///
    /// The compiler runs inside `root/output_dir`; the recorded artifact path is
    /// `output_dir/<artifact>`, relative to `root`.
    ///
    /// # Errors
    ///
    /// - `CpuError::UnknownExtension` / `UnknownCompileCommand` — nothing configured
    /// - `CpuError::MalformedCompileCommand` — the template cannot be expanded
    /// - `CpuError::CompilationFailed` — the compiler exited unsuccessfully
    /// - `CpuError::Io` — the compiler could not be started
    pub fn compile(
        &mut self,
        table: &CommandTable,
        key: Option<&str>,
        root: &Path,
        output_dir: &Path,
    ) -> Result<(), CpuError> {
        let command = table.compile_command(&self.src_display(), self.extension(), key)?;

        let src = absolute(&root.join(&self.src))?;
        let file = src.to_string_lossy();
        let vars = TemplateVars {
            name: &self.name,
            file: &file,
        };
        let malformed = |e: super::template::TemplateError| CpuError::MalformedCompileCommand {
            reason: e.to_string(),
        };
        let argv = expand_argv(&command.command, &vars).map_err(malformed)?;
        let artifact = expand(&command.artifact, &vars).map_err(malformed)?;

        let mut spec = ProcessSpec::new(argv);
        spec.cwd = Some(root.join(output_dir));
        spec.stdout = StdoutSink::Inherit;
        let program = spec.argv[0].clone();

        info!(name = %self.name, src = %src.display(), "compiling");
        let outcome =
            run_process(spec).map_err(|e| CpuError::io("cannot start compiler", &program, e))?;
        match outcome {
            ProcessOutcome::Finished { status, .. } if status.success() => {
                let exec_loc = output_dir.join(artifact);
                debug!(name = %self.name, exec_loc = %exec_loc.display(), "compiled");
                self.exec_loc = Some(exec_loc);
                Ok(())
            }
            ProcessOutcome::Finished { status, .. } => Err(CpuError::CompilationFailed {
                name: self.name.clone(),
                status: describe_status(status),
            }),
            ProcessOutcome::TimedOut { .. } => Err(CpuError::CompilationFailed {
                name: self.name.clone(),
                status: "timed out".to_owned(),
            }),
        }
    }

    /// Run the compiled artifact with the configured run command.
    ///
    /// The child's working directory is `root`.
    ///
    /// # Errors
    ///
    /// - `CpuError::UncompiledRun` — [`Executable::compile`] has not succeeded yet
    /// - `CpuError::UnknownExtension` — no run command configured
    /// - `CpuError::MalformedRunCommand` — the template cannot be expanded
    /// - `CpuError::Timeout` — the time limit was exceeded
    /// - `CpuError::ExecutionFailed` — the program exited unsuccessfully
    /// - `CpuError::Io` — the program could not be started
    pub fn run(
        &self,
        table: &CommandTable,
        root: &Path,
        options: RunOptions,
    ) -> Result<RunOutput, CpuError> {
        let exec_loc = self
            .exec_loc
            .as_ref()
            .ok_or_else(|| CpuError::UncompiledRun {
                name: self.name.clone(),
            })?;
        let template = table.run_command(&self.src_display(), self.extension())?;

        let artifact = absolute(&root.join(exec_loc))?;
        let file = artifact.to_string_lossy();
        let vars = TemplateVars {
            name: &self.name,
            file: &file,
        };
        let mut argv =
            expand_argv(template, &vars).map_err(|e| CpuError::MalformedRunCommand {
                reason: e.to_string(),
            })?;
        argv.extend(options.args);
        let program = argv[0].clone();

        let timeout = options.timeout;
        let spec = ProcessSpec {
            argv,
            cwd: Some(root.to_path_buf()),
            stdin: options.stdin,
            stdout: options.stdout,
            timeout,
        };

        match run_process(spec).map_err(|e| CpuError::io("cannot start", &program, e))? {
            ProcessOutcome::TimedOut { .. } => Err(CpuError::Timeout {
                name: self.name.clone(),
                seconds: timeout.map_or(0.0, |t| t.as_secs_f64()),
            }),
            ProcessOutcome::Finished { status, .. } if !status.success() => {
                Err(CpuError::ExecutionFailed {
                    name: self.name.clone(),
                    status: describe_status(status),
                })
            }
            ProcessOutcome::Finished {
                stdout, elapsed, ..
            } => Ok(RunOutput { stdout, elapsed }),
        }
    }

    /// Delete the compiled artifact, if any. The program must be compiled again before running.
    ///
    /// # Errors
    ///
    /// Returns `CpuError::Io` if the artifact exists but cannot be removed.
    pub fn delete_artifact(&mut self, root: &Path) -> Result<(), CpuError> {
        if let Some(exec_loc) = self.exec_loc.take() {
            let path = root.join(&exec_loc);
            match std::fs::remove_file(&path) {
                Ok(()) => debug!(path = %path.display(), "artifact deleted"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    self.exec_loc = Some(exec_loc);
                    return Err(CpuError::io("cannot delete", path, e));
                }
            }
        }
        Ok(())
    }
}

fn absolute(path: &Path) -> Result<PathBuf, CpuError> {
    std::path::absolute(path).map_err(|e| CpuError::io("cannot resolve", path, e))
}

#[cfg(all(test, unix))]
pub(crate) mod tests {
    use super::*;

    /// Shell scripts "compile" by being copied next to the other artifacts.
    pub(crate) fn sh_table() -> CommandTable {
        serde_json::from_str(
            r#"{
                "sh": {
                    "compile": {
                        "__default__": { "command": ["cp", "{file}", "{name}.sh"], "artifact": "{name}.sh" },
                        "broken": { "command": ["sh", "-c", "exit 2"], "artifact": "{name}" },
                        "typo": { "command": ["touch", "marker"], "artifact": "{nme}" }
                    },
                    "run": ["sh", "{file}"]
                }
            }"#,
        )
        .unwrap()
    }

    pub(crate) fn script(root: &Path, file: &str, body: &str) -> Executable {
        std::fs::write(root.join(file), body).unwrap();
        let name = file.trim_end_matches(".sh");
        Executable::new(ProgramKind::Solution, name, file)
    }

    fn scratch() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("bin")).unwrap();
        dir
    }

    #[test]
    fn test_compile_then_run() {
        let dir = scratch();
        let mut exe = script(dir.path(), "echo.sh", "echo hi \"$@\"\n");
        exe.compile(&sh_table(), None, dir.path(), Path::new("bin"))
            .unwrap();
        assert_eq!(exe.exec_loc.as_deref(), Some(Path::new("bin/echo.sh")));
        assert!(dir.path().join("bin/echo.sh").is_file());

        let out = exe
            .run(
                &sh_table(),
                dir.path(),
                RunOptions {
                    args: vec!["there".to_owned()],
                    ..RunOptions::default()
                },
            )
            .unwrap();
        assert_eq!(out.stdout.as_deref(), Some(&b"hi there\n"[..]));
    }

    #[test]
    fn test_unknown_extension_runs_nothing() {
        let dir = scratch();
        std::fs::write(dir.path().join("a.zz"), "").unwrap();
        let mut exe = Executable::new(ProgramKind::Solution, "a", "a.zz");
        let err = exe
            .compile(&sh_table(), None, dir.path(), Path::new("bin"))
            .unwrap_err();
        assert!(matches!(err, CpuError::UnknownExtension { .. }));
        assert!(exe.exec_loc.is_none());
        assert_eq!(std::fs::read_dir(dir.path().join("bin")).unwrap().count(), 0);
    }

    #[test]
    fn test_malformed_template_runs_nothing() {
        let dir = scratch();
        let mut exe = script(dir.path(), "a.sh", "true\n");
        let err = exe
            .compile(&sh_table(), Some("typo"), dir.path(), Path::new("bin"))
            .unwrap_err();
        assert!(matches!(err, CpuError::MalformedCompileCommand { .. }));
        assert!(!dir.path().join("bin/marker").exists());
    }

    #[test]
    fn test_compilation_failure() {
        let dir = scratch();
        let mut exe = script(dir.path(), "a.sh", "true\n");
        let err = exe
            .compile(&sh_table(), Some("broken"), dir.path(), Path::new("bin"))
            .unwrap_err();
        assert!(matches!(err, CpuError::CompilationFailed { status, .. } if status == "exit code 2"));
        assert!(exe.exec_loc.is_none());
    }

    #[test]
    fn test_run_before_compile() {
        let dir = scratch();
        let exe = script(dir.path(), "a.sh", "true\n");
        let err = exe
            .run(&sh_table(), dir.path(), RunOptions::default())
            .unwrap_err();
        assert!(matches!(err, CpuError::UncompiledRun { name } if name == "a"));
    }

    #[test]
    fn test_run_timeout() {
        let dir = scratch();
        let mut exe = script(dir.path(), "slow.sh", "sleep 5\n");
        exe.compile(&sh_table(), None, dir.path(), Path::new("bin"))
            .unwrap();
        let started = std::time::Instant::now();
        let err = exe
            .run(
                &sh_table(),
                dir.path(),
                RunOptions {
                    timeout: Some(Duration::from_millis(200)),
                    ..RunOptions::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, CpuError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_run_nonzero_exit() {
        let dir = scratch();
        let mut exe = script(dir.path(), "crash.sh", "exit 1\n");
        exe.compile(&sh_table(), None, dir.path(), Path::new("bin"))
            .unwrap();
        let err = exe
            .run(&sh_table(), dir.path(), RunOptions::default())
            .unwrap_err();
        assert!(matches!(err, CpuError::ExecutionFailed { .. }));
    }

    #[test]
    fn test_delete_artifact() {
        let dir = scratch();
        let mut exe = script(dir.path(), "a.sh", "true\n");
        exe.compile(&sh_table(), None, dir.path(), Path::new("bin"))
            .unwrap();
        exe.delete_artifact(dir.path()).unwrap();
        assert!(exe.exec_loc.is_none());
        assert!(!dir.path().join("bin/a.sh").exists());
        // Deleting again is a no-op.
        exe.delete_artifact(dir.path()).unwrap();
    }

    #[test]
    fn test_record_tag() {
        let exe = Executable::non_local("diff", "diff.py", "/opt/checkers/diff.py");
        let json = serde_json::to_value(&exe).unwrap();
        assert_eq!(json["_custom_type"], "NonLocalExecutable");
        assert_eq!(json["exec_loc"], "/opt/checkers/diff.py");
        assert!(exe.is_precompiled());
        assert_eq!(exe.extension(), "py");
    }
}
