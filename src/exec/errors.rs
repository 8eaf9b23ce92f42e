/// Errors raised while managing and running contest programs.
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Every failure `cpu` reports to the user.
#[derive(Debug, Error)]
pub enum CpuError {
    /// `make-contest` was called inside an existing contest or problem.
    #[error(
        "You are already in a cpu {kind} directory. If this is a mistake, delete {manifest} and try again"
    )]
    ContestAlreadyExists {
        /// `contest` or `problem`.
        kind: &'static str,
        /// The manifest file that was found.
        manifest: &'static str,
    },

    /// A command needs a manifest that is not in the current directory.
    #[error("Not in a cpu {kind} directory (looked for {manifest})")]
    NotInCpuDirectory {
        kind: &'static str,
        manifest: &'static str,
    },

    /// No command table entry for the source file's extension.
    #[error(
        "cpu does not know how to {action} '{src}'. Check that the config has a command entry for '.{ext}' files"
    )]
    UnknownExtension {
        /// `compile` or `run`.
        action: &'static str,
        src: String,
        ext: String,
    },

    /// The requested compile command key is not configured for the extension.
    #[error("Unknown compilation command '{key}' for '.{ext}' files")]
    UnknownCompileCommand { key: String, ext: String },

    /// A compile command template could not be expanded.
    #[error("Malformed compilation command: {reason}")]
    MalformedCompileCommand { reason: String },

    /// A run command template could not be expanded.
    #[error("Malformed run command: {reason}")]
    MalformedRunCommand { reason: String },

    /// The compiler exited unsuccessfully.
    #[error("Compilation of '{name}' failed ({status})")]
    CompilationFailed { name: String, status: String },

    /// An executable without an artifact was run.
    #[error("The program '{name}' has not been compiled yet")]
    UncompiledRun { name: String },

    /// A solution, checker, generator or test name is not registered.
    #[error("cpu does not know the {kind} '{name}'")]
    UnknownProgram {
        /// `solution`, `checker`, `generator`, `test` or `problem`.
        kind: &'static str,
        name: String,
        /// Registered names that look close to `name`.
        candidates: Vec<String>,
    },

    /// The program exited unsuccessfully.
    #[error("'{name}' exited unsuccessfully ({status})")]
    ExecutionFailed { name: String, status: String },

    /// The program did not finish within its time limit.
    #[error("'{name}' could not finish in {seconds} seconds")]
    Timeout { name: String, seconds: f64 },

    /// A solution printed the data delimiter more than once.
    #[error("The solution printed the data delimiter {count} times (at most once is allowed)")]
    MalformedDataDelimiter { count: usize },

    /// Parsing ran out of input.
    #[error("Unexpected end of input while reading {what}")]
    UnexpectedEof { what: &'static str },

    /// The checker's first token is not a number.
    #[error("Checker printed '{token}' where a numeric score was expected")]
    MalformedCheckerOutput { token: String },

    /// `test-solution` was called but no default checker is set.
    #[error("No default checker is set for this problem. Use `cpu set-checker <name>`")]
    NoDefaultChecker,

    /// The config file does not exist.
    #[error("Config file not found at {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// The config file is not valid.
    #[error("Invalid config file {}: {source}", path.display())]
    InvalidConfig {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A manifest file is not valid.
    #[error("Invalid manifest {}: {source}", path.display())]
    InvalidManifest {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A filesystem or process-spawn failure.
    #[error("{context} {}: {source}", path.display())]
    Io {
        context: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
}

impl CpuError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(context: &'static str, path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            context,
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Machine-readable error code (snake_case).
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ContestAlreadyExists { .. } => "contest_already_exists",
            Self::NotInCpuDirectory { .. } => "not_in_cpu_directory",
            Self::UnknownExtension { .. } => "unknown_extension",
            Self::UnknownCompileCommand { .. } => "unknown_compile_command",
            Self::MalformedCompileCommand { .. } => "malformed_compile_command",
            Self::MalformedRunCommand { .. } => "malformed_run_command",
            Self::CompilationFailed { .. } => "compilation_failed",
            Self::UncompiledRun { .. } => "uncompiled_run",
            Self::UnknownProgram { .. } => "unknown_program",
            Self::ExecutionFailed { .. } => "execution_failed",
            Self::Timeout { .. } => "timeout",
            Self::MalformedDataDelimiter { .. } => "malformed_data_delimiter",
            Self::UnexpectedEof { .. } => "unexpected_eof",
            Self::MalformedCheckerOutput { .. } => "malformed_checker_output",
            Self::NoDefaultChecker => "no_default_checker",
            Self::ConfigNotFound { .. } => "config_not_found",
            Self::InvalidConfig { .. } => "invalid_config",
            Self::InvalidManifest { .. } => "invalid_manifest",
            Self::Io { .. } => "io_error",
        }
    }

    /// Return the CLI exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ContestAlreadyExists { .. } | Self::NotInCpuDirectory { .. } => 2,
            Self::UnknownExtension { .. }
            | Self::UnknownCompileCommand { .. }
            | Self::MalformedCompileCommand { .. }
            | Self::MalformedRunCommand { .. }
            | Self::ConfigNotFound { .. }
            | Self::InvalidConfig { .. }
            | Self::InvalidManifest { .. } => 3,
            Self::UnknownProgram { .. } | Self::NoDefaultChecker => 4,
            Self::CompilationFailed { .. } | Self::UncompiledRun { .. } => 5,
            Self::ExecutionFailed { .. } | Self::Timeout { .. } => 6,
            Self::MalformedDataDelimiter { .. }
            | Self::UnexpectedEof { .. }
            | Self::MalformedCheckerOutput { .. } => 7,
            Self::Io { .. } => 1,
        }
    }
}
