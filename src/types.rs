/// Serializable command results.
///
/// These are what gets written to stdout, either as JSON or rendered for the
/// terminal. They are decoupled from the manifest types.
use serde::Serialize;

use crate::exec::{CpuError, VerdictLabel};

/// A command that changed the workspace.
#[derive(Debug, Clone, Serialize)]
pub struct ActionOutput {
    /// Always `true`; failures are reported through [`ErrorOutput`].
    pub ok: bool,
    /// Command-specific action, e.g. `solution_added`.
    pub action: String,
    /// The problem, program or test acted on.
    pub name: String,
    /// Human-readable summary.
    pub message: String,
}

impl ActionOutput {
    #[must_use]
    pub fn new(action: &str, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            action: action.to_owned(),
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Result of `run-solution`.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub solution: String,
    /// Test whose input was used; `None` for terminal I/O.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test: Option<String>,
    pub elapsed_secs: f64,
    /// Captured visible output; absent for terminal I/O.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Checker data printed after the delimiter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// One test in `list-tests`.
#[derive(Debug, Clone, Serialize)]
pub struct TestListing {
    pub id: String,
    /// e.g. `Test 3 [1.2 kB | 10 B]`.
    pub summary: String,
    /// Input size in bytes; `None` if the file is missing.
    pub input_size: Option<u64>,
    pub output_size: Option<u64>,
    /// Truncated input preview; absent in summary mode.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// How a single judged test ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    /// The checker scored the output.
    Checked,
    /// The test has no expected output, so it was skipped.
    NoOutput,
    /// Time limit exceeded.
    Tle,
    /// Runtime error.
    Rte,
}

impl TestStatus {
    /// Label for statuses that count as an extra verdict.
    #[must_use]
    pub fn error_label(self) -> Option<&'static str> {
        match self {
            Self::Tle => Some("TLE"),
            Self::Rte => Some("RTE"),
            Self::Checked | Self::NoOutput => None,
        }
    }
}

/// Result of judging a solution on one test.
#[derive(Debug, Clone, Serialize)]
pub struct TestReport {
    pub test: String,
    pub status: TestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<VerdictLabel>,
    /// Checker remarks, or the runtime error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    /// First lines of the solution's output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_preview: Option<String>,
}

/// Result of `test-solution`.
#[derive(Debug, Clone, Serialize)]
pub struct JudgeReport {
    pub solution: String,
    pub checker: String,
    pub tests: Vec<TestReport>,
    /// Lowest score over all tests; TLE and RTE count as 0.
    pub min_score: f64,
    /// e.g. `PC [0.50]`.
    pub verdict: String,
    /// Extra verdicts (`TLE`, `RTE`) seen on any test.
    pub errors: Vec<String>,
}

/// Result of `stress-test`.
#[derive(Debug, Clone, Serialize)]
pub struct StressReport {
    pub solution: String,
    /// Rounds attempted, including the failing one.
    pub rounds: u64,
    /// The kept test that breaks the solution, if one was found.
    pub failing_test: Option<String>,
}

/// A structured error envelope for JSON error output.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
    /// Always `false`.
    pub ok: bool,
    pub error: ErrorDetail,
}

/// Error detail in the JSON error envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (snake_case).
    pub code: String,
    pub message: String,
    /// Close registered names, for unknown-name errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates: Option<Vec<String>>,
}

impl ErrorOutput {
    #[must_use]
    pub fn from_cpu_error(err: &CpuError) -> Self {
        let candidates = match err {
            CpuError::UnknownProgram { candidates, .. } if !candidates.is_empty() => {
                Some(candidates.clone())
            }
            _ => None,
        };
        Self {
            ok: false,
            error: ErrorDetail {
                code: err.code().to_owned(),
                message: err.to_string(),
                candidates,
            },
        }
    }
}
