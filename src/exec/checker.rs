/// Checker verdicts: parsing a checker's stdout and labelling scores.
///
/// A checker prints a score first, then free-form remarks:
///
/// ```text
/// 0.75
/// partial credit given
/// ```
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use super::commands::CommandTable;
use super::errors::CpuError;
use super::executable::{Executable, RunOptions};
use super::parser::StringParser;

/// A checker's judgement of one solution output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckerVerdict {
    /// 1 is fully correct, 0 is wrong, values in between are partial credit.
    pub score: f64,
    /// Everything the checker printed after the score.
    pub remarks: String,
}

/// Parse a checker's stdout into a verdict.
///
/// # Errors
///
/// - `CpuError::UnexpectedEof` — the output is empty or whitespace only
/// - `CpuError::MalformedCheckerOutput` — the first token is not a number
pub fn parse_checker_output(output: &str) -> Result<CheckerVerdict, CpuError> {
    let mut parser = StringParser::new(output);
    let token = parser.read_token("checker score")?;
    let score = token
        .parse::<f64>()
        .map_err(|_| CpuError::MalformedCheckerOutput {
            token: token.to_owned(),
        })?;
    Ok(CheckerVerdict {
        score,
        remarks: parser.read_rest().to_owned(),
    })
}

/// The four files a checker is given, in argument order.
#[derive(Debug, Clone)]
pub struct CheckerInputs {
    pub input: PathBuf,
    pub expected_output: PathBuf,
    /// Passed even when the file does not exist.
    pub data: PathBuf,
    pub solution_output: PathBuf,
}

impl CheckerInputs {
    fn to_args(&self) -> Result<Vec<String>, CpuError> {
        [
            &self.input,
            &self.expected_output,
            &self.data,
            &self.solution_output,
        ]
        .into_iter()
        .map(|p| {
            std::path::absolute(p)
                .map(|abs| abs.to_string_lossy().into_owned())
                .map_err(|e| CpuError::io("cannot resolve", p, e))
        })
        .collect()
    }
}

impl Executable {
    /// Run as a checker over `inputs` and parse its verdict.
    ///
    /// # Errors
    ///
    /// Everything [`Executable::run`] returns, plus the errors of
    /// [`parse_checker_output`].
    pub fn check(
        &self,
        table: &CommandTable,
        root: &Path,
        inputs: &CheckerInputs,
    ) -> Result<CheckerVerdict, CpuError> {
        let run = self.run(
            table,
            root,
            RunOptions {
                args: inputs.to_args()?,
                ..RunOptions::default()
            },
        )?;
        let stdout = String::from_utf8_lossy(&run.stdout.unwrap_or_default()).into_owned();
        debug!(checker = %self.name, output = %stdout.trim_end(), "checker finished");
        parse_checker_output(&stdout)
    }
}

/// Short verdict label for a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum VerdictLabel {
    /// Accepted.
    Ac,
    /// Partially correct.
    Pc,
    /// Wrong answer.
    Wa,
    /// Negative score: the checker itself reported an error.
    Err,
    /// Score above 1.
    Unk,
}

impl VerdictLabel {
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn from_score(score: f64) -> Self {
        if score < 0.0 {
            Self::Err
        } else if score == 0.0 {
            Self::Wa
        } else if score < 1.0 {
            Self::Pc
        } else if score == 1.0 {
            Self::Ac
        } else {
            Self::Unk
        }
    }
}

impl fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ac => "AC",
            Self::Pc => "PC",
            Self::Wa => "WA",
            Self::Err => "ERR",
            Self::Unk => "UNK",
        })
    }
}

/// Render a score as e.g. `AC [1.00]`.
#[must_use]
pub fn verdict_string(score: f64) -> String {
    format!("{} [{score:.2}]", VerdictLabel::from_score(score))
}
