/// Splitting solution stdout into visible output and checker data.
use std::path::Path;
use std::time::Duration;

use super::commands::CommandTable;
use super::errors::CpuError;
use super::executable::{Executable, RunOptions};

/// Marker a solution prints between its visible output and extra data for the checker.
pub const DATA_DELIMITER: &str = "\u{DA}\u{7A}\u{F0}\u{11}\u{05}";

/// Result of running a solution.
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionResult {
    /// Visible output bytes; `None` when stdout was not captured.
    pub output: Option<Vec<u8>>,
    /// Bytes printed after [`DATA_DELIMITER`], if any.
    pub data: Option<Vec<u8>>,
    pub elapsed: Duration,
}

/// Split captured solution stdout at the data delimiter.
///
/// Works on raw bytes; output that is not valid UTF-8 passes through unchanged.
///
/// # Errors
///
/// Returns `CpuError::MalformedDataDelimiter` if the delimiter occurs more than once.
pub fn split_output(stdout: &[u8]) -> Result<(Vec<u8>, Option<Vec<u8>>), CpuError> {
    let delimiter = DATA_DELIMITER.as_bytes();
    let mut positions = Vec::new();
    let mut from = 0;
    while let Some(at) = find(&stdout[from..], delimiter) {
        positions.push(from + at);
        from += at + delimiter.len();
    }
    Ok(match positions.as_slice() {
        [] => (stdout.to_vec(), None),
        &[at] => (
            stdout[..at].to_vec(),
            Some(stdout[at + delimiter.len()..].to_vec()),
        ),
        _ => {
            return Err(CpuError::MalformedDataDelimiter {
                count: positions.len(),
            });
        }
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

impl Executable {
    /// Run as a solution, separating visible output from checker data.
    ///
    /// # Errors
    ///
    /// Everything [`Executable::run`] returns, plus
    /// `CpuError::MalformedDataDelimiter` for repeated delimiters.
    pub fn run_solution(
        &self,
        table: &CommandTable,
        root: &Path,
        options: RunOptions,
    ) -> Result<SolutionResult, CpuError> {
        let run = self.run(table, root, options)?;
        let (output, data) = match run.stdout {
            Some(stdout) => {
                let (output, data) = split_output(&stdout)?;
                (Some(output), data)
            }
            None => (None, None),
        };
        Ok(SolutionResult {
            output,
            data,
            elapsed: run.elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_delimiter() {
        let (output, data) = split_output(b"42\n").unwrap();
        assert_eq!(output, b"42\n");
        assert_eq!(data, None);
    }

    #[test]
    fn test_single_delimiter() {
        let raw = format!("42\n{DATA_DELIMITER}seed=7\n");
        let (output, data) = split_output(raw.as_bytes()).unwrap();
        assert_eq!(output, b"42\n");
        assert_eq!(data.as_deref(), Some(&b"seed=7\n"[..]));
    }

    #[test]
    fn test_delimiter_at_end_gives_empty_data() {
        let raw = format!("42\n{DATA_DELIMITER}");
        let (_, data) = split_output(raw.as_bytes()).unwrap();
        assert_eq!(data.as_deref(), Some(&b""[..]));
    }

    #[test]
    fn test_two_delimiters() {
        let raw = format!("a{DATA_DELIMITER}b{DATA_DELIMITER}c");
        assert!(matches!(
            split_output(raw.as_bytes()),
            Err(CpuError::MalformedDataDelimiter { count: 2 })
        ));
    }

    #[test]
    fn test_non_utf8_output_is_kept_verbatim() {
        let mut raw = b"caf\xE9\n".to_vec();
        raw.extend_from_slice(DATA_DELIMITER.as_bytes());
        raw.extend_from_slice(b"\xFF");
        let (output, data) = split_output(&raw).unwrap();
        assert_eq!(output, b"caf\xE9\n");
        assert_eq!(data.as_deref(), Some(&b"\xFF"[..]));
    }

    #[test]
    fn test_delimiter_is_utf8_encoded() {
        assert_eq!(
            DATA_DELIMITER.as_bytes(),
            &[0xC3, 0x9A, 0x7A, 0xC3, 0xB0, 0x11, 0x05]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_run_solution_splits_data() {
        use crate::exec::executable::tests::{script, sh_table};

        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("bin")).unwrap();
        let mut sol = script(
            dir.path(),
            "sol.sh",
            "printf '42\\n\\303\\232z\\303\\260\\021\\005seed=7\\n'\n",
        );
        sol.compile(&sh_table(), None, dir.path(), Path::new("bin"))
            .unwrap();
        let result = sol
            .run_solution(&sh_table(), dir.path(), RunOptions::default())
            .unwrap();
        assert_eq!(result.output.as_deref(), Some(&b"42\n"[..]));
        assert_eq!(result.data.as_deref(), Some(&b"seed=7\n"[..]));
    }
}
