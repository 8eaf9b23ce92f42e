/// CLI argument definitions via clap derive.
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

/// cpu — manage competitive programming contests from the CLI.
#[derive(Debug, Parser)]
#[command(
    name = "cpu",
    about = "Manage competitive programming contests: solutions, tests, checkers and generators",
    version,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output format. Auto-detects: table when TTY, json when piped.
    #[arg(long, global = true, value_name = "FORMAT", default_value = "auto")]
    pub output: OutputFormat,

    /// Shorthand for --output json.
    #[arg(long, global = true, conflicts_with = "output")]
    pub json: bool,

    /// Omit table headers.
    #[arg(long, global = true)]
    pub no_header: bool,

    /// Log compile and run details to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Auto-detect: table when stdout is a TTY, json when piped.
    #[default]
    Auto,
    /// Human-readable text and tables.
    Table,
    /// One pretty-printed JSON document per command.
    Json,
}

/// All subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a contest in the current directory with N problems.
    MakeContest(MakeContestArgs),
    /// Add a problem to the contest in the current directory.
    #[command(visible_alias = "ap")]
    AddProblem(AddProblemArgs),
    /// Register a solution source file.
    #[command(visible_alias = "as")]
    AddSolution(AddProgramArgs),
    /// Compile a registered solution.
    #[command(visible_alias = "cs")]
    CompileSolution(CompileSolutionArgs),
    /// Run a compiled solution on terminal I/O or on a test's input.
    #[command(visible_alias = "rs")]
    RunSolution(RunSolutionArgs),
    /// Delete a solution's compiled artifact and registration.
    DeleteSolution(NameArgs),
    /// Register an input generator source file.
    #[command(visible_alias = "ag")]
    AddGenerator(AddProgramArgs),
    /// Register a checker source file.
    #[command(visible_alias = "ac")]
    AddChecker(AddProgramArgs),
    /// Set the checker used by test-solution.
    SetChecker(NameArgs),
    /// Add a test from stdin or from a generator.
    #[command(visible_alias = "at")]
    AddTest(AddTestArgs),
    /// Write a solution's output as the expected output of tests.
    #[command(visible_alias = "mo")]
    MakeOutput(JudgeArgs),
    /// Run a solution on tests and score it with the default checker.
    ///
    /// The checker's fourth argument is the solution's full stdout, including
    /// any data printed after the delimiter.
    #[command(visible_alias = "ts")]
    TestSolution(JudgeArgs),
    /// Generate tests until a solution disagrees with an accepted one.
    StressTest(StressTestArgs),
    /// Show registered tests.
    #[command(visible_alias = "lt")]
    ListTests(ListTestsArgs),
    /// Delete tests and their files.
    DeleteTests(DeleteTestsArgs),
}

/// Arguments for `cpu make-contest`.
#[derive(Debug, Parser)]
pub struct MakeContestArgs {
    /// Number of problems.
    pub count: usize,

    /// Problem names, used instead of A, B, C, ...
    #[arg(long, value_name = "NAMES", num_args = 1..)]
    pub by_name: Option<Vec<String>>,
}

/// Arguments for `cpu add-problem`.
#[derive(Debug, Parser)]
pub struct AddProblemArgs {
    /// Problem name (also its directory name).
    pub name: String,
}

/// Arguments for registering a solution, generator or checker.
#[derive(Debug, Parser)]
pub struct AddProgramArgs {
    /// Source file, relative to the problem directory.
    pub file: PathBuf,

    /// Name to register under. Defaults to the file name without its extension.
    #[arg(short, long)]
    pub name: Option<String>,
}

/// Arguments naming one registered program.
#[derive(Debug, Parser)]
pub struct NameArgs {
    pub name: String,
}

/// Arguments for `cpu compile-solution`.
#[derive(Debug, Parser)]
pub struct CompileSolutionArgs {
    /// Solution name.
    pub name: String,

    /// Compile command key from the config, instead of the default one.
    #[arg(short = 'c', long = "custom-compile", value_name = "KEY")]
    pub key: Option<String>,
}

/// Arguments for `cpu run-solution`.
#[derive(Debug, Parser)]
pub struct RunSolutionArgs {
    /// Solution name.
    pub name: String,

    /// Time limit in seconds.
    #[arg(short = 't', long, value_name = "SECS", value_parser = parse_seconds)]
    pub time_limit: Option<Duration>,

    /// Read input from this test instead of the terminal.
    #[arg(short = 'i', long, value_name = "TEST")]
    pub input_test: Option<String>,

    /// Do not print the elapsed time.
    #[arg(short, long)]
    pub silent: bool,
}

/// Arguments for `cpu add-test`.
#[derive(Debug, Parser)]
pub struct AddTestArgs {
    /// Generator whose stdout becomes the test input.
    #[arg(short = 'g', long = "with-gen", value_name = "GENERATOR")]
    pub generator: Option<String>,
}

/// Arguments for `cpu make-output` and `cpu test-solution`.
#[derive(Debug, Parser)]
pub struct JudgeArgs {
    /// Solution name.
    pub solution: String,

    /// Time limit in seconds.
    #[arg(short = 't', long, value_name = "SECS", value_parser = parse_seconds)]
    pub timeout: Option<Duration>,

    /// Test IDs. All tests when omitted.
    pub tests: Vec<String>,
}

/// Arguments for `cpu stress-test`.
#[derive(Debug, Parser)]
pub struct StressTestArgs {
    /// Solution under test.
    pub stress: String,

    /// Accepted solution that produces the expected output.
    pub accepted: String,

    /// Generator for test inputs.
    pub generator: String,

    /// Stop after this many rounds. Unbounded when omitted.
    #[arg(short, long)]
    pub rounds: Option<u64>,
}

/// Arguments for `cpu list-tests`.
#[derive(Debug, Parser)]
pub struct ListTestsArgs {
    /// Print one summary line per test instead of previews.
    #[arg(short, long)]
    pub summary: bool,

    /// Lines shown per file in previews.
    #[arg(short = 't', long, value_name = "N", default_value = "5")]
    pub truncate: usize,

    /// Test IDs. All tests when omitted.
    pub tests: Vec<String>,
}

/// Arguments for `cpu delete-tests`.
#[derive(Debug, Parser)]
pub struct DeleteTestsArgs {
    /// Test IDs. All tests when omitted, after confirmation.
    pub tests: Vec<String>,

    /// Do not ask before deleting all tests.
    #[arg(short, long)]
    pub yes: bool,
}

/// Parse a non-negative number of seconds.
fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("invalid time limit '{s}': {e}"))
}
