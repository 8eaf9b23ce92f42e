/// Command dispatch: routes `Command` enum variants to their implementations.
pub mod contest;
pub mod fixtures;
pub mod judge;
pub mod program;
pub mod solution;

use std::path::PathBuf;

use crate::cli::OutputCtx;
use crate::cli::args::Command;
use crate::exec::CpuError;
use crate::workspace::{Config, Problem};

/// Where a command runs and how it reports.
pub struct Session<'a> {
    pub out: &'a OutputCtx,
    /// The contest or problem directory the command acts on.
    pub root: PathBuf,
    /// Holds `config.json` and the shared manifests.
    pub config_dir: PathBuf,
}

impl Session<'_> {
    /// The problem at the session root.
    ///
    /// # Errors
    ///
    /// Returns `CpuError::NotInCpuDirectory` outside a problem directory.
    pub fn problem(&self) -> Result<Problem, CpuError> {
        Problem::open(self.root.clone())
    }

    /// The user configuration, which must exist.
    ///
    /// # Errors
    ///
    /// Returns config load errors.
    pub fn config(&self) -> Result<Config, CpuError> {
        Config::load_from(&self.config_dir)
    }

    /// The user configuration, or defaults when there is none.
    ///
    /// # Errors
    ///
    /// Returns errors for a config that exists but cannot be loaded.
    pub fn config_or_default(&self) -> Result<Config, CpuError> {
        match Config::load_from(&self.config_dir) {
            Err(CpuError::ConfigNotFound { .. }) => Ok(Config::default()),
            other => other,
        }
    }
}

/// Dispatch a parsed `Command` to its handler.
///
/// # Errors
///
/// Returns `CpuError` on any command failure.
pub fn dispatch(command: &Command, session: &Session<'_>) -> Result<(), CpuError> {
    match command {
        Command::MakeContest(args) => contest::make_contest(args, session),
        Command::AddProblem(args) => contest::add_problem(args, session),
        Command::AddSolution(args) => solution::add_solution(args, session),
        Command::CompileSolution(args) => solution::compile_solution(args, session),
        Command::RunSolution(args) => solution::run_solution(args, session),
        Command::DeleteSolution(args) => solution::delete_solution(args, session),
        Command::AddGenerator(args) => program::add_generator(args, session),
        Command::AddChecker(args) => program::add_checker(args, session),
        Command::SetChecker(args) => program::set_checker(args, session),
        Command::AddTest(args) => fixtures::add_test(args, session),
        Command::ListTests(args) => fixtures::list_tests(args, session),
        Command::DeleteTests(args) => fixtures::delete_tests(args, session),
        Command::MakeOutput(args) => judge::make_output(args, session),
        Command::TestSolution(args) => judge::test_solution(args, session),
        Command::StressTest(args) => judge::stress_test(args, session),
    }
}
