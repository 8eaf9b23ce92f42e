/// Solution commands: `add-solution`, `compile-solution`, `run-solution`, `delete-solution`.
use std::path::Path;

use tracing::debug;

use crate::cli::args::{AddProgramArgs, CompileSolutionArgs, NameArgs, RunSolutionArgs};
use crate::cli::output::{write_action, write_run};
use crate::exec::{CpuError, ProgramKind, RunOptions, StdinSource, StdoutSink};
use crate::types::{ActionOutput, RunReport};
use crate::workspace::layout::SOLUTIONS_DIR;
use crate::workspace::{TestFile, lookup};

use super::Session;
use super::program::register;

/// Run `cpu add-solution`.
///
/// # Errors
///
/// Returns `CpuError::Io` if the file does not exist, or manifest errors.
pub fn add_solution(args: &AddProgramArgs, session: &Session<'_>) -> Result<(), CpuError> {
    let name = register(session, &args.file, args.name.as_deref(), ProgramKind::Solution)?;
    let message = format!("Solution {name} added");
    write_action(&ActionOutput::new("solution_added", name, message), session.out);
    Ok(())
}

/// Run `cpu compile-solution`. The artifact location is saved to the manifest.
///
/// # Errors
///
/// Returns `CpuError::UnknownProgram` for an unregistered solution, and the
/// errors of [`crate::exec::Executable::compile`].
pub fn compile_solution(args: &CompileSolutionArgs, session: &Session<'_>) -> Result<(), CpuError> {
    let config = session.config()?;
    let problem = session.problem()?;
    let root = problem.root();

    let message = problem.modify(|m| {
        let solution = lookup::require_mut(&mut m.solutions, &args.name, "solution")?;
        if solution.is_precompiled() {
            return Ok(format!("Solution {} is precompiled", solution.name));
        }
        solution.compile(
            &config.commands,
            args.key.as_deref(),
            root,
            Path::new(SOLUTIONS_DIR),
        )?;
        Ok(format!("Solution {} compiled", solution.name))
    })?;

    write_action(
        &ActionOutput::new("solution_compiled", &args.name, message),
        session.out,
    );
    Ok(())
}

/// Run `cpu run-solution`.
///
/// Without `--input-test` the solution talks to the terminal directly. With it,
/// the test input is fed to stdin and the output is captured and printed.
///
/// # Errors
///
/// Returns `CpuError::UnknownProgram` for an unknown solution or test, and the
/// errors of [`crate::exec::Executable::run`].
pub fn run_solution(args: &RunSolutionArgs, session: &Session<'_>) -> Result<(), CpuError> {
    let report = run_report(args, session)?;
    debug!(solution = %report.solution, elapsed = report.elapsed_secs, "run finished");
    write_run(&report, args.silent, session.out);
    Ok(())
}

fn run_report(args: &RunSolutionArgs, session: &Session<'_>) -> Result<RunReport, CpuError> {
    let config = session.config()?;
    let problem = session.problem()?;
    let root = problem.root();
    let manifest = problem.load_merged(&session.config_dir)?;
    let solution = lookup::require(&manifest.solutions, &args.name, "solution")?;

    Ok(if let Some(id) = &args.input_test {
        let test = lookup::require(&manifest.tests, id, "test")?;
        let options = RunOptions {
            stdin: StdinSource::File(test.open(root, TestFile::Input)?),
            stdout: StdoutSink::Capture,
            timeout: args.time_limit,
            ..RunOptions::default()
        };
        let result = solution.run_solution(&config.commands, root, options)?;
        RunReport {
            solution: solution.name.clone(),
            test: Some(id.clone()),
            elapsed_secs: result.elapsed.as_secs_f64(),
            output: result.output.as_deref().map(lossy),
            data: result.data.as_deref().map(lossy),
        }
    } else {
        let options = RunOptions {
            stdin: StdinSource::Inherit,
            stdout: StdoutSink::Inherit,
            timeout: args.time_limit,
            ..RunOptions::default()
        };
        let run = solution.run(&config.commands, root, options)?;
        RunReport {
            solution: solution.name.clone(),
            test: None,
            elapsed_secs: run.elapsed.as_secs_f64(),
            output: None,
            data: None,
        }
    })
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Run `cpu delete-solution`. A missing artifact is not an error.
///
/// # Errors
///
/// Returns `CpuError::UnknownProgram` for an unregistered solution, or
/// `CpuError::Io` if the artifact cannot be removed.
pub fn delete_solution(args: &NameArgs, session: &Session<'_>) -> Result<(), CpuError> {
    let problem = session.problem()?;
    let root = problem.root();
    problem.modify(|m| {
        let solution = lookup::require_mut(&mut m.solutions, &args.name, "solution")?;
        if !solution.is_precompiled() {
            solution.delete_artifact(root)?;
        }
        m.solutions.remove(&args.name);
        Ok(())
    })?;
    write_action(
        &ActionOutput::new(
            "solution_deleted",
            &args.name,
            format!("Solution {} deleted!", args.name),
        ),
        session.out,
    );
    Ok(())
}
