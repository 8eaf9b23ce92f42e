/// Test commands: `add-test`, `list-tests` and `delete-tests`.
use std::io::{BufRead, Read, Write};
use std::path::Path;

use crate::cli::args::{AddTestArgs, DeleteTestsArgs, ListTestsArgs};
use crate::cli::output::{write_action, write_test_listings};
use crate::exec::{CpuError, RunOptions, StdoutSink};
use crate::types::{ActionOutput, TestListing};
use crate::workspace::fixture::next_unused_id;
use crate::workspace::layout::GENERATORS_DIR;
use crate::workspace::{Config, Problem, ProblemManifest, TestCase, TestFile, lookup};

use super::Session;

/// The tests named by `ids`, or every test in numeric order when `ids` is empty.
///
/// # Errors
///
/// Returns `CpuError::UnknownProgram` for the first unregistered ID.
pub(crate) fn select_tests<'a>(
    manifest: &'a ProblemManifest,
    ids: &[String],
) -> Result<Vec<&'a TestCase>, CpuError> {
    if ids.is_empty() {
        return Ok(manifest
            .test_ids()
            .iter()
            .filter_map(|id| manifest.tests.get(id))
            .collect());
    }
    ids.iter()
        .map(|id| lookup::require(&manifest.tests, id, "test"))
        .collect()
}

/// Run `cpu add-test`.
///
/// # Errors
///
/// Returns `CpuError::Io` if stdin or the fixture files fail, and the compile
/// and run errors of the generator when `--with-gen` is given.
pub fn add_test(args: &AddTestArgs, session: &Session<'_>) -> Result<(), CpuError> {
    let problem = session.problem()?;
    let id = match &args.generator {
        Some(generator) => {
            let config = session.config()?;
            generate_test(session, &config, &problem, generator)?
        }
        None => read_test(session, &problem)?,
    };
    let message = if args.generator.is_some() {
        format!("Test {id} generated successfully!")
    } else {
        format!("Test {id} created successfully!")
    };
    write_action(&ActionOutput::new("test_added", id, message), session.out);
    Ok(())
}

/// New test from stdin: input until EOF, then expected output until EOF.
fn read_test(session: &Session<'_>, problem: &Problem) -> Result<String, CpuError> {
    let root = problem.root();
    problem.modify(|m| {
        let test = TestCase::new(next_unused_id(&m.tests));
        session
            .out
            .note(format!("Test {} created. Now reading input...", test.id));
        let input = read_stdin_to_eof()?;
        session.out.note("Now reading output...");
        let output = read_stdin_to_eof()?;

        test.write(root, TestFile::Input, &input)?;
        test.write(root, TestFile::Output, &output)?;
        let id = test.id.clone();
        m.tests.insert(id.clone(), test);
        Ok(id)
    })
}

fn read_stdin_to_eof() -> Result<String, CpuError> {
    let mut text = String::new();
    std::io::stdin()
        .lock()
        .read_to_string(&mut text)
        .map_err(|e| CpuError::io("cannot read", "<stdin>", e))?;
    Ok(text)
}

/// New test whose input is the stdout of `generator`, compiled first.
///
/// The generator's artifact is saved when it is registered in the problem.
/// Returns the new test ID.
///
/// # Errors
///
/// Returns `CpuError::UnknownProgram` for an unknown generator, and its
/// compile and run errors. A failed run leaves no test behind.
pub(crate) fn generate_test(
    session: &Session<'_>,
    config: &Config,
    problem: &Problem,
    name: &str,
) -> Result<String, CpuError> {
    let root = problem.root();
    let merged = problem.load_merged(&session.config_dir)?;
    let mut generator = lookup::require(&merged.generators, name, "generator")?.clone();
    if !generator.is_precompiled() {
        generator.compile(&config.commands, None, root, Path::new(GENERATORS_DIR))?;
    }

    problem.modify(|m| {
        if let Some(local) = m.generators.get_mut(name) {
            local.exec_loc.clone_from(&generator.exec_loc);
        }
        let test = TestCase::new(next_unused_id(&m.tests));
        session
            .out
            .note(format!("Test {} created. Calling generator...", test.id));

        let options = RunOptions {
            stdout: StdoutSink::File(test.create(root, TestFile::Input)?),
            ..RunOptions::default()
        };
        if let Err(err) = generator.run(&config.commands, root, options) {
            test.delete_files(root)?;
            return Err(err);
        }
        let id = test.id.clone();
        m.tests.insert(id.clone(), test);
        Ok(id)
    })
}

/// Run `cpu list-tests`.
///
/// # Errors
///
/// Returns `CpuError::UnknownProgram` for an unregistered test ID.
pub fn list_tests(args: &ListTestsArgs, session: &Session<'_>) -> Result<(), CpuError> {
    let config = session.config_or_default()?;
    let problem = session.problem()?;
    let listings = test_listings(args, &problem)?;
    write_test_listings(&listings, config.display_io_side_by_side, session.out);
    Ok(())
}

fn test_listings(args: &ListTestsArgs, problem: &Problem) -> Result<Vec<TestListing>, CpuError> {
    let root = problem.root();
    let manifest = problem.load()?;
    Ok(select_tests(&manifest, &args.tests)?
        .into_iter()
        .map(|test| {
            let preview = |file| (!args.summary).then(|| test.preview(root, file, args.truncate));
            TestListing {
                id: test.id.clone(),
                summary: test.summary(root),
                input_size: test.size(root, TestFile::Input),
                output_size: test.size(root, TestFile::Output),
                input: preview(TestFile::Input),
                output: preview(TestFile::Output),
            }
        })
        .collect())
}

/// Run `cpu delete-tests`. Deleting every test asks first unless `--yes` is given.
///
/// # Errors
///
/// Returns `CpuError::UnknownProgram` for an unregistered test ID, or
/// `CpuError::Io` if files cannot be removed.
pub fn delete_tests(args: &DeleteTestsArgs, session: &Session<'_>) -> Result<(), CpuError> {
    let problem = session.problem()?;
    if args.tests.is_empty()
        && !args.yes
        && !confirm("You are about to delete all tests. Proceed? (y/n) ")?
    {
        return Ok(());
    }
    let deleted = delete_test_ids(&problem, &args.tests)?;

    for id in &deleted {
        session.out.note(format!("Test {id} deleted"));
    }
    write_action(
        &ActionOutput::new(
            "tests_deleted",
            deleted.join(","),
            format!("{} test(s) deleted", deleted.len()),
        ),
        session.out,
    );
    Ok(())
}

/// Unregister tests and remove their files. All tests when `ids` is empty.
///
/// # Errors
///
/// Returns `CpuError::UnknownProgram` if any ID is unregistered; nothing is deleted then.
pub(crate) fn delete_test_ids(problem: &Problem, ids: &[String]) -> Result<Vec<String>, CpuError> {
    let root = problem.root();
    problem.modify(|m| {
        let ids = if ids.is_empty() {
            m.test_ids()
        } else {
            lookup::require_all(&m.tests, ids, "test")?;
            ids.to_vec()
        };
        for id in &ids {
            if let Some(test) = m.tests.remove(id) {
                test.delete_files(root)?;
            }
        }
        Ok(ids)
    })
}

/// Ask a yes/no question on the terminal until a valid answer is given.
/// End of input counts as no.
fn confirm(prompt: &str) -> Result<bool, CpuError> {
    let stdin = std::io::stdin();
    let mut stderr = std::io::stderr();
    loop {
        let _ = write!(stderr, "{prompt}");
        let _ = stderr.flush();
        let mut line = String::new();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .map_err(|e| CpuError::io("cannot read", "<stdin>", e))?;
        if read == 0 {
            return Ok(false);
        }
        match parse_answer(&line) {
            Some(answer) => return Ok(answer),
            None => {
                let _ = writeln!(stderr, "Please enter a y/n response.");
            }
        }
    }
}

fn parse_answer(line: &str) -> Option<bool> {
    match line.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}
