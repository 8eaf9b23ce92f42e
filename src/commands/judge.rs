/// Judging commands: `make-output`, `test-solution` and `stress-test`.
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use tracing::warn;

use crate::cli::args::{JudgeArgs, StressTestArgs};
use crate::cli::output::{
    write_action, write_judge, write_stress, write_test_preview, write_test_report,
};
use crate::exec::{
    CpuError, Executable, RunOptions, StdinSource, StdoutSink, VerdictLabel, verdict_string,
};
use crate::types::{ActionOutput, JudgeReport, StressReport, TestReport, TestStatus};
use crate::workspace::fixture::preview_file;
use crate::workspace::layout::CHECKERS_DIR;
use crate::workspace::{Config, Problem, ProblemManifest, TestCase, TestFile, lookup};

use super::Session;
use super::fixtures::{delete_test_ids, generate_test, select_tests};

/// Lines of test input and output shown before judging a test.
const TEST_PREVIEW_LINES: usize = 3;

/// Lines of solution output shown after judging a test.
const OUTPUT_PREVIEW_LINES: usize = 5;

/// Run `cpu make-output`.
///
/// # Errors
///
/// Returns `CpuError::UnknownProgram` for an unknown solution or test, and the
/// solution's run errors.
pub fn make_output(args: &JudgeArgs, session: &Session<'_>) -> Result<(), CpuError> {
    let config = session.config()?;
    let problem = session.problem()?;
    let manifest = problem.load_merged(&session.config_dir)?;
    let tests = select_tests(&manifest, &args.tests)?;
    let solution = lookup::require(&manifest.solutions, &args.solution, "solution")?;

    write_expected_outputs(session, &config, &problem, solution, &tests, args.timeout)?;

    let ids: Vec<&str> = tests.iter().map(|t| t.id.as_str()).collect();
    write_action(
        &ActionOutput::new(
            "output_generated",
            ids.join(","),
            format!("Output generated for {} test(s)", ids.len()),
        ),
        session.out,
    );
    Ok(())
}

/// Run `solution` on each test and store its output as the expected output.
/// Checker data goes to the `.data` file, which is removed when there is none.
fn write_expected_outputs(
    session: &Session<'_>,
    config: &Config,
    problem: &Problem,
    solution: &Executable,
    tests: &[&TestCase],
    timeout: Option<Duration>,
) -> Result<(), CpuError> {
    let root = problem.root();
    for test in tests {
        session
            .out
            .note(format!("Generating output for test {}...", test.id));
        let options = RunOptions {
            stdin: StdinSource::File(test.open(root, TestFile::Input)?),
            timeout,
            ..RunOptions::default()
        };
        let result = solution.run_solution(&config.commands, root, options)?;
        test.write(root, TestFile::Output, result.output.unwrap_or_default())?;
        match result.data {
            Some(data) => test.write(root, TestFile::Data, &data)?,
            None => test.remove(root, TestFile::Data)?,
        }
        session.out.note("Output generated!");
    }
    Ok(())
}

/// Run `cpu test-solution`.
///
/// # Errors
///
/// Returns `CpuError::NoDefaultChecker` if no checker is set, lookup errors,
/// checker failures and solution errors other than timeouts and crashes.
pub fn test_solution(args: &JudgeArgs, session: &Session<'_>) -> Result<(), CpuError> {
    let config = session.config()?;
    let problem = session.problem()?;
    let manifest = problem.load_merged(&session.config_dir)?;
    let report = judge(
        session,
        &config,
        &problem,
        &manifest,
        &args.solution,
        &args.tests,
        args.timeout,
    )?;
    write_judge(&report, session.out);
    Ok(())
}

/// Judge `solution` on the tests named by `ids` (all when empty).
///
/// Timeouts and runtime errors score 0 and are listed as extra verdicts;
/// tests without expected output are skipped.
pub(crate) fn judge(
    session: &Session<'_>,
    config: &Config,
    problem: &Problem,
    manifest: &ProblemManifest,
    solution: &str,
    ids: &[String],
    timeout: Option<Duration>,
) -> Result<JudgeReport, CpuError> {
    let root = problem.root();
    let checker_name = manifest
        .default_checker
        .as_deref()
        .ok_or(CpuError::NoDefaultChecker)?;
    let tests = select_tests(manifest, ids)?;
    let solution = lookup::require(&manifest.solutions, solution, "solution")?;
    let mut checker = lookup::require(&manifest.checkers, checker_name, "checker")?.clone();
    if !checker.is_precompiled() {
        checker.compile(&config.commands, None, root, Path::new(CHECKERS_DIR))?;
    }
    session.out.note("All info ready. Running tests:");

    let mut reports = Vec::with_capacity(tests.len());
    for test in tests {
        write_test_preview(
            &test.summary(root),
            &test.preview(root, TestFile::Input, TEST_PREVIEW_LINES),
            &test.preview(root, TestFile::Output, TEST_PREVIEW_LINES),
            config.display_io_side_by_side,
            session.out,
        );
        let report = judge_test(config, problem, solution, &checker, test, timeout)?;
        write_test_report(&report, session.out);
        reports.push(report);
    }

    Ok(summarize(solution.name.clone(), checker.name, reports))
}

fn judge_test(
    config: &Config,
    problem: &Problem,
    solution: &Executable,
    checker: &Executable,
    test: &TestCase,
    timeout: Option<Duration>,
) -> Result<TestReport, CpuError> {
    let root = problem.root();
    let mut report = TestReport {
        test: test.id.clone(),
        status: TestStatus::Checked,
        elapsed_secs: None,
        score: None,
        verdict: None,
        remarks: None,
        output_preview: None,
    };
    if !test.exists(root, TestFile::Output) {
        report.status = TestStatus::NoOutput;
        return Ok(report);
    }

    // The checker gets the full stdout, data and delimiter included.
    let output_path = problem.output_path(&solution.name);
    let sink = std::fs::File::create(&output_path)
        .map_err(|e| CpuError::io("cannot create", &output_path, e))?;
    let options = RunOptions {
        stdin: StdinSource::File(test.open(root, TestFile::Input)?),
        stdout: StdoutSink::File(sink),
        timeout,
        ..RunOptions::default()
    };
    match solution.run(&config.commands, root, options) {
        Ok(run) => report.elapsed_secs = Some(run.elapsed.as_secs_f64()),
        Err(CpuError::Timeout { .. }) => {
            report.status = TestStatus::Tle;
            report.score = Some(0.0);
            return Ok(report);
        }
        Err(err @ CpuError::ExecutionFailed { .. }) => {
            warn!(test = %test.id, error = %err, "runtime error");
            report.status = TestStatus::Rte;
            report.score = Some(0.0);
            report.remarks = Some(err.to_string());
            return Ok(report);
        }
        Err(err) => return Err(err),
    }

    report.output_preview = Some(preview_file(&output_path, OUTPUT_PREVIEW_LINES));
    let verdict = checker.check(
        &config.commands,
        root,
        &problem.checker_inputs(test, output_path),
    )?;
    report.verdict = Some(VerdictLabel::from_score(verdict.score));
    report.score = Some(verdict.score);
    report.remarks = Some(verdict.remarks);
    Ok(report)
}

/// Overall result: the lowest score (1 when nothing was scored) plus extra verdicts.
fn summarize(solution: String, checker: String, tests: Vec<TestReport>) -> JudgeReport {
    let min_score = tests
        .iter()
        .filter_map(|r| r.score)
        .fold(1.0, f64::min);
    let errors: BTreeSet<&str> = tests
        .iter()
        .filter_map(|r| r.status.error_label())
        .collect();
    JudgeReport {
        solution,
        checker,
        min_score,
        verdict: verdict_string(min_score),
        errors: errors.into_iter().map(str::to_owned).collect(),
        tests,
    }
}

/// Run `cpu stress-test`.
///
/// Each round generates a test, makes its expected output with the accepted
/// solution and judges the stressed one. The first failing test is kept;
/// passing ones are deleted.
///
/// # Errors
///
/// Returns the errors of generating, making output or judging. The round's
/// test is deleted first.
pub fn stress_test(args: &StressTestArgs, session: &Session<'_>) -> Result<(), CpuError> {
    let config = session.config()?;
    let problem = session.problem()?;

    let mut rounds = 0;
    let mut failing_test = None;
    while args.rounds.is_none_or(|max| rounds < max) {
        rounds += 1;
        session.out.note(format!("Attempt {rounds}:"));
        let id = generate_test(session, &config, &problem, &args.generator)?;
        let ids = [id];

        match stress_round(session, &config, &problem, args, &ids) {
            Ok(score) if score < 1.0 => {
                let [id] = ids;
                failing_test = Some(id);
                break;
            }
            Ok(_) => {
                delete_test_ids(&problem, &ids)?;
            }
            Err(err) => {
                if let Err(cleanup) = delete_test_ids(&problem, &ids) {
                    warn!(test = %ids[0], error = %cleanup, "cannot delete stress test");
                }
                return Err(err);
            }
        }
    }

    write_stress(
        &StressReport {
            solution: args.stress.clone(),
            rounds,
            failing_test,
        },
        session.out,
    );
    Ok(())
}

fn stress_round(
    session: &Session<'_>,
    config: &Config,
    problem: &Problem,
    args: &StressTestArgs,
    ids: &[String],
) -> Result<f64, CpuError> {
    let manifest = problem.load_merged(&session.config_dir)?;
    let tests = select_tests(&manifest, ids)?;
    let accepted = lookup::require(&manifest.solutions, &args.accepted, "solution")?;
    write_expected_outputs(session, config, problem, accepted, &tests, None)?;
    let report = judge(session, config, problem, &manifest, &args.stress, ids, None)?;
    Ok(report.min_score)
}

#[cfg(all(test, unix))]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::cli::args::{AddProgramArgs, AddTestArgs, CompileSolutionArgs, NameArgs};
    use crate::commands::fixtures::add_test;
    use crate::commands::program::{add_checker, add_generator, set_checker};
    use crate::commands::solution::{add_solution, compile_solution};
    use crate::commands::testing::Fixture;

    /// Scores 1 when the expected output equals the solution output, else 0.
    const EXACT_CHECKER: &str =
        "if [ \"$(cat \"$2\")\" = \"$(cat \"$4\")\" ]; then echo 1 same; else echo 0 differs; fi\n";

    fn solution(fx: &Fixture, file: &str, body: &str) -> String {
        let file = fx.script(file, body);
        let s = fx.session();
        add_solution(&AddProgramArgs { file: file.clone(), name: None }, &s).unwrap();
        let name = file.file_stem().unwrap().to_string_lossy().into_owned();
        compile_solution(
            &CompileSolutionArgs {
                name: name.clone(),
                key: None,
            },
            &s,
        )
        .unwrap();
        name
    }

    fn setup(fx: &Fixture) {
        let s = fx.session();
        let checker = fx.script("exact.sh", EXACT_CHECKER);
        add_checker(&AddProgramArgs { file: checker, name: None }, &s).unwrap();
        set_checker(&NameArgs { name: "exact".to_owned() }, &s).unwrap();
        let generator = fx.script("gen.sh", "echo 2 3\n");
        add_generator(&AddProgramArgs { file: generator, name: None }, &s).unwrap();
    }

    fn new_test(fx: &Fixture) {
        add_test(
            &AddTestArgs {
                generator: Some("gen".to_owned()),
            },
            &fx.session(),
        )
        .unwrap();
    }

    fn run_judge(fx: &Fixture, name: &str, timeout: Option<Duration>) -> JudgeReport {
        let s = fx.session();
        let config = s.config().unwrap();
        let problem = s.problem().unwrap();
        let manifest = problem.load_merged(&s.config_dir).unwrap();
        judge(&s, &config, &problem, &manifest, name, &[], timeout).unwrap()
    }

    const SUM: &str = "read a b\necho $((a + b))\n";

    #[test]
    fn test_make_output_writes_out_and_data() {
        let fx = Fixture::new();
        setup(&fx);
        new_test(&fx);
        let name = solution(
            &fx,
            "sum.sh",
            "read a b\necho $((a + b))\nprintf '\\303\\232z\\303\\260\\021\\005'\necho seed\n",
        );
        make_output(
            &JudgeArgs {
                solution: name,
                timeout: None,
                tests: Vec::new(),
            },
            &fx.session(),
        )
        .unwrap();
        let tests = fx.problem_root().join("tests");
        assert_eq!(std::fs::read_to_string(tests.join("1.out")).unwrap(), "5\n");
        assert_eq!(std::fs::read_to_string(tests.join("1.data")).unwrap(), "seed\n");
    }

    #[test]
    fn test_make_output_keeps_raw_bytes() {
        let fx = Fixture::new();
        setup(&fx);
        new_test(&fx);
        let name = solution(&fx, "latin1.sh", "printf 'caf\\351\\n'\n");
        make_output(
            &JudgeArgs {
                solution: name,
                timeout: None,
                tests: Vec::new(),
            },
            &fx.session(),
        )
        .unwrap();
        let out = std::fs::read(fx.problem_root().join("tests/1.out")).unwrap();
        assert_eq!(out, b"caf\xE9\n");
    }

    #[test]
    fn test_checker_sees_solution_data() {
        let fx = Fixture::new();
        setup(&fx);
        new_test(&fx);
        let s = fx.session();
        let checker = fx.script(
            "wants_data.sh",
            "if grep -q seed \"$4\"; then echo 1 got data; else echo 0 no data; fi\n",
        );
        add_checker(&AddProgramArgs { file: checker, name: None }, &s).unwrap();
        set_checker(&NameArgs { name: "wants_data".to_owned() }, &s).unwrap();

        let accepted = solution(&fx, "sum.sh", SUM);
        make_output(
            &JudgeArgs {
                solution: accepted,
                timeout: None,
                tests: Vec::new(),
            },
            &s,
        )
        .unwrap();
        let with_data = solution(
            &fx,
            "seeded.sh",
            "read a b\necho $((a + b))\nprintf '\\303\\232z\\303\\260\\021\\005'\necho seed\n",
        );
        let report = run_judge(&fx, &with_data, None);
        assert_eq!(report.min_score, 1.0);
        assert_eq!(report.tests[0].remarks.as_deref(), Some("got data\n"));
    }

    #[test]
    fn test_accepted_and_wrong_solutions() {
        let fx = Fixture::new();
        setup(&fx);
        new_test(&fx);
        let accepted = solution(&fx, "sum.sh", SUM);
        make_output(
            &JudgeArgs {
                solution: accepted.clone(),
                timeout: None,
                tests: Vec::new(),
            },
            &fx.session(),
        )
        .unwrap();

        let report = run_judge(&fx, &accepted, None);
        assert_eq!(report.min_score, 1.0);
        assert_eq!(report.verdict, "AC [1.00]");
        assert_eq!(report.tests[0].remarks.as_deref(), Some("same\n"));

        let wrong = solution(&fx, "off.sh", "echo 6\n");
        let report = run_judge(&fx, &wrong, None);
        assert_eq!(report.min_score, 0.0);
        assert_eq!(report.tests[0].verdict, Some(VerdictLabel::Wa));
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_timeouts_and_crashes_score_zero() {
        let fx = Fixture::new();
        setup(&fx);
        new_test(&fx);
        let accepted = solution(&fx, "sum.sh", SUM);
        make_output(
            &JudgeArgs {
                solution: accepted,
                timeout: None,
                tests: Vec::new(),
            },
            &fx.session(),
        )
        .unwrap();

        let slow = solution(&fx, "slow.sh", "sleep 5\n");
        let report = run_judge(&fx, &slow, Some(Duration::from_millis(200)));
        assert_eq!(report.tests[0].status, TestStatus::Tle);
        assert_eq!(report.errors, ["TLE"]);
        assert_eq!(report.min_score, 0.0);

        let crash = solution(&fx, "crash.sh", "exit 1\n");
        let report = run_judge(&fx, &crash, None);
        assert_eq!(report.tests[0].status, TestStatus::Rte);
        assert_eq!(report.errors, ["RTE"]);
    }

    #[test]
    fn test_tests_without_output_are_skipped() {
        let fx = Fixture::new();
        setup(&fx);
        new_test(&fx);
        let name = solution(&fx, "sum.sh", SUM);
        let report = run_judge(&fx, &name, None);
        assert_eq!(report.tests[0].status, TestStatus::NoOutput);
        assert_eq!(report.min_score, 1.0);
    }

    #[test]
    fn test_no_default_checker() {
        let fx = Fixture::new();
        let name = solution(&fx, "sum.sh", SUM);
        let s = fx.session();
        let config = s.config().unwrap();
        let problem = s.problem().unwrap();
        let manifest = problem.load_merged(&s.config_dir).unwrap();
        assert!(matches!(
            judge(&s, &config, &problem, &manifest, &name, &[], None),
            Err(CpuError::NoDefaultChecker)
        ));
    }

    #[test]
    fn test_stress_keeps_failing_test() {
        let fx = Fixture::new();
        setup(&fx);
        let accepted = solution(&fx, "sum.sh", SUM);
        let wrong = solution(&fx, "off.sh", "echo 6\n");
        let args = StressTestArgs {
            stress: wrong,
            accepted,
            generator: "gen".to_owned(),
            rounds: Some(3),
        };
        stress_test(&args, &fx.session()).unwrap();
        let m = fx.session().problem().unwrap().load().unwrap();
        assert_eq!(m.test_ids(), ["1"]);
        assert!(fx.problem_root().join("tests/1.out").is_file());
    }

    #[test]
    fn test_stress_error_keeps_round_error() {
        let fx = Fixture::new();
        setup(&fx);
        let accepted = solution(&fx, "sum.sh", SUM);
        let args = StressTestArgs {
            stress: accepted,
            accepted: "missing".to_owned(),
            generator: "gen".to_owned(),
            rounds: Some(1),
        };
        let err = stress_test(&args, &fx.session()).unwrap_err();
        assert!(matches!(err, CpuError::UnknownProgram { .. }));
        let m = fx.session().problem().unwrap().load().unwrap();
        assert!(m.tests.is_empty());
    }

    #[test]
    fn test_stress_deletes_passing_tests() {
        let fx = Fixture::new();
        setup(&fx);
        let accepted = solution(&fx, "sum.sh", SUM);
        let args = StressTestArgs {
            stress: accepted.clone(),
            accepted,
            generator: "gen".to_owned(),
            rounds: Some(2),
        };
        stress_test(&args, &fx.session()).unwrap();
        let m = fx.session().problem().unwrap().load().unwrap();
        assert!(m.tests.is_empty());
    }
}
