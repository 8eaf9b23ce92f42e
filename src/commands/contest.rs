/// `make-contest` and `add-problem` commands.
use crate::cli::args::{AddProblemArgs, MakeContestArgs};
use crate::cli::output::{write_action, write_actions};
use crate::exec::CpuError;
use crate::types::ActionOutput;
use crate::workspace::layout::{create_contest, create_problem, problem_names};

use super::Session;

/// Run `cpu make-contest`.
///
/// Problems are named by `--by-name` when given, otherwise `A`, `B`, ...
///
/// # Errors
///
/// Returns `CpuError::ContestAlreadyExists` inside an existing contest or problem,
/// or `CpuError::Io` if a directory cannot be created.
pub fn make_contest(args: &MakeContestArgs, session: &Session<'_>) -> Result<(), CpuError> {
    let outputs = create_contest_problems(args, session)?;
    write_actions(&outputs, session.out);
    Ok(())
}

fn create_contest_problems(
    args: &MakeContestArgs,
    session: &Session<'_>,
) -> Result<Vec<ActionOutput>, CpuError> {
    let names = args
        .by_name
        .clone()
        .unwrap_or_else(|| problem_names(args.count));

    create_contest(&session.root)?;
    session.out.note("Contest created, now adding problems");

    let mut outputs = Vec::with_capacity(names.len() + 1);
    for name in &names {
        create_problem(&session.root, name, &session.config_dir)?;
        outputs.push(ActionOutput::new(
            "problem_created",
            name,
            format!("Problem {name} created"),
        ));
    }
    outputs.push(ActionOutput::new(
        "contest_created",
        session.root.display().to_string(),
        "Contest creation successful!",
    ));
    Ok(outputs)
}

/// Run `cpu add-problem`.
///
/// # Errors
///
/// Returns `CpuError::NotInCpuDirectory` outside a contest directory, or
/// `CpuError::Io` if the problem directory already exists.
pub fn add_problem(args: &AddProblemArgs, session: &Session<'_>) -> Result<(), CpuError> {
    create_problem(&session.root, &args.name, &session.config_dir)?;
    write_action(
        &ActionOutput::new(
            "problem_created",
            &args.name,
            format!("Problem {} created", args.name),
        ),
        session.out,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{OutputCtx, OutputFormat};
    use crate::workspace::manifest::{self, ContestManifest, ManifestKind};

    fn session<'a>(out: &'a OutputCtx, root: &std::path::Path, config: &std::path::Path) -> Session<'a> {
        Session {
            out,
            root: root.to_path_buf(),
            config_dir: config.to_path_buf(),
        }
    }

    #[test]
    fn test_make_contest_default_names() {
        let dir = tempfile::tempdir().unwrap();
        let config = tempfile::tempdir().unwrap();
        let out = OutputCtx::new(OutputFormat::Json, false, false);
        let s = session(&out, dir.path(), config.path());

        let outputs =
            create_contest_problems(&MakeContestArgs { count: 3, by_name: None }, &s).unwrap();
        let actions: Vec<&str> = outputs.iter().map(|o| o.action.as_str()).collect();
        assert_eq!(
            actions,
            ["problem_created", "problem_created", "problem_created", "contest_created"]
        );
        assert_eq!(outputs[1].message, "Problem B created");
        assert_eq!(outputs[3].message, "Contest creation successful!");
        let m: ContestManifest =
            manifest::load(&dir.path().join(ManifestKind::Contest.file_name())).unwrap();
        assert_eq!(m.keys().collect::<Vec<_>>(), ["A", "B", "C"]);
        assert!(dir.path().join("C/tests").is_dir());
    }

    #[test]
    fn test_make_contest_by_name_then_add_problem() {
        let dir = tempfile::tempdir().unwrap();
        let config = tempfile::tempdir().unwrap();
        let out = OutputCtx::new(OutputFormat::Json, false, false);
        let s = session(&out, dir.path(), config.path());

        let args = MakeContestArgs {
            count: 1,
            by_name: Some(vec!["easy".to_owned()]),
        };
        make_contest(&args, &s).unwrap();
        add_problem(&AddProblemArgs { name: "hard".to_owned() }, &s).unwrap();

        let m: ContestManifest =
            manifest::load(&dir.path().join(ManifestKind::Contest.file_name())).unwrap();
        assert_eq!(m.keys().collect::<Vec<_>>(), ["easy", "hard"]);
        assert!(matches!(
            make_contest(&args, &s),
            Err(CpuError::ContestAlreadyExists { .. })
        ));
    }
}
