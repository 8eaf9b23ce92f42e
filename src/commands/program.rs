/// Registering programs: `add-generator`, `add-checker` and `set-checker`.
use std::collections::BTreeMap;
use std::path::Path;

use crate::cli::args::{AddProgramArgs, NameArgs};
use crate::cli::output::write_action;
use crate::exec::{CpuError, Executable, ProgramKind};
use crate::types::ActionOutput;
use crate::workspace::{ProblemManifest, lookup};

use super::Session;

/// The manifest section holding programs of `kind`.
fn section(manifest: &mut ProblemManifest, kind: ProgramKind) -> &mut BTreeMap<String, Executable> {
    match kind {
        ProgramKind::Solution => &mut manifest.solutions,
        ProgramKind::Checker => &mut manifest.checkers,
        ProgramKind::Executable | ProgramKind::NonLocalExecutable => &mut manifest.generators,
    }
}

/// Register `file` under `name` (default: the file stem). Returns the name used.
///
/// # Errors
///
/// Returns `CpuError::Io` if `file` does not exist, or manifest errors.
pub(crate) fn register(
    session: &Session<'_>,
    file: &Path,
    name: Option<&str>,
    kind: ProgramKind,
) -> Result<String, CpuError> {
    let problem = session.problem()?;
    let path = problem.root().join(file);
    std::fs::metadata(&path).map_err(|e| CpuError::io("cannot find", &path, e))?;

    let name = match name {
        Some(name) => name.to_owned(),
        None => file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
    };
    problem.modify(|m| {
        section(m, kind).insert(name.clone(), Executable::new(kind, &name, file));
        Ok(())
    })?;
    Ok(name)
}

/// Run `cpu add-generator`.
///
/// # Errors
///
/// Returns `CpuError::Io` if the file does not exist, or manifest errors.
pub fn add_generator(args: &AddProgramArgs, session: &Session<'_>) -> Result<(), CpuError> {
    let name = register(
        session,
        &args.file,
        args.name.as_deref(),
        ProgramKind::Executable,
    )?;
    let message = format!("Generator {name} added!");
    write_action(&ActionOutput::new("generator_added", name, message), session.out);
    Ok(())
}

/// Run `cpu add-checker`.
///
/// # Errors
///
/// Returns `CpuError::Io` if the file does not exist, or manifest errors.
pub fn add_checker(args: &AddProgramArgs, session: &Session<'_>) -> Result<(), CpuError> {
    let name = register(session, &args.file, args.name.as_deref(), ProgramKind::Checker)?;
    let message = format!("Checker {name} added!");
    write_action(&ActionOutput::new("checker_added", name, message), session.out);
    Ok(())
}

/// Run `cpu set-checker`. Shared checkers may be chosen too.
///
/// # Errors
///
/// Returns `CpuError::UnknownProgram` if no such checker is registered.
pub fn set_checker(args: &NameArgs, session: &Session<'_>) -> Result<(), CpuError> {
    let problem = session.problem()?;
    let merged = problem.load_merged(&session.config_dir)?;
    lookup::require(&merged.checkers, &args.name, "checker")?;
    problem.modify(|m| {
        m.default_checker = Some(args.name.clone());
        Ok(())
    })?;
    let message = format!("Default checker set to {}", args.name);
    write_action(
        &ActionOutput::new("checker_set", &args.name, message),
        session.out,
    );
    Ok(())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::commands::testing::Fixture;

    #[test]
    fn test_register_defaults_to_file_stem() {
        let fx = Fixture::new();
        let file = fx.script("gen_big.sh", "echo 1\n");
        let args = AddProgramArgs { file, name: None };
        add_generator(&args, &fx.session()).unwrap();

        let m = fx.session().problem().unwrap().load().unwrap();
        let generator = &m.generators["gen_big"];
        assert_eq!(generator.kind, ProgramKind::Executable);
        assert_eq!(generator.src, Path::new("gen_big.sh"));
        assert!(generator.exec_loc.is_none());
    }

    #[test]
    fn test_register_missing_file() {
        let fx = Fixture::new();
        let args = AddProgramArgs {
            file: "absent.sh".into(),
            name: None,
        };
        assert!(matches!(
            add_checker(&args, &fx.session()),
            Err(CpuError::Io { .. })
        ));
    }

    #[test]
    fn test_set_checker() {
        let fx = Fixture::new();
        let file = fx.script("exact.sh", "echo 1\n");
        let args = AddProgramArgs {
            file,
            name: Some("diff".to_owned()),
        };
        add_checker(&args, &fx.session()).unwrap();

        set_checker(&NameArgs { name: "diff".to_owned() }, &fx.session()).unwrap();
        let m = fx.session().problem().unwrap().load().unwrap();
        assert_eq!(m.default_checker.as_deref(), Some("diff"));
        assert_eq!(m.checkers["diff"].kind, ProgramKind::Checker);

        let err = set_checker(&NameArgs { name: "dif".to_owned() }, &fx.session()).unwrap_err();
        assert!(matches!(err, CpuError::UnknownProgram { kind: "checker", .. }));
    }
}
