/// Execution core: command templates, child processes, executables, and
/// parsing of solution and checker output.
pub mod checker;
pub mod commands;
pub mod errors;
pub mod executable;
pub mod parser;
pub mod process;
pub mod solution;
pub mod template;

pub use checker::{CheckerInputs, VerdictLabel, verdict_string};
pub use commands::CommandTable;
pub use errors::CpuError;
pub use executable::{Executable, ProgramKind, RunOptions};
pub use process::{StdinSource, StdoutSink};
