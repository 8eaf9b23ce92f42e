/// Command-line surface: clap definitions and terminal/JSON rendering.
pub mod args;
pub mod output;

pub use args::{Cli, OutputFormat};
pub use output::{OutputCtx, write_error};
