/// The per-extension table of compile and run command templates.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::errors::CpuError;

/// Compile command key used when the user does not pick one.
pub const DEFAULT_COMPILE_KEY: &str = "__default__";

/// A compile command: the argv to execute and where it leaves its artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileCommand {
    /// Argv template, e.g. `["g++", "-O2", "{file}", "-o", "{name}"]`.
    pub command: Vec<String>,
    /// Artifact path template, relative to the output directory.
    pub artifact: String,
}

/// Commands for one source extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageCommands {
    /// Compile commands by key; [`DEFAULT_COMPILE_KEY`] is the default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile: Option<BTreeMap<String, CompileCommand>>,
    /// Argv template used to run the compiled artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<Vec<String>>,
}

/// Extension (without the dot) to commands.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandTable(pub BTreeMap<String, LanguageCommands>);

impl CommandTable {
    /// Look up the compile command for `ext`, using `key` or the default key.
    ///
    /// # Errors
    ///
    /// - `CpuError::UnknownExtension` — no compile commands for `ext`
    /// - `CpuError::UnknownCompileCommand` — `key` is not configured
    pub fn compile_command(
        &self,
        src: &str,
        ext: &str,
        key: Option<&str>,
    ) -> Result<&CompileCommand, CpuError> {
        let commands = self
            .0
            .get(ext)
            .and_then(|c| c.compile.as_ref())
            .ok_or_else(|| CpuError::UnknownExtension {
                action: "compile",
                src: src.to_owned(),
                ext: ext.to_owned(),
            })?;
        let key = key.unwrap_or(DEFAULT_COMPILE_KEY);
        commands
            .get(key)
            .ok_or_else(|| CpuError::UnknownCompileCommand {
                key: key.to_owned(),
                ext: ext.to_owned(),
            })
    }

    /// Look up the run command template for `ext`.
    ///
    /// # Errors
    ///
    /// Returns `CpuError::UnknownExtension` if no run command is configured.
    pub fn run_command(&self, src: &str, ext: &str) -> Result<&[String], CpuError> {
        self.0
            .get(ext)
            .and_then(|c| c.run.as_deref())
            .ok_or_else(|| CpuError::UnknownExtension {
                action: "run",
                src: src.to_owned(),
                ext: ext.to_owned(),
            })
    }
}
