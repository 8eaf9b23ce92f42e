/// Output formatting: JSON documents, terminal text and test preview tables.
use std::io::{IsTerminal, Write};

use comfy_table::{Cell, Table, presets::UTF8_BORDERS_ONLY};
use serde::Serialize;

use super::args::OutputFormat;
use crate::exec::verdict_string;
use crate::types::{
    ActionOutput, ErrorOutput, JudgeReport, RunReport, StressReport, TestListing, TestReport,
    TestStatus,
};

/// Resolve the effective output format, handling `--json` flag and TTY auto-detection.
#[must_use]
pub fn resolve_format(fmt: OutputFormat, json_flag: bool) -> OutputFormat {
    if json_flag {
        return OutputFormat::Json;
    }
    if fmt == OutputFormat::Auto {
        if std::io::stdout().is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        fmt
    }
}

/// Output context passed to all formatters.
pub struct OutputCtx {
    pub format: OutputFormat,
    pub no_header: bool,
}

impl OutputCtx {
    /// Construct from CLI args.
    #[must_use]
    pub fn new(fmt: OutputFormat, json_flag: bool, no_header: bool) -> Self {
        Self {
            format: resolve_format(fmt, json_flag),
            no_header,
        }
    }

    #[must_use]
    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Progress line for the terminal. Suppressed in JSON mode.
    pub fn note(&self, message: impl std::fmt::Display) {
        if !self.is_json() {
            println!("{message}");
        }
    }
}

// --- Actions ---

/// Write the result of a workspace-changing command.
pub fn write_action(output: &ActionOutput, ctx: &OutputCtx) {
    if ctx.is_json() {
        print_json(output);
    } else {
        println!("{}", output.message);
    }
}

/// Write several action results as one document.
pub fn write_actions(outputs: &[ActionOutput], ctx: &OutputCtx) {
    if ctx.is_json() {
        print_json(outputs);
    } else {
        for output in outputs {
            println!("{}", output.message);
        }
    }
}

// --- run-solution ---

/// Write the result of `run-solution`.
pub fn write_run(report: &RunReport, silent: bool, ctx: &OutputCtx) {
    if ctx.is_json() {
        print_json(report);
        return;
    }
    if let Some(output) = &report.output {
        print!("{output}");
        if !output.is_empty() && !output.ends_with('\n') {
            println!();
        }
    }
    if let Some(data) = &report.data {
        println!("> Solution also gave the following data:");
        println!("{}", data.trim_end());
    }
    if !silent {
        println!("Solution executed in {:.3} seconds", report.elapsed_secs);
    }
}

// --- Tests ---

/// Write `list-tests` results.
pub fn write_test_listings(listings: &[TestListing], side_by_side: bool, ctx: &OutputCtx) {
    if ctx.is_json() {
        print_json(listings);
        return;
    }
    for listing in listings {
        match (&listing.input, &listing.output) {
            (Some(input), Some(output)) => {
                println!("{}", test_table(&listing.summary, input, output, side_by_side, ctx));
            }
            _ => println!("{}", listing.summary),
        }
    }
}

/// Print a test preview ahead of judging it. Nothing in JSON mode.
pub fn write_test_preview(
    summary: &str,
    input: &str,
    output: &str,
    side_by_side: bool,
    ctx: &OutputCtx,
) {
    if !ctx.is_json() {
        println!("{}", test_table(summary, input, output, side_by_side, ctx));
    }
}

/// Preview of a test's input and expected output, titled by its summary line.
#[must_use]
pub fn test_table(
    summary: &str,
    input: &str,
    output: &str,
    side_by_side: bool,
    ctx: &OutputCtx,
) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    if side_by_side {
        if !ctx.no_header {
            table.set_header([Cell::new(summary), Cell::new("")]);
        }
        table.add_row(["Input", "Output"]);
        table.add_row([input, output]);
    } else {
        if !ctx.no_header {
            table.set_header([summary]);
        }
        table.add_row(["Input"]);
        table.add_row([input]);
        table.add_row(["Output"]);
        table.add_row([output]);
    }
    table
}

// --- test-solution ---

/// Write one judged test as it completes. JSON mode reports everything at the end.
pub fn write_test_report(report: &TestReport, ctx: &OutputCtx) {
    if ctx.is_json() {
        return;
    }
    if let Some(secs) = report.elapsed_secs {
        println!("Solution executed in {secs:.3} seconds");
    }
    match report.status {
        TestStatus::NoOutput => println!("!!! Test has no output to check, skipping"),
        TestStatus::Tle => println!("Solution exceeded time limit. Skipping."),
        TestStatus::Rte => {
            println!(
                "Runtime error: {}",
                report.remarks.as_deref().unwrap_or_default()
            );
            println!("Skipping.");
        }
        TestStatus::Checked => {
            if let Some(preview) = &report.output_preview {
                println!("Output:");
                println!("{preview}");
            }
            if let Some(remarks) = &report.remarks {
                println!("Checker notes: {}", remarks.trim_end());
            }
            if let Some(score) = report.score {
                println!("Checker verdict: {}", verdict_string(score));
            }
        }
    }
    println!();
}

/// Write the final `test-solution` result.
pub fn write_judge(report: &JudgeReport, ctx: &OutputCtx) {
    if ctx.is_json() {
        print_json(report);
        return;
    }
    println!("Minimum score received: {}", report.verdict);
    if !report.errors.is_empty() {
        println!(
            "Additionally, it received the following errors: {}",
            report.errors.join(" ")
        );
    }
}

// --- stress-test ---

/// Write the final `stress-test` result.
pub fn write_stress(report: &StressReport, ctx: &OutputCtx) {
    if ctx.is_json() {
        print_json(report);
        return;
    }
    match &report.failing_test {
        Some(test) => println!("Solution {} breaks under test {test}", report.solution),
        None => println!("Failed to break solution {}", report.solution),
    }
}

// --- Error output ---

/// Write a structured error to stderr.
pub fn write_error(err: &ErrorOutput, format: OutputFormat, json_flag: bool) {
    let fmt = resolve_format(format, json_flag);
    let stderr = std::io::stderr();
    let mut out = stderr.lock();
    match fmt {
        OutputFormat::Json => {
            let s = serde_json::to_string_pretty(err).unwrap_or_default();
            let _ = writeln!(out, "{s}");
        }
        OutputFormat::Table | OutputFormat::Auto => {
            let _ = writeln!(out, "Error: {}", err.error.message);
            if let Some(candidates) = &err.error.candidates {
                let _ = writeln!(out, "  Did you mean:");
                for c in candidates {
                    let _ = writeln!(out, "    {c}");
                }
            }
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("JSON serialization error: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(no_header: bool) -> OutputCtx {
        OutputCtx::new(OutputFormat::Table, false, no_header)
    }

    #[test]
    fn test_json_flag_wins() {
        assert_eq!(resolve_format(OutputFormat::Table, true), OutputFormat::Json);
        assert_eq!(resolve_format(OutputFormat::Table, false), OutputFormat::Table);
    }

    #[test]
    fn test_side_by_side_table() {
        let rendered = test_table("Test 1 [4 B | 2 B]", "1 2", "3", true, &ctx(false)).to_string();
        assert!(rendered.contains("Test 1 [4 B | 2 B]"));
        let row = rendered
            .lines()
            .find(|line| line.contains("1 2"))
            .unwrap();
        assert!(row.contains('3'));
    }

    #[test]
    fn test_stacked_table() {
        let rendered =
            test_table("Test 1 [4 B | None]", "1 2", "[None]", false, &ctx(false)).to_string();
        let input_line = rendered.lines().position(|l| l.contains("1 2")).unwrap();
        let output_line = rendered.lines().position(|l| l.contains("[None]")).unwrap();
        assert!(input_line < output_line);
    }

    #[test]
    fn test_no_header_drops_summary() {
        let rendered = test_table("Test 9 [1 B | 1 B]", "a", "b", false, &ctx(true)).to_string();
        assert!(!rendered.contains("Test 9"));
    }
}
