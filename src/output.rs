//! CLI output formatting for script runs, the shell, and `check`.
//!
//! The interpreter never prints. It hands back [`Outcome`]s, [`LineEvent`]s
//! and [`ScriptReport`]s, and this module turns them into lines of text.
//!
//! # Output Format
//!
//! ## Run
//!
//! ```text
//! edit.txt:001 stored photo
//! edit.txt:002 stored r, g, b
//! edit.txt:004 error: brighten ten photo b
//!     Invalid argument: brighten: amount 'ten' is not a valid number
//! edit.txt:005 saved photo → out.png
//!
//! edit.txt: 4 commands, 1 failure
//! ```
//!
//! ## Check
//!
//! ```text
//! edit.txt: 5 commands OK
//! other.txt: 2 commands, 1 failure
//!     line 3: what
//!         Unsupported command: unknown command 'what'
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure and do no I/O.

use crate::interpreter::{LineEvent, LineFailure, Outcome, ScriptReport};

/// Format a 1-based line number as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// One-line summary of what a command did.
pub fn format_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Stored(names) => format!("stored {}", names.join(", ")),
        Outcome::Saved { name, path } => format!("saved {name} → {}", path.display()),
        Outcome::Removed(name) => format!("removed {name}"),
        Outcome::Info(info) => format!(
            "{} {}x{} max {}",
            info.name, info.width, info.height, info.max_value
        ),
        Outcome::Listed(names) if names.is_empty() => "no images".to_string(),
        Outcome::Listed(names) => {
            format!("{}: {}", plural(names.len(), "image"), names.join(", "))
        }
        Outcome::Ran(report) => format!("ran {}", summary(report)),
        Outcome::Quit => "quit".to_string(),
    }
}

/// A failing line: the offending text, then the error indented below it.
pub fn format_failure(failure: &LineFailure) -> Vec<String> {
    vec![
        format!(
            "{}:{} error: {}",
            failure.origin,
            format_index(failure.line),
            failure.text
        ),
        format!("{}{}", indent(1), failure.message),
    ]
}

pub fn format_event(event: &LineEvent<'_>) -> Vec<String> {
    match event {
        LineEvent::Completed {
            origin,
            line,
            outcome,
        } => vec![format!(
            "{origin}:{} {}",
            format_index(*line),
            format_outcome(outcome)
        )],
        LineEvent::Failed(failure) => format_failure(failure),
    }
}

fn summary(report: &ScriptReport) -> String {
    let mut text = format!(
        "{}: {}, {}",
        report.origin,
        plural(report.executed, "command"),
        plural(report.failures.len(), "failure")
    );
    if report.aborted {
        text.push_str(" (aborted)");
    } else if report.quit {
        text.push_str(" (quit)");
    }
    text
}

/// Closing summary of a script run.
pub fn format_report(report: &ScriptReport) -> Vec<String> {
    vec![summary(report)]
}

/// Result of `check`: OK, or every line that failed to parse.
pub fn format_check(report: &ScriptReport) -> Vec<String> {
    if report.succeeded() {
        return vec![format!(
            "{}: {} OK",
            report.origin,
            plural(report.executed, "command")
        )];
    }
    let mut lines = vec![summary(report)];
    for failure in &report.failures {
        lines.push(format!("{}line {}: {}", indent(1), failure.line, failure.text));
        lines.push(format!("{}{}", indent(2), failure.message));
    }
    lines
}

pub fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{line}");
    }
}

pub fn print_event(event: &LineEvent<'_>) {
    print_lines(&format_event(event));
}

pub fn print_check(report: &ScriptReport) {
    print_lines(&format_check(report));
}
