//! The default command: refactor files or stdin.

use super::utils::banner;
use crate::error::{NonTerminationError, RefactorError};
use crate::output::{
    print_check_summary, print_error, print_file_header, print_pending, print_warning,
    print_write_summary,
};
use crate::session::{AppliedChange, PendingMatch, Session};
use crate::utils::normalize_display_path;

use anyhow::Result;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Where one unit of source text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A file on disk.
    File(PathBuf),
    /// Text that is already in memory, such as stdin.
    Text {
        /// Name used in reports.
        name: String,
        /// The source text.
        source: String,
    },
}

impl Input {
    fn display_name(&self) -> String {
        match self {
            Self::File(path) => normalize_display_path(path),
            Self::Text { name, .. } => name.clone(),
        }
    }
}

/// What to do with the rewritten text.
#[derive(Debug, Default, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct RefactorOptions {
    /// Write changed files in place.
    pub write: bool,
    /// Report pending rewrites instead of output.
    pub check: bool,
    /// Emit a JSON report.
    pub json: bool,
    /// Prepend the active-rules banner to text output.
    pub banner: bool,
}

/// Result status of one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// The final text equals the input.
    Unchanged,
    /// The final text differs from the input.
    Changed,
    /// Reading, parsing, rendering or writing failed.
    Failed,
}

/// Why an input failed.
#[derive(Debug, Clone, Serialize)]
pub struct FileError {
    /// `io`, `parse` or `unparse`.
    pub kind: &'static str,
    /// Human-readable message.
    pub message: String,
    /// 1-based line, for parse errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// 1-based column, for parse errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
}

impl FileError {
    fn io(error: &std::io::Error) -> Self {
        Self {
            kind: "io",
            message: error.to_string(),
            line: None,
            column: None,
        }
    }
}

impl From<RefactorError> for FileError {
    fn from(error: RefactorError) -> Self {
        match error {
            RefactorError::Parse(parse) => Self {
                kind: "parse",
                line: Some(parse.line),
                column: Some(parse.column),
                message: parse.message,
            },
            unparse @ RefactorError::Unparse { .. } => Self {
                kind: "unparse",
                message: unparse.to_string(),
                line: None,
                column: None,
            },
        }
    }
}

/// Outcome for one input.
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// Display name of the input.
    pub path: String,
    /// Overall status.
    pub status: FileStatus,
    /// Rewritten text, when it goes to stdout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Whether the file on disk was rewritten.
    pub written: bool,
    /// Rewrites applied.
    pub iterations: usize,
    /// Every rewrite, in order.
    pub applied: Vec<AppliedChange>,
    /// Matches in the input, for `--check`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pending: Vec<PendingMatch>,
    /// Set when the session stopped before a fixed point.
    pub non_termination: Option<NonTerminationError>,
    /// Set when the input failed.
    pub error: Option<FileError>,
}

impl FileReport {
    fn failed(path: String, error: FileError) -> Self {
        Self {
            path,
            status: FileStatus::Failed,
            output: None,
            written: false,
            iterations: 0,
            applied: Vec::new(),
            pending: Vec::new(),
            non_termination: None,
            error: Some(error),
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RefactorReport {
    /// Active rules, in order.
    pub rules: Vec<&'static str>,
    /// Rule-selection advisories.
    pub advisories: Vec<String>,
    /// One report per input, in input order.
    pub files: Vec<FileReport>,
}

impl RefactorReport {
    /// 1 if any input failed, or if `check` is set and any input would change.
    #[must_use]
    pub fn exit_code(&self, check: bool) -> i32 {
        let failed = self.files.iter().any(|f| f.status == FileStatus::Failed);
        let changed = self.files.iter().any(|f| f.status == FileStatus::Changed);
        i32::from(failed || (check && changed))
    }
}

fn process(session: &Session, input: &Input, options: &RefactorOptions) -> FileReport {
    let path = input.display_name();
    let source = match input {
        Input::File(file) => match fs::read_to_string(file) {
            Ok(source) => source,
            Err(error) => return FileReport::failed(path, FileError::io(&error)),
        },
        Input::Text { source, .. } => source.clone(),
    };

    tracing::debug!(path = %path, "refactoring");
    let outcome = match session.run(&source) {
        Ok(outcome) => outcome,
        Err(error) => return FileReport::failed(path, error.into()),
    };
    let status = if outcome.source == source {
        FileStatus::Unchanged
    } else {
        FileStatus::Changed
    };

    let pending = if options.check && status == FileStatus::Changed {
        session.pending(&source).unwrap_or_default()
    } else {
        Vec::new()
    };

    let mut written = false;
    if let (true, Input::File(file)) = (options.write, input) {
        if status == FileStatus::Changed {
            if let Err(error) = fs::write(file, &outcome.source) {
                return FileReport::failed(path, FileError::io(&error));
            }
            written = true;
        }
    }
    let to_stdout = !options.check && !(options.write && matches!(input, Input::File(_)));

    FileReport {
        path,
        status,
        output: to_stdout.then_some(outcome.source),
        written,
        iterations: outcome.iterations,
        applied: outcome.applied,
        pending,
        non_termination: outcome.non_termination,
        error: None,
    }
}

/// Runs `session` over every input in parallel and prints the results in
/// input order.
///
/// # Errors
///
/// Returns an error if writing to `writer` or JSON serialization fails.
/// Per-input failures are reported, not returned.
pub fn run_refactor<W: Write>(
    session: &Session,
    inputs: &[Input],
    options: &RefactorOptions,
    advisories: Vec<String>,
    writer: &mut W,
) -> Result<i32> {
    let files: Vec<FileReport> = inputs
        .par_iter()
        .map(|input| process(session, input, options))
        .collect();
    let report = RefactorReport {
        rules: session.rules().iter().map(|rule| rule.name()).collect(),
        advisories,
        files,
    };

    for file in &report.files {
        if let Some(error) = &file.error {
            print_error(&file.path, &error.message);
        }
        if let Some(stopped) = &file.non_termination {
            print_warning(&format!("{}: {stopped}", file.path));
        }
    }

    if options.json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(report.exit_code(options.check));
    }

    if options.check {
        let mut changed = 0;
        for file in &report.files {
            if file.status == FileStatus::Changed {
                changed += 1;
                print_pending(writer, &file.path, &file.pending)?;
            }
        }
        print_check_summary(writer, changed, report.files.len())?;
        return Ok(report.exit_code(true));
    }

    let header = (options.banner && !report.rules.is_empty()).then(|| banner(&report.rules));
    let multiple = report.files.len() > 1;
    for file in &report.files {
        if options.write && file.output.is_none() && file.error.is_none() {
            let rewrites = file.written.then_some(file.iterations);
            print_write_summary(writer, &file.path, rewrites)?;
            continue;
        }
        let Some(output) = &file.output else {
            continue;
        };
        if multiple {
            print_file_header(writer, &file.path)?;
        }
        if let Some(header) = &header {
            write!(writer, "{header}")?;
        }
        write!(writer, "{output}")?;
        if multiple && !output.ends_with('\n') {
            writeln!(writer)?;
        }
    }
    writer.flush()?;
    Ok(report.exit_code(false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::registry::get_builtin_rules;

    fn text(source: &str) -> Input {
        Input::Text {
            name: "<stdin>".to_owned(),
            source: source.to_owned(),
        }
    }

    fn run(inputs: &[Input], options: &RefactorOptions) -> (i32, String) {
        colored::control::set_override(false);
        let session = Session::new(get_builtin_rules());
        let mut buffer = Vec::new();
        let code = run_refactor(&session, inputs, options, Vec::new(), &mut buffer).unwrap();
        (code, String::from_utf8(buffer).unwrap())
    }

    #[test]
    fn test_stdout_output() {
        let (code, out) = run(&[text("x = 1 + 2\n")], &RefactorOptions::default());
        assert_eq!(code, 0);
        assert_eq!(out, "x = 3\n");
    }

    #[test]
    fn test_banner() {
        let options = RefactorOptions {
            banner: true,
            ..RefactorOptions::default()
        };
        let (_, out) = run(&[text("pass\n")], &options);
        assert_eq!(
            out,
            "# Active rules: PropagateConstants, FoldConstants, RemoveRedundantPass\n\n\npass\n"
        );
    }

    #[test]
    fn test_check_exit_code() {
        let options = RefactorOptions {
            check: true,
            ..RefactorOptions::default()
        };
        let (code, out) = run(&[text("x = 1 + 2\n")], &options);
        assert_eq!(code, 1);
        assert!(out.contains("<stdin>:1:5: FoldConstants (replace) 1 + 2"));

        let (code, _) = run(&[text("x = 3\n")], &options);
        assert_eq!(code, 0);
    }

    #[test]
    fn test_parse_error_fails() {
        let (code, out) = run(&[text("def (:\n"), text("y = 2 - 1\n")], &RefactorOptions::default());
        assert_eq!(code, 1);
        assert!(out.contains("y = 1\n"));
    }

    #[test]
    fn test_write_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("mod.py");
        fs::write(&file, "def f():\n    pass\n    return 1 - 1\n").unwrap();
        let options = RefactorOptions {
            write: true,
            ..RefactorOptions::default()
        };
        let (code, out) = run(&[Input::File(file.clone())], &options);
        assert_eq!(code, 0);
        assert!(out.contains("Rewrote"));
        assert_eq!(fs::read_to_string(&file).unwrap(), "def f():\n    return 0\n");
    }

    #[test]
    fn test_exit_code_rules() {
        let report = |status| RefactorReport {
            rules: Vec::new(),
            advisories: Vec::new(),
            files: vec![FileReport {
                status,
                ..FileReport::failed("a.py".to_owned(), FileError::io(&std::io::Error::other("x")))
            }],
        };
        assert_eq!(report(FileStatus::Failed).exit_code(false), 1);
        assert_eq!(report(FileStatus::Changed).exit_code(false), 0);
        assert_eq!(report(FileStatus::Changed).exit_code(true), 1);
        assert_eq!(report(FileStatus::Unchanged).exit_code(true), 0);
    }
}
