use crate::cli::Cli;
use crate::commands::{find_python_files, run_list_rules, run_refactor, Input, RefactorOptions};
use crate::config::Config;
use crate::constants::NO_RULES_ADVISORY;
use crate::error::RuleLoadError;
use crate::output::print_warning;
use crate::rules::registry::select_rules;
use crate::session::Session;
use crate::tracing_config::init_tracing;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Name reported for text read from stdin.
const STDIN_NAME: &str = "<stdin>";

/// Runs pyrefactor with the given arguments.
///
/// # Errors
///
/// Returns an error if argument parsing fails, or if the command execution fails.
pub fn run_with_args(args: Vec<String>) -> Result<i32> {
    run_with_args_to(args, &mut std::io::stdout())
}

/// Run pyrefactor with the given arguments, writing output to the specified writer.
///
/// This is the testable version of `run_with_args` that allows output capture.
///
/// # Errors
///
/// Returns an error if argument parsing fails, or if the command execution fails.
pub fn run_with_args_to<W: Write>(args: Vec<String>, writer: &mut W) -> Result<i32> {
    run_with_input_to(args, std::io::stdin(), writer)
}

/// Like [`run_with_args_to`], reading stdin input from `stdin`.
///
/// # Errors
///
/// Returns an error if reading `stdin`, writing output, or serialization fails.
pub fn run_with_input_to<R: Read, W: Write>(
    args: Vec<String>,
    mut stdin: R,
    writer: &mut W,
) -> Result<i32> {
    let mut program_args = vec!["pyrefactor".to_owned()];
    program_args.extend(args);
    let cli_var = match Cli::try_parse_from(program_args) {
        Ok(c) => c,
        Err(e) => match e.kind() {
            clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                write!(writer, "{e}")?;
                writer.flush()?;
                return Ok(0);
            }
            _ => {
                eprint!("{e}");
                return Ok(1);
            }
        },
    };

    init_tracing(cli_var.output.verbose);

    if cli_var.list_rules {
        return run_list_rules(cli_var.output.json, writer);
    }

    // Load config from the first path or current directory
    let config_path = cli_var
        .paths
        .iter()
        .find(|path| path.as_os_str() != "-")
        .map_or(Path::new("."), PathBuf::as_path);
    let config = Config::load_from_path(config_path).pyrefactor;
    tracing::debug!(?config, "loaded configuration");

    let requested = if cli_var.rules.is_empty() {
        config.rules.clone()
    } else {
        Some(cli_var.rules.clone())
    };
    let selection = select_rules(requested.as_deref());
    let mut advisories = Vec::new();
    for error in &selection.errors {
        match error {
            RuleLoadError::UnknownRule(_) => print_warning(&error.to_string()),
            RuleLoadError::NoRules => {
                eprintln!("{NO_RULES_ADVISORY}");
                eprintln!("# Consider selecting some rules; `pyrefactor --list-rules` shows them.");
            }
        }
        advisories.push(error.to_string());
    }

    let mut session_config = config.session_config();
    if cli_var.max_iterations.is_some() {
        session_config.max_iterations = cli_var.max_iterations;
    }
    let session = Session::new(selection.rules).with_config(session_config);

    let inputs = if cli_var.reads_stdin() {
        let mut source = String::new();
        stdin
            .read_to_string(&mut source)
            .context("failed to read stdin")?;
        vec![Input::Text {
            name: STDIN_NAME.to_owned(),
            source,
        }]
    } else {
        let mut exclude = config.exclude_folders.unwrap_or_default();
        exclude.extend(cli_var.exclude.iter().cloned());
        let mut missing = false;
        let roots: Vec<PathBuf> = cli_var
            .paths
            .iter()
            .filter(|path| path.as_os_str() != "-")
            .filter(|path| {
                let exists = path.exists();
                if !exists {
                    eprintln!(
                        "Error: The file or directory '{}' does not exist.",
                        path.display()
                    );
                    missing = true;
                }
                exists
            })
            .cloned()
            .collect();
        if missing {
            return Ok(1);
        }
        find_python_files(&roots, &exclude)
            .into_iter()
            .map(Input::File)
            .collect()
    };
    tracing::debug!(inputs = inputs.len(), "starting run");

    let options = RefactorOptions {
        write: cli_var.output.write,
        check: cli_var.output.check,
        json: cli_var.output.json,
        banner: cli_var.output.banner || config.banner.unwrap_or(false),
    };
    run_refactor(&session, &inputs, &options, advisories, writer)
}
