use clap::{Args, Parser};
use std::path::PathBuf;

/// Help text for configuration file options, shown at the bottom of --help.
const CONFIG_HELP: &str = "\
CONFIGURATION FILE (.pyrefactor.toml, or [tool.pyrefactor] in pyproject.toml):

  [pyrefactor]
  rules = [\"PropagateConstants\", \"FoldConstants\"]  # Default: every built-in rule
  max_iterations = 200       # Fixed iteration cap
  min_iterations = 64        # Lower bound of the automatic cap
  iterations_per_node = 4    # Automatic cap per syntax node
  banner = false             # Prepend '# Active rules: ...'
  exclude_folders = [\"build\", \"dist\", \".venv\"]

ENVIRONMENT:
  PYREFACTOR_LOG             Log filter (falls back to RUST_LOG), e.g. pyrefactor=debug
";

/// Options for what happens with the rewritten text.
#[derive(Args, Debug, Default, Clone)]
#[allow(clippy::struct_excessive_bools)] // CLI flags are legitimately booleans
pub struct OutputOptions {
    /// Write the rewritten text back to each file.
    #[arg(short, long, conflicts_with = "check")]
    pub write: bool,

    /// List pending rewrites without applying them; exit 1 if any file would change.
    #[arg(long)]
    pub check: bool,

    /// Output a JSON report instead of text.
    #[arg(long)]
    pub json: bool,

    /// Prepend a comment naming the active rules.
    #[arg(long)]
    pub banner: bool,

    /// Enable debug logging on stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Command line interface configuration using `clap`.
/// This struct defines the arguments and flags accepted by the program.
#[derive(Parser, Debug)]
#[command(
    name = "pyrefactor",
    version,
    about = "pyrefactor - Rule-based, source-preserving refactoring for Python",
    long_about = None,
    after_help = CONFIG_HELP
)]
pub struct Cli {
    /// Files or directories to refactor. No paths, or `-`, reads stdin.
    pub paths: Vec<PathBuf>,

    /// Rule to run (repeatable, in order). Defaults to the config, then to every built-in rule.
    #[arg(short, long = "rule", value_name = "NAME")]
    pub rules: Vec<String>,

    /// Print the built-in rules and exit.
    #[arg(long)]
    pub list_rules: bool,

    /// Fixed iteration cap per file.
    #[arg(long, value_name = "N")]
    pub max_iterations: Option<usize>,

    /// Folders to skip when walking directories.
    #[arg(short, long, alias = "exclude-folder", value_name = "DIR")]
    pub exclude: Vec<String>,

    /// Output options.
    #[command(flatten)]
    pub output: OutputOptions,
}

impl Cli {
    /// Whether input comes from stdin.
    #[must_use]
    pub fn reads_stdin(&self) -> bool {
        self.paths.is_empty() || self.paths.iter().all(|path| path.as_os_str() == "-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["pyrefactor"]).unwrap();
        assert!(cli.reads_stdin());
        assert!(cli.rules.is_empty());
        assert!(!cli.output.write);
    }

    #[test]
    fn test_repeated_rules_keep_order() {
        let cli = Cli::try_parse_from([
            "pyrefactor",
            "-r",
            "fold-constants",
            "--rule",
            "remove-redundant-pass",
            "src",
        ])
        .unwrap();
        assert_eq!(cli.rules, vec!["fold-constants", "remove-redundant-pass"]);
        assert_eq!(cli.paths, vec![PathBuf::from("src")]);
        assert!(!cli.reads_stdin());
    }

    #[test]
    fn test_write_conflicts_with_check() {
        assert!(Cli::try_parse_from(["pyrefactor", "--write", "--check", "a.py"]).is_err());
    }

    #[test]
    fn test_dash_reads_stdin() {
        let cli = Cli::try_parse_from(["pyrefactor", "-", "--max-iterations", "5"]).unwrap();
        assert!(cli.reads_stdin());
        assert_eq!(cli.max_iterations, Some(5));
    }
}
