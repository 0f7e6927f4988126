use regex::Regex;
use rustc_hash::FxHashSet;
use std::sync::OnceLock;

/// Name of the dedicated configuration file.
pub const CONFIG_FILENAME: &str = ".pyrefactor.toml";

/// Name of the project file that may carry a `[tool.pyrefactor]` table.
pub const PYPROJECT_FILENAME: &str = "pyproject.toml";

/// Environment variable holding the log filter.
pub const LOG_ENV_VAR: &str = "PYREFACTOR_LOG";

/// Lower bound of the automatic iteration cap.
pub const DEFAULT_MIN_ITERATIONS: usize = 64;

/// Iterations granted per syntax node by the automatic iteration cap.
pub const DEFAULT_ITERATIONS_PER_NODE: usize = 4;

/// First line of the banner prepended by `--banner`.
pub const BANNER_PREFIX: &str = "# Active rules: ";

/// Advisory shown when rule selection comes up empty.
pub const NO_RULES_ADVISORY: &str = "# No rules found.";

/// Regex for a Python identifier: a letter or underscore, then word characters.
///
/// # Panics
///
/// Panics if the regex pattern is invalid.
pub fn get_identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::expect_used)]
    RE.get_or_init(|| Regex::new(r"^[^\d\W]\w*$").expect("Invalid identifier regex pattern"))
}

/// Hard keywords, which can never be used as names.
pub fn get_python_keywords() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        [
            "False", "None", "True", "and", "as", "assert", "async", "await", "break",
            "class", "continue", "def", "del", "elif", "else", "except", "finally", "for",
            "from", "global", "if", "import", "in", "is", "lambda", "nonlocal", "not", "or",
            "pass", "raise", "return", "try", "while", "with", "yield",
        ]
        .into_iter()
        .collect()
    })
}

/// Set of folders to exclude by default.
pub fn get_default_exclude_folders() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        let mut s = FxHashSet::default();
        s.insert("__pycache__");
        s.insert(".git");
        s.insert(".pytest_cache");
        s.insert(".mypy_cache");
        s.insert(".tox");
        s.insert("build");
        s.insert("dist");
        s.insert("venv");
        s.insert(".venv");
        s
    })
}
