use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{CONFIG_FILENAME, PYPROJECT_FILENAME};
use crate::session::SessionConfig;

#[derive(Debug, Deserialize, Default, Clone)]
/// Top-level configuration struct.
pub struct Config {
    #[serde(default)]
    /// The `[pyrefactor]` section.
    pub pyrefactor: PyRefactorConfig,
    /// The file this was loaded from; `None` when using defaults.
    #[serde(skip)]
    pub config_file_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
/// Options shared by every run.
pub struct PyRefactorConfig {
    /// Rules to run, in order. Missing means every built-in rule.
    pub rules: Option<Vec<String>>,
    /// Fixed iteration cap.
    pub max_iterations: Option<usize>,
    /// Lower bound of the automatic iteration cap.
    pub min_iterations: Option<usize>,
    /// Rewrites allowed per syntax node.
    pub iterations_per_node: Option<usize>,
    /// Prepend the active-rules banner to the output.
    pub banner: Option<bool>,
    /// Folders skipped when walking directories.
    pub exclude_folders: Option<Vec<String>>,
}

impl PyRefactorConfig {
    /// Loop limits with unset keys at their defaults.
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        let defaults = SessionConfig::default();
        SessionConfig {
            max_iterations: self.max_iterations,
            min_iterations: self.min_iterations.unwrap_or(defaults.min_iterations),
            iterations_per_node: self
                .iterations_per_node
                .unwrap_or(defaults.iterations_per_node),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
struct PyProject {
    tool: ToolConfig,
}

#[derive(Debug, Deserialize, Clone)]
struct ToolConfig {
    pyrefactor: PyRefactorConfig,
}

impl Config {
    /// Loads configuration from the current directory upward.
    #[must_use]
    pub fn load() -> Self {
        Self::load_from_path(Path::new("."))
    }

    /// Loads configuration starting from a specific path and traversing up.
    ///
    /// In each directory `.pyrefactor.toml` wins over `pyproject.toml`. A
    /// `pyproject.toml` without a `[tool.pyrefactor]` table is skipped. A
    /// malformed file is logged and skipped.
    #[must_use]
    pub fn load_from_path(path: &Path) -> Self {
        let mut current = start_dir(path);

        loop {
            let dedicated = current.join(CONFIG_FILENAME);
            if let Some(content) = read(&dedicated) {
                match toml::from_str::<Config>(&content) {
                    Ok(mut config) => {
                        config.config_file_path = Some(dedicated);
                        return config;
                    }
                    Err(error) => warn_malformed(&dedicated, &error),
                }
            }

            let pyproject = current.join(PYPROJECT_FILENAME);
            if let Some(content) = read(&pyproject) {
                let has_section = toml::from_str::<toml::Value>(&content)
                    .ok()
                    .and_then(|value| value.get("tool")?.get("pyrefactor").cloned())
                    .is_some();
                if has_section {
                    match toml::from_str::<PyProject>(&content) {
                        Ok(project) => {
                            return Config {
                                pyrefactor: project.tool.pyrefactor,
                                config_file_path: Some(pyproject),
                            };
                        }
                        Err(error) => warn_malformed(&pyproject, &error),
                    }
                }
            }

            if !current.pop() {
                break;
            }
        }

        Config::default()
    }
}

/// Absolute directory the upward search starts from. A relative path such as
/// `.` would otherwise stop the search at the current directory.
fn start_dir(path: &Path) -> PathBuf {
    let mut dir = path
        .canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf());
    if dir.is_file() {
        dir.pop();
    }
    dir
}

fn read(path: &Path) -> Option<String> {
    if !path.is_file() {
        return None;
    }
    fs::read_to_string(path).ok()
}

fn warn_malformed(path: &Path, error: &toml::de::Error) {
    tracing::warn!(path = %path.display(), %error, "ignoring malformed configuration");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_path_no_config() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from_path(dir.path());
        assert!(config.pyrefactor.rules.is_none());
        assert_eq!(config.pyrefactor.session_config(), SessionConfig::default());
    }

    #[test]
    fn test_load_from_path_pyrefactor_toml() {
        let dir = TempDir::new().unwrap();
        let mut file = std::fs::File::create(dir.path().join(".pyrefactor.toml")).unwrap();
        writeln!(
            file,
            r#"[pyrefactor]
rules = ["fold-constants"]
max_iterations = 10
banner = true
"#
        )
        .unwrap();

        let config = Config::load_from_path(dir.path());
        assert_eq!(
            config.pyrefactor.rules,
            Some(vec!["fold-constants".to_owned()])
        );
        assert_eq!(config.pyrefactor.banner, Some(true));
        assert_eq!(config.pyrefactor.session_config().max_iterations, Some(10));
        assert!(config.config_file_path.is_some());
    }

    #[test]
    fn test_load_from_path_pyproject_toml() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("pyproject.toml"),
            "[project]\nname = \"demo\"\n\n[tool.pyrefactor]\nmin_iterations = 8\niterations_per_node = 2\n",
        )
        .unwrap();

        let session = Config::load_from_path(dir.path()).pyrefactor.session_config();
        assert_eq!(session.min_iterations, 8);
        assert_eq!(session.iterations_per_node, 2);
        assert_eq!(session.max_iterations, None);
    }

    #[test]
    fn test_pyproject_without_section_keeps_searching() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("pkg");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("pyproject.toml"), "[project]\nname = \"inner\"\n").unwrap();
        std::fs::write(
            dir.path().join(".pyrefactor.toml"),
            "[pyrefactor]\nexclude_folders = [\"gen\"]\n",
        )
        .unwrap();

        let config = Config::load_from_path(&nested);
        assert_eq!(
            config.pyrefactor.exclude_folders,
            Some(vec!["gen".to_owned()])
        );
    }

    #[test]
    fn test_malformed_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(".pyrefactor.toml"),
            "[pyrefactor]\nunknown_key = 1\n",
        )
        .unwrap();
        let config = Config::load_from_path(dir.path());
        assert!(config.config_file_path.is_none());
    }

    #[test]
    fn test_relative_start_is_made_absolute() {
        let cwd = std::env::current_dir().unwrap().canonicalize().unwrap();
        assert_eq!(start_dir(Path::new(".")), cwd);
        assert_eq!(start_dir(Path::new("src/lib.rs")), cwd.join("src"));
        assert!(start_dir(Path::new("src/../src")).ends_with("src"));
    }

    #[test]
    fn test_relative_child_finds_parent_config() {
        let dir = tempfile::tempdir_in(".").unwrap();
        std::fs::write(
            dir.path().join(".pyrefactor.toml"),
            "[pyrefactor]\nmax_iterations = 7\n",
        )
        .unwrap();
        std::fs::create_dir_all(dir.path().join("pkg").join("sub")).unwrap();
        let cwd = std::env::current_dir().unwrap();
        let nested = dir.path().strip_prefix(&cwd).unwrap().join("pkg").join("sub");
        assert!(nested.is_relative());

        let config = Config::load_from_path(&nested.join(".."));
        assert_eq!(config.pyrefactor.max_iterations, Some(7));
    }

    #[test]
    fn test_load_from_file_path() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(".pyrefactor.toml"),
            "[pyrefactor]\nbanner = false\n",
        )
        .unwrap();
        let py_file = dir.path().join("test.py");
        std::fs::write(&py_file, "x = 1").unwrap();

        let config = Config::load_from_path(&py_file);
        assert_eq!(config.pyrefactor.banner, Some(false));
    }
}
