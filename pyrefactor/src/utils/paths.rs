//! Path utilities.
//!
//! Display normalization and Python file discovery with gitignore support.

use crate::constants::get_default_exclude_folders;
use std::path::{Path, PathBuf};

/// Normalizes a path for CLI display.
///
/// - Converts backslashes to forward slashes (for cross-platform consistency)
/// - Strips leading "./" or ".\" prefix (for cleaner output)
///
/// # Examples
/// ```
/// use std::path::Path;
/// use pyrefactor::utils::normalize_display_path;
///
/// assert_eq!(normalize_display_path(Path::new(".\\pkg\\mod.py")), "pkg/mod.py");
/// assert_eq!(normalize_display_path(Path::new("./src/main.py")), "src/main.py");
/// ```
#[must_use]
pub fn normalize_display_path(path: &Path) -> String {
    let s = path.to_string_lossy();
    let clean = s.trim_start_matches(r"\\?\");
    let normalized = clean.replace('\\', "/");
    normalized
        .strip_prefix("./")
        .unwrap_or(&normalized)
        .to_owned()
}

/// Checks if a folder name matches any exclusion pattern.
/// Supports exact matching and wildcard patterns starting with `*.`.
#[must_use]
pub fn is_excluded(name: &str, excludes: &[String]) -> bool {
    excludes.iter().any(|exclude| match exclude.strip_prefix('*') {
        Some(suffix) if suffix.starts_with('.') => name.ends_with(suffix),
        _ => name == exclude,
    })
}

/// Collects `*.py` files under `root`, honoring `.gitignore`, the default
/// excluded folders and `exclude`.
///
/// A `root` that is itself a file is returned as is. Files come back sorted
/// so output order does not depend on the file system.
#[must_use]
pub fn collect_python_files(root: &Path, exclude: &[String]) -> Vec<PathBuf> {
    use ignore::WalkBuilder;

    if root.is_file() {
        return vec![root.to_path_buf()];
    }

    let excludes: Vec<String> = exclude
        .iter()
        .cloned()
        .chain(get_default_exclude_folders().iter().map(|&s| s.to_owned()))
        .collect();
    let root_for_filter = root.to_path_buf();

    // Excluded directories are pruned at traversal time.
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .filter_entry(move |entry| {
            if entry.path() == root_for_filter
                || !entry.file_type().is_some_and(|ft| ft.is_dir())
            {
                return true;
            }
            entry
                .file_name()
                .to_str()
                .is_none_or(|name| !is_excluded(name, &excludes))
        })
        .build();

    let mut files = Vec::new();
    for result in walker {
        match result {
            Ok(entry) => {
                let path = entry.path();
                let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
                if is_file && path.extension().is_some_and(|ext| ext == "py") {
                    files.push(path.to_path_buf());
                }
            }
            Err(error) => tracing::debug!(%error, "walk error"),
        }
    }
    files.sort();
    files
}
