//! Shared utilities for command implementations.

use crate::constants::BANNER_PREFIX;
use std::path::PathBuf;

/// Finds all Python files under the given roots, excluding specified patterns.
/// Respects .gitignore files in addition to hardcoded defaults. A file reached
/// from two roots is listed once.
pub fn find_python_files(roots: &[PathBuf], exclude: &[String]) -> Vec<PathBuf> {
    let mut all_files: Vec<PathBuf> = Vec::new();
    for root in roots {
        for file in crate::utils::collect_python_files(root, exclude) {
            if !all_files.contains(&file) {
                all_files.push(file);
            }
        }
    }
    all_files
}

/// The `--banner` header: the active rules, then two empty lines.
pub fn banner(rule_names: &[&str]) -> String {
    format!("{BANNER_PREFIX}{}\n\n\n", rule_names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_format() {
        assert_eq!(
            banner(&["FoldConstants", "RemoveRedundantPass"]),
            "# Active rules: FoldConstants, RemoveRedundantPass\n\n\n"
        );
    }
}
