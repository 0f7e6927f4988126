use crate::rules::Rule;
use crate::session::PendingMatch;
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use std::io::Write;

/// Helper to create a consistently styled table.
fn create_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers);
    table
}

/// Print the built-in rules as a table.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_rule_table(writer: &mut impl Write, rules: &[Box<dyn Rule>]) -> std::io::Result<()> {
    let mut table = create_table(vec!["Rule", "Providers", "Description"]);
    for rule in rules {
        let providers = rule
            .context_providers()
            .iter()
            .map(|provider| format!("{provider:?}"))
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            Cell::new(rule.name()).add_attribute(Attribute::Bold),
            Cell::new(if providers.is_empty() { "-".to_owned() } else { providers })
                .fg(Color::Cyan),
            Cell::new(rule.description()),
        ]);
    }
    writeln!(writer, "{table}")?;
    Ok(())
}

/// Print the header that separates files in multi-file output.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_file_header(writer: &mut impl Write, path: &str) -> std::io::Result<()> {
    writeln!(writer, "{}", format!("# ==> {path} <==").dimmed())
}

/// Print the rewrites `--check` found in one file.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_pending(
    writer: &mut impl Write,
    path: &str,
    pending: &[PendingMatch],
) -> std::io::Result<()> {
    for found in pending {
        let text = found.text.lines().next().unwrap_or_default();
        writeln!(
            writer,
            "{}:{}:{}: {} {} {}",
            path.bold(),
            found.line,
            found.column,
            found.rule.yellow(),
            format!("({})", found.action).dimmed(),
            text
        )?;
    }
    Ok(())
}

/// Print the outcome of `--write` for one file.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_write_summary(
    writer: &mut impl Write,
    path: &str,
    rewrites: Option<usize>,
) -> std::io::Result<()> {
    match rewrites {
        Some(count) => writeln!(
            writer,
            "{} {} ({} rewrite{})",
            "Rewrote".green().bold(),
            path,
            count,
            if count == 1 { "" } else { "s" }
        ),
        None => writeln!(writer, "{} {}", "Unchanged".dimmed(), path),
    }
}

/// Print a closing line for `--check`.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_check_summary(
    writer: &mut impl Write,
    changed: usize,
    total: usize,
) -> std::io::Result<()> {
    if changed == 0 {
        writeln!(writer, "{}", format!("[OK] {total} file(s) already refactored").green())
    } else {
        writeln!(
            writer,
            "{}",
            format!("{changed} of {total} file(s) would be rewritten").red().bold()
        )
    }
}

/// Print an error for one file to stderr.
pub fn print_error(path: &str, message: &str) {
    eprintln!("{} {}: {}", "error:".red().bold(), path, message);
}

/// Print a warning to stderr.
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::registry::get_builtin_rules;

    #[test]
    fn test_rule_table_lists_every_rule() {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        print_rule_table(&mut buffer, &get_builtin_rules()).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        for rule in get_builtin_rules() {
            assert!(text.contains(rule.name()));
        }
        assert!(text.contains("Scope"));
    }

    #[test]
    fn test_pending_lines() {
        colored::control::set_override(false);
        let pending = vec![PendingMatch {
            rule: "FoldConstants",
            action: "replace",
            line: 3,
            column: 5,
            text: "1 + 2".to_owned(),
        }];
        let mut buffer = Vec::new();
        print_pending(&mut buffer, "a.py", &pending).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "a.py:3:5: FoldConstants (replace) 1 + 2\n"
        );
    }
}
