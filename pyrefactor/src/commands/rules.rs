//! `--list-rules`.

use crate::output::print_rule_table;
use crate::rules::registry::get_builtin_rules;

use anyhow::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct RuleInfo {
    name: &'static str,
    description: &'static str,
    providers: &'static [crate::rules::Provider],
}

/// Prints the built-in rules as a table, or as JSON.
///
/// # Errors
///
/// Returns an error if writing or JSON serialization fails.
pub fn run_list_rules<W: Write>(json: bool, writer: &mut W) -> Result<i32> {
    let rules = get_builtin_rules();
    if json {
        let infos: Vec<RuleInfo> = rules
            .iter()
            .map(|rule| RuleInfo {
                name: rule.name(),
                description: rule.description(),
                providers: rule.context_providers(),
            })
            .collect();
        writeln!(writer, "{}", serde_json::to_string_pretty(&infos)?)?;
    } else {
        print_rule_table(writer, &rules)?;
    }
    Ok(0)
}
