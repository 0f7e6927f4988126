//! Built-in rules, selectable by name.
//!
//! Lookup ignores case, `-` and `_`, so `fold-constants`, `fold_constants`
//! and `FoldConstants` all select the same rule.

use crate::error::RuleLoadError;
use crate::rules::constants::{FoldConstants, PropagateConstants};
use crate::rules::redundant_pass::RemoveRedundantPass;
use crate::rules::Rule;

/// Every built-in rule, in default registration order.
#[must_use]
pub fn get_builtin_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(PropagateConstants),
        Box::new(FoldConstants),
        Box::new(RemoveRedundantPass),
    ]
}

/// Canonical form of a rule name.
#[must_use]
pub fn normalize_rule_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// The built-in rule called `name`.
#[must_use]
pub fn find_rule(name: &str) -> Option<Box<dyn Rule>> {
    let wanted = normalize_rule_name(name);
    get_builtin_rules()
        .into_iter()
        .find(|rule| normalize_rule_name(rule.name()) == wanted)
}

/// Rules picked for a run, plus whatever could not be picked.
pub struct RuleSelection {
    /// Rules in the order they were requested.
    pub rules: Vec<Box<dyn Rule>>,
    /// Advisories. Never fatal.
    pub errors: Vec<RuleLoadError>,
}

impl RuleSelection {
    /// Names of the selected rules.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }
}

/// Resolves requested rule names. `None` selects every built-in rule.
///
/// Unknown names are reported and skipped, and repeated names are kept once.
/// An empty result also reports [`RuleLoadError::NoRules`].
#[must_use]
pub fn select_rules(names: Option<&[String]>) -> RuleSelection {
    let Some(names) = names else {
        return RuleSelection {
            rules: get_builtin_rules(),
            errors: Vec::new(),
        };
    };

    let mut rules: Vec<Box<dyn Rule>> = Vec::new();
    let mut errors = Vec::new();
    for name in names {
        match find_rule(name) {
            Some(rule) if rules.iter().any(|r| r.name() == rule.name()) => {}
            Some(rule) => rules.push(rule),
            None => errors.push(RuleLoadError::UnknownRule(name.clone())),
        }
    }
    if rules.is_empty() {
        errors.push(RuleLoadError::NoRules);
    }
    RuleSelection { rules, errors }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names_are_unique() {
        let rules = get_builtin_rules();
        let mut names: Vec<_> = rules.iter().map(|r| normalize_rule_name(r.name())).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), rules.len());
    }

    #[test]
    fn test_lookup_is_lenient() {
        for name in ["FoldConstants", "fold-constants", "FOLD_CONSTANTS"] {
            assert_eq!(find_rule(name).map(|r| r.name()), Some("FoldConstants"));
        }
        assert!(find_rule("fold").is_none());
    }

    #[test]
    fn test_select_keeps_requested_order() {
        let names = vec![
            "remove-redundant-pass".to_owned(),
            "nope".to_owned(),
            "fold-constants".to_owned(),
            "FoldConstants".to_owned(),
        ];
        let selection = select_rules(Some(&names));
        assert_eq!(selection.names(), vec!["RemoveRedundantPass", "FoldConstants"]);
        assert_eq!(
            selection.errors,
            vec![RuleLoadError::UnknownRule("nope".to_owned())]
        );
    }

    #[test]
    fn test_select_nothing() {
        let selection = select_rules(Some(&[]));
        assert!(selection.rules.is_empty());
        assert_eq!(selection.errors, vec![RuleLoadError::NoRules]);
        assert_eq!(select_rules(None).rules.len(), 3);
    }
}
