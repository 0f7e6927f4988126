//! Core library for the pyrefactor refactoring engine.
//!
//! Rules inspect a parsed Python module node by node and return an
//! [`Action`](rules::Action) for the nodes they want rewritten. A
//! [`Session`](session::Session) applies one action at a time, splicing the
//! rendered replacement into the original text and re-parsing, until no rule
//! matches. Everything a rule does not touch stays byte-for-byte identical.
//!
//! ```
//! use pyrefactor::rules::registry::get_builtin_rules;
//! use pyrefactor::session::Session;
//!
//! let outcome = Session::new(get_builtin_rules())
//!     .run("TAU = 3.14 + 3.14  # full turn\n")
//!     .unwrap();
//! assert_eq!(outcome.source, "TAU = 6.28  # full turn\n");
//! ```

#![allow(
    clippy::similar_names,
    clippy::map_unwrap_or,
    clippy::items_after_statements
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

/// Module containing error types shared by the engine.
pub mod error;

/// Module owning the parsed tree and the node reference type.
pub mod syntax;

/// Module for the tree-sitter concrete syntax tree, used to find comments.
pub mod cst;

/// Module mapping nodes to their source spans and attached comments.
pub mod span;

/// Module for lexical scopes and name definitions.
pub mod scope;

/// Module for tree traversal, node location and rule matching.
pub mod walker;

/// Module defining the rule trait, actions and built-in rules.
pub mod rules;

/// Module rendering actions into text edits.
pub mod synth;

/// Module running rules to a fixed point.
pub mod session;

/// Module containing utility functions.
pub mod utils;

/// Module containing shared constants and regex patterns.
pub mod constants;

/// Module for loading configuration.
pub mod config;

/// Module defining the command-line interface arguments and structs.
pub mod cli;

/// Module for handling CLI commands and their execution logic.
pub mod commands;

/// Module for CLI output formatting with colored text and tables.
pub mod output;

/// Module installing the tracing subscriber.
pub mod tracing_config;

/// Module defining the entry point logic shared by the binaries.
pub mod entry_point;
