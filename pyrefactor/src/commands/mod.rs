//! Commands module - CLI command implementations.

mod refactor;
mod rules;
mod utils;

pub use refactor::{
    run_refactor, FileError, FileReport, FileStatus, Input, RefactorOptions, RefactorReport,
};
pub use rules::run_list_rules;
pub use utils::{banner, find_python_files};
