//! Main binary entry point for `pyrefactor`.
//!
//! This binary simply delegates to the shared `entry_point::run_with_args()` function
//! to ensure consistent behavior with the `pyrefactor-cli` crate.

use anyhow::Result;

fn main() -> Result<()> {
    let code = pyrefactor::entry_point::run_with_args(std::env::args().skip(1).collect())?;
    std::process::exit(code);
}
