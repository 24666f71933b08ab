use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::cargo::{finish, step, OnFailure};

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking workspace...".cyan().bold());
    println!();

    let start = Instant::now();

    // The mock backend is feature-gated; check it too.
    step(
        "Build check (hal, shim)",
        &["check", "-p", "hal", "-p", "shim", "--all-features"],
        OnFailure::Abort,
    )?;
    step(
        "Clippy",
        &["clippy", "--workspace", "--all-targets", "--all-features", "--", "-D", "warnings"],
        OnFailure::Warn,
    )?;
    if step("Formatting", &["fmt", "--all", "--check"], OnFailure::Warn)?.is_none() {
        eprintln!("     Run 'cargo fmt --all' to fix");
    }

    finish("All checks", start);
    Ok(())
}
