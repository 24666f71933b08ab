use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::cargo::{finish, step, OnFailure};

pub fn run(unit_only: bool, integration_only: bool) -> Result<()> {
    println!();
    println!("{}", "🧪 Running tests...".cyan().bold());
    println!();

    let start = Instant::now();

    if !integration_only {
        let output = step("Unit tests", &["test", "--lib", "--workspace"], OnFailure::Abort)?;
        report(output.as_ref());
    }

    if !unit_only {
        // Contract tests need the hal mock backend.
        let output = step(
            "Integration tests",
            &["test", "--tests", "-p", "hal", "-p", "shim", "--all-features"],
            OnFailure::Abort,
        )?;
        report(output.as_ref());
    }

    step("Doc tests", &["test", "--doc", "--workspace"], OnFailure::Warn)?;

    finish("All tests", start);
    Ok(())
}

fn report(output: Option<&std::process::Output>) {
    if let Some(output) = output {
        let stdout = String::from_utf8_lossy(&output.stdout);
        for summary in test_summaries(&stdout) {
            println!("    {}", summary.dimmed());
        }
    }
}

/// The `test result:` lines cargo prints per test binary.
fn test_summaries(output: &str) -> Vec<&str> {
    output
        .lines()
        .filter_map(|line| line.split("test result:").nth(1))
        .map(str::trim)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summaries_are_extracted_per_binary() {
        let output = "running 2 tests\ntest result: ok. 2 passed; 0 failed\n\nrunning 1 test\ntest result: ok. 1 passed; 0 failed\n";
        assert_eq!(
            test_summaries(output),
            vec!["ok. 2 passed; 0 failed", "ok. 1 passed; 0 failed"]
        );
    }
}
