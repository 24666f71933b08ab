use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::cargo::{finish, step, OnFailure};

pub fn run(open: bool) -> Result<()> {
    println!();
    println!("{}", "📚 Building documentation...".cyan().bold());
    println!();

    let start = Instant::now();

    let mut args = vec!["doc", "--workspace", "--no-deps", "--all-features", "--document-private-items"];
    if open {
        args.push("--open");
    }
    step("Documentation", &args, OnFailure::Abort)?;

    if !open {
        println!("   {}", "Open target/doc/shim/index.html in your browser".dimmed());
        println!("   {}", "Or run 'cargo run -p xtask -- doc --open'".dimmed());
        println!();
    }

    finish("Documentation", start);
    Ok(())
}
