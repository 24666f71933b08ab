use anyhow::{Context, Result};
use colored::Colorize;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use crate::cargo::{finish, step, OnFailure};

/// Build the release `cdylib` and copy it to the name the host loader probes.
pub fn run(name: &str, target: Option<&str>) -> Result<()> {
    println!();
    println!("{}", "📦 Packaging audio HAL module...".cyan().bold());
    println!();

    anyhow::ensure!(
        !name.is_empty() && !name.contains(['/', '.']),
        "module name must be a plain suffix, got {name:?}"
    );

    let start = Instant::now();

    let mut args = vec!["build", "-p", "shim", "--lib", "--release"];
    if let Some(target) = target {
        args.extend(["--target", target]);
    }
    step("Release build", &args, OnFailure::Abort)?;

    let mut out_dir = env::var_os("CARGO_TARGET_DIR").map_or_else(|| PathBuf::from("target"), PathBuf::from);
    if let Some(target) = target {
        out_dir.push(target);
    }
    out_dir.push("release");

    let built = out_dir.join("libshim.so");
    let module = out_dir.join(format!("audio.primary.{name}.so"));
    fs::copy(&built, &module)
        .with_context(|| format!("Failed to copy {} to {}", built.display(), module.display()))?;

    println!("   {}", format!("→ {}", module.display()).green());
    println!(
        "   {}",
        "Install under /vendor/lib*/hw/ (or the platform's HAL search path)".dimmed()
    );
    println!();

    finish("Packaging", start);
    Ok(())
}
