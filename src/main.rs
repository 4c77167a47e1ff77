use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{CommandFactory, Parser};

use m32asm::assemble::assemble_file;

/// Two-pass assembler for a 32-bit MIPS-like instruction set.
#[derive(Parser)]
#[command(name = "m32asm", version, about)]
struct Cli {
    /// Source files to assemble (must end in `.as`)
    files: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.files.is_empty() {
        let _ = Cli::command().print_help();
        println!();
        return ExitCode::FAILURE;
    }

    let mut any_processed = false;
    let mut any_hard_error = false;

    for path in &cli.files {
        if path.extension().and_then(|ext| ext.to_str()) != Some("as") {
            eprintln!("{}: not a .as file, skipping", path.display());
            continue;
        }

        any_processed = true;
        match process_file(path) {
            Ok(had_hard_error) => any_hard_error |= had_hard_error,
            Err(err) => {
                eprintln!("{}: {err:#}", path.display());
                any_hard_error = true;
            }
        }
    }

    if !any_processed || any_hard_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Assembles one file, printing every diagnostic to standard error.
/// Returns `true` iff a hard error occurred.
fn process_file(path: &std::path::Path) -> anyhow::Result<bool> {
    let outcome = assemble_file(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    for diag in &outcome.diagnostics {
        eprintln!("{}: {diag}", path.display());
    }

    Ok(outcome.has_hard_error())
}
