//! Top-level orchestration: source text in, diagnostics and (on success)
//! written artifacts out. One call per source file; nothing here survives
//! past the call, so concurrent files never interfere with each other.

use std::path::Path;

use crate::error::AsmError;
use crate::parser::ast::Statement;
use crate::parser::parse_line;
use crate::scanner::{self, AssemblyContext};
use crate::symtable::SymbolTable;
use crate::writer;

/// Outcome of assembling one source file.
pub struct AssembleOutcome {
    pub diagnostics: Vec<AsmError>,
    /// `false` iff a hard error suppressed the three output artifacts.
    pub wrote_output: bool,
}

impl AssembleOutcome {
    pub fn has_hard_error(&self) -> bool {
        self.diagnostics.iter().any(|d| !d.is_warning())
    }
}

/// Runs the tokenizer/parser over every line, then both scanner passes,
/// collecting every diagnostic along the way. Parse errors don't abort the
/// file: a line that fails to parse becomes a `StatementKind::Error` that
/// the scanner passes skip outright, and assembly continues with the next
/// line so all diagnostics surface in one run.
fn assemble_text(text: &str) -> (SymbolTable, AssemblyContext, Vec<AsmError>) {
    let mut diagnostics = Vec::new();
    let statements: Vec<Statement> = text
        .lines()
        .enumerate()
        .map(|(i, line)| {
            let (stmt, err) = parse_line(line, i + 1);
            if let Some(err) = err {
                diagnostics.push(err);
            }
            stmt
        })
        .collect();

    let mut table = SymbolTable::new();
    let mut ctx = AssemblyContext::new();
    diagnostics.extend(scanner::pass1(&statements, &mut table, &mut ctx));
    diagnostics.extend(scanner::pass2(&statements, &mut table, &mut ctx));

    (table, ctx, diagnostics)
}

/// Reads `path`, assembles it, and writes `.ob`/`.ent`/`.ext` next to it
/// unless a hard error occurred — either way, every diagnostic from both
/// passes is returned.
pub fn assemble_file(path: &Path) -> std::io::Result<AssembleOutcome> {
    let text = std::fs::read_to_string(path)?;
    let (table, ctx, diagnostics) = assemble_text(&text);

    let outcome = AssembleOutcome { diagnostics, wrote_output: false };
    if outcome.has_hard_error() {
        return Ok(outcome);
    }

    writer::write_outputs(path, &table, &ctx)?;
    Ok(AssembleOutcome { wrote_output: true, ..outcome })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn assembles_a_minimal_program() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prog.as");
        std::fs::write(&path, "MAIN: add $1, $2, $3\nstop\n").unwrap();

        let outcome = assemble_file(&path).unwrap();
        assert!(outcome.diagnostics.is_empty());
        assert!(outcome.wrote_output);
        assert!(dir.path().join("prog.ob").exists());
    }

    #[test]
    fn hard_error_suppresses_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.as");
        std::fs::write(&path, "jmp NOPE\n").unwrap();

        let outcome = assemble_file(&path).unwrap();
        assert!(!outcome.wrote_output);
        assert!(outcome.has_hard_error());
        assert!(!dir.path().join("bad.ob").exists());
    }

    #[test]
    fn both_passes_still_run_when_a_line_fails_to_parse() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mixed.as");
        std::fs::write(&path, ".nope X\nMAIN: add $1, $2, $3\n").unwrap();

        let outcome = assemble_file(&path).unwrap();
        assert!(outcome.has_hard_error());
        assert!(!outcome.wrote_output);
        // the second, valid line still reached the scanner without panicking.
        assert_eq!(outcome.diagnostics.len(), 1);
    }
}
