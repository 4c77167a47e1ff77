//! Renders the three output artifacts and writes them next to the source
//! file, swapping its extension the way the source language's
//! `modify_file_ext` does (`prog.as` → `prog.ob`/`.ent`/`.ext`).

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::scanner::{AssemblyContext, INITIAL_IC};
use crate::symtable::{SymbolAttrs, SymbolTable};

/// `.ob`/`.ent`/`.ext` paths for a given `.as` source path.
pub fn output_paths(source: &Path) -> (PathBuf, PathBuf, PathBuf) {
    (source.with_extension("ob"), source.with_extension("ent"), source.with_extension("ext"))
}

/// Renders the `.ob` file body: header line plus the instruction and data
/// images concatenated, in 4-byte address-prefixed records.
pub fn render_ob(ctx: &AssemblyContext) -> String {
    let mut out = String::new();
    writeln!(out, "     {} {}", ctx.icf, ctx.dcf).unwrap();

    let total = ctx.icf as usize + ctx.dcf as usize;
    for i in 0..total {
        if i % 4 == 0 {
            if i > 0 {
                out.push('\n');
            }
            write!(out, "{:04} ", INITIAL_IC as usize + i).unwrap();
        } else {
            out.push(' ');
        }
        let byte = if i < ctx.icf as usize { ctx.inst_img[i] } else { ctx.mem_img[i - ctx.icf as usize] };
        write!(out, "{byte:02X}").unwrap();
    }
    if total > 0 {
        out.push('\n');
    }
    out
}

/// Renders the `.ext` file body, or `None` if there are no external use-sites.
pub fn render_ext(table: &SymbolTable, icf: u32) -> Option<String> {
    render_use_sites(table, icf, |attrs| {
        attrs.contains(SymbolAttrs::REQUIRED) && attrs.contains(SymbolAttrs::EXTERN)
    })
}

/// Renders the `.ent` file body, or `None` if no symbol is an un-referenced
/// entry declaration.
pub fn render_ent(table: &SymbolTable, icf: u32) -> Option<String> {
    render_use_sites(table, icf, |attrs| {
        attrs.contains(SymbolAttrs::ENTRY) && !attrs.contains(SymbolAttrs::REQUIRED)
    })
}

fn render_use_sites(
    table: &SymbolTable,
    icf: u32,
    include: impl Fn(SymbolAttrs) -> bool,
) -> Option<String> {
    let mut out = String::new();
    for symbol in table.iter() {
        if !include(symbol.attrs) {
            continue;
        }
        let addr = symbol.offset + INITIAL_IC + if symbol.attrs.contains(SymbolAttrs::DATA) { icf } else { 0 };
        writeln!(out, "{} {:04}", symbol.name, addr).unwrap();
    }
    (!out.is_empty()).then_some(out)
}

/// Writes whichever of the three artifacts apply for this assembly: `.ob`
/// always, `.ent`/`.ext` only when they'd have at least one line.
pub fn write_outputs(source: &Path, table: &SymbolTable, ctx: &AssemblyContext) -> std::io::Result<()> {
    let (ob_path, ent_path, ext_path) = output_paths(source);

    std::fs::write(&ob_path, render_ob(ctx))?;
    if let Some(body) = render_ent(table, ctx.icf) {
        std::fs::write(&ent_path, body)?;
    }
    if let Some(body) = render_ext(table, ctx.icf) {
        std::fs::write(&ext_path, body)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_line;
    use crate::parser::ast::Statement;
    use crate::scanner::{pass1, pass2};

    fn assemble(lines: &[&str]) -> (SymbolTable, AssemblyContext) {
        let statements: Vec<Statement> =
            lines.iter().enumerate().map(|(i, l)| parse_line(l, i + 1).0).collect();
        let mut table = SymbolTable::new();
        let mut ctx = AssemblyContext::new();
        pass1(&statements, &mut table, &mut ctx);
        pass2(&statements, &mut table, &mut ctx);
        (table, ctx)
    }

    #[test]
    fn ob_header_and_single_record() {
        let (_, ctx) = assemble(&["MAIN: add $1, $2, $3"]);
        let body = render_ob(&ctx);
        assert_eq!(body, "     4 0\n0100 40 48 22 00\n");
    }

    #[test]
    fn ob_includes_data_after_instructions() {
        let (_, ctx) = assemble(&[r#"STR: .asciz "hi""#]);
        let body = render_ob(&ctx);
        assert_eq!(body, "     0 3\n0100 68 69 00\n");
    }

    #[test]
    fn ext_lists_external_use_sites() {
        let (table, ctx) = assemble(&[".extern EXT", "jmp EXT"]);
        let body = render_ext(&table, ctx.icf).expect("one use-site");
        assert_eq!(body, "EXT 0100\n");
    }

    #[test]
    fn ent_is_none_without_any_entry_declarations() {
        let (table, ctx) = assemble(&["MAIN: add $1, $2, $3"]);
        assert_eq!(render_ent(&table, ctx.icf), None);
    }

    #[test]
    fn ent_lists_defined_entry_symbols() {
        let (table, ctx) = assemble(&["MAIN: add $1, $1, $1", ".entry MAIN"]);
        let body = render_ent(&table, ctx.icf).expect("one entry");
        assert_eq!(body, "MAIN 0100\n");
    }

    #[test]
    fn output_paths_swap_extension() {
        let (ob, ent, ext) = output_paths(Path::new("/tmp/prog.as"));
        assert_eq!(ob, Path::new("/tmp/prog.ob"));
        assert_eq!(ent, Path::new("/tmp/prog.ent"));
        assert_eq!(ext, Path::new("/tmp/prog.ext"));
    }

    #[test]
    fn writes_only_ob_when_no_entries_or_externs() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("prog.as");
        let (table, ctx) = assemble(&["MAIN: add $1, $2, $3"]);
        write_outputs(&source, &table, &ctx).unwrap();
        assert!(dir.path().join("prog.ob").exists());
        assert!(!dir.path().join("prog.ent").exists());
        assert!(!dir.path().join("prog.ext").exists());
    }
}
