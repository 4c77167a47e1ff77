//! The two-pass scanner: walks the parsed statement sequence once to build
//! the symbol table and data image, snapshots the code/data boundary, then
//! walks it again to bind label references and encode the instruction image.
//!
//! Everything the source language keeps as module-global counters and
//! buffers (`IC`, `DC`, `ICF`, `DCF`, `inst_img`, `mem_img`) lives here in
//! [`AssemblyContext`] instead, so a fresh assembly run is just a fresh
//! value with no reset step to forget.

use crate::error::{AsmError, ErrorKind, Span};
use crate::parser::ast::{DirInstruction, OpInstruction, SingleBody, Statement, StatementKind};
use crate::symtable::{Symbol, SymbolAttrs, SymbolTable};
use crate::tables::{DirId, OpId};

/// The logical load address of the first instruction word.
pub const INITIAL_IC: u32 = 100;

/// Per-file assembly state: running counters plus the two output images.
#[derive(Debug, Default)]
pub struct AssemblyContext {
    pub ic: u32,
    pub dc: u32,
    pub icf: u32,
    pub dcf: u32,
    pub inst_img: Vec<u8>,
    pub mem_img: Vec<u8>,
}

impl AssemblyContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Records a label definition or declaration, applying the merge rules for
/// a name that may already be present. Always applies whatever update it
/// can, even when it also returns an error — a double-definition still
/// leaves the table in a sensible state for the rest of the file.
fn log_label(
    table: &mut SymbolTable,
    name: &str,
    attr: SymbolAttrs,
    offset: u32,
    is_definition: bool,
    line_index: usize,
) -> Option<ErrorKind> {
    if let Some(existing) = table.find_mut(name) {
        if is_definition && existing.defined {
            return Some(ErrorKind::LabelDoubleDef);
        }
        existing.attrs |= attr;
        if is_definition {
            existing.offset = offset;
            existing.defined = true;
        } else if !existing.defined {
            existing.declared_at = line_index;
        }
        return scope_conflict(existing.attrs);
    }

    let mut symbol = Symbol { name: name.to_string(), offset: 0, attrs: attr, defined: false, declared_at: line_index };
    if is_definition {
        symbol.offset = offset;
        symbol.defined = true;
    }
    let error = scope_conflict(symbol.attrs);
    table.insert(symbol);
    error
}

fn scope_conflict(attrs: SymbolAttrs) -> Option<ErrorKind> {
    if !attrs.contains(SymbolAttrs::EXTERN) {
        return None;
    }
    if attrs.contains(SymbolAttrs::ENTRY) {
        Some(ErrorKind::LabelScopeMismatch)
    } else if attrs.intersects(SymbolAttrs::CODE | SymbolAttrs::DATA) {
        Some(ErrorKind::LabelExtDef)
    } else {
        None
    }
}

/// Pass 1: builds the data image and the preliminary symbol table, and
/// snapshots the code/data boundary (`ICF`/`DCF`) at the end.
pub fn pass1(statements: &[Statement], table: &mut SymbolTable, ctx: &mut AssemblyContext) -> Vec<AsmError> {
    let mut diags = Vec::new();

    for stmt in statements {
        match &stmt.kind {
            StatementKind::Error | StatementKind::Ignore | StatementKind::End => continue,
            StatementKind::Operation(_) => {
                if let Some(label) = &stmt.label {
                    if let Some(kind) =
                        log_label(table, label, SymbolAttrs::CODE, ctx.ic, true, stmt.line_index)
                    {
                        diags.push(AsmError::new(kind, Span::line(stmt.line_index)));
                    }
                }
                ctx.ic += 4;
            }
            StatementKind::Directive(dir_inst) => {
                let is_scope_dir =
                    matches!(dir_inst, DirInstruction::Single { body: SingleBody::Label(_), .. });
                if let Some(label) = &stmt.label {
                    if is_scope_dir {
                        diags.push(AsmError::new(
                            ErrorKind::RedundantEntryExternLabel,
                            Span::line(stmt.line_index),
                        ));
                    } else if let Some(kind) =
                        log_label(table, label, SymbolAttrs::DATA, ctx.dc, true, stmt.line_index)
                    {
                        diags.push(AsmError::new(kind, Span::line(stmt.line_index)));
                    }
                }

                match dir_inst {
                    DirInstruction::Single { body: SingleBody::Label(name), dir } => {
                        let attr = if *dir == DirId::Entry { SymbolAttrs::ENTRY } else { SymbolAttrs::EXTERN };
                        if let Some(kind) = log_label(table, name, attr, 0, false, stmt.line_index) {
                            diags.push(AsmError::new(kind, Span::line(stmt.line_index)));
                        }
                    }
                    DirInstruction::Single { body: SingleBody::Str(s), .. } => {
                        ctx.mem_img.extend_from_slice(s.as_bytes());
                        ctx.mem_img.push(0);
                        ctx.dc += s.len() as u32 + 1;
                    }
                    DirInstruction::Array { width, values, .. } => {
                        for value in values {
                            let bytes = value.to_le_bytes();
                            ctx.mem_img.extend_from_slice(&bytes[..*width as usize]);
                        }
                        ctx.dc += *width * values.len() as u32;
                    }
                }
            }
        }
    }

    ctx.icf = ctx.ic;
    ctx.dcf = ctx.dc;
    ctx.ic = 0;
    ctx.dc = 0;
    diags
}

/// Pass 2: binds label references, encodes every operation into a 32-bit
/// word, and appends it to the instruction image.
pub fn pass2(statements: &[Statement], table: &mut SymbolTable, ctx: &mut AssemblyContext) -> Vec<AsmError> {
    let mut diags = Vec::new();

    for stmt in statements {
        let op_inst = match &stmt.kind {
            StatementKind::Operation(op_inst) => op_inst,
            _ => continue,
        };

        let mut op_inst = op_inst.clone();
        let ic = ctx.ic;

        match &mut op_inst {
            OpInstruction::I { op, immed, label, .. } if op.is_branch() => {
                if let Some(name) = label.take() {
                    match resolve_branch(table, &name, ic) {
                        Ok((value, warning)) => {
                            *immed = value;
                            if let Some(kind) = warning {
                                diags.push(AsmError::new(kind, Span::line(stmt.line_index)));
                            }
                        }
                        Err(kind) => diags.push(AsmError::new(kind, Span::line(stmt.line_index))),
                    }
                    log_use_site(table, &name, ic, stmt.line_index);
                }
            }
            OpInstruction::J { op, addr, label, .. } if *op == OpId::La => {
                if let Some(name) = label.take() {
                    match resolve_la(table, &name, ctx.icf) {
                        Ok(value) => *addr = value,
                        Err(kind) => diags.push(AsmError::new(kind, Span::line(stmt.line_index))),
                    }
                    log_use_site(table, &name, ic, stmt.line_index);
                }
            }
            OpInstruction::J { op, addr, label, .. } if matches!(op, OpId::Jmp | OpId::Call) => {
                if let Some(name) = label.take() {
                    match resolve_jmp(table, &name) {
                        Ok((value, warning)) => {
                            *addr = value;
                            if let Some(kind) = warning {
                                diags.push(AsmError::new(kind, Span::line(stmt.line_index)));
                            }
                        }
                        Err(kind) => diags.push(AsmError::new(kind, Span::line(stmt.line_index))),
                    }
                    log_use_site(table, &name, ic, stmt.line_index);
                }
            }
            _ => {}
        }

        let word = encode(&op_inst);
        ctx.inst_img.extend_from_slice(&word.to_le_bytes());
        ctx.ic += 4;
    }

    for symbol in table.iter() {
        let is_use_site = symbol.attrs.contains(SymbolAttrs::REQUIRED);
        if !is_use_site && symbol.attrs.contains(SymbolAttrs::ENTRY) && !symbol.defined {
            diags.push(AsmError::new(ErrorKind::LabelEntUndef, Span::line(symbol.declared_at)));
        }
    }

    diags
}

fn log_use_site(table: &mut SymbolTable, name: &str, ic: u32, line_index: usize) {
    let attrs = table.find(name).map(|s| s.attrs).unwrap_or(SymbolAttrs::empty());
    table.insert(Symbol {
        name: name.to_string(),
        offset: ic,
        attrs: attrs | SymbolAttrs::REQUIRED,
        defined: false,
        declared_at: line_index,
    });
}

fn resolve_branch(table: &SymbolTable, name: &str, ic: u32) -> Result<(i32, Option<ErrorKind>), ErrorKind> {
    let symbol = table.find(name).ok_or(ErrorKind::LabelUndefined)?;
    if symbol.attrs.contains(SymbolAttrs::EXTERN) {
        return Err(ErrorKind::LabelUnexpExt);
    }
    let warning = symbol.attrs.contains(SymbolAttrs::DATA).then_some(ErrorKind::LabelJmp2Data);
    Ok((symbol.offset as i32 - ic as i32, warning))
}

fn resolve_la(table: &SymbolTable, name: &str, icf: u32) -> Result<u32, ErrorKind> {
    let symbol = table.find(name).ok_or(ErrorKind::LabelUndefined)?;
    if !symbol.attrs.intersects(SymbolAttrs::EXTERN | SymbolAttrs::DATA) {
        return Err(ErrorKind::LabelExpData);
    }
    Ok(if symbol.attrs.contains(SymbolAttrs::EXTERN) { 0 } else { symbol.offset + icf + INITIAL_IC })
}

fn resolve_jmp(table: &SymbolTable, name: &str) -> Result<(u32, Option<ErrorKind>), ErrorKind> {
    let symbol = table.find(name).ok_or(ErrorKind::LabelUndefined)?;
    let warning = symbol.attrs.contains(SymbolAttrs::DATA).then_some(ErrorKind::LabelJmp2Data);
    let addr = if symbol.attrs.contains(SymbolAttrs::EXTERN) { 0 } else { symbol.offset + INITIAL_IC };
    Ok((addr, warning))
}

/// Packs one instruction into its 32-bit machine word.
pub fn encode(op_inst: &OpInstruction) -> u32 {
    match op_inst {
        OpInstruction::R { op, funct, rs, rt, rd } => {
            (*funct << 6) | ((*rd as u32) << 11) | ((*rt as u32) << 16) | ((*rs as u32) << 21) | (op.opcode() << 26)
        }
        OpInstruction::I { op, rs, rt, immed, .. } => {
            (*immed as u32 & 0xFFFF) | ((*rt as u32) << 16) | ((*rs as u32) << 21) | (op.opcode() << 26)
        }
        OpInstruction::J { op, reg_flag, addr, .. } => {
            (*addr & 0x01FF_FFFF) | ((*reg_flag as u32) << 25) | (op.opcode() << 26)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_line;

    fn scan(lines: &[&str]) -> (SymbolTable, AssemblyContext, Vec<AsmError>) {
        let statements: Vec<Statement> =
            lines.iter().enumerate().map(|(i, l)| parse_line(l, i + 1).0).collect();
        let mut table = SymbolTable::new();
        let mut ctx = AssemblyContext::new();
        let mut diags = pass1(&statements, &mut table, &mut ctx);
        diags.extend(pass2(&statements, &mut table, &mut ctx));
        (table, ctx, diags)
    }

    #[test]
    fn add_instruction_matches_worked_example() {
        let (_, ctx, diags) = scan(&["MAIN: add $1, $2, $3"]);
        assert!(diags.is_empty());
        assert_eq!(&ctx.inst_img[0..4], &0x0022_4840u32.to_le_bytes());
    }

    #[test]
    fn branch_immediate_is_pc_relative() {
        let (_, ctx, diags) = scan(&[
            "LOOP: add $1, $1, $1",
            "add $1, $1, $1",
            "add $1, $1, $1",
            "bne $1, $2, LOOP",
        ]);
        assert!(diags.is_empty());
        let word = u32::from_le_bytes(ctx.inst_img[12..16].try_into().unwrap());
        let immed = (word & 0xFFFF) as i16;
        assert_eq!(immed, -12);
    }

    #[test]
    fn la_address_includes_data_boundary() {
        let (_, _, diags) = scan(&[r#"STR: .asciz "hi""#, "la $5, STR"]);
        assert!(diags.is_empty());
    }

    #[test]
    fn undefined_label_reference_is_reported() {
        let (_, _, diags) = scan(&["jmp NOPE"]);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, ErrorKind::LabelUndefined);
    }

    #[test]
    fn entry_without_definition_is_reported_after_pass_two() {
        let (_, _, diags) = scan(&[".entry MISSING"]);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, ErrorKind::LabelEntUndef);
    }

    #[test]
    fn double_definition_is_reported() {
        let (_, _, diags) = scan(&["X: add $1, $1, $1", "X: add $1, $1, $1"]);
        assert_eq!(diags.iter().filter(|d| d.kind == ErrorKind::LabelDoubleDef).count(), 1);
    }

    #[test]
    fn extern_and_entry_is_scope_mismatch() {
        let (_, _, diags) = scan(&[".extern X", ".entry X"]);
        assert!(diags.iter().any(|d| d.kind == ErrorKind::LabelScopeMismatch));
    }

    #[test]
    fn jump_to_data_symbol_is_a_warning_not_an_error() {
        let (_, _, diags) = scan(&[r#"D: .asciz "x""#, "jmp D"]);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].is_warning());
        assert_eq!(diags[0].kind, ErrorKind::LabelJmp2Data);
    }
}
