//! Per-line parser.
//!
//! Drives a per-line state machine keyed by a bitset of *expectation flags*
//! ([`ast::ExpectFlags`]) carried alongside the statement under construction.
//! Each token's kind is checked against the current flags; if permitted, a
//! kind-specific handler updates the statement and replaces the flags.
//! Termination is either an `Ignore` (a comment was seen) or a token of kind
//! `End`. Which register operand a `Reg` token fills ([`ast::RegSlot`]) is
//! tracked in its own field rather than folded into the flag bitset.

pub mod ast;

#[cfg(test)]
mod tests;

use crate::error::{AsmError, ErrorKind, Span};
use crate::tables::{DirId, OpId, OpType};
use crate::tokenizer::{Token, TokenKind, Tokenizer};
use ast::{DirInstruction, ExpectFlags, OpInstruction, RegSlot, SingleBody, Statement, StatementKind};

const MAX_LINE_LEN: usize = 80;
const MAX_LABEL_LEN: usize = 32;

/// Partial operation operands, filled in as register/immediate/label tokens
/// arrive. Which variant is live is fixed the moment the `Op` token is seen.
enum OpBuilder {
    R { op: OpId, funct: u32, rs: Option<u8>, rt: Option<u8>, rd: Option<u8> },
    I { op: OpId, rs: Option<u8>, rt: Option<u8>, immed: Option<i32>, label: Option<String> },
    J { op: OpId, reg_flag: bool, reg_val: Option<u8>, label: Option<String> },
}

impl OpBuilder {
    fn op(&self) -> OpId {
        match self {
            OpBuilder::R { op, .. } => *op,
            OpBuilder::I { op, .. } => *op,
            OpBuilder::J { op, .. } => *op,
        }
    }

    fn finish(self) -> OpInstruction {
        match self {
            OpBuilder::R { op, funct, rs, rt, rd } => OpInstruction::R {
                op,
                funct,
                rs: rs.unwrap_or(0),
                rt: rt.unwrap_or(0),
                rd: rd.unwrap_or(0),
            },
            OpBuilder::I { op, rs, rt, immed, label } => OpInstruction::I {
                op,
                rs: rs.unwrap_or(0),
                rt: rt.unwrap_or(0),
                immed: immed.unwrap_or(0),
                label,
            },
            OpBuilder::J { op, reg_flag, reg_val, label } => OpInstruction::J {
                op,
                reg_flag,
                addr: reg_val.map(u32::from).unwrap_or(0),
                label,
            },
        }
    }
}

enum DirBuilder {
    Array { dir: DirId, width: u32, values: Vec<i64> },
    /// `.asciz`/`.entry`/`.extern` — `body` is filled by the String or Label
    /// handler, whichever the directive expects.
    Single { dir: DirId, body: Option<SingleBody> },
}

impl DirBuilder {
    fn finish(self) -> DirInstruction {
        match self {
            DirBuilder::Array { dir, width, values } => DirInstruction::Array { dir, width, values },
            DirBuilder::Single { dir, body } => {
                DirInstruction::Single { dir, body: body.expect("set by String/Label handler") }
            }
        }
    }
}

enum Building {
    None,
    Op(OpBuilder),
    Dir(DirBuilder),
}

struct PState {
    flags: ExpectFlags,
    reg_slot: Option<RegSlot>,
    label: Option<String>,
    building: Building,
    ignore: bool,
}

/// Parses one source line into a [`Statement`]. On failure the statement's
/// kind is [`StatementKind::Error`] and the diagnostic is returned alongside
/// it — the caller decides how to report it; this module never prints.
pub fn parse_line(line: &str, line_index: usize) -> (Statement, Option<AsmError>) {
    if line.len() > MAX_LINE_LEN {
        return (
            Statement { line_index, label: None, kind: StatementKind::Error },
            Some(AsmError::new(ErrorKind::LongLine, Span::line(line_index)).with_line(line)),
        );
    }

    let mut tokenizer = Tokenizer::new(line);
    let mut state = PState {
        flags: ExpectFlags::INITIAL,
        reg_slot: None,
        label: None,
        building: Building::None,
        ignore: false,
    };

    loop {
        let token = tokenizer.next();
        let is_end = token.kind == TokenKind::End;
        if let Err(kind) = dispatch(&token, &mut state) {
            return (
                Statement { line_index, label: state.label, kind: StatementKind::Error },
                Some(AsmError::new(kind, Span::at(line_index, token.index)).with_line(line)),
            );
        }
        if state.ignore || is_end {
            break;
        }
    }

    let kind = if state.ignore {
        StatementKind::Ignore
    } else {
        match state.building {
            Building::None => StatementKind::End,
            Building::Op(b) => StatementKind::Operation(b.finish()),
            Building::Dir(b) => StatementKind::Directive(b.finish()),
        }
    };

    (Statement { line_index, label: state.label, kind }, None)
}

fn dispatch(token: &Token, st: &mut PState) -> Result<(), ErrorKind> {
    match &token.kind {
        TokenKind::Err => Err(ErrorKind::UnknownTok),
        TokenKind::Empty => Err(ErrorKind::UnexpectedTok),
        TokenKind::End => {
            if st.flags.contains(ExpectFlags::END) {
                Ok(())
            } else {
                Err(ErrorKind::UnexpectedEol)
            }
        }
        TokenKind::Comment => {
            if st.flags.contains(ExpectFlags::COMMENT) {
                st.ignore = true;
                Ok(())
            } else {
                Err(ErrorKind::UnexpectedTok)
            }
        }
        TokenKind::LabelDef(name) => {
            if st.flags.contains(ExpectFlags::LABEL_DEF) {
                handle_labeldef(name, st)
            } else {
                Err(ErrorKind::UnexpectedTok)
            }
        }
        TokenKind::Op(op) => {
            if st.flags.contains(ExpectFlags::OP) {
                handle_op(*op, st);
                Ok(())
            } else {
                Err(ErrorKind::UnexpectedTok)
            }
        }
        TokenKind::Dir(dir) => {
            if st.flags.contains(ExpectFlags::DIR) {
                handle_dir(*dir, st)
            } else {
                Err(ErrorKind::UnexpectedTok)
            }
        }
        TokenKind::Reg(reg) => {
            if st.flags.contains(ExpectFlags::REG) {
                handle_reg(*reg, st)
            } else {
                Err(ErrorKind::UnexpectedTok)
            }
        }
        TokenKind::Immed(v) => {
            if st.flags.contains(ExpectFlags::IMMED) {
                handle_immed(*v, st)
            } else {
                Err(ErrorKind::UnexpectedTok)
            }
        }
        TokenKind::String(s) => {
            if st.flags.contains(ExpectFlags::STRING) {
                handle_string(s, st);
                Ok(())
            } else {
                Err(ErrorKind::UnexpectedTok)
            }
        }
        TokenKind::Label(name) => {
            if st.flags.contains(ExpectFlags::LABEL) {
                handle_label(name, st);
                Ok(())
            } else {
                Err(ErrorKind::UnexpectedTok)
            }
        }
    }
}

fn is_reserved(name: &str) -> bool {
    crate::tables::lookup_op(name).is_some() || crate::tables::lookup_dir(name).is_some()
}

fn handle_labeldef(name: &str, st: &mut PState) -> Result<(), ErrorKind> {
    if name.len() > MAX_LABEL_LEN {
        return Err(ErrorKind::LongLabel);
    }
    if is_reserved(name) {
        return Err(ErrorKind::InvalLabel);
    }
    st.label = Some(name.to_string());
    st.flags = ExpectFlags::OP | ExpectFlags::DIR;
    Ok(())
}

fn handle_op(op: OpId, st: &mut PState) {
    st.building = Building::Op(match op.op_type() {
        OpType::R => OpBuilder::R { op, funct: op.funct(), rs: None, rt: None, rd: None },
        OpType::I => OpBuilder::I { op, rs: None, rt: None, immed: None, label: None },
        OpType::J => OpBuilder::J { op, reg_flag: false, reg_val: None, label: None },
    });
    st.flags = match op {
        OpId::La | OpId::Call => ExpectFlags::LABEL,
        OpId::Jmp => {
            st.reg_slot = Some(RegSlot::Rs);
            ExpectFlags::REG | ExpectFlags::LABEL
        }
        OpId::Stop => ExpectFlags::END,
        _ => {
            st.reg_slot = Some(RegSlot::Rs);
            ExpectFlags::REG
        }
    };
}

fn handle_dir(dir: Option<DirId>, st: &mut PState) -> Result<(), ErrorKind> {
    let dir = dir.ok_or(ErrorKind::InvalDir)?;
    st.flags = match dir {
        DirId::Asciz => {
            st.building = Building::Dir(DirBuilder::Single { dir, body: None });
            ExpectFlags::STRING
        }
        DirId::Entry | DirId::Extern => {
            st.building = Building::Dir(DirBuilder::Single { dir, body: None });
            ExpectFlags::LABEL
        }
        DirId::Db | DirId::Dh | DirId::Dw => {
            let width = dir.element_width().expect("array directive has a width");
            st.building = Building::Dir(DirBuilder::Array { dir, width, values: Vec::new() });
            ExpectFlags::IMMED
        }
    };
    Ok(())
}

/// R-type opcode `1` is the move family (`move`/`mvhi`/`mvlo`), a 2-operand
/// `rs, rd` encoding with the `rt` slot unused.
fn is_move_family(op: OpId) -> bool {
    op.opcode() == 1
}

fn handle_reg(reg: Result<u8, ()>, st: &mut PState) -> Result<(), ErrorKind> {
    let reg = reg.map_err(|_| ErrorKind::InvalReg)?;
    let Building::Op(builder) = &mut st.building else {
        return Err(ErrorKind::UnexpectedTok);
    };
    let op = builder.op();
    match builder {
        OpBuilder::J { reg_flag, reg_val, .. } => {
            *reg_flag = true;
            *reg_val = Some(reg);
            st.flags = ExpectFlags::END;
        }
        OpBuilder::R { rs, rt, rd, .. } => match st.reg_slot {
            Some(RegSlot::Rs) => {
                *rs = Some(reg);
                st.reg_slot = Some(if is_move_family(op) { RegSlot::Rd } else { RegSlot::Rt });
                st.flags = ExpectFlags::REG;
            }
            Some(RegSlot::Rt) => {
                *rt = Some(reg);
                if is_move_family(op) {
                    st.flags = ExpectFlags::END;
                } else {
                    st.reg_slot = Some(RegSlot::Rd);
                    st.flags = ExpectFlags::REG;
                }
            }
            Some(RegSlot::Rd) => {
                *rd = Some(reg);
                st.flags = ExpectFlags::END;
            }
            None => unreachable!("REG flag only set alongside a slot tag"),
        },
        OpBuilder::I { rs, rt, .. } => match st.reg_slot {
            Some(RegSlot::Rs) => {
                *rs = Some(reg);
                if op.is_branch() {
                    st.reg_slot = Some(RegSlot::Rt);
                    st.flags = ExpectFlags::REG;
                } else {
                    st.flags = ExpectFlags::IMMED;
                }
            }
            Some(RegSlot::Rt) => {
                *rt = Some(reg);
                if op.is_branch() {
                    st.flags = ExpectFlags::LABEL;
                } else {
                    st.flags = ExpectFlags::END;
                }
            }
            _ => unreachable!("I-type only ever fills Rs then Rt"),
        },
    }
    Ok(())
}

/// Immediates in operation context sit between `rs` and `rt` for the
/// memory/arith-immediate I-type family (`addi rs, imm, rt` in source
/// order) — after storing it, the state machine still expects the `rt`
/// register, mirroring the source's `EXP_REG | REG_RT` transition.
fn handle_immed(value: i64, st: &mut PState) -> Result<(), ErrorKind> {
    match &st.building {
        Building::Op(OpBuilder::I { .. }) => {
            let width = immed_width_for(st);
            check_signed_width(value, width)?;
            if let Building::Op(OpBuilder::I { immed, .. }) = &mut st.building {
                *immed = Some(value as i32);
            }
            st.reg_slot = Some(RegSlot::Rt);
            st.flags = ExpectFlags::REG;
            Ok(())
        }
        Building::Dir(DirBuilder::Array { width, .. }) => {
            check_signed_width(value, *width)?;
            if let Building::Dir(DirBuilder::Array { values, .. }) = &mut st.building {
                values.push(value);
            }
            st.flags = ExpectFlags::IMMED | ExpectFlags::END;
            Ok(())
        }
        _ => Err(ErrorKind::UnexpectedTok),
    }
}

fn immed_width_for(st: &PState) -> u32 {
    if let Building::Op(b) = &st.building {
        b.op().immediate_width().unwrap_or(2)
    } else {
        2
    }
}

fn check_signed_width(value: i64, width: u32) -> Result<(), ErrorKind> {
    let (lo, hi): (i64, i64) = match width {
        1 => (-128, 127),
        2 => (-32768, 32767),
        4 => (i32::MIN as i64, i32::MAX as i64),
        _ => (-32768, 32767),
    };
    if value < lo || value > hi {
        Err(ErrorKind::InvalImmed)
    } else {
        Ok(())
    }
}

fn handle_string(s: &str, st: &mut PState) {
    if let Building::Dir(DirBuilder::Single { body, .. }) = &mut st.building {
        *body = Some(SingleBody::Str(s.to_string()));
    }
    st.flags = ExpectFlags::END;
}

fn handle_label(name: &str, st: &mut PState) {
    match &mut st.building {
        Building::Op(OpBuilder::I { label, .. }) => *label = Some(name.to_string()),
        Building::Op(OpBuilder::J { label, .. }) => *label = Some(name.to_string()),
        Building::Dir(DirBuilder::Single { body, .. }) => {
            *body = Some(SingleBody::Label(name.to_string()));
        }
        _ => {}
    }
    st.flags = ExpectFlags::END;
}
