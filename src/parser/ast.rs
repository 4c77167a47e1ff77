//! The structured forms the parser builds: one [`Statement`] per source line.

use bitflags::bitflags;

use crate::tables::{DirId, OpId};

bitflags! {
    /// Which token kinds the state machine will accept next.
    ///
    /// This is *only* about token kind — which register operand slot a
    /// `Reg` token fills is tracked separately by [`RegSlot`], since the two
    /// concerns vary independently (the source language one-hot-encoded
    /// them together as a single flag word).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ExpectFlags: u16 {
        const LABEL_DEF = 1 << 0;
        const COMMENT   = 1 << 1;
        const END       = 1 << 2;
        const OP        = 1 << 3;
        const DIR       = 1 << 4;
        const REG       = 1 << 5;
        const IMMED     = 1 << 6;
        const STRING    = 1 << 7;
        const LABEL     = 1 << 8;
    }
}

impl ExpectFlags {
    pub const INITIAL: ExpectFlags = ExpectFlags::LABEL_DEF
        .union(ExpectFlags::COMMENT)
        .union(ExpectFlags::END)
        .union(ExpectFlags::OP)
        .union(ExpectFlags::DIR);
}

/// Which register operand a `Reg` token currently fills. Orthogonal to
/// [`ExpectFlags`]: only meaningful while `ExpectFlags::REG` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegSlot {
    Rs,
    Rt,
    Rd,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub line_index: usize,
    pub label: Option<String>,
    pub kind: StatementKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    Error,
    Operation(OpInstruction),
    Directive(DirInstruction),
    Ignore,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OpInstruction {
    R { op: OpId, funct: u32, rs: u8, rt: u8, rd: u8 },
    I { op: OpId, rs: u8, rt: u8, immed: i32, label: Option<String> },
    J { op: OpId, reg_flag: bool, addr: u32, label: Option<String> },
}

impl OpInstruction {
    pub fn op(&self) -> OpId {
        match self {
            OpInstruction::R { op, .. } => *op,
            OpInstruction::I { op, .. } => *op,
            OpInstruction::J { op, .. } => *op,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DirInstruction {
    /// `.db`/`.dh`/`.dw` — `width` is the byte width of one element.
    Array { dir: DirId, width: u32, values: Vec<i64> },
    /// `.asciz`/`.entry`/`.extern`.
    Single { dir: DirId, body: SingleBody },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SingleBody {
    Str(String),
    Label(String),
}
