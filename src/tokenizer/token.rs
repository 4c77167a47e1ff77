//! Token kinds produced by [`super::Tokenizer`].

use crate::tables::{DirId, OpId};

/// One lexical token together with the index of the term it came from,
/// counting whitespace/comma-separated terms from the start of the line.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub index: usize,
}

impl Token {
    pub fn new(kind: TokenKind, index: usize) -> Self {
        Self { kind, index }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Term didn't match any recognized shape.
    Err,
    /// An empty term — a trailing comma in an array, for instance.
    Empty,
    /// No more terms on this line.
    End,
    /// A term whose first character is `;`.
    Comment,
    /// `name:` — an alphabetic-leading alphanumeric identifier ending in `:`.
    LabelDef(String),
    /// An identifier, without the trailing colon.
    Label(String),
    Op(OpId),
    /// `dir_id` is `None` when the term starts with `.` but doesn't name a
    /// recognized directive.
    Dir(Option<DirId>),
    /// `Ok(n)` for `$0..$31`; `Err(())` marks a `$`-prefixed term whose
    /// number falls outside that range (still consumed as a register term,
    /// just an invalid one — this distinction is what lets the parser raise
    /// `INVAL_REG` instead of treating the term as unrecognized).
    Reg(Result<u8, ()>),
    Immed(i64),
    /// Payload with the surrounding quotes already stripped.
    String(String),
}
