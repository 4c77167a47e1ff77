//! Diagnostic types shared by every pipeline stage.
//!
//! Every stage — tokenizer, parser, scanner — reports failures as an
//! [`AsmError`] tagged with an [`ErrorKind`]. `ErrorKind::is_warning` tells
//! the caller whether the diagnostic should suppress output generation
//! (hard errors) or merely be reported (warnings).

use thiserror::Error;

/// Anchors a diagnostic to a source line and, where known, the index of the
/// offending term within that line. The source grammar here is line
/// oriented, so a byte-offset span isn't needed — every diagnostic already
/// knows which line it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub col: Option<usize>,
}

impl Span {
    pub fn line(line: usize) -> Self {
        Self { line, col: None }
    }

    pub fn at(line: usize, col: usize) -> Self {
        Self { line, col: Some(col) }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    // ----- lexical/syntax: abort the current line's statement, not the file -----
    #[error("unknown token")]
    UnknownTok,
    #[error("unexpected token")]
    UnexpectedTok,
    #[error("unexpected end of line")]
    UnexpectedEol,
    #[error("unrecognized directive")]
    InvalDir,
    #[error("invalid register")]
    InvalReg,
    #[error("numeric literal out of bounds")]
    InvalImmed,
    #[error("label name is a reserved word")]
    InvalLabel,
    #[error("label name exceeds character limit")]
    LongLabel,
    #[error("line exceeds character limit")]
    LongLine,

    // ----- semantic: detected by the scanner passes, accumulated -----
    #[error("reference to undefined label")]
    LabelUndefined,
    #[error("label defined as both external and an entry")]
    LabelScopeMismatch,
    #[error("label declared external but defined in file")]
    LabelExtDef,
    #[error("label defined more than once")]
    LabelDoubleDef,
    #[error("expected a data symbol")]
    LabelExpData,
    #[error("expected a code label")]
    LabelExpCode,
    #[error("label declared entry but not defined in file")]
    LabelEntUndef,
    #[error("external label operand to branch operation")]
    LabelUnexpExt,

    // ----- warnings: reported but never set the hard-error flag -----
    #[error("attempted jump to data symbol")]
    LabelJmp2Data,
    #[error("redundant label on .entry/.extern declaration")]
    RedundantEntryExternLabel,
}

impl ErrorKind {
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            ErrorKind::LabelJmp2Data | ErrorKind::RedundantEntryExternLabel
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsmError {
    pub kind: ErrorKind,
    pub span: Span,
    /// The offending line's own text, kept for the caret printout. `None`
    /// for diagnostics raised once per file after statements have already
    /// been discarded (e.g. an undefined `.entry` reported at end of pass 2).
    pub line_text: Option<String>,
}

impl AsmError {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        Self { kind, span, line_text: None }
    }

    pub fn with_line(mut self, line_text: impl Into<String>) -> Self {
        self.line_text = Some(line_text.into());
        self
    }

    pub fn is_warning(&self) -> bool {
        self.kind.is_warning()
    }
}

impl std::fmt::Display for AsmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:", self.span.line)?;
        if let Some(col) = self.span.col {
            write!(f, "{}:", col)?;
        }
        write!(
            f,
            " {}: {}",
            if self.kind.is_warning() { "warning" } else { "error" },
            self.kind
        )?;
        if let Some(line) = &self.line_text {
            write!(f, "\n{:>4} | {}", self.span.line, line)?;
            if let Some(col) = self.span.col {
                write!(f, "\n     | {}^", " ".repeat(col))?;
            }
        }
        Ok(())
    }
}
