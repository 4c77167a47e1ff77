//! Stateful, context-sensitive line tokenizer.
//!
//! A [`Tokenizer`] is primed with one line and then pulled via [`Tokenizer::next`]
//! until it yields [`TokenKind::End`]. Unlike the source language's tokenizer —
//! which kept its cursor and `expect` mode in static variables shared across
//! calls — this one owns both as fields, so nothing about it survives past the
//! value itself, and two lines can be tokenized concurrently without
//! interference.

mod token;

pub use token::{Token, TokenKind};

use crate::tables::{lookup_dir, lookup_op, DirId, OpId};

const WSPACE: &[char] = &[' ', '\x0c', '\n', '\r', '\t', '\x0b'];

/// What shape the next term must take, set by the previous token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExpectMode {
    Default,
    String,
    Array,
}

/// Tokenizes one source line. Create fresh per line with [`Tokenizer::new`].
pub struct Tokenizer<'a> {
    remaining: &'a str,
    /// Index of `remaining`'s start within the original line, for [`Token::index`].
    offset: usize,
    expect: ExpectMode,
}

impl<'a> Tokenizer<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { remaining: line, offset: 0, expect: ExpectMode::Default }
    }

    /// Pulls the next token. Returns `TokenKind::End` forever once the line
    /// is exhausted.
    pub fn next(&mut self) -> Token {
        let (term, index) = match self.next_term() {
            Some((term, index)) => (term, index),
            None => return Token::new(TokenKind::End, self.offset),
        };
        let kind = self.classify(term);
        Token::new(kind, index)
    }

    fn next_term(&mut self) -> Option<(&'a str, usize)> {
        match self.expect {
            ExpectMode::Default => self.next_default_term(),
            ExpectMode::String => self.next_string_term(),
            ExpectMode::Array => self.next_array_term(),
        }
    }

    fn next_default_term(&mut self) -> Option<(&'a str, usize)> {
        let trimmed_start = self.remaining.trim_start_matches(WSPACE);
        self.offset += self.remaining.len() - trimmed_start.len();
        if trimmed_start.is_empty() {
            self.remaining = trimmed_start;
            return None;
        }
        let end = trimmed_start.find(WSPACE).unwrap_or(trimmed_start.len());
        let term = &trimmed_start[..end];
        let term_index = self.offset;
        self.offset += end;
        self.remaining = &trimmed_start[end..];
        Some((term, term_index))
    }

    fn next_string_term(&mut self) -> Option<(&'a str, usize)> {
        let trimmed_start = self.remaining.trim_start_matches(WSPACE);
        self.offset += self.remaining.len() - trimmed_start.len();
        self.remaining = trimmed_start;
        if !trimmed_start.starts_with('"') {
            return None;
        }
        let bytes = trimmed_start.as_bytes();
        let mut close = None;
        let mut i = bytes.len();
        while i > 1 {
            i -= 1;
            if bytes[i] == b'"' {
                close = Some(i);
                break;
            }
        }
        let close = close?;
        let rest = &trimmed_start[close + 1..];
        if !rest.chars().all(|c| WSPACE.contains(&c)) {
            return None;
        }
        let term = &trimmed_start[..=close];
        let term_index = self.offset;
        self.offset = self.offset + trimmed_start.len();
        self.remaining = "";
        self.expect = ExpectMode::Default;
        Some((term, term_index))
    }

    fn next_array_term(&mut self) -> Option<(&'a str, usize)> {
        let trimmed_start = self.remaining.trim_start_matches(WSPACE);
        self.offset += self.remaining.len() - trimmed_start.len();
        if trimmed_start.is_empty() {
            self.expect = ExpectMode::Default;
            self.remaining = trimmed_start;
            let term_index = self.offset;
            return Some(("", term_index));
        }
        let term_index = self.offset;
        match trimmed_start.find(',') {
            Some(comma) => {
                let term = trimmed_start[..comma].trim_matches(WSPACE);
                self.offset += comma + 1;
                self.remaining = &trimmed_start[comma + 1..];
                Some((term, term_index))
            }
            None => {
                self.expect = ExpectMode::Default;
                self.offset += trimmed_start.len();
                self.remaining = "";
                Some((trimmed_start, term_index))
            }
        }
    }

    fn classify(&mut self, term: &str) -> TokenKind {
        if term.is_empty() {
            return TokenKind::Empty;
        }
        if term.starts_with(';') {
            return TokenKind::Comment;
        }
        if let Some(op) = lookup_op(term) {
            if op != OpId::Stop {
                self.expect = ExpectMode::Array;
            }
            return TokenKind::Op(op);
        }
        if let Some(rest) = term.strip_prefix('.') {
            return match lookup_dir(rest) {
                Some(dir) => {
                    match dir {
                        DirId::Asciz => self.expect = ExpectMode::String,
                        DirId::Db | DirId::Dh | DirId::Dw => self.expect = ExpectMode::Array,
                        _ => {}
                    }
                    TokenKind::Dir(Some(dir))
                }
                None => TokenKind::Dir(None),
            };
        }
        if let Some(reg) = parse_reg_term(term) {
            return TokenKind::Reg(reg);
        }
        if let Ok(immed) = term.parse::<i64>() {
            return TokenKind::Immed(immed);
        }
        if is_string(term) {
            return TokenKind::String(term[1..term.len() - 1].to_string());
        }
        if is_labeldef(term) {
            return TokenKind::LabelDef(term[..term.len() - 1].to_string());
        }
        if is_label(term) {
            return TokenKind::Label(term.to_string());
        }
        TokenKind::Err
    }
}

/// `$N` register terms. `None` when `term` doesn't start with `$` at all —
/// not register-shaped, so the caller should keep trying other kinds.
/// `Some(Err(()))` when it's `$`-prefixed but the digits don't name a valid
/// `0..=31` register (wrong digit count, leading zero on two digits, or
/// non-digit payload).
fn parse_reg_term(term: &str) -> Option<Result<u8, ()>> {
    let digits = term.strip_prefix('$')?;
    let value = match digits.len() {
        1 => digits.bytes().next().filter(u8::is_ascii_digit).map(|b| (b - b'0') as u32),
        2 => {
            let bytes = digits.as_bytes();
            if bytes[0] == b'0' || !bytes[0].is_ascii_digit() || !bytes[1].is_ascii_digit() {
                None
            } else {
                Some((bytes[0] - b'0') as u32 * 10 + (bytes[1] - b'0') as u32)
            }
        }
        _ => None,
    };
    match value {
        Some(v) if v <= 31 => Some(Ok(v as u8)),
        _ => Some(Err(())),
    }
}

fn is_string(term: &str) -> bool {
    let bytes = term.as_bytes();
    bytes.len() >= 2
        && bytes[0] == b'"'
        && bytes[bytes.len() - 1] == b'"'
        && term.bytes().all(|b| b.is_ascii_graphic() || b == b' ')
}

fn is_label(term: &str) -> bool {
    let mut chars = term.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric())
}

fn is_labeldef(term: &str) -> bool {
    match term.strip_suffix(':') {
        Some(body) => !body.is_empty() && is_label(body),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pulls tokens the way the parser does: stop at `End` *or* `Comment`,
    /// since a comment terminates the statement without the tokenizer's
    /// cooperation.
    fn tokens(line: &str) -> Vec<TokenKind> {
        let mut tok = Tokenizer::new(line);
        let mut out = Vec::new();
        loop {
            let t = tok.next();
            let stop = matches!(t.kind, TokenKind::End | TokenKind::Comment);
            out.push(t.kind);
            if stop {
                break;
            }
        }
        out
    }

    #[test]
    fn label_def_then_op_then_registers() {
        let kinds = tokens("MAIN: add $1, $2, $3");
        assert_eq!(
            kinds,
            vec![
                TokenKind::LabelDef("MAIN".into()),
                TokenKind::Op(OpId::Add),
                TokenKind::Reg(Ok(1)),
                TokenKind::Reg(Ok(2)),
                TokenKind::Reg(Ok(3)),
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn out_of_range_register_is_tagged_not_unrecognized() {
        let kinds = tokens("add $32, $1, $1");
        assert_eq!(kinds[1], TokenKind::Reg(Err(())));
    }

    #[test]
    fn asciz_string_then_end() {
        let kinds = tokens(r#".asciz "hi there""#);
        assert_eq!(
            kinds,
            vec![
                TokenKind::Dir(Some(DirId::Asciz)),
                TokenKind::String("hi there".into()),
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn string_last_quote_rule_keeps_embedded_quote_inside() {
        // last-quote rule: the span runs to the final `"` on the line.
        let kinds = tokens(r#".asciz "a"b""#);
        assert_eq!(kinds[1], TokenKind::String(r#"a"b"#.into()));
    }

    #[test]
    fn db_array_of_immediates() {
        let kinds = tokens(".db 1, 2, 3");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Dir(Some(DirId::Db)),
                TokenKind::Immed(1),
                TokenKind::Immed(2),
                TokenKind::Immed(3),
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn trailing_comma_yields_empty_before_end() {
        let kinds = tokens(".db 1,");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Dir(Some(DirId::Db)),
                TokenKind::Immed(1),
                TokenKind::Empty,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn invalid_directive_is_tagged() {
        let kinds = tokens(".nope X");
        assert_eq!(kinds[0], TokenKind::Dir(None));
    }

    #[test]
    fn comment_line() {
        let kinds = tokens("; a whole comment");
        assert_eq!(kinds, vec![TokenKind::Comment]);
    }

    #[test]
    fn bare_label_without_colon() {
        let kinds = tokens("jmp LOOP");
        assert_eq!(kinds[1], TokenKind::Label("LOOP".into()));
    }
}
