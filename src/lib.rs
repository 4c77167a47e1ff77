//! # m32asm
//!
//! A two-pass assembler for a 32-bit MIPS-like instruction set.
//!
//! ## Pipeline
//!
//! One source file at a time, with no state surviving between files:
//!
//! 1. **Tokenizer** ([`tokenizer`]) — splits a line into context-sensitive tokens.
//! 2. **Parser** ([`parser`]) — drives an expectation-flag state machine into one
//!    [`parser::ast::Statement`] per line.
//! 3. **Scanner** ([`scanner`]) — two passes over the statement sequence: pass 1
//!    builds the symbol table and data image, pass 2 binds label references and
//!    encodes the instruction image.
//! 4. **Writer** ([`writer`]) — renders the `.ob`/`.ent`/`.ext` artifacts.
//!
//! [`assemble::assemble_file`] drives all four stages for one source path.
//!
//! ```rust,no_run
//! use m32asm::assemble::assemble_file;
//! use std::path::Path;
//!
//! let outcome = assemble_file(Path::new("prog.as")).unwrap();
//! for diag in &outcome.diagnostics {
//!     eprintln!("{diag}");
//! }
//! ```

pub mod assemble;
pub mod error;
pub mod parser;
pub mod scanner;
pub mod symtable;
pub mod tables;
pub mod tokenizer;
pub mod writer;
