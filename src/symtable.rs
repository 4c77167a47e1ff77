//! Symbol table: dynamic name → (offset, attribute-set) mapping plus the
//! reference log the writer consumes for the `.ext` file.

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SymbolAttrs: u8 {
        /// This entry records a *use site*, not a definition.
        const REQUIRED = 1 << 0;
        const EXTERN   = 1 << 1;
        const ENTRY    = 1 << 2;
        const CODE     = 1 << 3;
        const DATA     = 1 << 4;
    }
}

/// A symbol-table entry: either a definition/declaration or (with
/// `REQUIRED` set) a use-site record logged by the scanner's second pass.
///
/// The source language sentinels an undefined `.entry` by negating the
/// declaration line number into the offset field. We keep the offset
/// meaningful only once the symbol is actually defined and track the
/// `.entry` declaration site in its own field instead — see
/// `Symbol::declared_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub offset: u32,
    pub attrs: SymbolAttrs,
    /// `true` once `offset` holds a real definition address.
    pub defined: bool,
    /// Line on which an `.entry`/`.extern` declaration (or a use-site
    /// reference) was recorded, for diagnostics that need to cite it.
    pub declared_at: usize,
}

impl Symbol {
    fn new(name: impl Into<String>, attrs: SymbolAttrs, declared_at: usize) -> Self {
        Self { name: name.into(), offset: 0, attrs, defined: false, declared_at }
    }
}

/// Append-only log of symbol definitions, declarations, and use-sites.
/// Mirrors the source's flat `symtable` array: no dedup on insert, linear
/// scan on lookup. Reinitialized per source file.
#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn insert(&mut self, symbol: Symbol) {
        self.entries.push(symbol);
    }

    pub fn declare(&mut self, name: impl Into<String>, attrs: SymbolAttrs, declared_at: usize) {
        self.insert(Symbol::new(name, attrs, declared_at));
    }

    /// Returns the first entry matching `name` whose `REQUIRED` attribute is
    /// not set — use-site records are deliberately skipped so lookups find
    /// definitions/declarations, never references.
    pub fn find(&self, name: &str) -> Option<&Symbol> {
        self.entries.iter().find(|s| !s.attrs.contains(SymbolAttrs::REQUIRED) && s.name == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.entries.iter_mut().find(|s| !s.attrs.contains(SymbolAttrs::REQUIRED) && s.name == name)
    }

    /// Stable insertion order, the order the writer emits symbols in.
    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.entries.iter()
    }
}
