//! Static mnemonic and directive tables.
//!
//! Keyed by name, closed and known at build time — matches against these
//! tables are how the tokenizer tells an operation mnemonic or a directive
//! apart from a label. Both tables are sorted by name so lookup is a binary
//! search, same approach as a C implementation would use `bsearch` over a
//! sorted array.

/// One of the 27 operation mnemonics.
///
/// The low 6 bits of the discriminant are the machine opcode; for R-type
/// operations, the bits above that are the funct. This mirrors the `(funct
/// << 6) | opcode` packing of the source language: [`OpId::opcode`] and
/// [`OpId::funct`] just unpack it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpId {
    // R-type (opcode 0 or 1)
    Add,
    Sub,
    And,
    Or,
    Nor,
    Move,
    Mvhi,
    Mvlo,
    // I-type
    Addi,
    Subi,
    Andi,
    Ori,
    Nori,
    Bne,
    Beq,
    Blt,
    Bgt,
    Lb,
    Sb,
    Lw,
    Sw,
    Lh,
    Sh,
    // J-type
    Jmp,
    La,
    Call,
    Stop,
}

/// The three instruction formats, distinguished by opcode range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpType {
    R,
    I,
    J,
}

impl OpId {
    const FUNCT_SHIFT: u32 = 6;

    /// Low 6 bits of the packed `(funct << 6) | opcode` encoding.
    pub fn opcode(self) -> u32 {
        use OpId::*;
        match self {
            Add | Sub | And | Or | Nor => 0,
            Move | Mvhi | Mvlo => 1,
            Addi => 10,
            Subi => 11,
            Andi => 12,
            Ori => 13,
            Nori => 14,
            Bne => 15,
            Beq => 16,
            Blt => 17,
            Bgt => 18,
            Lb => 19,
            Sb => 20,
            Lw => 21,
            Sw => 22,
            Lh => 23,
            Sh => 24,
            Jmp => 30,
            La => 31,
            Call => 32,
            Stop => 63,
        }
    }

    /// funct field, meaningful only for R-type operations.
    pub fn funct(self) -> u32 {
        use OpId::*;
        match self {
            Add | Move => 1,
            Sub | Mvhi => 2,
            And | Mvlo => 3,
            Or => 4,
            Nor => 5,
            _ => 0,
        }
    }

    pub fn op_type(self) -> OpType {
        let opcode = self.opcode();
        if opcode == 0 || opcode == 1 {
            OpType::R
        } else if opcode > 24 {
            OpType::J
        } else {
            OpType::I
        }
    }

    /// `true` for BNE/BEQ/BLT/BGT — opcodes 15..18.
    pub fn is_branch(self) -> bool {
        matches!(self, OpId::Bne | OpId::Beq | OpId::Blt | OpId::Bgt)
    }

    /// Width in bytes of the operand-context immediate bounds check. Only
    /// the byte load/store family is tighter than the default: the encoded
    /// immediate field is 16 bits regardless of load/store width (see
    /// §6.3's bit layout), so `lw`/`sw`/`lh`/`sh` all get the same 16-bit
    /// bound as arithmetic-immediate ops; `None` means "use the 16-bit
    /// default".
    pub fn immediate_width(self) -> Option<u32> {
        match self {
            OpId::Lb | OpId::Sb => Some(1),
            _ => None,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        OPERATIONS
            .iter()
            .find(|(_, id)| *id == self)
            .map(|(name, _)| *name)
            .expect("every OpId has a table entry")
    }
}

/// Sorted for binary search, mirroring the source's `operations[]` array.
const OPERATIONS: &[(&str, OpId)] = &[
    ("add", OpId::Add),
    ("addi", OpId::Addi),
    ("and", OpId::And),
    ("andi", OpId::Andi),
    ("beq", OpId::Beq),
    ("bgt", OpId::Bgt),
    ("blt", OpId::Blt),
    ("bne", OpId::Bne),
    ("call", OpId::Call),
    ("jmp", OpId::Jmp),
    ("la", OpId::La),
    ("lb", OpId::Lb),
    ("lh", OpId::Lh),
    ("lw", OpId::Lw),
    ("move", OpId::Move),
    ("mvhi", OpId::Mvhi),
    ("mvlo", OpId::Mvlo),
    ("nor", OpId::Nor),
    ("nori", OpId::Nori),
    ("or", OpId::Or),
    ("ori", OpId::Ori),
    ("sb", OpId::Sb),
    ("sh", OpId::Sh),
    ("stop", OpId::Stop),
    ("sub", OpId::Sub),
    ("subi", OpId::Subi),
    ("sw", OpId::Sw),
];

/// Binary-searches the operations table. `name` must already be lowercase;
/// mnemonics in this language are case-sensitive lowercase words.
pub fn lookup_op(name: &str) -> Option<OpId> {
    OPERATIONS
        .binary_search_by_key(&name, |(n, _)| n)
        .ok()
        .map(|i| OPERATIONS[i].1)
}

/// A directive keyword. A term that starts with `.` but doesn't match one of
/// these is unrecognized — [`lookup_dir`] reports that with `None` rather
/// than a variant of this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirId {
    Db,
    Dw,
    Dh,
    Asciz,
    Entry,
    Extern,
}

impl DirId {
    /// Byte width of one array element for `.db`/`.dh`/`.dw`; `None` for the
    /// string/label directives.
    pub fn element_width(self) -> Option<u32> {
        match self {
            DirId::Db => Some(1),
            DirId::Dh => Some(2),
            DirId::Dw => Some(4),
            _ => None,
        }
    }
}

/// Sorted for binary search, mirroring the source's `directives[]` array.
const DIRECTIVES: &[(&str, DirId)] = &[
    ("asciz", DirId::Asciz),
    ("db", DirId::Db),
    ("dh", DirId::Dh),
    ("dw", DirId::Dw),
    ("entry", DirId::Entry),
    ("extern", DirId::Extern),
];

/// Looks up a directive name with the leading `.` already stripped.
pub fn lookup_dir(name: &str) -> Option<DirId> {
    DIRECTIVES
        .binary_search_by_key(&name, |(n, _)| n)
        .ok()
        .map(|i| DIRECTIVES[i].1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operations_table_is_sorted() {
        let mut sorted = OPERATIONS.to_vec();
        sorted.sort_by_key(|(n, _)| *n);
        assert_eq!(OPERATIONS, sorted.as_slice());
    }

    #[test]
    fn directives_table_is_sorted() {
        let mut sorted = DIRECTIVES.to_vec();
        sorted.sort_by_key(|(n, _)| *n);
        assert_eq!(DIRECTIVES, sorted.as_slice());
    }

    #[test]
    fn lookup_op_finds_every_mnemonic() {
        for (name, id) in OPERATIONS {
            assert_eq!(lookup_op(name), Some(*id));
        }
        assert_eq!(lookup_op("nope"), None);
    }

    #[test]
    fn lookup_dir_strips_no_dot() {
        assert_eq!(lookup_dir("asciz"), Some(DirId::Asciz));
        assert_eq!(lookup_dir(".asciz"), None);
    }

    #[test]
    fn opcode_categorization_matches_spec() {
        assert_eq!(OpId::Add.op_type(), OpType::R);
        assert_eq!(OpId::Move.op_type(), OpType::R);
        assert_eq!(OpId::Addi.op_type(), OpType::I);
        assert_eq!(OpId::Sh.op_type(), OpType::I);
        assert_eq!(OpId::Jmp.op_type(), OpType::J);
        assert_eq!(OpId::Stop.op_type(), OpType::J);
        assert!(OpId::Bne.is_branch());
        assert!(OpId::Bgt.is_branch());
        assert!(!OpId::Beq.op_type().eq(&OpType::J));
    }

    #[test]
    fn add_encoding_matches_worked_example() {
        // MAIN: add $1, $2, $3 -> (1<<6)|(3<<11)|(2<<16)|(1<<21)|(0<<26) = 0x00224840
        let word = (OpId::Add.funct() << 6)
            | (3 << 11)
            | (2 << 16)
            | (1 << 21)
            | (OpId::Add.opcode() << 26);
        assert_eq!(word, 0x0022_4840);
    }
}
