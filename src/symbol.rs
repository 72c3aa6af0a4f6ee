use std::{fmt, str::FromStr};

use fxhash::FxBuildHasher;
use indexmap::IndexMap;

type FxMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Labels that every symbol table starts with. Both alias the console.
pub const RESERVED: [(&str, usize); 2] = [("stdin", 0), ("stdout", 0)];

/// Symbol table of label -> memory address (instruction number).
/// Keys are stored lowercase, lookups are case-insensitive.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SymbolTable {
    table: FxMap<String, usize>,
}

impl SymbolTable {
    /// Fresh table holding only the reserved console labels.
    pub fn new() -> Self {
        let mut table = FxMap::with_hasher(FxBuildHasher::default());
        for (name, addr) in RESERVED {
            table.insert(name.to_string(), addr);
        }
        SymbolTable { table }
    }

    /// Drop every user label, keeping the reserved seed.
    pub fn reset(&mut self) {
        *self = SymbolTable::new();
    }

    /// Register a label. Redefinition keeps the latest address.
    pub fn define(&mut self, label: &str, addr: usize) -> Option<usize> {
        self.table.insert(label.to_ascii_lowercase(), addr)
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.table.get(&label.to_ascii_lowercase()).copied()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    /// Entries in definition order, reserved labels first.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.table.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Every operation the machine understands.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Opcode {
    Add,
    Sub,
    Mlt,
    Div,
    Set,
    Neg,
    Inc,
    Dec,
    Lda,
    Sta,
    /// Unconditional
    Br,
    /// ACC > 0
    Brp,
    /// ACC == 0
    Brz,
    /// Indirect, through memory
    Bri,
    /// Subroutine call, return address stored at target
    Brs,
    Hlt,
    Noop,
}

impl Opcode {
    pub const ALL: [Opcode; 17] = [
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mlt,
        Opcode::Div,
        Opcode::Set,
        Opcode::Neg,
        Opcode::Inc,
        Opcode::Dec,
        Opcode::Lda,
        Opcode::Sta,
        Opcode::Br,
        Opcode::Brp,
        Opcode::Brz,
        Opcode::Bri,
        Opcode::Brs,
        Opcode::Hlt,
        Opcode::Noop,
    ];

    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mlt => "mlt",
            Opcode::Div => "div",
            Opcode::Set => "set",
            Opcode::Neg => "neg",
            Opcode::Inc => "inc",
            Opcode::Dec => "dec",
            Opcode::Lda => "lda",
            Opcode::Sta => "sta",
            Opcode::Br => "br",
            Opcode::Brp => "brp",
            Opcode::Brz => "brz",
            Opcode::Bri => "bri",
            Opcode::Brs => "brs",
            Opcode::Hlt => "hlt",
            Opcode::Noop => "noop",
        }
    }
}

impl FromStr for Opcode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.to_ascii_lowercase();
        Opcode::ALL
            .into_iter()
            .find(|op| op.mnemonic() == s)
            .ok_or(())
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Instruction operand as it was written, after load-time label substitution.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Operand {
    /// Unsigned integer literal, or a label already replaced by its address
    Literal(usize),
    /// Identifier that was not a known label at load time
    Label(String),
    /// Digits too large to be an address, kept as written
    OutOfRange(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(n) => write!(f, "{n}"),
            Operand::Label(name) | Operand::OutOfRange(name) => f.write_str(name),
        }
    }
}

/// A decoded instruction. Immutable once loaded.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Instruction {
    pub op: Opcode,
    pub operand: Option<Operand>,
}

impl Instruction {
    pub fn new(op: Opcode, operand: Option<Operand>) -> Self {
        Instruction { op, operand }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operand {
            Some(operand) => write!(f, "{} {}", self.op, operand),
            None => write!(f, "{}", self.op),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn seeded_with_console_labels() {
        let table = SymbolTable::new();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("stdin"), Some(0));
        assert_eq!(table.get("STDOUT"), Some(0));
    }

    #[test]
    fn lookup_ignores_case() {
        let mut table = SymbolTable::new();
        table.define("Loop", 4);
        assert_eq!(table.get("loop"), Some(4));
        assert_eq!(table.get("LOOP"), Some(4));
        assert!(!table.contains("loops"));
    }

    #[test]
    fn reset_keeps_only_seed() {
        let mut table = SymbolTable::new();
        table.define("a", 1);
        table.define("stdin", 9);
        table.reset();
        assert_eq!(table, SymbolTable::new());
    }

    #[test]
    fn opcode_names() {
        for op in Opcode::ALL {
            assert_eq!(op.mnemonic().parse::<Opcode>(), Ok(op));
        }
        assert_eq!("BRZ".parse::<Opcode>(), Ok(Opcode::Brz));
        assert!("jmp".parse::<Opcode>().is_err());
    }
}
