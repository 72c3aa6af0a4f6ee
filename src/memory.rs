use std::fmt;

use crate::{error::FaultKind, symbol::Instruction};

/// Highest address a program may write to. Reads above it see the placeholder.
pub const MAX_ADDR: usize = 0xF_FFFF;

/// Contents of a memory cell or of the accumulator.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub enum Word {
    /// Placeholder for anything never written, printed as `?`
    #[default]
    Unset,
    Instr(Instruction),
    Int(i64),
    /// Raw console token, coerced lazily by arithmetic
    Text(String),
}

impl Word {
    /// Integer view of the word. Text is parsed after trimming.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Word::Int(n) => Some(*n),
            Word::Text(s) => s.trim().parse().ok(),
            Word::Unset | Word::Instr(_) => None,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Word::Unset)
    }
}

impl From<i64> for Word {
    fn from(value: i64) -> Self {
        Word::Int(value)
    }
}

impl From<Instruction> for Word {
    fn from(value: Instruction) -> Self {
        Word::Instr(value)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Word::Unset => f.write_str("?"),
            Word::Instr(instr) => write!(f, "{instr}"),
            Word::Int(n) => write!(f, "{n}"),
            Word::Text(s) => f.write_str(s),
        }
    }
}

/// Growable, 1-indexed memory image. Index 0 is always a placeholder.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Memory {
    cells: Vec<Word>,
}

impl Memory {
    pub fn new() -> Self {
        Memory {
            cells: vec![Word::Unset],
        }
    }

    /// Empty the image back to the lone placeholder at index 0.
    pub fn clear(&mut self) {
        self.cells.truncate(1);
        self.cells[0] = Word::Unset;
    }

    /// Cell at `addr`, or the placeholder when out of range.
    pub fn get(&self, addr: usize) -> &Word {
        static UNSET: Word = Word::Unset;
        self.cells.get(addr).unwrap_or(&UNSET)
    }

    /// Store at `addr`, padding with placeholders up to it. Never shrinks.
    pub fn set(&mut self, addr: usize, word: Word) -> Result<(), FaultKind> {
        if addr > MAX_ADDR {
            return Err(FaultKind::AddressOutOfRange(addr.to_string()));
        }
        if addr >= self.cells.len() {
            self.cells.resize(addr + 1, Word::Unset);
        }
        self.cells[addr] = word;
        Ok(())
    }

    /// Append after the current end, returning the new address.
    pub fn push(&mut self, word: Word) -> usize {
        self.cells.push(word);
        self.cells.len() - 1
    }

    /// Number of cells, including the placeholder at 0.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Word)> {
        self.cells.iter().enumerate()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn starts_with_placeholder() {
        let mem = Memory::new();
        assert_eq!(mem.len(), 1);
        assert!(mem.get(0).is_unset());
    }

    #[test]
    fn out_of_range_reads_placeholder() {
        let mem = Memory::new();
        assert_eq!(mem.get(500), &Word::Unset);
        assert_eq!(mem.len(), 1);
    }

    #[test]
    fn write_past_end_grows() {
        let mut mem = Memory::new();
        mem.push(Word::Int(1));
        mem.set(6, Word::Int(42)).unwrap();
        assert_eq!(mem.len(), 7);
        assert_eq!(mem.get(1), &Word::Int(1));
        for addr in 2..6 {
            assert!(mem.get(addr).is_unset());
        }
        assert_eq!(mem.get(6), &Word::Int(42));

        // Writing inside the image never truncates
        mem.set(3, Word::Int(3)).unwrap();
        assert_eq!(mem.len(), 7);
    }

    #[test]
    fn clear_keeps_index_zero() {
        let mut mem = Memory::new();
        mem.set(10, Word::Int(5)).unwrap();
        mem.clear();
        assert_eq!(mem, Memory::new());
    }

    #[test]
    fn write_above_address_space_faults() {
        let mut mem = Memory::new();
        for addr in [MAX_ADDR + 1, usize::MAX - 1, usize::MAX] {
            assert_eq!(
                mem.set(addr, Word::Int(1)),
                Err(FaultKind::AddressOutOfRange(addr.to_string()))
            );
        }
        assert_eq!(mem.len(), 1);
    }

    #[test]
    fn coercion() {
        assert_eq!(Word::Int(-3).as_int(), Some(-3));
        assert_eq!(Word::Text(" 12\n".into()).as_int(), Some(12));
        assert_eq!(Word::Text("-7".into()).as_int(), Some(-7));
        assert_eq!(Word::Text("abc".into()).as_int(), None);
        assert_eq!(Word::Unset.as_int(), None);
        assert_eq!(Word::Unset.to_string(), "?");
    }
}
