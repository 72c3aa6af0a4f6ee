use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::{
    memory::{Memory, Word},
    symbol::{Instruction, Opcode, Operand, SymbolTable},
};

lazy_static! {
    /// `[N.] [label,] mnemonic [operand] [# comment]`, case-insensitive.
    /// A label is a whole token ending in a comma. Longer mnemonics are listed before their
    /// prefixes.
    static ref LINE: Regex = Regex::new(
        r"(?xi)
        ^\s*
        (?:(?P<num>\d+)\.\s*)?
        (?:(?P<label>[a-z_][a-z0-9_]*),\s+)?
        (?P<op>add|sub|mlt|div|set|neg|inc|dec|lda|sta|brp|brz|bri|brs|br|hlt|noop)
        (?:\s+(?P<arg>\d+|[a-z_][a-z0-9_]*))?
        \s*(?:\#.*)?$"
    )
    .expect("line grammar should compile");
}

/// What happened while loading a source.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct LoadReport {
    /// Instructions written to memory
    pub loaded: usize,
    /// 1-based source lines that did not match the grammar (blank and `#` lines excluded)
    pub skipped: Vec<usize>,
    /// Operands naming no label, with the 1-based source line they appear on
    pub unresolved: Vec<(usize, String)>,
    /// Integer operands too large to be an address, with their source line
    pub out_of_range: Vec<(usize, String)>,
}

/// One source line that matched the grammar.
struct Line<'a> {
    /// 1-based source line
    src_line: usize,
    label: Option<&'a str>,
    op: Opcode,
    arg: Option<&'a str>,
}

impl<'a> Line<'a> {
    fn from_captures(src_line: usize, caps: Captures<'a>) -> Option<Self> {
        let op = caps.name("op")?.as_str().parse().ok()?;
        Some(Line {
            src_line,
            label: caps.name("label").map(|m| m.as_str()),
            op,
            arg: caps.name("arg").map(|m| m.as_str()),
        })
    }
}

/// Two-pass assembler. Labels are collected before any instruction is emitted, so forward
/// references resolve.
pub struct AsmParser<'a> {
    lines: Vec<Line<'a>>,
    skipped: Vec<usize>,
}

impl<'a> AsmParser<'a> {
    pub fn new(src: &'a str) -> Self {
        let mut lines = Vec::new();
        let mut skipped = Vec::new();
        for (idx, text) in src.lines().enumerate() {
            let trimmed = text.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            match LINE.captures(text).and_then(|c| Line::from_captures(idx + 1, c)) {
                Some(line) => lines.push(line),
                None => skipped.push(idx + 1),
            }
        }
        AsmParser { lines, skipped }
    }

    /// Reset `symbols` and `memory` then fill them from the source.
    pub fn load_into(self, memory: &mut Memory, symbols: &mut SymbolTable) -> LoadReport {
        symbols.reset();
        memory.clear();

        // Pass 1: labels, numbered by matching instruction from 1
        for (idx, line) in self.lines.iter().enumerate() {
            if let Some(label) = line.label {
                symbols.define(label, idx + 1);
            }
        }

        // Pass 2: instructions from address 1
        let mut unresolved = Vec::new();
        let mut out_of_range = Vec::new();
        for line in &self.lines {
            let operand = line.arg.map(|arg| match arg.parse::<usize>() {
                Ok(n) => Operand::Literal(n),
                Err(_) if arg.bytes().all(|b| b.is_ascii_digit()) => {
                    out_of_range.push((line.src_line, arg.to_string()));
                    Operand::OutOfRange(arg.to_string())
                }
                Err(_) => match symbols.get(arg) {
                    Some(addr) => Operand::Literal(addr),
                    None => {
                        unresolved.push((line.src_line, arg.to_string()));
                        Operand::Label(arg.to_string())
                    }
                },
            });
            memory.push(Word::Instr(Instruction::new(line.op, operand)));
        }

        LoadReport {
            loaded: self.lines.len(),
            skipped: self.skipped,
            unresolved,
            out_of_range,
        }
    }

    /// Assemble into a fresh image and table.
    pub fn assemble(self) -> (Memory, SymbolTable, LoadReport) {
        let mut memory = Memory::new();
        let mut symbols = SymbolTable::new();
        let report = self.load_into(&mut memory, &mut symbols);
        (memory, symbols, report)
    }
}
