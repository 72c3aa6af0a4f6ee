use std::fmt;

use crate::{
    console::Console,
    error::{Fault, FaultKind},
    memory::{Memory, Word},
    parser::{AsmParser, LoadReport},
    symbol::{Instruction, Opcode, Operand, SymbolTable},
    vprintln,
};

/// Address of the first instruction, and the PC every run starts from.
pub const ENTRY: usize = 1;

/// The five machine registers. `pc == 0` means halted.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Registers {
    /// Program counter, next address to fetch
    pub pc: usize,
    /// Address register, `None` until the first memory access of a run
    pub ar: Option<usize>,
    /// Instruction register
    pub ir: Word,
    /// Accumulator
    pub acc: Word,
    /// Operand scratch register
    pub b: Word,
}

impl Default for Registers {
    fn default() -> Self {
        Registers {
            pc: ENTRY,
            ar: None,
            ir: Word::Unset,
            acc: Word::Unset,
            b: Word::Unset,
        }
    }
}

/// Outcome of a single cycle.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Step {
    Continue,
    Halted,
}

/// Normal end of a run.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Halt {
    /// Instructions executed, including the final `hlt`
    pub steps: u64,
}

/// Complete machine: memory image, symbol table and registers.
///
/// Runs borrow the machine mutably, so a second run cannot start while one is in progress.
#[derive(Clone, Debug, Default)]
pub struct Machine {
    memory: Memory,
    symbols: SymbolTable,
    reg: Registers,
}

impl Machine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble `src` into a fresh machine.
    pub fn from_source(src: &str) -> (Self, LoadReport) {
        let mut machine = Self::new();
        let report = machine.load(src);
        (machine, report)
    }

    /// Replace memory and symbols with the program in `src`. Registers are left alone.
    pub fn load(&mut self, src: &str) -> LoadReport {
        let report = AsmParser::new(src).load_into(&mut self.memory, &mut self.symbols);
        for line in &report.skipped {
            vprintln!("skipped line {line}: no instruction found");
        }
        for (line, label) in &report.unresolved {
            vprintln!("line {line}: `{label}` is not a label");
        }
        for (line, digits) in &report.out_of_range {
            vprintln!("line {line}: literal `{digits}` is out of range");
        }
        vprintln!("{} instructions loaded", report.loaded);
        report
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn registers(&self) -> &Registers {
        &self.reg
    }

    /// Cell at `addr`, placeholder if out of range.
    pub fn peek(&self, addr: usize) -> &Word {
        self.memory.get(addr)
    }

    /// Store directly into memory, growing it if needed.
    pub fn poke(&mut self, addr: usize, word: impl Into<Word>) -> Result<(), FaultKind> {
        self.memory.set(addr, word.into())
    }

    pub fn is_halted(&self) -> bool {
        self.reg.pc == 0
    }

    /// Reset the registers and execute from address 1 until `hlt` or a fault.
    /// Memory written by earlier runs is kept.
    pub fn run(&mut self, console: &mut dyn Console) -> Result<Halt, Fault> {
        self.reg = Registers::default();
        let mut steps = 0;
        loop {
            let step = self.step(console)?;
            steps += 1;
            if step == Step::Halted {
                return Ok(Halt { steps });
            }
        }
    }

    /// One fetch/increment/execute cycle. Does nothing once halted.
    pub fn step(&mut self, console: &mut dyn Console) -> Result<Step, Fault> {
        if self.is_halted() {
            return Ok(Step::Halted);
        }
        let addr = self.reg.pc;
        let instr = self.fetch(console).map_err(|kind| self.fault(addr, kind))?;

        // PC incremented before instruction is performed
        self.reg.pc += 1;
        vprintln!("increment  PC={}", self.reg.pc);

        vprintln!("execute    IR={}", self.reg.ir);
        self.execute(&instr, console)
            .map_err(|kind| self.fault(addr, kind))?;

        Ok(if self.is_halted() {
            Step::Halted
        } else {
            Step::Continue
        })
    }

    fn fault(&mut self, addr: usize, kind: FaultKind) -> Fault {
        self.reg.pc = 0;
        vprintln!("fault at {addr}: {kind}");
        Fault {
            addr,
            ir: self.reg.ir.clone(),
            kind,
        }
    }

    fn fetch(&mut self, console: &mut dyn Console) -> Result<Instruction, FaultKind> {
        let addr = self.reg.pc;
        self.reg.ir = self.read(addr, console)?;
        vprintln!("fetch      AR={addr} IR={}", self.reg.ir);
        match &self.reg.ir {
            Word::Instr(instr) => Ok(instr.clone()),
            other => Err(FaultKind::IllegalInstruction(other.clone())),
        }
    }

    fn execute(
        &mut self,
        instr: &Instruction,
        console: &mut dyn Console,
    ) -> Result<(), FaultKind> {
        match instr.op {
            Opcode::Add => {
                let b = self.load_b(instr, console)?;
                let acc = self.acc_int()?;
                self.set_acc(acc.checked_add(b))
            }
            Opcode::Sub => {
                let b = self.load_b(instr, console)?;
                let acc = self.acc_int()?;
                self.set_acc(acc.checked_sub(b))
            }
            Opcode::Mlt => {
                let b = self.load_b(instr, console)?;
                let acc = self.acc_int()?;
                self.set_acc(acc.checked_mul(b))
            }
            Opcode::Div => {
                let b = self.load_b(instr, console)?;
                let acc = self.acc_int()?;
                if b == 0 {
                    return Err(FaultKind::DivisionFault);
                }
                self.set_acc(floor_div(acc, b))
            }
            Opcode::Set => {
                self.reg.acc = match self.operand(instr)? {
                    Operand::Literal(n) => Word::Int(addr_to_int(*n)?),
                    Operand::Label(token) => Word::Text(token.clone()),
                    Operand::OutOfRange(_) => return Err(FaultKind::Overflow),
                };
                Ok(())
            }
            Opcode::Neg => {
                let acc = self.acc_int()?;
                self.set_acc(acc.checked_neg())
            }
            Opcode::Inc => {
                let acc = self.acc_int()?;
                self.set_acc(acc.checked_add(1))
            }
            Opcode::Dec => {
                let acc = self.acc_int()?;
                self.set_acc(acc.checked_sub(1))
            }
            Opcode::Lda => {
                let addr = self.resolve(instr)?;
                self.reg.acc = self.read(addr, console)?;
                Ok(())
            }
            Opcode::Sta => {
                let addr = self.resolve(instr)?;
                self.write(addr, console)
            }
            Opcode::Br => {
                self.reg.pc = self.resolve(instr)?;
                Ok(())
            }
            Opcode::Brp => {
                if self.reg.acc.as_int().is_some_and(|n| n > 0) {
                    self.reg.pc = self.resolve(instr)?;
                }
                Ok(())
            }
            Opcode::Brz => {
                if self.reg.acc.as_int() == Some(0) {
                    self.reg.pc = self.resolve(instr)?;
                }
                Ok(())
            }
            Opcode::Bri => {
                // Plain memory read, address 0 is not the console here
                let addr = self.resolve(instr)?;
                self.reg.ar = Some(addr);
                let word = self.memory.get(addr).clone();
                let target = word.as_int().ok_or(FaultKind::NonNumeric(word))?;
                self.reg.pc =
                    usize::try_from(target).map_err(|_| FaultKind::InvalidAddress(target))?;
                Ok(())
            }
            Opcode::Brs => {
                let target = self.resolve(instr)?;
                if target == 0 {
                    return Err(FaultKind::InvalidAddress(0));
                }
                // Return address is the instruction after `brs`
                let ret = addr_to_int(self.reg.pc)?;
                self.memory.set(target, Word::Int(ret))?;
                self.reg.pc = target
                    .checked_add(1)
                    .ok_or_else(|| FaultKind::AddressOutOfRange(target.to_string()))?;
                Ok(())
            }
            Opcode::Hlt => {
                self.reg.pc = 0;
                Ok(())
            }
            Opcode::Noop => Ok(()),
        }
    }

    fn operand<'i>(&self, instr: &'i Instruction) -> Result<&'i Operand, FaultKind> {
        instr
            .operand
            .as_ref()
            .ok_or(FaultKind::MissingOperand(instr.op.mnemonic()))
    }

    /// Address named by the operand: literal as-is, label through the symbol table.
    /// Addresses above `MAX_ADDR` still resolve; reads there see the placeholder.
    fn resolve(&self, instr: &Instruction) -> Result<usize, FaultKind> {
        match self.operand(instr)? {
            Operand::Literal(addr) => Ok(*addr),
            Operand::OutOfRange(digits) => Err(FaultKind::AddressOutOfRange(digits.clone())),
            Operand::Label(name) => self
                .symbols
                .get(name)
                .ok_or_else(|| FaultKind::UndefinedLabel(name.clone())),
        }
    }

    /// AR <- operand address, B <- int(read()).
    fn load_b(
        &mut self,
        instr: &Instruction,
        console: &mut dyn Console,
    ) -> Result<i64, FaultKind> {
        let addr = self.resolve(instr)?;
        let word = self.read(addr, console)?;
        let b = word.as_int().ok_or(FaultKind::NonNumeric(word))?;
        self.reg.b = Word::Int(b);
        Ok(b)
    }

    fn acc_int(&self) -> Result<i64, FaultKind> {
        self.reg
            .acc
            .as_int()
            .ok_or_else(|| FaultKind::NonNumeric(self.reg.acc.clone()))
    }

    fn set_acc(&mut self, value: Option<i64>) -> Result<(), FaultKind> {
        self.reg.acc = Word::Int(value.ok_or(FaultKind::Overflow)?);
        Ok(())
    }

    /// AR <- addr, then read the cell at AR. Address 0 is console input.
    fn read(&mut self, addr: usize, console: &mut dyn Console) -> Result<Word, FaultKind> {
        self.reg.ar = Some(addr);
        if addr == 0 {
            let line = console.read_line()?.ok_or(FaultKind::InputExhausted)?;
            vprintln!("read       {line:?}");
            return Ok(Word::Text(line));
        }
        Ok(self.memory.get(addr).clone())
    }

    /// AR <- addr, then write ACC to the cell at AR. Address 0 is console output.
    fn write(&mut self, addr: usize, console: &mut dyn Console) -> Result<(), FaultKind> {
        self.reg.ar = Some(addr);
        if addr == 0 {
            console.write_line(&self.reg.acc.to_string())?;
            return Ok(());
        }
        self.memory.set(addr, self.reg.acc.clone())
    }

    /// Full state listing: registers, every memory cell, every symbol.
    pub fn dump(&self) -> Dump<'_> {
        Dump(self)
    }
}

fn addr_to_int(addr: usize) -> Result<i64, FaultKind> {
    i64::try_from(addr).map_err(|_| FaultKind::Overflow)
}

/// Division rounding towards negative infinity.
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

pub struct Dump<'a>(&'a Machine);

impl fmt::Display for Dump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Machine {
            memory,
            symbols,
            reg,
        } = self.0;
        writeln!(f, "------ Registers ------")?;
        writeln!(f, "PC:  {}", reg.pc)?;
        writeln!(f, "ACC: {}", reg.acc)?;
        writeln!(f, "B:   {}", reg.b)?;
        match reg.ar {
            Some(ar) => writeln!(f, "AR:  {ar}")?,
            None => writeln!(f, "AR:  ?")?,
        }
        writeln!(f, "IR:  {}", reg.ir)?;
        writeln!(f, "------- Memory --------")?;
        for (addr, word) in memory.iter() {
            writeln!(f, "{addr:>5}: {word}")?;
        }
        writeln!(f, "------- Symbols -------")?;
        for (label, addr) in symbols.iter() {
            writeln!(f, "{label} -> {addr}")?;
        }
        write!(f, "-----------------------")
    }
}
