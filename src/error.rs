use miette::Diagnostic;
use thiserror::Error;

use crate::memory::Word;

/// Why a run stopped before reaching `hlt`.
#[derive(Error, Diagnostic, Clone, PartialEq, Eq, Debug)]
pub enum FaultKind {
    #[error("Divided by zero.")]
    #[diagnostic(
        code(runtime::div_zero),
        help("check the divisor cell before running `div`")
    )]
    DivisionFault,

    #[error("Reference to undefined label `{0}`.")]
    #[diagnostic(
        code(runtime::undefined_label),
        help("define the label with `{0}, <instruction>` somewhere in the file")
    )]
    UndefinedLabel(String),

    #[error("Fetched a cell that is not an instruction: `{0}`.")]
    #[diagnostic(
        code(runtime::illegal_instruction),
        help("programs must end with `hlt` or branch away before running into data")
    )]
    IllegalInstruction(Word),

    #[error("Instruction `{0}` requires an operand.")]
    #[diagnostic(code(runtime::missing_operand))]
    MissingOperand(&'static str),

    #[error("Value `{0}` is not a number.")]
    #[diagnostic(
        code(runtime::non_numeric),
        help("arithmetic only works on integers, or console input that parses as one")
    )]
    NonNumeric(Word),

    #[error("Integer overflow.")]
    #[diagnostic(code(runtime::overflow), help("values are 64-bit signed integers"))]
    Overflow,

    #[error("Address {0} is not valid.")]
    #[diagnostic(
        code(runtime::bad_addr),
        help("branch targets must be non-negative")
    )]
    InvalidAddress(i64),

    #[error("Address {0} is outside the address space.")]
    #[diagnostic(
        code(runtime::addr_range),
        help("addresses run from 1 to 1048575")
    )]
    AddressOutOfRange(String),

    #[error("Console input ended.")]
    #[diagnostic(
        code(runtime::input_exhausted),
        help("the program read from address 0 but no more input was available")
    )]
    InputExhausted,

    #[error("Console I/O failed: {0}")]
    #[diagnostic(code(runtime::console))]
    Console(String),
}

impl From<std::io::Error> for FaultKind {
    fn from(value: std::io::Error) -> Self {
        FaultKind::Console(value.to_string())
    }
}

/// A fault together with the machine state it happened in.
#[derive(Error, Diagnostic, Clone, PartialEq, Eq, Debug)]
#[error("Machine faulted at address {addr} executing `{ir}`.")]
pub struct Fault {
    /// Address of the faulting instruction
    pub addr: usize,
    /// Instruction register at the time of the fault
    pub ir: Word,
    #[source]
    #[diagnostic_source]
    pub kind: FaultKind,
}
