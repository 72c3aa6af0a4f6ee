// Assembling
mod parser;
pub use parser::{AsmParser, LoadReport};
mod symbol;
pub use symbol::{Instruction, Opcode, Operand, SymbolTable};
mod memory;
pub use memory::{Memory, Word, MAX_ADDR};

// Running
mod runtime;
pub use runtime::{Dump, Halt, Machine, Registers, Step, ENTRY};
mod error;
pub use error::{Fault, FaultKind};
pub mod console;

pub mod env;
pub mod output;
