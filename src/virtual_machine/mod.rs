//! Intcode virtual machine.
//!
//! Intcode is a tiny integer machine: memory is a sequence of signed 64-bit
//! words, and programs are loaded at address 0 and run from there. The VM is
//! single-threaded and cooperatively scheduled. It suspends whenever it needs
//! input that is not yet available, so several machines can be driven in
//! lock-step by one scheduler.
//!
//! # Architecture
//!
//! - **Memory**: a dense program region plus a sparse overflow for any
//!   non-negative address beyond it; unwritten cells read as 0
//! - **Registers**: instruction pointer and relative base, nothing else
//! - **Instruction format**: decimal `MMMOO` words, see [`isa`]
//! - **I/O**: one [`vm::ports::InputPort`] and one [`vm::ports::OutputPort`] per machine
//!
//! # Modules
//!
//! - [`errors`]: fatal execution and parse errors
//! - [`isa`]: Instruction set definition and opcode mappings
//! - [`operand`]: Parameter addressing modes
//! - [`program`]: Program images and their text form
//! - [`vm`]: The stepping engine, memory models and ports

pub mod errors;
pub mod isa;
#[cfg(test)]
mod isa_static_check;
pub mod operand;
pub mod program;
pub mod vm;

/// Machine word. Every memory cell, parameter and I/O value is one.
pub type Word = i64;
