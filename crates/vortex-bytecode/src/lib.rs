//! Vortex bytecode definitions
//!
//! This crate provides the program representation the Vortex VM executes:
//! - Tagged runtime values ([`Value`])
//! - The heap-object arena ([`Heap`], string objects)
//! - The loaded program ([`Program`]: bytecode buffer, line table,
//!   constant pool, globals)
//! - The instruction set ([`Opcode`]) and its operand-width table
//! - The disassembler ([`disasm`])
//!
//! It contains no execution semantics; those live in `vortex-core`.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod disasm;
pub mod heap;
pub mod opcode;
pub mod program;
pub mod value;

pub use heap::{Heap, HeapObject, ObjectRef};
pub use opcode::Opcode;
pub use program::{Program, ProgramError, MAX_CONSTANTS};
pub use value::Value;
