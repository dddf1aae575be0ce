//! Vortex VM core runtime
//!
//! This crate provides the execution engine for Vortex bytecode:
//! - Fixed-capacity operand stack
//! - Fetch-decode-execute interpreter over a
//!   [`Program`](vortex_bytecode::Program)
//! - Terminal-state and fault reporting
//!
//! The engine consumes a fully-formed program; it exposes no API for
//! parsing source text.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod stack;
pub mod vm;

pub use stack::OperandStack;
pub use vm::{Fault, Machine, MachineOptions, VmState};

/// VM execution errors
#[derive(Debug, thiserror::Error)]
pub enum VmError {
    /// Operand stack is at capacity
    #[error("Stack overflow")]
    StackOverflow,

    /// Instruction popped more values than the stack holds
    #[error("Stack underflow")]
    StackUnderflow,

    /// Operand type does not satisfy an opcode's precondition
    #[error("Type error: {0}")]
    TypeError(String),

    /// Division by zero (reported; the IEEE-754 result is still pushed)
    #[error("Division by zero")]
    DivisionByZero,

    /// Byte does not decode to any opcode
    #[error("Invalid opcode: 0x{0:02X}")]
    InvalidOpcode(u8),

    /// Opcode is declared in the instruction set but has no execution
    /// semantics
    #[error("Unsupported opcode: {0}")]
    UnsupportedOpcode(&'static str),

    /// Constant-pool index out of range
    #[error("Invalid constant index: {0}")]
    InvalidConstantIndex(usize),

    /// Global-table index out of range
    #[error("Invalid global index: {0}")]
    InvalidGlobalIndex(usize),

    /// Instruction's operand bytes run past the end of the code buffer
    #[error("Truncated operand at offset {0}")]
    TruncatedOperand(usize),

    /// Program counter ran past the end of the code buffer
    #[error("Instruction pointer out of bounds: {0}")]
    PcOutOfBounds(usize),

    /// Output sink failure (print or diagnostics)
    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),
}

/// VM execution result
pub type VmResult<T> = Result<T, VmError>;
