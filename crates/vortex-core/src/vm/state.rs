//! Machine state and fault reporting

use crate::VmError;
use std::fmt;

/// Execution state of a machine
///
/// `Running` is the initial state; every other state is terminal. Once the
/// machine leaves `Running` it never re-enters it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    /// Executing instructions
    Running,
    /// Stopped cleanly via HALT; the stack top is the program result
    Halted,
    /// A push exceeded the operand stack capacity
    StackOverflow,
    /// An instruction popped more values than the stack held
    StackUnderflow,
    /// Any other fault during execution
    RuntimeError,
    /// Reserved for a future front-end; never produced by this engine
    CompileError,
}

impl VmState {
    /// Check if the machine can still execute instructions
    #[inline]
    pub fn is_running(self) -> bool {
        self == VmState::Running
    }

    /// Check if this is a fault state (terminal and not a clean halt)
    pub fn is_fault(self) -> bool {
        matches!(
            self,
            VmState::StackOverflow
                | VmState::StackUnderflow
                | VmState::RuntimeError
                | VmState::CompileError
        )
    }
}

impl fmt::Display for VmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            VmState::Running => "running",
            VmState::Halted => "halted",
            VmState::StackOverflow => "stack overflow",
            VmState::StackUnderflow => "stack underflow",
            VmState::RuntimeError => "runtime error",
            VmState::CompileError => "compile error",
        };
        write!(f, "{}", text)
    }
}

/// A recorded execution fault
///
/// Captures the error and the byte offset of the instruction that was
/// executing when the machine left `Running`.
#[derive(Debug)]
pub struct Fault {
    /// What went wrong
    pub error: VmError,
    /// Byte offset of the faulting instruction in the code buffer
    pub offset: usize,
}
