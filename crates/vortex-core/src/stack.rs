//! Operand stack
//!
//! Fixed-capacity last-in-first-out array of values. Exceeding the
//! capacity is a stack-overflow fault, not a resize. The stack is the only
//! bounded resource in the engine.
//!
//! Handlers that pop N values call [`OperandStack::require`] before the
//! first destructive pop so that a failed instruction leaves the stack
//! exactly as it was.

use crate::{VmError, VmResult};
use vortex_bytecode::Value;

/// Default operand stack capacity (in slots)
pub const DEFAULT_STACK_CAPACITY: usize = 2048;

/// Operand stack for the VM
#[derive(Debug)]
pub struct OperandStack {
    slots: Vec<Value>,
    capacity: usize,
}

impl OperandStack {
    /// Create a stack with the given slot capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity.min(DEFAULT_STACK_CAPACITY)),
            capacity,
        }
    }

    /// Push a value onto the stack
    ///
    /// # Errors
    ///
    /// Returns `VmError::StackOverflow` if the stack is full; the value is
    /// not pushed.
    #[inline]
    pub fn push(&mut self, value: Value) -> VmResult<()> {
        if self.slots.len() >= self.capacity {
            return Err(VmError::StackOverflow);
        }
        self.slots.push(value);
        Ok(())
    }

    /// Pop a value from the stack
    ///
    /// # Errors
    ///
    /// Returns `VmError::StackUnderflow` if the stack is empty.
    #[inline]
    pub fn pop(&mut self) -> VmResult<Value> {
        self.slots.pop().ok_or(VmError::StackUnderflow)
    }

    /// Peek at the top value without popping
    #[inline]
    pub fn peek(&self) -> VmResult<Value> {
        self.slots.last().copied().ok_or(VmError::StackUnderflow)
    }

    /// Verify the stack holds at least `n` entries
    ///
    /// # Errors
    ///
    /// Returns `VmError::StackUnderflow` without mutating anything.
    #[inline]
    pub fn require(&self, n: usize) -> VmResult<()> {
        if self.slots.len() < n {
            return Err(VmError::StackUnderflow);
        }
        Ok(())
    }

    /// Current stack depth
    #[inline]
    pub fn depth(&self) -> usize {
        self.slots.len()
    }

    /// Check if the stack is empty
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slots from bottom to top (diagnostics and tests)
    pub fn as_slice(&self) -> &[Value] {
        &self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop() {
        let mut stack = OperandStack::with_capacity(8);
        stack.push(Value::Double(1.0)).unwrap();
        stack.push(Value::Bool(true)).unwrap();
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.pop().unwrap(), Value::Bool(true));
        assert_eq!(stack.pop().unwrap(), Value::Double(1.0));
        assert!(stack.is_empty());
    }

    #[test]
    fn test_overflow_leaves_stack_full_but_unchanged() {
        let mut stack = OperandStack::with_capacity(2);
        stack.push(Value::Double(1.0)).unwrap();
        stack.push(Value::Double(2.0)).unwrap();
        let result = stack.push(Value::Double(3.0));
        assert!(matches!(result, Err(VmError::StackOverflow)));
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.peek().unwrap(), Value::Double(2.0));
    }

    #[test]
    fn test_underflow() {
        let mut stack = OperandStack::with_capacity(2);
        assert!(matches!(stack.pop(), Err(VmError::StackUnderflow)));
        assert!(matches!(stack.peek(), Err(VmError::StackUnderflow)));
    }

    #[test]
    fn test_require_does_not_mutate() {
        let mut stack = OperandStack::with_capacity(4);
        stack.push(Value::Nil).unwrap();
        assert!(stack.require(1).is_ok());
        assert!(matches!(stack.require(2), Err(VmError::StackUnderflow)));
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.as_slice(), &[Value::Nil]);
    }

    #[test]
    fn test_default_capacity_holds_2048() {
        let mut stack = OperandStack::with_capacity(DEFAULT_STACK_CAPACITY);
        for _ in 0..DEFAULT_STACK_CAPACITY {
            stack.push(Value::Nil).unwrap();
        }
        assert!(matches!(stack.push(Value::Nil), Err(VmError::StackOverflow)));
        assert_eq!(stack.depth(), DEFAULT_STACK_CAPACITY);
    }
}
