//! Bytecode interpreter
//!
//! The machine repeatedly fetches the byte at the program counter, decodes
//! it, dispatches to the opcode's handler, and advances the program counter
//! past the instruction's full encoded width (only while the state is still
//! [`VmState::Running`]). Any other state terminates the loop
//! for good; there is no recovery path.
//!
//! Arity and capacity checks run before any destructive pop or push, so an
//! instruction that faults leaves the operand stack exactly as it was
//! (division by zero is the one deliberate exception: the IEEE-754 result
//! is pushed and the fault reported afterwards).

use super::state::{Fault, VmState};
use crate::stack::{OperandStack, DEFAULT_STACK_CAPACITY};
use crate::{VmError, VmResult};
use std::io::{self, Write};
use vortex_bytecode::{Opcode, Program, Value};

/// Machine configuration
///
/// Specifies limits and debug affordances only; enforcement is the
/// machine's job.
#[derive(Debug, Clone)]
pub struct MachineOptions {
    /// Operand stack capacity in slots
    pub stack_capacity: usize,
    /// Dump the stack after every instruction
    pub trace_execution: bool,
    /// Dump the stack when execution ends in a fault state
    pub dump_stack_on_fault: bool,
}

impl Default for MachineOptions {
    fn default() -> Self {
        Self {
            stack_capacity: DEFAULT_STACK_CAPACITY,
            trace_execution: false,
            dump_stack_on_fault: false,
        }
    }
}

/// Vortex virtual machine
///
/// Borrows the program it executes for its whole lifetime; it is the only
/// writer of the program's globals and heap arena at run time. Printed
/// output and diagnostics go to an injectable sink (stdout by default) so
/// the machine stays headless-testable.
pub struct Machine<'p> {
    program: &'p mut Program,
    stack: OperandStack,
    pc: usize,
    state: VmState,
    fault: Option<Fault>,
    options: MachineOptions,
    out: Box<dyn Write + 'p>,
}

impl<'p> Machine<'p> {
    /// Create a machine with default options, writing to stdout
    pub fn new(program: &'p mut Program) -> Self {
        Self::with_options(program, MachineOptions::default())
    }

    /// Create a machine with explicit options
    pub fn with_options(program: &'p mut Program, options: MachineOptions) -> Self {
        Self {
            stack: OperandStack::with_capacity(options.stack_capacity),
            program,
            pc: 0,
            state: VmState::Running,
            fault: None,
            options,
            out: Box::new(io::stdout()),
        }
    }

    /// Redirect print output and diagnostics to `out`
    pub fn with_output(mut self, out: Box<dyn Write + 'p>) -> Self {
        self.out = out;
        self
    }

    // ========================================================================
    // Execution loop
    // ========================================================================

    /// Run until a terminal state, then report it
    pub fn run(&mut self) -> VmState {
        while self.state.is_running() {
            self.step();
            if self.options.trace_execution {
                let _ = writeln!(self.out, "======");
                self.dump_stack();
            }
        }
        self.report();
        self.state
    }

    /// Execute a single instruction, recording any fault
    pub fn step(&mut self) {
        let offset = self.pc;
        if let Err(error) = self.execute_instruction() {
            self.state = match error {
                VmError::StackOverflow => VmState::StackOverflow,
                VmError::StackUnderflow => VmState::StackUnderflow,
                _ => VmState::RuntimeError,
            };
            self.fault = Some(Fault { error, offset });
        }
    }

    fn execute_instruction(&mut self) -> VmResult<()> {
        let byte = *self
            .program
            .code()
            .get(self.pc)
            .ok_or(VmError::PcOutOfBounds(self.pc))?;
        let opcode = Opcode::from_u8(byte).ok_or(VmError::InvalidOpcode(byte))?;

        match opcode {
            // Stack manipulation & constants
            Opcode::PushConstant => self.op_push_constant()?,
            Opcode::PushTrue => self.stack.push(Value::Bool(true))?,
            Opcode::PushFalse => self.stack.push(Value::Bool(false))?,
            Opcode::PushNil => self.stack.push(Value::Nil)?,
            Opcode::Pop => {
                self.stack.pop()?;
            }

            // Arithmetic
            Opcode::Add => self.op_add()?,
            Opcode::Sub => self.op_arith(Opcode::Sub, |a, b| a - b)?,
            Opcode::Mul => self.op_arith(Opcode::Mul, |a, b| a * b)?,
            Opcode::Div => self.op_div()?,
            Opcode::Negate => self.op_negate()?,

            // Logic & comparison
            Opcode::Not => self.op_not()?,
            Opcode::Eq => self.op_eq()?,
            Opcode::Less => self.op_compare(Opcode::Less, |a, b| a < b)?,
            Opcode::LessEq => self.op_compare(Opcode::LessEq, |a, b| a <= b)?,
            Opcode::Greater => self.op_compare(Opcode::Greater, |a, b| a > b)?,
            Opcode::GreaterEq => self.op_compare(Opcode::GreaterEq, |a, b| a >= b)?,

            // Globals
            Opcode::LoadGlobal => self.op_load_global()?,
            Opcode::StoreGlobal => self.op_store_global()?,

            // Declared for the disassembler only; executing them is a fault
            Opcode::DeclareLocal
            | Opcode::LoadLocal
            | Opcode::StoreLocal
            | Opcode::Jump
            | Opcode::JumpIfFalse => {
                return Err(VmError::UnsupportedOpcode(opcode.name()));
            }

            // System
            Opcode::Print => self.op_print()?,
            Opcode::Halt => {
                self.state = VmState::Halted;
            }
        }

        // PC stays on the consumed instruction once the state is terminal,
        // so fault offsets point at the instruction that produced them.
        if self.state.is_running() {
            self.pc += 1 + opcode.operand_width();
        }
        Ok(())
    }

    // ========================================================================
    // Instruction handlers
    // ========================================================================

    fn op_push_constant(&mut self) -> VmResult<()> {
        let code = self.program.code();
        if self.pc + 3 >= code.len() {
            return Err(VmError::TruncatedOperand(self.pc));
        }
        let b1 = code[self.pc + 1] as usize;
        let b2 = code[self.pc + 2] as usize;
        let b3 = code[self.pc + 3] as usize;
        let index = (b1 << 16) | (b2 << 8) | b3;

        let value = self
            .program
            .constant_at(index)
            .ok_or(VmError::InvalidConstantIndex(index))?;
        self.stack.push(value)
    }

    fn op_add(&mut self) -> VmResult<()> {
        self.stack.require(2)?;
        let b = self.stack.pop()?;
        let a = self.stack.pop()?;
        match (a, b) {
            (Value::Double(a), Value::Double(b)) => self.stack.push(Value::Double(a + b)),
            (Value::Object(x), Value::Object(y)) => {
                let heap = self.program.heap();
                let combined = match (heap.str_contents(x), heap.str_contents(y)) {
                    (Some(left), Some(right)) => format!("{}{}", left, right),
                    _ => {
                        return Err(VmError::TypeError(
                            "Cannot add non-string objects".to_string(),
                        ))
                    }
                };
                let result = self.program.intern_string(combined);
                self.stack.push(Value::Object(result))
            }
            (a, b) => Err(VmError::TypeError(format!(
                "Cannot add {} and {}",
                a.type_name(),
                b.type_name()
            ))),
        }
    }

    fn op_arith(&mut self, opcode: Opcode, apply: fn(f64, f64) -> f64) -> VmResult<()> {
        let (a, b) = self.pop_double_pair(opcode)?;
        self.stack.push(Value::Double(apply(a, b)))
    }

    fn op_div(&mut self) -> VmResult<()> {
        let (a, b) = self.pop_double_pair(Opcode::Div)?;
        // The IEEE-754 quotient is pushed even when b is zero; the fault is
        // reported afterwards.
        self.stack.push(Value::Double(a / b))?;
        if b == 0.0 {
            return Err(VmError::DivisionByZero);
        }
        Ok(())
    }

    fn op_negate(&mut self) -> VmResult<()> {
        self.stack.require(1)?;
        let value = self.stack.pop()?;
        match value.as_double() {
            Some(d) => self.stack.push(Value::Double(-d)),
            None => Err(VmError::TypeError(format!(
                "Cannot negate {}",
                value.type_name()
            ))),
        }
    }

    fn op_not(&mut self) -> VmResult<()> {
        self.stack.require(1)?;
        let value = self.stack.pop()?;
        self.stack.push(Value::Bool(!value.is_truthy()))
    }

    fn op_eq(&mut self) -> VmResult<()> {
        self.stack.require(2)?;
        let b = self.stack.pop()?;
        let a = self.stack.pop()?;
        let result = match (a, b) {
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::Object(x), Value::Object(y)) => {
                let heap = self.program.heap();
                heap.str_contents(x) == heap.str_contents(y)
            }
            (a, b) => {
                return Err(VmError::TypeError(format!(
                    "Cannot compare {} and {}",
                    a.type_name(),
                    b.type_name()
                )))
            }
        };
        self.stack.push(Value::Bool(result))
    }

    fn op_compare(&mut self, opcode: Opcode, cmp: fn(f64, f64) -> bool) -> VmResult<()> {
        let (a, b) = self.pop_double_pair(opcode)?;
        self.stack.push(Value::Bool(cmp(a, b)))
    }

    fn op_print(&mut self) -> VmResult<()> {
        self.stack.require(1)?;
        let value = self.stack.pop()?;
        writeln!(self.out, "{}", value.display_text(self.program.heap()))?;
        Ok(())
    }

    fn op_load_global(&mut self) -> VmResult<()> {
        self.stack.require(1)?;
        let index = self.pop_global_index()?;
        let value = self
            .program
            .global_at(index)
            .ok_or(VmError::InvalidGlobalIndex(index))?;
        self.stack.push(value)
    }

    fn op_store_global(&mut self) -> VmResult<()> {
        self.stack.require(2)?;
        let index = self.pop_global_index()?;
        let value = self.stack.pop()?;
        let slot = self
            .program
            .global_slot_mut(index)
            .ok_or(VmError::InvalidGlobalIndex(index))?;
        *slot = value;
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Pop the right operand then the left, both required to be doubles
    fn pop_double_pair(&mut self, opcode: Opcode) -> VmResult<(f64, f64)> {
        self.stack.require(2)?;
        let b = self.stack.pop()?;
        let a = self.stack.pop()?;
        match (a.as_double(), b.as_double()) {
            (Some(a), Some(b)) => Ok((a, b)),
            _ => Err(VmError::TypeError(format!(
                "{} requires two doubles, got {} and {}",
                opcode.name(),
                a.type_name(),
                b.type_name()
            ))),
        }
    }

    /// Pop the stack-top global index, which must be a double
    fn pop_global_index(&mut self) -> VmResult<usize> {
        let value = self.stack.pop()?;
        match value.as_double() {
            Some(d) => Ok(d as usize),
            None => Err(VmError::TypeError(format!(
                "Global index must be a double, got {}",
                value.type_name()
            ))),
        }
    }

    // ========================================================================
    // Termination reporting
    // ========================================================================

    fn report(&mut self) {
        match self.state {
            VmState::Halted => {
                let text = match self.stack.peek() {
                    Ok(value) => value.display_text(self.program.heap()),
                    Err(_) => "<empty stack>".to_string(),
                };
                let _ = writeln!(self.out, "Program finished with: {}", text);
            }
            VmState::Running | VmState::CompileError => {}
            VmState::StackOverflow | VmState::StackUnderflow | VmState::RuntimeError => {
                match &self.fault {
                    Some(fault) => {
                        let _ = writeln!(
                            self.out,
                            "{}: {} at offset {}",
                            self.state, fault.error, fault.offset
                        );
                    }
                    None => {
                        let _ = writeln!(self.out, "{}", self.state);
                    }
                }
                if self.options.dump_stack_on_fault {
                    self.dump_stack();
                }
            }
        }
    }

    fn dump_stack(&mut self) {
        let _ = writeln!(self.out, "Program counter: {}", self.pc);
        for value in self.stack.as_slice() {
            let _ = writeln!(self.out, "{}", value.display_text(self.program.heap()));
        }
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Current machine state
    #[inline]
    pub fn state(&self) -> VmState {
        self.state
    }

    /// Current program counter (byte offset into the code buffer)
    #[inline]
    pub fn pc(&self) -> usize {
        self.pc
    }

    /// The recorded fault, if the machine ended in a fault state
    pub fn fault(&self) -> Option<&Fault> {
        self.fault.as_ref()
    }

    /// The value at the top of the stack (the program result after HALT)
    pub fn result(&self) -> Option<Value> {
        self.stack.peek().ok()
    }

    /// Operand stack contents, bottom to top
    pub fn stack(&self) -> &[Value] {
        self.stack.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn silent(program: &mut Program) -> Machine<'_> {
        Machine::new(program).with_output(Box::new(io::sink()))
    }

    #[test]
    fn test_halt_with_empty_stack() {
        let mut program = Program::new();
        program.emit(Opcode::Halt, 1);
        let mut machine = silent(&mut program);
        assert_eq!(machine.run(), VmState::Halted);
        assert_eq!(machine.result(), None);
    }

    #[test]
    fn test_invalid_opcode_faults() {
        let mut program = Program::new();
        program.push_code(0x60, 1);
        let mut machine = silent(&mut program);
        assert_eq!(machine.run(), VmState::RuntimeError);
        let fault = machine.fault().unwrap();
        assert!(matches!(fault.error, VmError::InvalidOpcode(0x60)));
        assert_eq!(fault.offset, 0);
    }

    #[test]
    fn test_running_off_the_end_faults() {
        let mut program = Program::new();
        program.emit(Opcode::PushNil, 1);
        let mut machine = silent(&mut program);
        assert_eq!(machine.run(), VmState::RuntimeError);
        assert!(matches!(
            machine.fault().unwrap().error,
            VmError::PcOutOfBounds(1)
        ));
    }

    #[test]
    fn test_declared_only_opcode_faults() {
        let mut program = Program::new();
        program.emit(Opcode::Jump, 1);
        let mut machine = silent(&mut program);
        assert_eq!(machine.run(), VmState::RuntimeError);
        assert!(matches!(
            machine.fault().unwrap().error,
            VmError::UnsupportedOpcode("JUMP")
        ));
    }

    #[test]
    fn test_truncated_push_constant_operand() {
        let mut program = Program::new();
        program.push_code(Opcode::PushConstant.to_u8(), 1);
        program.push_code(0, 1);
        let mut machine = silent(&mut program);
        assert_eq!(machine.run(), VmState::RuntimeError);
        assert!(matches!(
            machine.fault().unwrap().error,
            VmError::TruncatedOperand(0)
        ));
    }
}
