//! Loaded program representation
//!
//! A [`Program`] is the unit of loaded code and data: the bytecode buffer,
//! a per-byte source-line table, the constant pool, the global-variable
//! table, and the heap-object arena. It owns every piece of memory the
//! execution engine touches; the engine only borrows it.
//!
//! Programs are populated through the construction primitives here (an
//! external assembler's surface; there is no source-language front-end in
//! this repository).

use crate::heap::{Heap, ObjectRef};
use crate::opcode::Opcode;
use crate::value::Value;
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Largest constant-pool index a 3-byte operand can address
pub const MAX_CONSTANTS: usize = (1 << 24) - 1;

/// Program construction errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProgramError {
    /// Constant pool is at its 2^24 - 1 entry capacity
    #[error("Constant pool full ({MAX_CONSTANTS} entries)")]
    ConstantPoolFull,

    /// A global with this name is already declared
    #[error("Global '{0}' is already declared")]
    DuplicateGlobal(String),

    /// No global with this name is declared
    #[error("Global '{0}' is not declared")]
    UnboundGlobal(String),

    /// Constant index does not fit a 3-byte operand
    #[error("Constant index {0} exceeds the 3-byte operand range")]
    UnencodableConstantIndex(u32),
}

/// A loaded Vortex program
#[derive(Debug, Default)]
pub struct Program {
    code: Vec<u8>,
    /// Source line per byte of `code` (diagnostics and disassembly only)
    lines: Vec<u32>,
    constants: Vec<Value>,
    globals: Vec<Value>,
    global_names: FxHashMap<String, usize>,
    heap: Heap,
}

impl Program {
    /// Create an empty program
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Construction primitives
    // ========================================================================

    /// Append one raw byte and its source line, returning the byte's offset
    pub fn push_code(&mut self, byte: u8, line: u32) -> usize {
        self.code.push(byte);
        self.lines.push(line);
        self.code.len() - 1
    }

    /// Append a constant to the pool, returning its index
    ///
    /// Fails without mutating the pool once it holds [`MAX_CONSTANTS`]
    /// entries (the largest count a 3-byte operand can still address).
    pub fn add_constant(&mut self, value: Value) -> Result<u32, ProgramError> {
        if self.constants.len() >= MAX_CONSTANTS {
            return Err(ProgramError::ConstantPoolFull);
        }
        self.constants.push(value);
        Ok((self.constants.len() - 1) as u32)
    }

    /// Allocate a new string object in the heap arena
    ///
    /// Returns a handle valid for this program's lifetime. Equal texts are
    /// not deduplicated.
    pub fn intern_string(&mut self, contents: impl Into<String>) -> ObjectRef {
        self.heap.alloc_str(contents)
    }

    /// Declare a global variable, binding `name` to a fresh slot
    ///
    /// Redeclaring a name is a code-generation error on the (external)
    /// front-end's side and is rejected eagerly here.
    pub fn declare_global(&mut self, name: &str, initial: Value) -> Result<usize, ProgramError> {
        if self.global_names.contains_key(name) {
            return Err(ProgramError::DuplicateGlobal(name.to_string()));
        }
        let index = self.globals.len();
        self.globals.push(initial);
        self.global_names.insert(name.to_string(), index);
        Ok(index)
    }

    /// Look up the slot index of a declared global
    pub fn resolve_global_index(&self, name: &str) -> Result<usize, ProgramError> {
        self.global_names
            .get(name)
            .copied()
            .ok_or_else(|| ProgramError::UnboundGlobal(name.to_string()))
    }

    // ========================================================================
    // Assembler conveniences
    // ========================================================================

    /// Emit a no-operand instruction
    pub fn emit(&mut self, opcode: Opcode, line: u32) -> usize {
        self.push_code(opcode.to_u8(), line)
    }

    /// Emit `PUSH_CONSTANT` with its 3-byte big-endian pool index
    ///
    /// Indices from [`add_constant`](Self::add_constant) always fit.
    ///
    /// # Errors
    ///
    /// Returns `UnencodableConstantIndex` without emitting anything if
    /// `index` does not fit the 3-byte operand.
    pub fn emit_push_constant(&mut self, index: u32, line: u32) -> Result<usize, ProgramError> {
        if index as usize >= MAX_CONSTANTS {
            return Err(ProgramError::UnencodableConstantIndex(index));
        }
        let offset = self.push_code(Opcode::PushConstant.to_u8(), line);
        self.push_code((index >> 16) as u8, line);
        self.push_code((index >> 8) as u8, line);
        self.push_code(index as u8, line);
        Ok(offset)
    }

    // ========================================================================
    // Read access
    // ========================================================================

    /// The bytecode buffer
    #[inline]
    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// Source line recorded for the byte at `offset`
    #[inline]
    pub fn line_at(&self, offset: usize) -> Option<u32> {
        self.lines.get(offset).copied()
    }

    /// The constant pool
    #[inline]
    pub fn constants(&self) -> &[Value] {
        &self.constants
    }

    /// Constant at `index`, if in range
    #[inline]
    pub fn constant_at(&self, index: usize) -> Option<Value> {
        self.constants.get(index).copied()
    }

    /// Number of declared globals
    #[inline]
    pub fn global_count(&self) -> usize {
        self.globals.len()
    }

    /// Global at `index`, if in range
    #[inline]
    pub fn global_at(&self, index: usize) -> Option<Value> {
        self.globals.get(index).copied()
    }

    /// Mutable global slot at `index`, if in range
    #[inline]
    pub fn global_slot_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.globals.get_mut(index)
    }

    /// The heap-object arena
    #[inline]
    pub fn heap(&self) -> &Heap {
        &self.heap
    }
}
