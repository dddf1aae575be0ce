//! Bytecode opcodes for the Vortex VM
//!
//! This module defines the complete instruction set for the Vortex virtual
//! machine. All opcodes are single-byte instructions; the only opcode that
//! takes operand bytes is [`Opcode::PushConstant`], whose 24-bit constant
//! index follows the opcode byte big-endian.
//!
//! The operand width table here is the single source of truth for
//! instruction boundaries: both the execution engine and the disassembler
//! decode with [`Opcode::operand_width`], so they always agree on where one
//! instruction ends and the next begins.

/// Bytecode opcode enumeration
///
/// Opcodes are organized into categories:
/// - 0x00-0x0F: Stack manipulation & constants
/// - 0x10-0x1F: Arithmetic
/// - 0x20-0x2F: Logic & comparison
/// - 0x30-0x3F: Global variables
/// - 0x40-0x4F: Local variables (declared, not executed)
/// - 0x50-0x5F: Control flow (declared, not executed)
/// - 0xF0-0xFF: System
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // ===== Stack Manipulation & Constants (0x00-0x0F) =====
    /// Push constant from pool (operand: u24 big-endian index)
    PushConstant = 0x01,
    /// Push true literal
    PushTrue = 0x02,
    /// Push false literal
    PushFalse = 0x03,
    /// Push nil literal
    PushNil = 0x04,
    /// Pop top value from stack
    Pop = 0x05,

    // ===== Arithmetic (0x10-0x1F) =====
    /// Addition: pop b, pop a, push a + b (doubles or string concatenation)
    Add = 0x10,
    /// Subtraction: pop b, pop a, push a - b
    Sub = 0x11,
    /// Multiplication: pop b, pop a, push a * b
    Mul = 0x12,
    /// Division: pop b, pop a, push a / b
    Div = 0x13,
    /// Negation: pop a, push -a
    Negate = 0x14,

    // ===== Logic & Comparison (0x20-0x2F) =====
    /// Logical NOT: pop a, push !truthiness(a)
    Not = 0x20,
    /// Equality: pop b, pop a, push a == b
    Eq = 0x21,
    /// Less than: pop b, pop a, push a < b
    Less = 0x22,
    /// Less or equal: pop b, pop a, push a <= b
    LessEq = 0x23,
    /// Greater than: pop b, pop a, push a > b
    Greater = 0x24,
    /// Greater or equal: pop b, pop a, push a >= b
    GreaterEq = 0x25,

    // ===== Global Variables (0x30-0x3F) =====
    /// Load global: pop index (double), push globals[index]
    LoadGlobal = 0x30,
    /// Store global: pop index (double), pop value, globals[index] = value
    StoreGlobal = 0x31,

    // ===== Local Variables (0x40-0x4F) =====
    // Declared for instruction-set consistency; dispatching them at run
    // time is an unsupported-opcode fault.
    /// Declare local variable slot
    DeclareLocal = 0x40,
    /// Load local variable onto stack
    LoadLocal = 0x41,
    /// Store top of stack to local variable
    StoreLocal = 0x42,

    // ===== Control Flow (0x50-0x5F) =====
    // Declared for instruction-set consistency; never executed.
    /// Unconditional jump
    Jump = 0x50,
    /// Jump if false
    JumpIfFalse = 0x51,

    // ===== System (0xF0-0xFF) =====
    /// Print: pop a, emit a's display text
    Print = 0xF0,
    /// Halt execution, reporting the stack top as the program result
    Halt = 0xFF,
}

impl Opcode {
    /// Convert byte to opcode
    ///
    /// Returns None if the byte does not correspond to a valid opcode.
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            // Stack manipulation & constants
            0x01 => Some(Self::PushConstant),
            0x02 => Some(Self::PushTrue),
            0x03 => Some(Self::PushFalse),
            0x04 => Some(Self::PushNil),
            0x05 => Some(Self::Pop),

            // Arithmetic
            0x10 => Some(Self::Add),
            0x11 => Some(Self::Sub),
            0x12 => Some(Self::Mul),
            0x13 => Some(Self::Div),
            0x14 => Some(Self::Negate),

            // Logic & comparison
            0x20 => Some(Self::Not),
            0x21 => Some(Self::Eq),
            0x22 => Some(Self::Less),
            0x23 => Some(Self::LessEq),
            0x24 => Some(Self::Greater),
            0x25 => Some(Self::GreaterEq),

            // Global variables
            0x30 => Some(Self::LoadGlobal),
            0x31 => Some(Self::StoreGlobal),

            // Local variables
            0x40 => Some(Self::DeclareLocal),
            0x41 => Some(Self::LoadLocal),
            0x42 => Some(Self::StoreLocal),

            // Control flow
            0x50 => Some(Self::Jump),
            0x51 => Some(Self::JumpIfFalse),

            // System
            0xF0 => Some(Self::Print),
            0xFF => Some(Self::Halt),

            // Invalid opcodes
            _ => None,
        }
    }

    /// Convert opcode to byte
    #[inline]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Get the human-readable mnemonic of the opcode
    pub fn name(self) -> &'static str {
        match self {
            Self::PushConstant => "PUSH_CONSTANT",
            Self::PushTrue => "PUSH_TRUE",
            Self::PushFalse => "PUSH_FALSE",
            Self::PushNil => "PUSH_NIL",
            Self::Pop => "POP",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Mul => "MUL",
            Self::Div => "DIV",
            Self::Negate => "NEGATE",
            Self::Not => "NOT",
            Self::Eq => "EQ",
            Self::Less => "LESS",
            Self::LessEq => "LESS_EQ",
            Self::Greater => "GREATER",
            Self::GreaterEq => "GREATER_EQ",
            Self::LoadGlobal => "LOAD_GLOBAL",
            Self::StoreGlobal => "STORE_GLOBAL",
            Self::DeclareLocal => "DECLARE_LOCAL",
            Self::LoadLocal => "LOAD_LOCAL",
            Self::StoreLocal => "STORE_LOCAL",
            Self::Jump => "JUMP",
            Self::JumpIfFalse => "JUMP_IF_FALSE",
            Self::Print => "PRINT",
            Self::Halt => "HALT",
        }
    }

    /// Number of operand bytes following the opcode byte
    ///
    /// Every instruction's total encoded width is `1 + operand_width()`.
    #[inline]
    pub fn operand_width(self) -> usize {
        match self {
            Self::PushConstant => 3,
            _ => 0,
        }
    }

    /// Check if this opcode is an ordering comparison (requires two doubles)
    pub fn is_ordering(self) -> bool {
        matches!(
            self,
            Self::Less | Self::LessEq | Self::Greater | Self::GreaterEq
        )
    }

    /// Check if this opcode is declared but has no execution semantics
    ///
    /// Local-variable and jump opcodes are part of the instruction set and
    /// are decoded by the disassembler, but the execution engine faults on
    /// them.
    pub fn is_declared_only(self) -> bool {
        matches!(
            self,
            Self::DeclareLocal
                | Self::LoadLocal
                | Self::StoreLocal
                | Self::Jump
                | Self::JumpIfFalse
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_OPCODES: [Opcode; 25] = [
        Opcode::PushConstant,
        Opcode::PushTrue,
        Opcode::PushFalse,
        Opcode::PushNil,
        Opcode::Pop,
        Opcode::Add,
        Opcode::Sub,
        Opcode::Mul,
        Opcode::Div,
        Opcode::Negate,
        Opcode::Not,
        Opcode::Eq,
        Opcode::Less,
        Opcode::LessEq,
        Opcode::Greater,
        Opcode::GreaterEq,
        Opcode::LoadGlobal,
        Opcode::StoreGlobal,
        Opcode::DeclareLocal,
        Opcode::LoadLocal,
        Opcode::StoreLocal,
        Opcode::Jump,
        Opcode::JumpIfFalse,
        Opcode::Print,
        Opcode::Halt,
    ];

    #[test]
    fn test_opcode_roundtrip() {
        for opcode in &ALL_OPCODES {
            let byte = opcode.to_u8();
            let decoded = Opcode::from_u8(byte);
            assert_eq!(decoded, Some(*opcode), "Failed roundtrip for {:?}", opcode);
        }
    }

    #[test]
    fn test_invalid_opcode() {
        assert_eq!(Opcode::from_u8(0x00), None);
        assert_eq!(Opcode::from_u8(0x0F), None);
        assert_eq!(Opcode::from_u8(0x60), None);
        assert_eq!(Opcode::from_u8(0xFE), None);
    }

    #[test]
    fn test_opcode_names() {
        assert_eq!(Opcode::PushConstant.name(), "PUSH_CONSTANT");
        assert_eq!(Opcode::LessEq.name(), "LESS_EQ");
        assert_eq!(Opcode::StoreGlobal.name(), "STORE_GLOBAL");
        assert_eq!(Opcode::Halt.name(), "HALT");
    }

    #[test]
    fn test_operand_widths() {
        for opcode in &ALL_OPCODES {
            let expected = if *opcode == Opcode::PushConstant { 3 } else { 0 };
            assert_eq!(opcode.operand_width(), expected, "width of {:?}", opcode);
        }
    }

    #[test]
    fn test_ordering_detection() {
        assert!(Opcode::Less.is_ordering());
        assert!(Opcode::LessEq.is_ordering());
        assert!(Opcode::Greater.is_ordering());
        assert!(Opcode::GreaterEq.is_ordering());
        assert!(!Opcode::Eq.is_ordering());
        assert!(!Opcode::Add.is_ordering());
    }

    #[test]
    fn test_declared_only_detection() {
        assert!(Opcode::DeclareLocal.is_declared_only());
        assert!(Opcode::LoadLocal.is_declared_only());
        assert!(Opcode::StoreLocal.is_declared_only());
        assert!(Opcode::Jump.is_declared_only());
        assert!(Opcode::JumpIfFalse.is_declared_only());
        assert!(!Opcode::LoadGlobal.is_declared_only());
        assert!(!Opcode::Halt.is_declared_only());
    }
}
