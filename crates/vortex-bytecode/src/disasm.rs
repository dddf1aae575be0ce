//! Bytecode disassembler
//!
//! A pure read-only formatter over a [`Program`]. Output has two sections:
//! a `CONSTANTS:` section with one `[index] : <display text>` line per pool
//! entry, then a `BYTECODE BEGINS:` section with one
//! `<sourceLine>: <MNEMONIC>[ <operand>]` line per decoded instruction.
//!
//! Instruction boundaries come from [`Opcode::operand_width`], the same
//! table the execution engine decodes with, so disassembly and execution
//! always agree on where instructions start.

use crate::opcode::Opcode;
use crate::program::Program;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Disassemble a program into its two-section text form
pub fn disassemble(program: &Program) -> String {
    let mut out = String::new();

    out.push_str("CONSTANTS:\n");
    for (index, constant) in program.constants().iter().enumerate() {
        out.push_str(&format!(
            "[{}] : {}\n",
            index,
            constant.display_text(program.heap())
        ));
    }

    out.push_str("BYTECODE BEGINS:\n");
    let code = program.code();
    let mut offset = 0;
    while offset < code.len() {
        let line = program.line_at(offset).unwrap_or(0);
        let (text, width) = disassemble_instruction(code, offset);
        out.push_str(&format!("{}: {}\n", line, text));
        offset += width;
    }

    out
}

/// Write the disassembly to `<name>.vbyte`, returning the path written
pub fn write_to_file(program: &Program, name: &str) -> io::Result<PathBuf> {
    let path = PathBuf::from(format!("{}.vbyte", name));
    fs::write(&path, disassemble(program))?;
    Ok(path)
}

/// Decode one instruction at `offset`, returning its text and encoded width
fn disassemble_instruction(code: &[u8], offset: usize) -> (String, usize) {
    let byte = code[offset];
    let Some(opcode) = Opcode::from_u8(byte) else {
        return (format!("???(0x{:02X})", byte), 1);
    };

    match opcode.operand_width() {
        0 => (opcode.name().to_string(), 1),
        3 => {
            if offset + 3 >= code.len() {
                // Not enough bytes left for the operand; consume the rest
                return (
                    format!("{} <truncated>", opcode.name()),
                    code.len() - offset,
                );
            }
            let b1 = code[offset + 1] as u32;
            let b2 = code[offset + 2] as u32;
            let b3 = code[offset + 3] as u32;
            let index = (b1 << 16) | (b2 << 8) | b3;
            (format!("{} {}", opcode.name(), index), 4)
        }
        width => (opcode.name().to_string(), 1 + width),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn bytecode_lines(text: &str) -> Vec<String> {
        text.lines()
            .skip_while(|l| *l != "BYTECODE BEGINS:")
            .skip(1)
            .map(|l| l.to_string())
            .collect()
    }

    #[test]
    fn test_constants_section() {
        let mut program = Program::new();
        program.add_constant(Value::Double(0.0)).unwrap();
        program.add_constant(Value::Double(67.0)).unwrap();
        let s = program.intern_string("Hello World");
        program.add_constant(Value::Object(s)).unwrap();

        let text = disassemble(&program);
        assert!(text.starts_with("CONSTANTS:\n"));
        assert!(text.contains("[0] : 0\n"));
        assert!(text.contains("[1] : 67\n"));
        assert!(text.contains("[2] : \"Hello World\"\n"));
    }

    #[test]
    fn test_push_constant_is_one_line() {
        let mut program = Program::new();
        program.add_constant(Value::Double(1.0)).unwrap();
        program.add_constant(Value::Double(2.0)).unwrap();
        program.add_constant(Value::Double(3.0)).unwrap();
        program.emit_push_constant(2, 5).unwrap();

        let lines = bytecode_lines(&disassemble(&program));
        // All 4 bytes decode as one instruction, operand rendered decimal
        assert_eq!(lines, vec!["5: PUSH_CONSTANT 2"]);
    }

    #[test]
    fn test_source_lines_prefix_each_instruction() {
        let mut program = Program::new();
        program.emit(Opcode::PushTrue, 1);
        program.emit(Opcode::Not, 2);
        program.emit(Opcode::Halt, 3);

        let lines = bytecode_lines(&disassemble(&program));
        assert_eq!(lines, vec!["1: PUSH_TRUE", "2: NOT", "3: HALT"]);
    }

    #[test]
    fn test_declared_only_opcodes_decode() {
        let mut program = Program::new();
        program.emit(Opcode::DeclareLocal, 1);
        program.emit(Opcode::Jump, 1);
        program.emit(Opcode::JumpIfFalse, 1);

        let lines = bytecode_lines(&disassemble(&program));
        assert_eq!(lines, vec!["1: DECLARE_LOCAL", "1: JUMP", "1: JUMP_IF_FALSE"]);
    }

    #[test]
    fn test_unknown_byte_renders_and_advances() {
        let mut program = Program::new();
        program.push_code(0x60, 1);
        program.emit(Opcode::Halt, 1);

        let lines = bytecode_lines(&disassemble(&program));
        assert_eq!(lines, vec!["1: ???(0x60)", "1: HALT"]);
    }

    #[test]
    fn test_roundtrip_instruction_boundaries() {
        let mut program = Program::new();
        for _ in 0..4 {
            program.add_constant(Value::Double(9.0)).unwrap();
        }
        // (mnemonic, operand) expectations in encode order
        let expected = vec![
            ("PUSH_CONSTANT", Some(0)),
            ("PUSH_CONSTANT", Some(3)),
            ("ADD", None),
            ("PRINT", None),
            ("HALT", None),
        ];
        program.emit_push_constant(0, 1).unwrap();
        program.emit_push_constant(3, 1).unwrap();
        program.emit(Opcode::Add, 2);
        program.emit(Opcode::Print, 2);
        program.emit(Opcode::Halt, 3);

        // Re-parse the mnemonic stream and compare instruction boundaries
        let mut decoded = Vec::new();
        for line in bytecode_lines(&disassemble(&program)) {
            let rest = line.split_once(": ").unwrap().1;
            match rest.split_once(' ') {
                Some((mnemonic, operand)) => {
                    decoded.push((mnemonic.to_string(), Some(operand.parse::<u32>().unwrap())));
                }
                None => decoded.push((rest.to_string(), None)),
            }
        }
        let expected: Vec<(String, Option<u32>)> = expected
            .into_iter()
            .map(|(m, o)| (m.to_string(), o))
            .collect();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_write_to_file_appends_vbyte_extension() {
        let mut program = Program::new();
        program.add_constant(Value::Double(1.5)).unwrap();
        program.emit_push_constant(0, 1).unwrap();
        program.emit(Opcode::Halt, 1);

        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("out");
        let path = write_to_file(&program, base.to_str().unwrap()).unwrap();
        assert_eq!(path.extension().unwrap(), "vbyte");

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.contains("CONSTANTS:"));
        assert!(contents.contains("1: PUSH_CONSTANT 0"));
    }
}
