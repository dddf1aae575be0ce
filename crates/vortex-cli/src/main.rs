//! Vortex VM command-line tool
//!
//! There is no source-language front-end yet, so the CLI ships a built-in
//! demo program assembled directly against the bytecode API. It exercises
//! arithmetic, string printing, and the global table end to end.

use anyhow::Result;
use clap::{Parser, Subcommand};
use vortex_bytecode::{disasm, Opcode, Program, Value};
use vortex_core::{Machine, MachineOptions, VmState};

#[derive(Parser)]
#[command(name = "vortex")]
#[command(about = "Vortex stack virtual machine", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble and run the built-in demo program
    Demo {
        /// Dump the stack after every instruction
        #[arg(long)]
        trace: bool,
        /// Dump the stack if execution ends in a fault
        #[arg(long)]
        dump_stack: bool,
    },

    /// Print the demo program's disassembly
    Disasm,

    /// Write the demo program's disassembly to <name>.vbyte
    Dump {
        /// Output file stem
        #[arg(default_value = "demo")]
        name: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Demo { trace, dump_stack } => run_demo(trace, dump_stack),
        Commands::Disasm => {
            let program = demo_program()?;
            print!("{}", disasm::disassemble(&program));
            Ok(())
        }
        Commands::Dump { name } => {
            let program = demo_program()?;
            let path = disasm::write_to_file(&program, &name)?;
            println!("Wrote {}", path.display());
            Ok(())
        }
    }
}

fn run_demo(trace: bool, dump_stack: bool) -> Result<()> {
    let mut program = demo_program()?;
    let options = MachineOptions {
        trace_execution: trace,
        dump_stack_on_fault: dump_stack,
        ..MachineOptions::default()
    };
    let mut machine = Machine::with_options(&mut program, options);
    let state = machine.run();
    if state != VmState::Halted {
        anyhow::bail!("demo program ended in state: {state}");
    }
    Ok(())
}

/// Assemble the demo: compute 3.5 + 6.5, store it in the global `answer`,
/// greet, then load the global back and print it.
fn demo_program() -> Result<Program> {
    let mut program = Program::new();

    let slot = program.declare_global("answer", Value::Nil)?;
    let hello = program.intern_string("Hello, Vortex");

    let a = program.add_constant(Value::Double(3.5))?;
    let b = program.add_constant(Value::Double(6.5))?;
    let greeting = program.add_constant(Value::Object(hello))?;
    let answer_slot = program.add_constant(Value::Double(slot as f64))?;

    // answer = 3.5 + 6.5
    program.emit_push_constant(a, 1)?;
    program.emit_push_constant(b, 1)?;
    program.emit(Opcode::Add, 1);
    program.emit_push_constant(answer_slot, 1)?;
    program.emit(Opcode::StoreGlobal, 1);

    // print "Hello, Vortex"
    program.emit_push_constant(greeting, 2)?;
    program.emit(Opcode::Print, 2);

    // print answer
    program.emit_push_constant(answer_slot, 3)?;
    program.emit(Opcode::LoadGlobal, 3);
    program.emit(Opcode::Print, 3);

    // leave answer on the stack as the program result
    program.emit_push_constant(answer_slot, 4)?;
    program.emit(Opcode::LoadGlobal, 4);
    program.emit(Opcode::Halt, 4);

    Ok(program)
}
