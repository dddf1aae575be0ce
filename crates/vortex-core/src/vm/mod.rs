//! Virtual machine execution engine

mod interpreter;
mod state;

pub use interpreter::{Machine, MachineOptions};
pub use state::{Fault, VmState};
