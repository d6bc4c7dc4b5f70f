//! # simevm-interpreter
//!
//! The instruction executor contract the call executor drives, and the bundled bytecode
//! interpreter implementing it.
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod gas;
mod host;
mod instruction_result;
pub mod instructions;
pub mod interpreter;
pub mod interpreter_action;
pub mod opcode;

pub use context;
pub use primitives;
pub use state;

pub use gas::{Gas, MemoryGas};
pub use host::{Host, HostError};
pub use instruction_result::{InstructionResult, SuccessOrHalt};
pub use instructions::{instruction_table, Instruction, InstructionTable};
pub use interpreter::{
    analyze_legacy, EthInterpreter, InstructionExecutor, Interpreter, InterpreterInput, JumpTable,
    Memory, Stack,
};
pub use interpreter_action::{
    CallInputs, CallOutcome, CallScheme, CallValue, CreateInputs, CreateOutcome, CreateScheme,
    InterpreterResult,
};
