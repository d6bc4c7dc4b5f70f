//! Core interpreter implementation and components.

mod analysis;
mod memory;
mod stack;

pub use analysis::{analyze_legacy, JumpTable};
pub use memory::Memory;
pub use stack::Stack;

use crate::{
    gas::{num_words, MemoryExtensionResult},
    instructions::instruction_table,
    opcode, Gas, Host, InstructionResult, InterpreterResult,
};
use core::mem;
use primitives::{hardfork::SpecId, Address, Bytes, MEMORY_LIMIT, U256};
use state::Bytecode;

/// Everything a frame needs to start executing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterpreterInput {
    /// Account whose storage and balance the code acts on.
    pub target_address: Address,
    /// Caller of this frame.
    pub caller: Address,
    /// Call data. Empty for deployments.
    pub input: Bytes,
    /// Value reported by `CALLVALUE`.
    pub call_value: U256,
    /// Code to run: runtime code for calls, init code for deployments.
    pub bytecode: Bytecode,
    /// Gas available to the frame.
    pub gas_limit: u64,
    /// Whether state changes are forbidden.
    pub is_static: bool,
}

/// Contract every instruction executor fulfills.
///
/// Given code, call data, gas and a host, run to completion and report how the frame ended,
/// what it returned and how much gas is left.
pub trait InstructionExecutor {
    /// Executes one frame.
    fn execute(&self, input: InterpreterInput, host: &mut dyn Host) -> InterpreterResult;
}

/// Bundled bytecode interpreter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EthInterpreter;

impl InstructionExecutor for EthInterpreter {
    fn execute(&self, input: InterpreterInput, host: &mut dyn Host) -> InterpreterResult {
        let cfg = &host.env().cfg;
        let (spec_id, memory_limit) = (cfg.spec, cfg.memory_limit);
        Interpreter::new_with_memory_limit(input, spec_id, memory_limit).run(host)
    }
}

/// State of one executing frame.
#[derive(Debug, Clone)]
pub struct Interpreter {
    /// Code being executed.
    pub bytecode: Bytes,
    /// Valid jump destinations of `bytecode`.
    pub jump_table: JumpTable,
    /// Program counter.
    pub pc: usize,
    /// Operand stack.
    pub stack: Stack,
    /// Frame memory.
    pub memory: Memory,
    /// Memory size in bytes past which the frame halts.
    pub memory_limit: u64,
    /// Gas counter.
    pub gas: Gas,
    /// Output of the last nested call or deployment.
    pub return_data: Bytes,
    /// Frame input.
    pub input: InterpreterInput,
    /// Active hardfork.
    pub spec_id: SpecId,
    /// Set to anything but `Continue` to stop the loop.
    pub instruction_result: InstructionResult,
    /// Data returned by `RETURN` or `REVERT`.
    pub output: Bytes,
}

impl Interpreter {
    /// Create new interpreter with the default memory limit.
    pub fn new(input: InterpreterInput, spec_id: SpecId) -> Self {
        Self::new_with_memory_limit(input, spec_id, MEMORY_LIMIT)
    }

    /// Create new interpreter whose memory can't grow past `memory_limit` bytes.
    pub fn new_with_memory_limit(
        input: InterpreterInput,
        spec_id: SpecId,
        memory_limit: u64,
    ) -> Self {
        let bytecode = input.bytecode.original_bytes();
        let jump_table = analyze_legacy(&bytecode);
        Self {
            bytecode,
            jump_table,
            pc: 0,
            stack: Stack::new(),
            memory: Memory::new(),
            memory_limit,
            gas: Gas::new(input.gas_limit),
            return_data: Bytes::new(),
            input,
            spec_id,
            instruction_result: InstructionResult::Continue,
            output: Bytes::new(),
        }
    }

    /// Opcode at the program counter. Past the end of the code is `STOP`.
    #[inline]
    pub fn current_opcode(&self) -> u8 {
        self.bytecode.get(self.pc).copied().unwrap_or(opcode::STOP)
    }

    /// Stops execution with `result`.
    #[inline]
    pub fn halt(&mut self, result: InstructionResult) {
        self.instruction_result = result;
    }

    /// Grows memory to cover `offset..offset + len`, charging for it.
    ///
    /// Returns `false` and halts with `MemoryLimitOOG` if the new size is over the memory limit,
    /// or with `OutOfGas` if the expansion can't be paid for.
    #[inline]
    #[must_use]
    pub fn resize_memory(&mut self, offset: usize, len: usize) -> bool {
        if len == 0 {
            return true;
        }
        let Some(end) = offset.checked_add(len) else {
            self.halt(InstructionResult::OutOfGas);
            return false;
        };
        let words = num_words(end);
        if (words as u64).saturating_mul(32) > self.memory_limit {
            self.halt(InstructionResult::MemoryLimitOOG);
            return false;
        }
        match self.gas.record_memory_expansion(words) {
            MemoryExtensionResult::Extended => {
                self.memory.resize(words * 32);
                true
            }
            MemoryExtensionResult::Same => true,
            MemoryExtensionResult::OutOfGas => {
                self.halt(InstructionResult::OutOfGas);
                false
            }
        }
    }

    /// Executes the instruction at the program counter.
    #[inline]
    pub fn step(&mut self, host: &mut dyn Host) {
        let opcode = self.current_opcode();
        self.pc += 1;
        instruction_table()[opcode as usize](self, host);
    }

    /// Runs until the frame stops, reverts or halts.
    pub fn run(&mut self, host: &mut dyn Host) -> InterpreterResult {
        while self.instruction_result == InstructionResult::Continue {
            host.step(self);
            self.step(host);
            host.step_end(self);
        }
        InterpreterResult::new(self.instruction_result, mem::take(&mut self.output), self.gas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{gas, CallInputs, CallOutcome, CreateInputs, CreateOutcome, HostError};
    use context::{Env, SStoreResult, StateLoad};
    use primitives::{bytes, Log, B256};
    use state::AccountInfo;

    /// Host without state: every access is warm and empty.
    #[derive(Default)]
    struct NoopHost {
        env: Env,
    }

    impl Host for NoopHost {
        fn env(&self) -> &Env {
            &self.env
        }
        fn load_account(&mut self, _: Address) -> Result<StateLoad<AccountInfo>, HostError> {
            Ok(StateLoad::new(AccountInfo::default(), false))
        }
        fn load_code(&mut self, _: Address) -> Result<StateLoad<Bytecode>, HostError> {
            Ok(StateLoad::new(Bytecode::default(), false))
        }
        fn block_hash(&mut self, _: u64) -> Result<B256, HostError> {
            Ok(B256::ZERO)
        }
        fn sload(&mut self, _: Address, _: U256) -> Result<StateLoad<U256>, HostError> {
            Ok(StateLoad::new(U256::ZERO, false))
        }
        fn sstore(
            &mut self,
            _: Address,
            _: U256,
            _: U256,
        ) -> Result<StateLoad<SStoreResult>, HostError> {
            Ok(StateLoad::default())
        }
        fn tload(&mut self, _: Address, _: U256) -> U256 {
            U256::ZERO
        }
        fn tstore(&mut self, _: Address, _: U256, _: U256) -> Result<(), HostError> {
            Ok(())
        }
        fn log(&mut self, _: Log) -> Result<(), HostError> {
            Ok(())
        }
        fn call(&mut self, inputs: CallInputs) -> CallOutcome {
            CallOutcome::new(
                InterpreterResult::new_with_limit(InstructionResult::Stop, inputs.gas_limit),
                inputs.return_memory_offset,
            )
        }
        fn create(&mut self, inputs: CreateInputs) -> CreateOutcome {
            CreateOutcome::new(
                InterpreterResult::new_with_limit(InstructionResult::Stop, inputs.gas_limit),
                None,
            )
        }
    }

    fn run(code: Bytes, gas_limit: u64) -> InterpreterResult {
        let input = InterpreterInput {
            bytecode: Bytecode::new_raw(code),
            gas_limit,
            ..Default::default()
        };
        EthInterpreter.execute(input, &mut NoopHost::default())
    }

    #[test]
    fn add_and_return() {
        // PUSH1 2 PUSH1 3 ADD PUSH1 0 MSTORE PUSH1 32 PUSH1 0 RETURN
        let result = run(bytes!("600260030160005260206000f3"), 100_000);
        assert_eq!(result.result, InstructionResult::Return);
        assert_eq!(result.output.len(), 32);
        assert_eq!(U256::from_be_slice(&result.output), U256::from(5));
        // five pushes, ADD, MSTORE and one word of memory
        assert_eq!(
            result.gas.spent(),
            5 * gas::VERYLOW + gas::VERYLOW + gas::MEMORY
        );
    }

    #[test]
    fn running_off_the_end_stops() {
        let result = run(bytes!("6001"), 100);
        assert_eq!(result.result, InstructionResult::Stop);
        assert_eq!(result.gas.spent(), gas::VERYLOW);
    }

    #[test]
    fn invalid_jump_halts() {
        // PUSH1 3 JUMP STOP
        let result = run(bytes!("60035600"), 100);
        assert_eq!(result.result, InstructionResult::InvalidJump);
    }

    #[test]
    fn out_of_gas_halts() {
        let result = run(bytes!("60016001"), 4);
        assert_eq!(result.result, InstructionResult::OutOfGas);
    }

    #[test]
    fn stack_underflow() {
        let result = run(bytes!("01"), 100);
        assert_eq!(result.result, InstructionResult::StackUnderflow);
    }

    #[test]
    fn revert_returns_data() {
        // PUSH1 0xaa PUSH1 0 MSTORE8 PUSH1 1 PUSH1 0 REVERT
        let result = run(bytes!("60aa60005360016000fd"), 100_000);
        assert_eq!(result.result, InstructionResult::Revert);
        assert_eq!(result.output, bytes!("aa"));
    }

    #[test]
    fn designated_invalid() {
        let result = run(bytes!("fe"), 100);
        assert_eq!(result.result, InstructionResult::InvalidFEOpcode);
        let result = run(bytes!("0c"), 100);
        assert_eq!(result.result, InstructionResult::OpcodeNotFound);
    }

    #[test]
    fn sstore_in_static_frame() {
        let input = InterpreterInput {
            bytecode: Bytecode::new_raw(bytes!("6001600055")),
            gas_limit: 100_000,
            is_static: true,
            ..Default::default()
        };
        let result = EthInterpreter.execute(input, &mut NoopHost::default());
        assert_eq!(result.result, InstructionResult::StateChangeDuringStaticCall);
    }

    #[test]
    fn memory_limit_halts_before_charging() {
        let mut host = NoopHost::default();
        host.env.cfg.memory_limit = 64;
        let input = |code| InterpreterInput {
            bytecode: Bytecode::new_raw(code),
            gas_limit: 100_000,
            ..Default::default()
        };

        // PUSH1 1 PUSH1 32 MSTORE fills exactly 64 bytes
        let result = EthInterpreter.execute(input(bytes!("6001602052")), &mut host);
        assert_eq!(result.result, InstructionResult::Stop);

        // PUSH1 1 PUSH1 33 MSTORE needs a third word
        let result = EthInterpreter.execute(input(bytes!("6001602152")), &mut host);
        assert_eq!(result.result, InstructionResult::MemoryLimitOOG);
        // two pushes and the static cost of MSTORE, nothing for memory
        assert_eq!(result.gas.spent(), 3 * gas::VERYLOW);
    }
}
