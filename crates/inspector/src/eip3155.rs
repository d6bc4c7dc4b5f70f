use crate::{inspectors::GasInspector, Inspector};
use context::{Env, ExecutionResult};
use interpreter::{opcode, Interpreter};
use primitives::{hex, B256, U256};
use serde::Serialize;
use std::io::Write;

/// [EIP-3155](https://eips.ethereum.org/EIPS/eip-3155) tracer [Inspector].
///
/// Writes one JSON line per executed instruction and, unless disabled, a summary line per
/// transaction. A line is written once its instruction finished, so the line of a `CALL` or
/// `CREATE` follows the lines of the frame it ran.
pub struct TracerEip3155 {
    output: Box<dyn Write>,
    gas_inspector: GasInspector,
    /// Print summary of the execution.
    print_summary: bool,
    /// Instruction state captured in `step`, one slot per call depth.
    pending: Vec<Option<PendingStep>>,
}

impl core::fmt::Debug for TracerEip3155 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TracerEip3155")
            .field("gas_inspector", &self.gas_inspector)
            .field("print_summary", &self.print_summary)
            .field("pending", &self.pending)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
struct PendingStep {
    pc: u64,
    opcode: u8,
    gas: u64,
    stack: Vec<U256>,
    return_data: String,
    refunded: i64,
    mem_size: usize,
}

// # Output
// The CUT MUST output a `json` object for EACH operation.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Output<'a> {
    // Required fields:
    /// Program counter
    pc: u64,
    /// OpCode
    op: u8,
    /// Gas left before executing this operation
    #[serde(serialize_with = "serde_hex_u64")]
    gas: u64,
    /// Gas cost of this operation
    #[serde(serialize_with = "serde_hex_u64")]
    gas_cost: u64,
    /// Array of all values on the stack
    stack: &'a [U256],
    /// Depth of the call stack
    depth: u64,
    /// Data returned by the function call
    return_data: &'a str,
    /// Amount of **global** gas refunded
    #[serde(serialize_with = "serde_hex_u64")]
    refund: u64,
    /// Size of memory array
    #[serde(serialize_with = "serde_hex_u64")]
    mem_size: u64,

    // Optional fields:
    /// Name of the operation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    op_name: Option<&'static str>,
    /// Description of an error (should contain revert reason if supported)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

// # Summary and error handling
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary {
    // Required fields:
    /// Root of the state trie after executing the transaction
    state_root: String,
    /// Return values of the function
    output: String,
    /// All gas used by the transaction
    #[serde(serialize_with = "serde_hex_u64")]
    gas_used: u64,
    /// Bool whether transaction was executed successfully
    pass: bool,

    // Optional fields:
    /// Name of the fork rules used for execution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fork: Option<String>,
}

impl TracerEip3155 {
    /// Creates a new EIP-3155 tracer with the given output writer, by first wrapping it in a
    /// [`BufWriter`](std::io::BufWriter).
    pub fn buffered(output: impl Write + 'static) -> Self {
        Self::new(Box::new(std::io::BufWriter::new(output)))
    }

    /// Creates a new EIP-3155 tracer with a stdout output.
    pub fn new_stdout() -> Self {
        Self::buffered(std::io::stdout())
    }

    /// Creates a new EIP-3155 tracer with the given output writer.
    pub fn new(output: Box<dyn Write>) -> Self {
        Self {
            output,
            gas_inspector: GasInspector::new(),
            print_summary: true,
            pending: Vec::new(),
        }
    }

    /// Sets the writer to use for the output.
    pub fn set_writer(&mut self, writer: Box<dyn Write>) {
        self.output = writer;
    }

    /// Don't include a summary at the end of the trace
    pub fn without_summary(mut self) -> Self {
        self.print_summary = false;
        self
    }

    /// Resets the tracer to its initial state of [`Self::new`].
    pub fn clear(&mut self) {
        self.gas_inspector.clear();
        self.pending.clear();
    }

    fn write_value(&mut self, value: &impl Serialize) -> std::io::Result<()> {
        write_value(&mut *self.output, value)
    }
}

impl Inspector for TracerEip3155 {
    fn step(&mut self, interp: &Interpreter, depth: usize) {
        self.gas_inspector.record_step(&interp.gas, depth);
        if self.pending.len() <= depth {
            self.pending.resize(depth + 1, None);
        }
        self.pending[depth] = Some(PendingStep {
            pc: interp.pc as u64,
            opcode: interp.current_opcode(),
            gas: interp.gas.remaining(),
            stack: interp.stack.data().to_vec(),
            return_data: hex::encode_prefixed(&interp.return_data),
            refunded: interp.gas.refunded(),
            mem_size: interp.memory.len(),
        });
    }

    fn step_end(&mut self, interp: &Interpreter, depth: usize) {
        self.gas_inspector.record_step_end(&interp.gas, depth);
        let Some(step) = self.pending.get_mut(depth).and_then(Option::take) else {
            return;
        };

        let result = interp.instruction_result;
        let value = Output {
            pc: step.pc,
            op: step.opcode,
            gas: step.gas,
            gas_cost: self.gas_inspector.last_gas_cost(),
            stack: &step.stack,
            // EIP-3155 counts depth from one.
            depth: depth as u64 + 1,
            return_data: &step.return_data,
            refund: step.refunded.max(0) as u64,
            mem_size: step.mem_size as u64,
            op_name: opcode::name(step.opcode),
            error: result.is_error().then(|| format!("{result:?}")),
        };
        let _ = write_value(&mut *self.output, &value);
    }

    fn transaction_end(&mut self, result: &ExecutionResult, env: &Env) {
        if self.print_summary {
            let summary = Summary {
                state_root: B256::ZERO.to_string(),
                output: result
                    .output()
                    .map(|output| output.to_string())
                    .unwrap_or_else(|| "0x".to_string()),
                gas_used: result.gas_used(),
                pass: result.is_success(),
                fork: Some(env.spec().to_string()),
            };
            let _ = self.write_value(&summary);
        }
        let _ = self.output.flush();
        self.clear();
    }
}

fn write_value(output: &mut dyn Write, value: &impl Serialize) -> std::io::Result<()> {
    serde_json::to_writer(&mut *output, value)?;
    output.write_all(b"\n")
}

fn serde_hex_u64<S: serde::Serializer>(n: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format!("{:#x}", *n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use context::SuccessReason;
    use interpreter::{InterpreterInput, InstructionResult};
    use primitives::{bytes, hardfork::SpecId, Bytes};
    use serde_json::Value;
    use state::Bytecode;
    use std::{cell::RefCell, rc::Rc};

    /// Writer whose contents stay readable after the tracer took ownership.
    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn lines(&self) -> Vec<Value> {
            let data = self.0.borrow();
            std::str::from_utf8(&data)
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    fn interpreter(code: Bytes) -> Interpreter {
        Interpreter::new(
            InterpreterInput {
                bytecode: Bytecode::new_raw(code),
                gas_limit: 1_000,
                ..Default::default()
            },
            SpecId::CANCUN,
        )
    }

    #[test]
    fn step_lines_and_summary() {
        let buf = SharedBuf::default();
        let mut tracer = TracerEip3155::new(Box::new(buf.clone()));

        // PUSH1 1
        let mut interp = interpreter(bytes!("6001"));
        tracer.step(&interp, 0);
        assert!(interp.gas.record_cost(3));
        assert!(interp.stack.push(U256::from(1)));
        interp.pc = 2;
        tracer.step_end(&interp, 0);

        let result = ExecutionResult::Success {
            reason: SuccessReason::Stop,
            gas_used: 21_003,
            gas_refunded: 0,
            logs: Vec::new(),
            output: context::Output::Call(Bytes::new()),
        };
        tracer.transaction_end(&result, &Env::new_with_spec(SpecId::CANCUN));

        let lines = buf.lines();
        assert_eq!(lines.len(), 2);
        let step = &lines[0];
        assert_eq!(step["pc"], 0);
        assert_eq!(step["op"], 0x60);
        assert_eq!(step["opName"], "PUSH1");
        assert_eq!(step["gas"], "0x3e8");
        assert_eq!(step["gasCost"], "0x3");
        assert_eq!(step["depth"], 1);
        assert_eq!(step["stack"].as_array().unwrap().len(), 0);
        assert!(step.get("error").is_none());

        let summary = &lines[1];
        assert_eq!(summary["pass"], true);
        assert_eq!(summary["gasUsed"], "0x520b");
        assert_eq!(summary["output"], "0x");
        assert_eq!(summary["fork"], SpecId::CANCUN.to_string());
    }

    #[test]
    fn nested_step_keeps_parent_state() {
        let buf = SharedBuf::default();
        let mut tracer = TracerEip3155::new(Box::new(buf.clone())).without_summary();

        let mut parent = interpreter(bytes!("f1"));
        tracer.step(&parent, 0);
        assert!(parent.gas.record_cost(700));

        let mut child = interpreter(bytes!("00"));
        tracer.step(&child, 1);
        child.halt(InstructionResult::Stop);
        tracer.step_end(&child, 1);

        tracer.step_end(&parent, 0);

        let lines = buf.lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["opName"], "STOP");
        assert_eq!(lines[0]["depth"], 2);
        assert_eq!(lines[1]["opName"], "CALL");
        assert_eq!(lines[1]["gasCost"], "0x2bc");
    }
}
