//! EIP-3155 traces of engine transactions.
use serde_json::Value;
use simevm::{
    inspector::inspectors::TracerEip3155,
    interpreter::opcode::*,
    primitives::{address, Address, Bytes, U256},
    state::{AccountInfo, Bytecode},
    Engine, EngineOpts,
};
use std::{cell::RefCell, io::Write, rc::Rc};

const ALICE: Address = address!("0x00000000000000000000000000000000000a11ce");
const TARGET: Address = address!("0x7a7a00000000000000000000000000000000007a");

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
    fn lines(&self) -> anyhow::Result<Vec<Value>> {
        let data = self.0.borrow();
        std::str::from_utf8(&data)?
            .lines()
            .map(|line| Ok(serde_json::from_str(line)?))
            .collect()
    }
}

#[test]
fn traces_each_step_and_summary() -> anyhow::Result<()> {
    let buf = SharedBuf::default();
    let mut engine = Engine::new_with_inspector(
        EngineOpts::default(),
        Box::new(TracerEip3155::new(Box::new(buf.clone()))),
    );
    engine.insert_account_info(ALICE, AccountInfo::from_balance(U256::from(1_000)));
    // PUSH1 1 PUSH1 0 SSTORE STOP
    engine.insert_account_info(
        TARGET,
        AccountInfo::default().with_code(Bytecode::new_raw(Bytes::from(vec![
            PUSH1, 1, PUSH1, 0, SSTORE, STOP,
        ]))),
    );

    let result = engine.message_call(ALICE, TARGET, Bytes::new(), U256::ZERO, None, None, false)?;
    assert!(result.is_success());

    let lines = buf.lines()?;
    assert_eq!(lines.len(), 5);
    let ops: Vec<_> = lines[..4].iter().map(|line| line["opName"].clone()).collect();
    assert_eq!(ops, ["PUSH1", "PUSH1", "SSTORE", "STOP"]);
    assert_eq!(lines[0]["depth"], 1);
    assert_eq!(lines[2]["stack"].as_array().map(Vec::len), Some(2));

    let summary = &lines[4];
    assert_eq!(summary["pass"], true);
    assert_eq!(summary["gasUsed"], format!("{:#x}", result.gas_used()));
    assert_eq!(summary["fork"], "Cancun");
    Ok(())
}

#[test]
fn tracing_flag_is_reported() {
    let engine = Engine::new(EngineOpts {
        tracing: true,
        ..Default::default()
    });
    assert!(engine.tracing());
}
