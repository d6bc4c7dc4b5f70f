//! End-to-end behavior of the engine against the bundled interpreter.
use simevm::{
    context::{ExecutionResult, HaltReason, SuccessReason},
    interpreter::opcode::*,
    primitives::{address, eip170::MAX_CODE_SIZE, keccak256, Address, Bytes, U256},
    state::{AccountInfo, Bytecode},
    Engine, EngineError, EngineOpts,
};

const ALICE: Address = address!("0x00000000000000000000000000000000000a11ce");
const BOB: Address = address!("0x0000000000000000000000000000000000000b0b");
const STORER: Address = address!("0x5700000000000000000000000000000000000057");
const CALLER_CONTRACT: Address = address!("0xca11000000000000000000000000000000000ca1");

fn engine_with(accounts: &[(Address, AccountInfo)]) -> Engine {
    let mut engine = Engine::default();
    for (address, info) in accounts {
        engine.insert_account_info(*address, info.clone());
    }
    engine
}

fn contract(code: Vec<u8>) -> AccountInfo {
    AccountInfo::default().with_code(Bytecode::new_raw(Bytes::from(code)))
}

fn funded(balance: u64) -> AccountInfo {
    AccountInfo::from_balance(U256::from(balance))
}

/// Stores 42 in slot 5.
fn storer() -> Vec<u8> {
    vec![PUSH1, 42, PUSH1, 5, SSTORE, STOP]
}

/// Calls `target` with all gas and no value, then stores 1 in its own slot 1.
fn call_then_store(target: Address) -> Vec<u8> {
    let mut code = vec![PUSH1, 0, PUSH1, 0, PUSH1, 0, PUSH1, 0, PUSH1, 0, PUSH20];
    code.extend_from_slice(target.as_slice());
    code.extend_from_slice(&[GAS, CALL, POP, PUSH1, 1, PUSH1, 1, SSTORE, STOP]);
    code
}

/// Init code returning `len` zero bytes as the deployed code.
fn returns_zeroes(len: u16) -> Vec<u8> {
    let [hi, lo] = len.to_be_bytes();
    vec![PUSH2, hi, lo, PUSH1, 0, RETURN]
}

#[test]
fn committing_transfer_charges_gas() {
    let mut engine = engine_with(&[(ALICE, funded(100_000))]);
    let result = engine
        .message_call_committing(
            ALICE,
            BOB,
            Bytes::new(),
            U256::from(10_000),
            Some(30_000),
            Some(2),
            false,
        )
        .unwrap();

    assert!(result.is_success());
    assert_eq!(result.gas_used(), 21_000);
    assert_eq!(engine.get_balance(BOB).unwrap(), U256::from(10_000));
    assert_eq!(
        engine.get_balance(ALICE).unwrap(),
        U256::from(100_000 - 10_000 - result.gas_used() * 2)
    );
    assert_eq!(engine.journal_len(), 0);
    assert_eq!(engine.journal_depth(), 0);
    assert_eq!(engine.last_result(), Some(&result));
}

#[test]
fn snapshot_revert_restores_storage() {
    let mut engine = engine_with(&[(ALICE, funded(100_000)), (STORER, contract(storer()))]);

    let checkpoint = engine.snapshot();
    let result = engine
        .message_call(ALICE, STORER, Bytes::new(), U256::ZERO, None, None, false)
        .unwrap();
    assert!(result.is_success());
    assert_eq!(engine.storage(STORER, U256::from(5)).unwrap(), U256::from(42));

    engine.revert(checkpoint).unwrap();
    assert_eq!(engine.storage(STORER, U256::from(5)).unwrap(), U256::ZERO);
    assert_eq!(engine.basic(ALICE).unwrap().nonce, 0);
    assert_eq!(engine.journal_len(), checkpoint.journal_i);
    assert_eq!(engine.journal_logs().len(), checkpoint.log_i);
    assert_eq!(engine.journal_depth(), 0);
}

#[test]
fn revert_undoes_nested_calls() {
    let mut engine = engine_with(&[
        (ALICE, funded(100_000)),
        (STORER, contract(storer())),
        (CALLER_CONTRACT, contract(call_then_store(STORER))),
    ]);

    let checkpoint = engine.snapshot();
    let result = engine
        .message_call(
            ALICE,
            CALLER_CONTRACT,
            Bytes::new(),
            U256::from(1_000),
            None,
            None,
            false,
        )
        .unwrap();
    assert!(result.is_success());
    assert_eq!(engine.storage(STORER, U256::from(5)).unwrap(), U256::from(42));
    assert_eq!(
        engine.storage(CALLER_CONTRACT, U256::from(1)).unwrap(),
        U256::from(1)
    );

    engine.revert(checkpoint).unwrap();
    assert_eq!(engine.storage(STORER, U256::from(5)).unwrap(), U256::ZERO);
    assert_eq!(engine.storage(CALLER_CONTRACT, U256::from(1)).unwrap(), U256::ZERO);
    assert_eq!(engine.get_balance(ALICE).unwrap(), U256::from(100_000));
    assert_eq!(engine.get_balance(CALLER_CONTRACT).unwrap(), U256::ZERO);
}

#[test]
fn commit_matches_no_checkpoint() {
    let setup = [(ALICE, funded(100_000)), (STORER, contract(storer()))];
    let mut with_checkpoint = engine_with(&setup);
    let mut without = engine_with(&setup);

    let checkpoint = with_checkpoint.snapshot();
    let committed = with_checkpoint
        .message_call(ALICE, STORER, Bytes::new(), U256::from(5), None, None, false)
        .unwrap();
    with_checkpoint.commit(checkpoint).unwrap();
    let plain = without
        .message_call(ALICE, STORER, Bytes::new(), U256::from(5), None, None, false)
        .unwrap();

    assert_eq!(committed, plain);
    for address in [ALICE, STORER] {
        assert_eq!(
            with_checkpoint.basic(address).unwrap(),
            without.basic(address).unwrap()
        );
    }
    assert_eq!(
        with_checkpoint.storage(STORER, U256::from(5)).unwrap(),
        without.storage(STORER, U256::from(5)).unwrap()
    );
    assert_eq!(with_checkpoint.journal_len(), without.journal_len());
    assert_eq!(with_checkpoint.journal_depth(), 0);
}

#[test]
fn value_above_balance_halts_without_moving_funds() {
    let mut engine = engine_with(&[(ALICE, funded(500))]);
    let result = engine
        .message_call(ALICE, BOB, Bytes::new(), U256::from(501), None, None, false)
        .unwrap();

    assert_eq!(result.halt_reason(), Some(HaltReason::InsufficientBalance));
    assert_eq!(engine.get_balance(ALICE).unwrap(), U256::from(500));
    assert_eq!(engine.get_balance(BOB).unwrap(), U256::ZERO);
}

#[test]
fn deploy_at_max_code_size() {
    let mut engine = engine_with(&[(ALICE, funded(1_000))]);

    let address = engine
        .deploy(
            ALICE,
            returns_zeroes(MAX_CODE_SIZE as u16).into(),
            U256::ZERO,
            None,
            None,
            None,
        )
        .unwrap();
    assert_eq!(address, ALICE.create(0));
    assert_eq!(engine.get_code(address).unwrap().len(), MAX_CODE_SIZE);
    assert_eq!(engine.basic(ALICE).unwrap().nonce, 1);
}

#[test]
fn deploy_above_max_code_size_reverts_everything() {
    let mut engine = engine_with(&[(ALICE, funded(1_000))]);

    let error = engine
        .deploy(
            ALICE,
            returns_zeroes(MAX_CODE_SIZE as u16 + 1).into(),
            U256::from(10),
            None,
            None,
            None,
        )
        .unwrap_err();
    let EngineError::Execution(result) = &error else {
        panic!("expected an execution failure, got {error:?}");
    };
    assert_eq!(result.halt_reason(), Some(HaltReason::CodeTooLarge));

    let deployer = engine.basic(ALICE).unwrap();
    assert_eq!(deployer.nonce, 0);
    assert_eq!(deployer.balance, U256::from(1_000));
    assert!(engine.get_code(ALICE.create(0)).unwrap().is_empty());
}

#[test]
fn deploy_with_salt_uses_create2_address() {
    let mut engine = engine_with(&[(ALICE, funded(1_000))]);
    let init_code = Bytes::from(returns_zeroes(1));
    let salt = U256::from(7);

    let address = engine
        .deploy(ALICE, init_code.clone(), U256::ZERO, Some(salt), None, None)
        .unwrap();
    assert_eq!(
        address,
        ALICE.create2(salt.to_be_bytes::<32>(), keccak256(&init_code))
    );
}

#[test]
fn static_call_cannot_write() {
    let mut engine = engine_with(&[(ALICE, funded(1_000)), (STORER, contract(storer()))]);
    let result = engine
        .message_call(ALICE, STORER, Bytes::new(), U256::ZERO, Some(100_000), None, true)
        .unwrap();

    assert_eq!(
        result,
        ExecutionResult::Halt {
            reason: HaltReason::StateChangeInStaticContext,
            gas_used: 100_000,
        }
    );
    assert_eq!(engine.storage(STORER, U256::from(5)).unwrap(), U256::ZERO);
}

#[test]
fn revert_returns_data() {
    // PUSH1 0xaa PUSH1 0 MSTORE8 PUSH1 1 PUSH1 0 REVERT
    let reverter = contract(vec![PUSH1, 0xaa, PUSH1, 0, MSTORE8, PUSH1, 1, PUSH1, 0, REVERT]);
    let mut engine = engine_with(&[(ALICE, funded(1_000)), (STORER, reverter)]);

    let result = engine
        .message_call(ALICE, STORER, Bytes::new(), U256::ZERO, None, None, false)
        .unwrap();
    assert!(result.is_revert());
    assert!(!result.is_halt());
    assert_eq!(result.output(), Some(&Bytes::from(vec![0xaa])));
}

#[test]
fn logs_are_captured() {
    // PUSH1 0x11 PUSH1 0 MSTORE8 PUSH1 9 PUSH1 1 PUSH1 0 LOG1
    let logger = contract(vec![
        PUSH1, 0x11, PUSH1, 0, MSTORE8, PUSH1, 9, PUSH1, 1, PUSH1, 0, LOG1, STOP,
    ]);
    let mut engine = engine_with(&[(ALICE, funded(1_000)), (STORER, logger)]);

    let result = engine
        .message_call(ALICE, STORER, Bytes::new(), U256::ZERO, None, None, false)
        .unwrap();
    let ExecutionResult::Success { reason, logs, .. } = &result else {
        panic!("expected success, got {result:?}");
    };
    assert_eq!(*reason, SuccessReason::Stop);
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].address, STORER);
    assert_eq!(logs[0].data.data, Bytes::from(vec![0x11]));
    assert_eq!(logs[0].topics().len(), 1);
    assert_eq!(engine.journal_logs(), logs.as_slice());
}

#[test]
fn recursion_stops_at_call_stack_limit() {
    // Calls itself forever; the innermost call fails with CallTooDeep.
    let code = vec![PUSH1, 0, PUSH1, 0, PUSH1, 0, PUSH1, 0, PUSH1, 0, ADDRESS, GAS, CALL, STOP];
    let mut opts = EngineOpts::default();
    opts.env.cfg.call_stack_limit = 8;
    let mut engine = Engine::new(opts);
    engine.insert_account_info(ALICE, funded(1_000));
    engine.insert_account_info(STORER, contract(code));

    let result = engine
        .message_call(ALICE, STORER, Bytes::new(), U256::ZERO, Some(1_000_000), None, false)
        .unwrap();
    assert!(result.is_success());
    assert_eq!(engine.journal_depth(), 0);
}

#[test]
fn invalid_transaction_is_an_error() {
    let mut engine = engine_with(&[(ALICE, funded(1_000))]);
    let before = engine.journal_len();

    let error = engine
        .message_call(ALICE, BOB, Bytes::new(), U256::ZERO, Some(21_000), Some(1), false)
        .unwrap_err();
    assert!(matches!(error, EngineError::Evm(_)));
    assert_eq!(engine.journal_len(), before);
    assert_eq!(engine.get_balance(ALICE).unwrap(), U256::from(1_000));
    assert_eq!(engine.last_result(), None);
}

#[test]
fn inserted_account_round_trips() {
    let mut engine = Engine::default();
    let info = AccountInfo::from_balance(U256::from(3))
        .with_nonce(9)
        .with_code(Bytecode::new_raw(Bytes::from(storer())));
    engine.insert_account_info(BOB, info.clone());

    let read = engine.basic(BOB).unwrap();
    assert_eq!(read.balance, info.balance);
    assert_eq!(read.nonce, info.nonce);
    assert_eq!(read.code_hash, info.code_hash);
    assert_eq!(
        read.code.map(|code| code.original_bytes()),
        info.code.map(|code| code.original_bytes())
    );
    assert!(engine.accounts().contains_key(&BOB));
}

#[test]
fn transient_storage_is_readable_within_call() {
    // PUSH1 7 PUSH1 1 TSTORE PUSH1 1 TLOAD PUSH1 0 SSTORE
    let code = vec![PUSH1, 7, PUSH1, 1, TSTORE, PUSH1, 1, TLOAD, PUSH1, 0, SSTORE, STOP];
    let mut engine = engine_with(&[(ALICE, funded(1_000)), (STORER, contract(code))]);

    let result = engine
        .message_call(ALICE, STORER, Bytes::new(), U256::ZERO, None, None, false)
        .unwrap();
    assert!(result.is_success());
    assert_eq!(engine.storage(STORER, U256::ZERO).unwrap(), U256::from(7));
}

#[test]
fn memory_growth_past_limit_halts() {
    // PUSH1 0 PUSH7 0x04000000000000 MSTORE STOP
    let code = vec![PUSH1, 0, PUSH7, 0x04, 0, 0, 0, 0, 0, 0, MSTORE, STOP];
    let mut engine = engine_with(&[(ALICE, funded(1_000)), (STORER, contract(code))]);

    let result = engine
        .message_call(ALICE, STORER, Bytes::new(), U256::ZERO, None, None, false)
        .unwrap();
    assert_eq!(result.halt_reason(), Some(HaltReason::MemoryLimitOOG));
    assert_eq!(engine.journal_depth(), 0);
}

#[test]
fn back_to_back_snapshots_are_distinct() {
    let mut engine = engine_with(&[(ALICE, funded(1_000))]);
    let first = engine.snapshot();
    let second = engine.snapshot();
    assert_ne!(first, second);

    engine.set_balance(ALICE, U256::from(5)).unwrap();
    engine.revert(first).unwrap();
    assert_eq!(engine.journal_depth(), 0);
    assert_eq!(engine.get_balance(ALICE).unwrap(), U256::from(1_000));
}
