//! Setup done before the first frame runs: warming and the up-front fee charge.

use context::{Context, EvmError, InvalidTransaction};
use core::cmp::Ordering;
use database_interface::DatabaseMut;
use primitives::{hardfork::SpecId, TxKind, U256};

/// Warms the accounts a transaction touches before executing: the caller, the call target,
/// the coinbase (EIP-3651) and every access list entry (EIP-2930).
pub fn load_accounts<DB: DatabaseMut>(ctx: &mut Context<DB>) -> Result<(), EvmError<DB::Error>> {
    let spec = ctx.spec();
    let Context { env, journal, .. } = ctx;

    journal
        .load_account(env.tx.caller)
        .map_err(EvmError::Database)?;
    if let TxKind::Call(target) = env.tx.kind {
        journal.load_account(target).map_err(EvmError::Database)?;
    }

    // EIP-3651: Warm COINBASE. Starts the `COINBASE` address warm
    if spec.is_enabled_in(SpecId::SHANGHAI) {
        journal.warm_account(env.block.beneficiary);
    }

    // Load access list
    for item in &env.tx.access_list {
        journal.warm_account(item.address);
        for key in &item.storage_keys {
            journal.warm_slot(item.address, U256::from_be_bytes(key.0));
        }
    }

    Ok(())
}

/// Checks the caller can pay for the transaction, then charges the gas fee up front and bumps
/// the nonce of call transactions. Create transactions bump the nonce in their frame.
pub fn validate_against_state_and_deduct_caller<DB: DatabaseMut>(
    ctx: &mut Context<DB>,
) -> Result<(), EvmError<DB::Error>> {
    let Context { env, journal, .. } = ctx;
    let tx = &env.tx;
    let caller = journal
        .load_account(tx.caller)
        .map_err(EvmError::Database)?
        .data;

    if !env.cfg.disable_nonce_check {
        if let Some(tx_nonce) = tx.nonce {
            let state = caller.nonce;
            match tx_nonce.cmp(&state) {
                Ordering::Greater => {
                    return Err(InvalidTransaction::NonceTooHigh { tx: tx_nonce, state }.into());
                }
                Ordering::Less => {
                    return Err(InvalidTransaction::NonceTooLow { tx: tx_nonce, state }.into());
                }
                Ordering::Equal => {}
            }
        }
    }
    if !tx.is_create() && caller.nonce == u64::MAX {
        return Err(InvalidTransaction::NonceOverflowInTransaction.into());
    }

    let blob_fee = U256::from(tx.total_blob_gas())
        .saturating_mul(U256::from(env.block.blob_gasprice().unwrap_or_default()));
    let max_fee = U256::from(tx.gas_limit)
        .saturating_mul(U256::from(tx.gas_price))
        .saturating_add(blob_fee);
    if caller.balance < max_fee {
        return Err(InvalidTransaction::LackOfFundForMaxFee {
            fee: Box::new(max_fee),
            balance: Box::new(caller.balance),
        }
        .into());
    }

    // The effective price never exceeds the max fee, so this can't underflow.
    let fee = U256::from(tx.gas_limit)
        .saturating_mul(U256::from(env.effective_gas_price()))
        .saturating_add(blob_fee);
    if !fee.is_zero() {
        journal
            .set_balance(tx.caller, caller.balance - fee)
            .map_err(EvmError::Database)?;
    }

    if !tx.is_create() {
        journal.inc_nonce(tx.caller).map_err(EvmError::Database)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use context::{AccessListItem, Env};
    use database::AccountStore;
    use primitives::{address, Address, B256};
    use state::AccountInfo;

    const CALLER: Address = address!("0x1000000000000000000000000000000000000001");
    const TARGET: Address = address!("0x2000000000000000000000000000000000000002");

    fn ctx(balance: u64, nonce: u64) -> Context<AccountStore> {
        let mut db = AccountStore::new();
        db.insert_account_info(
            CALLER,
            AccountInfo::from_balance(U256::from(balance)).with_nonce(nonce),
        );
        let mut env = Env::new_with_spec(SpecId::CANCUN);
        env.tx.caller = CALLER;
        env.tx.kind = TxKind::Call(TARGET);
        env.tx.gas_limit = 100;
        env.tx.gas_price = 10;
        Context::new(env, db)
    }

    #[test]
    fn deducts_fee_and_bumps_nonce() {
        let mut ctx = ctx(5_000, 3);
        validate_against_state_and_deduct_caller(&mut ctx).unwrap();
        let caller = ctx.journal.peek_account(CALLER).unwrap();
        assert_eq!(caller.balance, U256::from(4_000));
        assert_eq!(caller.nonce, 4);
    }

    #[test]
    fn create_keeps_nonce() {
        let mut ctx = ctx(5_000, 3);
        ctx.env.tx.kind = TxKind::Create;
        validate_against_state_and_deduct_caller(&mut ctx).unwrap();
        assert_eq!(ctx.journal.peek_account(CALLER).unwrap().nonce, 3);
    }

    #[test]
    fn lack_of_funds() {
        let mut ctx = ctx(999, 0);
        assert_eq!(
            validate_against_state_and_deduct_caller(&mut ctx),
            Err(EvmError::Transaction(
                InvalidTransaction::LackOfFundForMaxFee {
                    fee: Box::new(U256::from(1_000)),
                    balance: Box::new(U256::from(999)),
                }
            ))
        );
        assert_eq!(
            ctx.journal.peek_account(CALLER).unwrap().balance,
            U256::from(999)
        );
    }

    #[test]
    fn nonce_mismatch() {
        let mut ctx = ctx(5_000, 3);
        ctx.env.tx.nonce = Some(4);
        assert_eq!(
            validate_against_state_and_deduct_caller(&mut ctx),
            Err(EvmError::Transaction(InvalidTransaction::NonceTooHigh {
                tx: 4,
                state: 3
            }))
        );
        ctx.env.tx.nonce = Some(2);
        assert_eq!(
            validate_against_state_and_deduct_caller(&mut ctx),
            Err(EvmError::Transaction(InvalidTransaction::NonceTooLow {
                tx: 2,
                state: 3
            }))
        );
        ctx.env.cfg.disable_nonce_check = true;
        assert!(validate_against_state_and_deduct_caller(&mut ctx).is_ok());
    }

    #[test]
    fn warms_access_list_and_coinbase() {
        let mut ctx = ctx(0, 0);
        let listed = Address::with_last_byte(7);
        ctx.env.block.beneficiary = Address::with_last_byte(9);
        ctx.env.tx.access_list = vec![AccessListItem {
            address: listed,
            storage_keys: vec![B256::with_last_byte(1)],
        }];
        load_accounts(&mut ctx).unwrap();

        assert!(!ctx.journal.warm_account(CALLER));
        assert!(!ctx.journal.warm_account(TARGET));
        assert!(!ctx.journal.warm_account(listed));
        assert!(!ctx.journal.warm_account(Address::with_last_byte(9)));
        assert!(!ctx.journal.warm_slot(listed, U256::from(1)));
        assert!(ctx.journal.warm_slot(listed, U256::from(2)));
    }
}
