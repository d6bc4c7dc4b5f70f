//! Checks a transaction must pass before it touches any state.
use context::{Env, InvalidTransaction};
use core::cmp;
use interpreter::gas;
use primitives::hardfork::SpecId;

/// Validates the transaction against the block and configuration.
pub fn validate_env(env: &Env) -> Result<(), InvalidTransaction> {
    let spec = env.spec();
    let tx = &env.tx;
    let base_fee = (spec.is_enabled_in(SpecId::LONDON) && !env.cfg.disable_base_fee)
        .then_some(env.block.basefee as u128);

    match tx.gas_priority_fee {
        Some(priority_fee) => validate_priority_fee(tx.gas_price, priority_fee, base_fee)?,
        None => validate_legacy_gas_price(tx.gas_price, base_fee)?,
    }

    if tx.gas_limit > env.block.gas_limit {
        return Err(InvalidTransaction::CallerGasLimitMoreThanBlock);
    }

    if let Some(chain_id) = tx.chain_id {
        if chain_id != env.cfg.chain_id {
            return Err(InvalidTransaction::InvalidChainId);
        }
    }

    if !tx.blob_hashes.is_empty() {
        if tx.is_create() {
            return Err(InvalidTransaction::BlobCreateTransaction);
        }
        validate_eip4844_tx(
            tx.blob_hashes.len(),
            tx.max_fee_per_blob_gas,
            env.block.blob_gasprice().unwrap_or_default(),
            env.cfg.max_blobs_per_tx(),
        )?;
    }

    // EIP-3860: Limit and meter initcode
    if spec.is_enabled_in(SpecId::SHANGHAI)
        && tx.is_create()
        && tx.data.len() > env.cfg.max_initcode_size()
    {
        return Err(InvalidTransaction::CreateInitCodeSizeLimit);
    }

    Ok(())
}

/// Validate legacy transaction gas price against basefee.
#[inline]
pub fn validate_legacy_gas_price(
    gas_price: u128,
    base_fee: Option<u128>,
) -> Result<(), InvalidTransaction> {
    if base_fee.is_some_and(|base_fee| gas_price < base_fee) {
        return Err(InvalidTransaction::GasPriceLessThanBasefee);
    }
    Ok(())
}

/// Validate transaction that has EIP-1559 priority fee
pub fn validate_priority_fee(
    max_fee: u128,
    max_priority_fee: u128,
    base_fee: Option<u128>,
) -> Result<(), InvalidTransaction> {
    if max_priority_fee > max_fee {
        return Err(InvalidTransaction::PriorityFeeGreaterThanMaxFee);
    }

    if let Some(base_fee) = base_fee {
        let effective_gas_price = cmp::min(max_fee, base_fee.saturating_add(max_priority_fee));
        if effective_gas_price < base_fee {
            return Err(InvalidTransaction::GasPriceLessThanBasefee);
        }
    }

    Ok(())
}

/// Validate EIP-4844 blob pricing and count.
pub fn validate_eip4844_tx(
    blob_count: usize,
    max_blob_fee: u128,
    block_blob_gas_price: u128,
    max_blobs: u64,
) -> Result<(), InvalidTransaction> {
    if block_blob_gas_price > max_blob_fee {
        return Err(InvalidTransaction::BlobGasPriceGreaterThanMax);
    }

    if blob_count as u64 > max_blobs {
        return Err(InvalidTransaction::TooManyBlobs {
            have: blob_count,
            max: max_blobs as usize,
        });
    }

    Ok(())
}

/// Intrinsic gas of the transaction in `env`.
pub fn initial_tx_gas(env: &Env) -> u64 {
    gas::initial_tx_gas(
        env.spec(),
        &env.tx.data,
        env.tx.is_create(),
        &env.tx.access_list,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitives::{Bytes, TxKind, B256};
    use rstest::rstest;

    fn env(spec: SpecId) -> Env {
        Env::new_with_spec(spec)
    }

    #[rstest]
    #[case(SpecId::LONDON, 10, 9, Err(InvalidTransaction::GasPriceLessThanBasefee))]
    #[case(SpecId::LONDON, 10, 10, Ok(()))]
    #[case(SpecId::BERLIN, 10, 0, Ok(()))]
    fn legacy_gas_price_against_basefee(
        #[case] spec: SpecId,
        #[case] basefee: u64,
        #[case] gas_price: u128,
        #[case] expected: Result<(), InvalidTransaction>,
    ) {
        let mut env = env(spec);
        env.block.basefee = basefee;
        env.tx.gas_price = gas_price;
        assert_eq!(validate_env(&env), expected);
    }

    #[test]
    fn disabled_base_fee_skips_check() {
        let mut env = env(SpecId::CANCUN);
        env.block.basefee = 100;
        env.cfg.disable_base_fee = true;
        assert_eq!(validate_env(&env), Ok(()));
    }

    #[test]
    fn priority_fee_above_max_fee() {
        let mut env = env(SpecId::CANCUN);
        env.tx.gas_price = 5;
        env.tx.gas_priority_fee = Some(6);
        assert_eq!(
            validate_env(&env),
            Err(InvalidTransaction::PriorityFeeGreaterThanMaxFee)
        );
    }

    #[test]
    fn gas_limit_and_chain_id() {
        let mut env = env(SpecId::CANCUN);
        env.block.gas_limit = 30_000_000;
        env.tx.gas_limit = 30_000_001;
        assert_eq!(
            validate_env(&env),
            Err(InvalidTransaction::CallerGasLimitMoreThanBlock)
        );

        env.tx.gas_limit = 21_000;
        env.tx.chain_id = Some(5);
        assert_eq!(validate_env(&env), Err(InvalidTransaction::InvalidChainId));
        env.tx.chain_id = Some(1);
        assert_eq!(validate_env(&env), Ok(()));
    }

    #[test]
    fn blob_rules() {
        let mut env = env(SpecId::CANCUN);
        env.tx.blob_hashes = vec![B256::ZERO; 7];
        env.tx.max_fee_per_blob_gas = 1;
        assert_eq!(
            validate_env(&env),
            Err(InvalidTransaction::TooManyBlobs { have: 7, max: 6 })
        );

        env.tx.blob_hashes.truncate(1);
        env.tx.max_fee_per_blob_gas = 0;
        assert_eq!(
            validate_env(&env),
            Err(InvalidTransaction::BlobGasPriceGreaterThanMax)
        );

        env.tx.kind = TxKind::Create;
        assert_eq!(
            validate_env(&env),
            Err(InvalidTransaction::BlobCreateTransaction)
        );
    }

    #[test]
    fn initcode_limit() {
        let mut env = env(SpecId::SHANGHAI);
        env.tx.kind = TxKind::Create;
        env.tx.data = Bytes::from(vec![0; env.cfg.max_initcode_size() + 1]);
        assert_eq!(
            validate_env(&env),
            Err(InvalidTransaction::CreateInitCodeSizeLimit)
        );

        env.cfg.spec = SpecId::LONDON;
        assert_eq!(validate_env(&env), Ok(()));
    }

    #[test]
    fn intrinsic_gas_of_env() {
        let mut env = env(SpecId::CANCUN);
        env.tx.data = Bytes::from_static(&[0, 1]);
        assert_eq!(initial_tx_gas(&env), 21_000 + 4 + 16);
    }
}
