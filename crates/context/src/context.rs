//! This module contains [`Context`] struct and the [`Env`] it executes in.
use crate::{
    block::BlockEnv,
    cfg::CfgEnv,
    journal::{Journal, JournalError},
    result::EvmError,
    tx::TxEnv,
};
use core::mem;
use database_interface::{Database, DatabaseMut};
use derive_where::derive_where;
use primitives::hardfork::SpecId;

/// Configuration, block and transaction environment of one execution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Env {
    /// Configurations.
    pub cfg: CfgEnv,
    /// Block information.
    pub block: BlockEnv,
    /// Transaction information.
    pub tx: TxEnv,
}

impl Env {
    /// Environment with defaults for the given hardfork.
    pub fn new_with_spec(spec: SpecId) -> Self {
        Self {
            cfg: CfgEnv::new_with_spec(spec),
            ..Default::default()
        }
    }

    /// Gas price the transaction actually pays.
    ///
    /// EIP-1559 transactions pay `min(max_fee, basefee + priority_fee)`, legacy ones their gas price.
    pub fn effective_gas_price(&self) -> u128 {
        let Some(priority_fee) = self.tx.gas_priority_fee else {
            return self.tx.gas_price;
        };
        core::cmp::min(
            self.tx.gas_price,
            (self.block.basefee as u128).saturating_add(priority_fee),
        )
    }

    /// Current hardfork.
    #[inline]
    pub fn spec(&self) -> SpecId {
        self.cfg.spec
    }
}

/// Error recorded by the context while executing.
///
/// Execution can't propagate database errors through the instruction executor, so they are
/// parked here and surfaced after the frames unwind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError<DbError> {
    /// Database error.
    #[error("database error: {0}")]
    Db(DbError),
    /// Journal invariant violated.
    #[error(transparent)]
    Journal(JournalError),
}

impl<DbError> From<ContextError<DbError>> for EvmError<DbError> {
    fn from(value: ContextError<DbError>) -> Self {
        match value {
            ContextError::Db(e) => EvmError::Database(e),
            ContextError::Journal(e) => EvmError::Journal(e),
        }
    }
}

/// EVM context contains data that EVM needs for execution.
#[derive_where(Clone, Debug; DB, <DB as Database>::Error)]
pub struct Context<DB: Database> {
    /// Configuration, block and transaction.
    pub env: Env,
    /// EVM State with journaling support and database.
    pub journal: Journal<DB>,
    /// Error that happened during execution.
    pub error: Result<(), ContextError<DB::Error>>,
}

impl<DB: DatabaseMut> Context<DB> {
    /// Creates a context over `db`.
    pub fn new(env: Env, db: DB) -> Self {
        let spec = env.spec();
        Self {
            env,
            journal: Journal::new_with_spec(db, spec),
            error: Ok(()),
        }
    }

    /// Switches hardfork, keeping the journal in step.
    pub fn set_spec(&mut self, spec: SpecId) {
        self.env.cfg.spec = spec;
        self.journal.set_spec_id(spec);
    }

    /// Current hardfork.
    #[inline]
    pub fn spec(&self) -> SpecId {
        self.env.cfg.spec
    }

    /// Records the first error; later ones are dropped.
    pub fn set_error(&mut self, error: ContextError<DB::Error>) {
        if self.error.is_ok() {
            self.error = Err(error);
        }
    }

    /// Returns `true` if an error was recorded.
    #[inline]
    pub fn has_error(&self) -> bool {
        self.error.is_err()
    }

    /// Takes the recorded error, leaving the context clean.
    pub fn take_error(&mut self) -> Result<(), ContextError<DB::Error>> {
        mem::replace(&mut self.error, Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::{AccountStore, ProviderError};

    #[test]
    fn effective_gas_price() {
        let mut env = Env::default();
        env.tx.gas_price = 100;
        assert_eq!(env.effective_gas_price(), 100);

        env.block.basefee = 30;
        env.tx.gas_priority_fee = Some(20);
        assert_eq!(env.effective_gas_price(), 50);

        env.tx.gas_priority_fee = Some(200);
        assert_eq!(env.effective_gas_price(), 100);
    }

    #[test]
    fn first_error_wins() {
        let mut ctx = Context::new(Env::default(), AccountStore::new());
        ctx.set_error(ContextError::Db(ProviderError::Other("first".into())));
        ctx.set_error(ContextError::Db(ProviderError::Other("second".into())));
        assert_eq!(
            ctx.take_error(),
            Err(ContextError::Db(ProviderError::Other("first".into())))
        );
        assert!(!ctx.has_error());
    }

    #[test]
    fn spec_follows_env() {
        let mut ctx = Context::new(Env::new_with_spec(SpecId::LONDON), AccountStore::new());
        assert_eq!(ctx.journal.spec, SpecId::LONDON);
        ctx.set_spec(SpecId::PRAGUE);
        assert_eq!(ctx.journal.spec, SpecId::PRAGUE);
        assert_eq!(ctx.spec(), SpecId::PRAGUE);
    }
}
