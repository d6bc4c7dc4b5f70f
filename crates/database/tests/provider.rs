//! Read-through caching against a fallback provider.
use simevm_database::{
    AccountState, AccountStore, Database, DatabaseMut, ProviderError, StateProvider,
};
use primitives::{address, Address, HashMap, StorageKey, StorageValue, B256, U256};
use state::{AccountInfo, Bytecode};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

const FUNDED: Address = address!("0x00000000000000000000000000000000000000aa");
const BROKEN: Address = address!("0x00000000000000000000000000000000000000bb");

#[derive(Default)]
struct CountingProvider {
    accounts: HashMap<Address, AccountInfo>,
    storage: HashMap<(Address, StorageKey), StorageValue>,
    account_lookups: AtomicUsize,
    storage_lookups: AtomicUsize,
    block_lookups: AtomicUsize,
}

impl StateProvider for CountingProvider {
    fn fetch_account(&self, address: Address) -> Result<Option<AccountInfo>, ProviderError> {
        self.account_lookups.fetch_add(1, Ordering::SeqCst);
        if address == BROKEN {
            return Err(ProviderError::Transport("connection reset".into()));
        }
        Ok(self.accounts.get(&address).cloned())
    }

    fn fetch_storage(
        &self,
        address: Address,
        key: StorageKey,
    ) -> Result<StorageValue, ProviderError> {
        self.storage_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .storage
            .get(&(address, key))
            .copied()
            .unwrap_or_default())
    }

    fn fetch_block_hash(&self, number: u64) -> Result<B256, ProviderError> {
        self.block_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(B256::with_last_byte(number as u8))
    }
}

fn provider() -> Arc<CountingProvider> {
    let mut provider = CountingProvider::default();
    provider.accounts.insert(
        FUNDED,
        AccountInfo::from_balance(U256::from(1_000))
            .with_nonce(4)
            .with_code(Bytecode::from(vec![0x00])),
    );
    provider
        .storage
        .insert((FUNDED, U256::from(1)), U256::from(77));
    Arc::new(provider)
}

#[test]
fn accounts_are_fetched_once() {
    let provider = provider();
    let mut store = AccountStore::with_provider(provider.clone());

    for _ in 0..3 {
        let info = store.basic(FUNDED).unwrap().unwrap();
        assert_eq!(info.balance, U256::from(1_000));
        assert_eq!(info.nonce, 4);
        assert_eq!(info.code, Some(Bytecode::from(vec![0x00])));
    }
    assert_eq!(provider.account_lookups.load(Ordering::SeqCst), 1);

    // code delivered inline is registered by hash
    let hash = store.basic(FUNDED).unwrap().unwrap().code_hash;
    assert_eq!(store.code_by_hash(hash).unwrap(), Bytecode::from(vec![0x00]));
}

#[test]
fn missing_accounts_are_cached_as_not_existing() {
    let provider = provider();
    let mut store = AccountStore::with_provider(provider.clone());
    let unknown = Address::with_last_byte(0x42);

    assert_eq!(store.basic(unknown).unwrap(), None);
    assert_eq!(store.basic(unknown).unwrap(), None);
    assert_eq!(store.storage(unknown, U256::from(1)).unwrap(), U256::ZERO);

    assert_eq!(provider.account_lookups.load(Ordering::SeqCst), 1);
    assert_eq!(provider.storage_lookups.load(Ordering::SeqCst), 0);
    assert_eq!(
        store.accounts()[&unknown].account_state,
        AccountState::NotExisting
    );
}

#[test]
fn storage_is_fetched_once_per_slot() {
    let provider = provider();
    let mut store = AccountStore::with_provider(provider.clone());

    assert_eq!(store.storage(FUNDED, U256::from(1)).unwrap(), U256::from(77));
    assert_eq!(store.storage(FUNDED, U256::from(1)).unwrap(), U256::from(77));
    assert_eq!(store.storage(FUNDED, U256::from(2)).unwrap(), U256::ZERO);
    assert_eq!(provider.storage_lookups.load(Ordering::SeqCst), 2);

    // local writes shadow the provider
    store.set_storage(FUNDED, U256::from(1), U256::from(5));
    assert_eq!(store.storage(FUNDED, U256::from(1)).unwrap(), U256::from(5));
    assert_eq!(provider.storage_lookups.load(Ordering::SeqCst), 2);
}

#[test]
fn block_hashes_fall_back_to_provider() {
    let provider = provider();
    let mut store = AccountStore::with_provider(provider.clone());

    assert_eq!(store.block_hash(9).unwrap(), B256::with_last_byte(9));
    assert_eq!(store.block_hash(9).unwrap(), B256::with_last_byte(9));
    assert_eq!(provider.block_lookups.load(Ordering::SeqCst), 1);
}

#[test]
fn provider_failures_are_surfaced() {
    let mut store = AccountStore::with_provider(provider());

    let err = store.basic(BROKEN).unwrap_err();
    assert_eq!(err, ProviderError::Transport("connection reset".into()));
    // nothing is cached for a failed lookup
    assert!(!store.accounts().contains_key(&BROKEN));
}
