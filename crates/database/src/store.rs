//! In-memory account store with an optional read-through provider.
use crate::BlockHashRing;
use core::fmt;
use database_interface::{
    Database, DatabaseMut, ProviderError, SharedProvider, StateProvider,
};
use primitives::{
    hash_map::Entry, Address, HashMap, StorageKey, StorageValue, B256, KECCAK_EMPTY, U256,
};
use state::{AccountInfo, Bytecode};
use tracing::{debug, warn};

/// Cached state of an [`AccountStore`].
///
/// Accounts and code are stored in two separate maps: `accounts` maps addresses to [`DbAccount`],
/// `contracts` maps code hashes to [`Bytecode`]. Every account with a given code hash holds a
/// clone of the same `contracts` entry, so code bytes are never duplicated.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cache {
    /// Per-address account records.
    pub accounts: HashMap<Address, DbAccount>,
    /// All known code by its hash.
    pub contracts: HashMap<B256, Bytecode>,
    /// Recent block hashes.
    pub block_hashes: BlockHashRing,
}

impl Default for Cache {
    fn default() -> Self {
        let mut contracts = HashMap::default();
        contracts.insert(KECCAK_EMPTY, Bytecode::default());
        contracts.insert(B256::ZERO, Bytecode::default());

        Cache {
            accounts: HashMap::default(),
            contracts,
            block_hashes: BlockHashRing::default(),
        }
    }
}

/// The account store.
///
/// Reads are served from [`Cache`]; misses fall through to the [`StateProvider`] when one is
/// configured and the answer is cached, including "not found" answers. Writes only ever touch
/// the cache. The store does not journal anything itself.
#[derive(Clone, Default)]
pub struct AccountStore {
    /// The cache that stores all state.
    pub cache: Cache,
    /// Read-only fallback source.
    provider: Option<SharedProvider>,
}

impl fmt::Debug for AccountStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountStore")
            .field("cache", &self.cache)
            .field("provider", &self.provider.as_ref().map(|p| p.fork_block()))
            .finish()
    }
}

impl AccountStore {
    /// Creates an empty store without a provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that reads through to `provider`.
    pub fn with_provider(provider: SharedProvider) -> Self {
        Self {
            cache: Cache::default(),
            provider: Some(provider),
        }
    }

    /// Returns the fallback provider, if any.
    pub fn provider(&self) -> Option<&SharedProvider> {
        self.provider.as_ref()
    }

    /// Returns the full cached account map.
    pub fn accounts(&self) -> &HashMap<Address, DbAccount> {
        &self.cache.accounts
    }

    /// Inserts the account's code into the cache.
    ///
    /// Normalizes `code_hash` and swaps the account's code for the shared copy.
    pub fn insert_contract(&mut self, account: &mut AccountInfo) {
        register_code(&mut self.cache.contracts, account);
    }

    /// Inserts account info but does not override storage.
    pub fn insert_account_info(&mut self, address: Address, mut info: AccountInfo) {
        self.insert_contract(&mut info);
        let account = self.cache.accounts.entry(address).or_default();
        if account.account_state == AccountState::NotExisting {
            account.account_state = AccountState::StorageCleared;
        }
        account.info = info;
    }

    /// Seeds a block hash.
    pub fn insert_block_hash(&mut self, number: u64, hash: B256) {
        self.cache.block_hashes.insert(number, hash);
    }

    /// Returns the account for the given address.
    ///
    /// If the account was not found in the cache, it is loaded from the provider.
    pub fn load_account(&mut self, address: Address) -> Result<&mut DbAccount, ProviderError> {
        let Self { cache, provider } = self;
        match cache.accounts.entry(address) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let mut fetched = fetch_account(provider.as_deref(), address)?;
                if let Some(info) = fetched.as_mut() {
                    register_code(&mut cache.contracts, info);
                }
                Ok(entry.insert(fetched.into()))
            }
        }
    }

    /// Inserts account storage without overriding account info.
    pub fn insert_account_storage(
        &mut self,
        address: Address,
        slot: StorageKey,
        value: StorageValue,
    ) -> Result<(), ProviderError> {
        let account = self.load_account(address)?;
        account.storage.insert(slot, value);
        Ok(())
    }

    /// Replaces account storage without overriding account info.
    ///
    /// Slots missing from `storage` read as zero afterwards, the provider is not consulted.
    pub fn replace_account_storage(
        &mut self,
        address: Address,
        storage: HashMap<StorageKey, StorageValue>,
    ) -> Result<(), ProviderError> {
        let account = self.load_account(address)?;
        account.account_state = AccountState::StorageCleared;
        account.storage = storage.into_iter().collect();
        Ok(())
    }

    fn account_mut(&mut self, address: Address) -> &mut DbAccount {
        let account = self.cache.accounts.entry(address).or_default();
        if account.account_state == AccountState::None {
            account.account_state = AccountState::Touched;
        }
        account
    }
}

impl Database for AccountStore {
    type Error = ProviderError;

    fn basic(&mut self, address: Address) -> Result<Option<AccountInfo>, Self::Error> {
        Ok(self.load_account(address)?.info())
    }

    fn code_by_hash(&mut self, code_hash: B256) -> Result<Bytecode, Self::Error> {
        // Providers hand out code inline with the account, so anything unknown here is empty.
        Ok(self
            .cache
            .contracts
            .get(&code_hash)
            .cloned()
            .unwrap_or_default())
    }

    /// Get the value in an account's storage slot.
    fn storage(
        &mut self,
        address: Address,
        index: StorageKey,
    ) -> Result<StorageValue, Self::Error> {
        let account = self.load_account(address)?;
        if let Some(value) = account.storage.get(&index) {
            return Ok(*value);
        }
        if account.account_state.is_storage_cleared() {
            return Ok(StorageValue::ZERO);
        }
        let value = fetch_storage(self.provider.as_deref(), address, index)?;
        if let Some(account) = self.cache.accounts.get_mut(&address) {
            account.storage.insert(index, value);
        }
        Ok(value)
    }

    fn block_hash(&mut self, number: u64) -> Result<B256, Self::Error> {
        if let Some(hash) = self.cache.block_hashes.get(number) {
            return Ok(hash);
        }
        let Some(provider) = &self.provider else {
            return Ok(B256::ZERO);
        };
        let hash = provider.fetch_block_hash(number).inspect_err(|err| {
            warn!(target: "simevm::store", number, %err, "block hash fetch failed");
        })?;
        self.cache.block_hashes.insert(number, hash);
        Ok(hash)
    }
}

impl DatabaseMut for AccountStore {
    fn set_balance(&mut self, address: Address, balance: U256) {
        self.account_mut(address).info.balance = balance;
    }

    fn set_nonce(&mut self, address: Address, nonce: u64) {
        self.account_mut(address).info.nonce = nonce;
    }

    fn set_code(&mut self, address: Address, code: Bytecode) {
        let mut info = self.account_mut(address).info.clone();
        info.set_code_and_hash(code);
        self.insert_contract(&mut info);
        let account = self.account_mut(address);
        account.info.code_hash = info.code_hash;
        account.info.code = info.code;
    }

    fn set_code_hash(&mut self, address: Address, code_hash: B256) {
        let code = self.cache.contracts.get(&code_hash).cloned();
        let account = self.account_mut(address);
        account.info.code_hash = code_hash;
        account.info.code = code;
    }

    fn set_storage(&mut self, address: Address, key: StorageKey, value: StorageValue) {
        self.account_mut(address).storage.insert(key, value);
    }

    fn create_account(&mut self, address: Address) -> bool {
        let account = self
            .cache
            .accounts
            .entry(address)
            .or_insert_with(DbAccount::new_not_existing);
        if account.info().is_some() {
            return true;
        }
        account.storage.clear();
        account.account_state = AccountState::StorageCleared;
        false
    }

    fn remove_account(&mut self, address: Address) {
        if let Entry::Occupied(mut entry) = self.cache.accounts.entry(address) {
            *entry.get_mut() = DbAccount::new_not_existing();
        }
    }
}

/// A frozen store can serve as the fallback of another store.
impl StateProvider for AccountStore {
    fn fetch_account(&self, address: Address) -> Result<Option<AccountInfo>, ProviderError> {
        match self.cache.accounts.get(&address) {
            Some(account) => Ok(account.info()),
            None => fetch_account(self.provider.as_deref(), address),
        }
    }

    fn fetch_storage(
        &self,
        address: Address,
        key: StorageKey,
    ) -> Result<StorageValue, ProviderError> {
        match self.cache.accounts.get(&address) {
            Some(account) => match account.storage.get(&key) {
                Some(value) => Ok(*value),
                None if account.account_state.is_storage_cleared() => Ok(StorageValue::ZERO),
                None => fetch_storage(self.provider.as_deref(), address, key),
            },
            None => fetch_storage(self.provider.as_deref(), address, key),
        }
    }

    fn fetch_block_hash(&self, number: u64) -> Result<B256, ProviderError> {
        match (self.cache.block_hashes.get(number), &self.provider) {
            (Some(hash), _) => Ok(hash),
            (None, Some(provider)) => provider.fetch_block_hash(number),
            (None, None) => Ok(B256::ZERO),
        }
    }
}

fn register_code(contracts: &mut HashMap<B256, Bytecode>, account: &mut AccountInfo) {
    if let Some(code) = &account.code {
        if !code.is_empty() {
            if account.code_hash == KECCAK_EMPTY || account.code_hash.is_zero() {
                account.code_hash = code.hash_slow();
            }
            let shared = contracts
                .entry(account.code_hash)
                .or_insert_with(|| code.clone());
            account.code = Some(shared.clone());
        }
    }
    if account.code_hash.is_zero() {
        account.code_hash = KECCAK_EMPTY;
    }
}

fn fetch_account(
    provider: Option<&dyn StateProvider>,
    address: Address,
) -> Result<Option<AccountInfo>, ProviderError> {
    let Some(provider) = provider else {
        return Ok(None);
    };
    let fetched = provider.fetch_account(address).inspect_err(|err| {
        warn!(target: "simevm::store", %address, %err, "account fetch failed");
    })?;
    debug!(target: "simevm::store", %address, found = fetched.is_some(), "fetched account");
    Ok(fetched)
}

fn fetch_storage(
    provider: Option<&dyn StateProvider>,
    address: Address,
    key: StorageKey,
) -> Result<StorageValue, ProviderError> {
    let Some(provider) = provider else {
        return Ok(StorageValue::ZERO);
    };
    provider.fetch_storage(address, key).inspect_err(|err| {
        warn!(target: "simevm::store", %address, %key, %err, "storage fetch failed");
    })
}

/// Cached record of one account.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DbAccount {
    /// Balance, nonce and code.
    pub info: AccountInfo,
    /// Where storage reads for slots missing from `storage` go.
    pub account_state: AccountState,
    /// Storage slots
    pub storage: HashMap<StorageKey, StorageValue>,
}

impl DbAccount {
    /// Record for an address the provider does not know.
    pub fn new_not_existing() -> Self {
        Self {
            account_state: AccountState::NotExisting,
            ..Default::default()
        }
    }

    /// Account info, `None` while the address has never held anything.
    pub fn info(&self) -> Option<AccountInfo> {
        if self.account_state == AccountState::NotExisting && self.info.is_empty() {
            None
        } else {
            Some(self.info.clone())
        }
    }
}

impl From<Option<AccountInfo>> for DbAccount {
    fn from(from: Option<AccountInfo>) -> Self {
        from.map(Self::from).unwrap_or_else(Self::new_not_existing)
    }
}

impl From<AccountInfo> for DbAccount {
    fn from(info: AccountInfo) -> Self {
        Self {
            info,
            account_state: AccountState::None,
            ..Default::default()
        }
    }
}

/// Origin of an account's storage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccountState {
    /// The provider reported the account as absent. Storage is implicitly zero.
    NotExisting,
    /// Modified locally on top of provider state.
    Touched,
    /// Created or replaced locally. Storage not in the cache is zero.
    StorageCleared,
    /// Loaded from the provider and untouched.
    #[default]
    None,
}

impl AccountState {
    /// Returns `true` if slots missing from the cache are known to be zero.
    pub fn is_storage_cleared(&self) -> bool {
        matches!(self, AccountState::StorageCleared | AccountState::NotExisting)
    }
}
