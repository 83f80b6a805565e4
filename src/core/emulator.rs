//! Ledger emulator: a single-writer miniature UTXO ledger.
//!
//! # State machine
//! `Idle(slot, empty mempool) -> Pending(slot, mempool) -> tick -> Idle(slot + n)`.
//! `submit_tx` and `create_utxo` only append to the mempool. `tick` is the sole operation that
//! advances the slot and mutates the utxo indices; it commits the whole mempool as one block in
//! submission order.
//!
//! # Invariants
//! - Utxo ids are globally unique and never reused after consumption.
//! - `address_utxos` holds exactly the unconsumed members of `all_utxos`, bucketed by address,
//!   after every commit. A consumed utxo leaves its bucket in the same commit.
//! - Reads reflect committed state only; pending mempool effects are visible solely through
//!   `is_consumed`.
//!
//! # Structure sharing
//! Indices are held in `Arc` and mutated through `Arc::make_mut` (copy-on-write). Snapshots clone
//! the `Arc`s; the first write after a snapshot copies the touched index, so a snapshot is never
//! observably aliased to live state.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use log::{debug, info, warn};
use thiserror::Error;
use crate::config::EmulatorConfig;
use crate::core::block::{assemble_block, Block, GENESIS_PREVIOUS_HASH};
use crate::core::mempool::Mempool;
use crate::core::params::{LiveSlotParams, NetworkParameterProvider};
use crate::core::rng::EmulatorRng;
use crate::core::snapshot::Snapshot;
use crate::core::transaction::{
    Address, EmulatorTx, GenesisTx, Transaction, TxId, TxOutput, Utxo, UtxoId,
};
use crate::core::value::{Assets, Value};
use crate::core::wallet::{SimpleWallet, UtxoSource, Wallet};
use crate::error::{EmulatorError, Result};
use crate::utils::lovelace_to_ada_string;

/// Number of random bytes behind an emulator wallet address.
const WALLET_ADDRESS_BYTES: usize = 28;

/// Rejections raised by `submit_tx`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error(
        "Slot out of range: slot {slot} is outside validity interval [{valid_from:?}, {valid_to:?})"
    )]
    SlotOutOfRange {
        slot: u64,
        valid_from: Option<u64>,
        valid_to: Option<u64>,
    },

    #[error("Unknown utxo: {0}")]
    UnknownUtxo(UtxoId),

    #[error("Double spend: utxo {0} is already consumed or spent by a pending transaction")]
    DoubleSpend(UtxoId),

    #[error("Transaction has no inputs")]
    EmptyInputs,
}

/// Errors in ledger state management and snapshots.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Cannot snapshot with {pending} pending transaction(s) in the mempool")]
    SnapshotWithPendingTxns { pending: usize },

    #[error("Snapshot name already exists: {0}")]
    DuplicateSnapshotName(String),

    #[error("Unknown snapshot name: {0}")]
    UnknownSnapshotName(String),

    #[error("Cannot create a utxo with zero value")]
    ZeroValueUtxoCreation,

    #[error("Unknown or consumed utxo: {0}")]
    UnknownUtxo(UtxoId),

    #[error("Snapshot format error: {0}")]
    SnapshotFormat(String),
}

/// Programmer errors: the call itself is malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Collateral must be pure ADA, but {0} carries native assets")]
    CollateralNotPure(UtxoId),

    #[error("Collateral already set to {existing}; cannot replace it with {attempted}")]
    CollateralAlreadySet { existing: UtxoId, attempted: UtxoId },
}

impl From<ValidationError> for EmulatorError {
    fn from(err: ValidationError) -> Self {
        EmulatorError::Validation(err)
    }
}

impl From<StateError> for EmulatorError {
    fn from(err: StateError) -> Self {
        EmulatorError::State(err)
    }
}

impl From<InvariantViolation> for EmulatorError {
    fn from(err: InvariantViolation) -> Self {
        EmulatorError::Invariant(err)
    }
}

/// Deterministic in-process ledger.
#[derive(Debug)]
pub struct LedgerEmulator {
    id: u64,
    net_number: u8,
    rng: EmulatorRng,
    slot: u64,
    params: LiveSlotParams,
    mempool: Mempool,
    genesis: Arc<Vec<GenesisTx>>,
    blocks: Arc<Vec<Block>>,
    /// Every utxo ever created, consumed or not.
    all_utxos: Arc<BTreeMap<UtxoId, Utxo>>,
    consumed_utxos: Arc<BTreeSet<UtxoId>>,
    /// Unconsumed utxos by address, in creation order.
    address_utxos: Arc<BTreeMap<Address, Vec<Utxo>>>,
}

impl LedgerEmulator {
    pub fn new(config: &EmulatorConfig) -> Self {
        Self {
            id: config.emulator_id,
            net_number: config.net_number,
            rng: EmulatorRng::new(config.seed),
            slot: 0,
            params: LiveSlotParams::new(config.params.clone(), 0),
            mempool: Mempool::new(),
            genesis: Arc::new(Vec::new()),
            blocks: Arc::new(Vec::new()),
            all_utxos: Arc::new(BTreeMap::new()),
            consumed_utxos: Arc::new(BTreeSet::new()),
            address_utxos: Arc::new(BTreeMap::new()),
        }
    }

    /// Emulator with default parameters and the given identity and seed.
    pub fn with_seed(emulator_id: u64, seed: u32) -> Self {
        Self::new(&EmulatorConfig {
            emulator_id,
            seed,
            ..EmulatorConfig::default()
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn net_number(&self) -> u8 {
        self.net_number
    }

    pub fn current_slot(&self) -> u64 {
        self.slot
    }

    /// POSIX milliseconds of the current slot.
    pub fn now(&self) -> i64 {
        self.params.live_time()
    }

    /// Parameter helper pinned to the current slot.
    pub fn params(&self) -> &LiveSlotParams {
        &self.params
    }

    /// Next PRNG draw scaled into `[0, 1)`. Advances the generator.
    pub fn random(&mut self) -> f64 {
        self.rng.next_unit()
    }

    /// Next raw PRNG draw. Advances the generator.
    pub fn random_u32(&mut self) -> u32 {
        self.rng.next_draw()
    }

    /// The generator itself, for callers that want `rand::Rng` helpers on the same stream.
    pub fn rng(&mut self) -> &mut EmulatorRng {
        &mut self.rng
    }

    pub fn mempool(&self) -> &Mempool {
        &self.mempool
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn genesis(&self) -> &[GenesisTx] {
        &self.genesis
    }

    pub fn all_utxos(&self) -> &BTreeMap<UtxoId, Utxo> {
        &self.all_utxos
    }

    pub fn consumed_utxos(&self) -> &BTreeSet<UtxoId> {
        &self.consumed_utxos
    }

    pub fn address_utxos(&self) -> &BTreeMap<Address, Vec<Utxo>> {
        &self.address_utxos
    }

    /// Creates a wallet with a PRNG-derived address and, if the value is non-zero, queues a
    /// genesis utxo for it. Funds become visible after the next `tick`.
    pub fn create_wallet(&mut self, lovelace: u64, assets: Assets) -> Result<SimpleWallet> {
        let mut raw = [0u8; WALLET_ADDRESS_BYTES];
        rand::RngCore::fill_bytes(&mut self.rng, &mut raw);
        let prefix = if self.net_number == 0 { "addr_test1" } else { "addr1" };
        let wallet = SimpleWallet::new(format!("{}{}", prefix, hex::encode(raw)));

        let value = Value::new(lovelace, assets);
        if !value.is_zero() {
            self.create_utxo(wallet.address(), value)?;
        }
        debug!("create_wallet: emulator={} address={}", self.id, wallet.address());
        Ok(wallet)
    }

    /// Queues a no-cost genesis transaction minting `value` at `address`. Bypasses balance rules;
    /// zero value is rejected. Returns the id the utxo will have once committed.
    pub fn create_utxo(&mut self, address: &Address, value: Value) -> Result<UtxoId> {
        if value.is_zero() {
            return Err(StateError::ZeroValueUtxoCreation.into());
        }
        let genesis_index = self.genesis.len() as u64;
        let tx = GenesisTx::new(self.id, genesis_index, TxOutput::new(address.clone(), value))?;
        let utxo_id = UtxoId::new(tx.id.clone(), 0);
        debug!(
            "create_utxo: genesis[{}] {} -> {} ({})",
            genesis_index,
            utxo_id,
            address,
            lovelace_to_ada_string(tx.output.value.lovelace)
        );
        Arc::make_mut(&mut self.genesis).push(tx.clone());
        self.mempool.push(EmulatorTx::Genesis(tx));
        Ok(utxo_id)
    }

    /// Validates `tx` against the current slot and committed state, then appends it to the
    /// mempool. A rejected transaction leaves the mempool untouched.
    pub fn submit_tx(&mut self, tx: Transaction) -> Result<TxId> {
        if let Err(e) = self.validate_tx(&tx) {
            warn!("submit_tx: tx {} rejected: {}", tx.id, e);
            return Err(e.into());
        }
        let id = tx.id.clone();
        debug!(
            "submit_tx: tx {} accepted at slot {} ({} inputs, {} outputs)",
            id,
            self.slot,
            tx.body.inputs.len(),
            tx.body.outputs.len()
        );
        self.mempool.push(EmulatorTx::Regular(tx));
        Ok(id)
    }

    fn validate_tx(&self, tx: &Transaction) -> std::result::Result<(), ValidationError> {
        let body = &tx.body;
        if body.inputs.is_empty() {
            return Err(ValidationError::EmptyInputs);
        }
        if !body.validity.contains(self.slot) {
            return Err(ValidationError::SlotOutOfRange {
                slot: self.slot,
                valid_from: body.validity.valid_from,
                valid_to: body.validity.valid_to,
            });
        }
        let mut seen = BTreeSet::new();
        for input in &body.inputs {
            if !self.all_utxos.contains_key(input) {
                return Err(ValidationError::UnknownUtxo(input.clone()));
            }
            if self.is_consumed(input) || !seen.insert(input) {
                return Err(ValidationError::DoubleSpend(input.clone()));
            }
        }
        for reference in body.ref_inputs.iter().chain(body.collateral.iter()) {
            if !self.has_utxo(reference) {
                return Err(ValidationError::UnknownUtxo(reference.clone()));
            }
        }
        Ok(())
    }

    /// Advances the clock by `n_slots` (must be at least 1). If the mempool is non-empty, its
    /// transactions are committed as one block, in submission order, and the block is returned.
    pub fn tick(&mut self, n_slots: i64) -> Result<Option<Block>> {
        if n_slots < 1 {
            return Err(InvariantViolation::InvalidArgument(format!(
                "tick requires n_slots >= 1, got {}",
                n_slots
            ))
            .into());
        }
        self.slot = self.slot.saturating_add(n_slots as u64);
        self.params.refresh(self.slot);

        if self.mempool.is_empty() {
            debug!("tick: slot -> {} (empty mempool)", self.slot);
            return Ok(None);
        }
        let txs = self.mempool.drain();
        self.apply_transactions(&txs);

        let previous_hash = self
            .blocks
            .last()
            .map(|b| b.block_hash.clone())
            .unwrap_or_else(|| GENESIS_PREVIOUS_HASH.to_string());
        let block = assemble_block(self.blocks.len() as u64, self.slot, previous_hash, txs);
        info!(
            "tick: committed block {} at slot {} with {} tx(s), hash {}",
            block.height,
            block.slot,
            block.len(),
            block.block_hash
        );
        Arc::make_mut(&mut self.blocks).push(block.clone());
        Ok(Some(block))
    }

    fn apply_transactions(&mut self, txs: &[EmulatorTx]) {
        let all = Arc::make_mut(&mut self.all_utxos);
        let consumed = Arc::make_mut(&mut self.consumed_utxos);
        let by_address = Arc::make_mut(&mut self.address_utxos);

        for tx in txs {
            for id in tx.consumed_utxos() {
                if let Some(spent) = all.get(&id) {
                    let address = spent.address().clone();
                    let now_empty = match by_address.get_mut(&address) {
                        Some(bucket) => {
                            bucket.retain(|u| u.id != id);
                            bucket.is_empty()
                        }
                        None => false,
                    };
                    if now_empty {
                        by_address.remove(&address);
                    }
                }
                consumed.insert(id);
            }
            for utxo in tx.new_utxos() {
                by_address
                    .entry(utxo.address().clone())
                    .or_default()
                    .push(utxo.clone());
                all.insert(utxo.id.clone(), utxo);
            }
        }
    }

    /// Returns the utxo if it exists and has not been consumed by a committed block.
    pub fn get_utxo(&self, id: &UtxoId) -> Result<Utxo> {
        match self.all_utxos.get(id) {
            Some(utxo) if !self.consumed_utxos.contains(id) => Ok(utxo.clone()),
            _ => Err(StateError::UnknownUtxo(id.clone()).into()),
        }
    }

    /// True if the utxo exists in committed state and is unconsumed.
    pub fn has_utxo(&self, id: &UtxoId) -> bool {
        self.all_utxos.contains_key(id) && !self.consumed_utxos.contains(id)
    }

    /// Unconsumed utxos at `address` in committed state, in creation order.
    pub fn get_utxos(&self, address: &Address) -> Vec<Utxo> {
        self.address_utxos.get(address).cloned().unwrap_or_default()
    }

    /// True if consumed by a committed block or spent by any pending mempool transaction.
    pub fn is_consumed(&self, id: &UtxoId) -> bool {
        self.consumed_utxos.contains(id) || self.mempool.is_pending_input(id)
    }

    /// Captures the full ledger state. Requires an empty mempool.
    pub fn snapshot(&self, name: &str) -> Result<Snapshot> {
        if !self.mempool.is_empty() {
            return Err(StateError::SnapshotWithPendingTxns {
                pending: self.mempool.len(),
            }
            .into());
        }
        info!(
            "snapshot: '{}' at slot {} ({} blocks, {} utxos)",
            name,
            self.slot,
            self.blocks.len(),
            self.all_utxos.len()
        );
        Ok(Snapshot {
            name: name.to_string(),
            seed: self.rng.state(),
            net_number: self.net_number,
            slot: self.slot,
            genesis: Arc::clone(&self.genesis),
            blocks: Arc::clone(&self.blocks),
            all_utxos: Arc::clone(&self.all_utxos),
            consumed_utxos: Arc::clone(&self.consumed_utxos),
            address_utxos: Arc::clone(&self.address_utxos),
        })
    }

    /// Replaces the whole ledger state with `snapshot`: history, indices, slot, and PRNG
    /// continuation point. Pending transactions and prior blocks are discarded. The emulator
    /// keeps its own identity.
    pub fn load_snapshot(&mut self, snapshot: &Snapshot) {
        let dropped = self.mempool.drain().len();
        if dropped > 0 {
            warn!("load_snapshot: discarding {} pending transaction(s)", dropped);
        }
        self.rng.set_state(snapshot.seed);
        self.net_number = snapshot.net_number;
        self.slot = snapshot.slot;
        self.params.refresh(snapshot.slot);
        self.genesis = Arc::clone(&snapshot.genesis);
        self.blocks = Arc::clone(&snapshot.blocks);
        self.all_utxos = Arc::clone(&snapshot.all_utxos);
        self.consumed_utxos = Arc::clone(&snapshot.consumed_utxos);
        self.address_utxos = Arc::clone(&snapshot.address_utxos);
        info!(
            "load_snapshot: emulator {} adopted '{}' at slot {} ({} blocks)",
            self.id,
            snapshot.name,
            self.slot,
            self.blocks.len()
        );
    }

    /// Human-readable state summary, also written to the log at info level.
    pub fn dump(&self) -> String {
        let mut out = format!(
            "emulator {} (net {}) slot {} time {}ms: {} block(s), {} pending, {} live utxo(s)\n",
            self.id,
            self.net_number,
            self.slot,
            self.now(),
            self.blocks.len(),
            self.mempool.len(),
            self.address_utxos.values().map(Vec::len).sum::<usize>()
        );
        for (address, utxos) in self.address_utxos.iter() {
            let total = utxos
                .iter()
                .fold(0u64, |acc, u| acc.saturating_add(u.lovelace()));
            out.push_str(&format!(
                "  {}: {} utxo(s), {}\n",
                address,
                utxos.len(),
                lovelace_to_ada_string(total)
            ));
        }
        info!("{}", out.trim_end());
        out
    }

    /// Minimum lovelace for an output holding `value`, per the configured parameters.
    pub fn min_ada_for(&self, value: &Value) -> u64 {
        self.params.min_ada_for(value)
    }
}

impl Default for LedgerEmulator {
    fn default() -> Self {
        Self::new(&EmulatorConfig::default())
    }
}

impl UtxoSource for LedgerEmulator {
    fn utxos_at(&self, address: &Address) -> Vec<Utxo> {
        self.get_utxos(address)
    }

    fn is_consumed(&self, id: &UtxoId) -> bool {
        LedgerEmulator::is_consumed(self, id)
    }
}
