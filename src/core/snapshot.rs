//! Point-in-time ledger snapshots for test branching and cross-session transfer.
//!
//! # Invariants
//! - **Immutability:** a [`Snapshot`] has no mutation methods; its contents never change.
//! - **No aliasing:** collections are shared with the ledger through `Arc` only until the ledger
//!   writes, at which point the ledger copies (`Arc::make_mut`). The snapshot is therefore never
//!   observably aliased to live state.
//! - **Restore identity:** after `load_snapshot`, slot, blocks, genesis, indices, and the PRNG
//!   continuation point equal those at capture time, so later draws match an uninterrupted run.
//! - **Cross-session:** a snapshot from one emulator can be loaded into another, which adopts its
//!   entire history and discards its own.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use log::info;
use crate::core::block::Block;
use crate::core::emulator::{LedgerEmulator, StateError};
use crate::core::transaction::{Address, GenesisTx, Utxo, UtxoId};
use crate::error::Result;

/// Full copy of ledger state taken with an empty mempool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub(crate) name: String,
    /// PRNG continuation point.
    pub(crate) seed: u32,
    pub(crate) net_number: u8,
    pub(crate) slot: u64,
    pub(crate) genesis: Arc<Vec<GenesisTx>>,
    pub(crate) blocks: Arc<Vec<Block>>,
    pub(crate) all_utxos: Arc<BTreeMap<UtxoId, Utxo>>,
    pub(crate) consumed_utxos: Arc<BTreeSet<UtxoId>>,
    pub(crate) address_utxos: Arc<BTreeMap<Address, Vec<Utxo>>>,
}

impl Snapshot {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn net_number(&self) -> u8 {
        self.net_number
    }

    pub fn slot(&self) -> u64 {
        self.slot
    }

    pub fn genesis(&self) -> &[GenesisTx] {
        &self.genesis
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
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

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| StateError::SnapshotFormat(e.to_string()).into())
    }

    /// Decodes a snapshot and rejects it unless its indices are mutually consistent.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)
            .map_err(|e| StateError::SnapshotFormat(e.to_string()))?;
        snapshot
            .check_consistency()
            .map_err(StateError::SnapshotFormat)?;
        Ok(snapshot)
    }

    /// Checks `consumed ⊆ all` and that the address index holds exactly the unconsumed utxos,
    /// each once, under its own address.
    fn check_consistency(&self) -> std::result::Result<(), String> {
        for (id, utxo) in self.all_utxos.iter() {
            if &utxo.id != id {
                return Err(format!("utxo keyed {} carries id {}", id, utxo.id));
            }
        }
        if let Some(id) = self
            .consumed_utxos
            .iter()
            .find(|id| !self.all_utxos.contains_key(*id))
        {
            return Err(format!("consumed utxo {} is not a known utxo", id));
        }

        let mut indexed = BTreeSet::new();
        for (address, utxos) in self.address_utxos.iter() {
            if utxos.is_empty() {
                return Err(format!("empty address bucket {}", address));
            }
            for utxo in utxos {
                if utxo.address() != address {
                    return Err(format!(
                        "utxo {} indexed under foreign address {}",
                        utxo.id, address
                    ));
                }
                if self.all_utxos.get(&utxo.id) != Some(utxo) {
                    return Err(format!("indexed utxo {} differs from the utxo set", utxo.id));
                }
                if self.consumed_utxos.contains(&utxo.id) {
                    return Err(format!("consumed utxo {} is still indexed", utxo.id));
                }
                if !indexed.insert(&utxo.id) {
                    return Err(format!("utxo {} indexed twice", utxo.id));
                }
            }
        }
        let live = self.all_utxos.len() - self.consumed_utxos.len();
        if indexed.len() != live {
            return Err(format!(
                "address index holds {} utxo(s) but {} are unconsumed",
                indexed.len(),
                live
            ));
        }
        Ok(())
    }
}

/// Named snapshots owned by a test harness.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    snapshots: BTreeMap<String, Arc<Snapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures `ledger` under `name`. Fails if the name is taken or the mempool is non-empty.
    pub fn snapshot(&mut self, ledger: &LedgerEmulator, name: &str) -> Result<Arc<Snapshot>> {
        if self.snapshots.contains_key(name) {
            return Err(StateError::DuplicateSnapshotName(name.to_string()).into());
        }
        let snapshot = Arc::new(ledger.snapshot(name)?);
        self.snapshots.insert(name.to_string(), Arc::clone(&snapshot));
        Ok(snapshot)
    }

    /// Restores the snapshot called `name` into `ledger`, which may be a different emulator
    /// from the one it was taken from.
    pub fn load_snapshot(&self, ledger: &mut LedgerEmulator, name: &str) -> Result<()> {
        let snapshot = self
            .snapshots
            .get(name)
            .ok_or_else(|| StateError::UnknownSnapshotName(name.to_string()))?;
        ledger.load_snapshot(snapshot);
        Ok(())
    }

    /// Registers a snapshot obtained elsewhere (for example decoded from JSON).
    pub fn insert(&mut self, snapshot: Snapshot) -> Result<Arc<Snapshot>> {
        if self.snapshots.contains_key(snapshot.name()) {
            return Err(StateError::DuplicateSnapshotName(snapshot.name().to_string()).into());
        }
        info!("snapshot store: registered '{}'", snapshot.name());
        let snapshot = Arc::new(snapshot);
        self.snapshots
            .insert(snapshot.name().to_string(), Arc::clone(&snapshot));
        Ok(snapshot)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Snapshot>> {
        self.snapshots.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.snapshots.contains_key(name)
    }

    /// Snapshot names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.snapshots.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transaction::{Transaction, TxBody, TxOutput};
    use crate::core::value::{Assets, Value};
    use crate::core::wallet::Wallet;
    use crate::error::EmulatorError;

    fn seeded() -> LedgerEmulator {
        let mut ledger = LedgerEmulator::with_seed(1, 1234);
        ledger.create_wallet(50_000_000, Assets::new()).unwrap();
        ledger.create_wallet(20_000_000, Assets::new()).unwrap();
        ledger.tick(2).unwrap();
        ledger
    }

    #[test]
    fn test_snapshot_duplicate_name() {
        let ledger = seeded();
        let mut store = SnapshotStore::new();
        store.snapshot(&ledger, "s1").unwrap();
        let err = store.snapshot(&ledger, "s1").unwrap_err();
        assert_eq!(err, EmulatorError::State(StateError::DuplicateSnapshotName("s1".into())));
    }

    #[test]
    fn test_load_unknown_name() {
        let mut ledger = seeded();
        let store = SnapshotStore::new();
        let err = store.load_snapshot(&mut ledger, "nope").unwrap_err();
        assert_eq!(err, EmulatorError::State(StateError::UnknownSnapshotName("nope".into())));
    }

    #[test]
    fn test_pending_mempool_rejected_and_not_registered() {
        let mut ledger = seeded();
        ledger.create_utxo(&"x".to_string(), Value::ada(1)).unwrap();
        let mut store = SnapshotStore::new();
        let err = store.snapshot(&ledger, "s1").unwrap_err();
        assert!(matches!(
            err,
            EmulatorError::State(StateError::SnapshotWithPendingTxns { .. })
        ));
        assert!(!store.contains("s1"));
    }

    #[test]
    fn test_round_trip_restores_state() {
        let mut ledger = seeded();
        let mut store = SnapshotStore::new();
        let before = store.snapshot(&ledger, "base").unwrap();

        let wallet = ledger.create_wallet(7_000_000, Assets::new()).unwrap();
        ledger.tick(5).unwrap();
        let utxo = ledger.get_utxos(wallet.address())[0].id.clone();
        ledger
            .submit_tx(
                Transaction::new(TxBody {
                    inputs: vec![utxo],
                    outputs: vec![TxOutput::new("elsewhere", Value::ada(1))],
                    ..TxBody::default()
                })
                .unwrap(),
            )
            .unwrap();
        ledger.tick(1).unwrap();

        store.load_snapshot(&mut ledger, "base").unwrap();
        let after = ledger.snapshot("base").unwrap();
        assert_eq!(*before, after);
        assert!(ledger.get_utxos(wallet.address()).is_empty());
    }

    #[test]
    fn test_cross_session_adopts_history() {
        let source = seeded();
        let mut store = SnapshotStore::new();
        store.snapshot(&source, "shared").unwrap();

        let mut target = LedgerEmulator::with_seed(2, 1);
        target.create_wallet(1_000_000, Assets::new()).unwrap();
        target.tick(10).unwrap();
        store.load_snapshot(&mut target, "shared").unwrap();

        assert_eq!(target.blocks(), source.blocks());
        assert_eq!(target.current_slot(), source.current_slot());
        assert_eq!(target.address_utxos(), source.address_utxos());
        assert_eq!(target.id(), 2);
    }

    #[test]
    fn test_json_round_trip() {
        let ledger = seeded();
        let snap = ledger.snapshot("json").unwrap();
        let json = snap.to_json().unwrap();
        let decoded = Snapshot::from_json(&json).unwrap();
        assert_eq!(decoded, snap);
        assert!(matches!(
            Snapshot::from_json("{}").unwrap_err(),
            EmulatorError::State(StateError::SnapshotFormat(_))
        ));
    }

    fn tampered(edit: impl FnOnce(&mut serde_json::Value)) -> String {
        let mut json: serde_json::Value =
            serde_json::from_str(&seeded().snapshot("t").unwrap().to_json().unwrap()).unwrap();
        edit(&mut json);
        json.to_string()
    }

    fn assert_format_error(json: &str) {
        assert!(matches!(
            Snapshot::from_json(json).unwrap_err(),
            EmulatorError::State(StateError::SnapshotFormat(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_unknown_consumed_utxo() {
        let json = tampered(|v| v["consumed_utxos"] = serde_json::json!(["ab#0"]));
        assert_format_error(&json);
    }

    #[test]
    fn test_from_json_rejects_stale_address_index() {
        let json = tampered(|v| v["address_utxos"] = serde_json::json!({}));
        assert_format_error(&json);

        let json = tampered(|v| {
            let first = v["all_utxos"]
                .as_object()
                .and_then(|m| m.keys().next().cloned())
                .unwrap();
            v["consumed_utxos"] = serde_json::json!([first]);
        });
        assert_format_error(&json);
    }

    #[test]
    fn test_inconsistent_snapshot_never_reaches_ledger() {
        let json = tampered(|v| v["consumed_utxos"] = serde_json::json!(["ab#0"]));
        let mut store = SnapshotStore::new();
        assert!(Snapshot::from_json(&json).and_then(|s| store.insert(s)).is_err());
        assert!(store.names().is_empty());
    }

    #[test]
    fn test_insert_and_names() {
        let ledger = seeded();
        let mut store = SnapshotStore::new();
        store.snapshot(&ledger, "b").unwrap();
        store.insert(ledger.snapshot("a").unwrap()).unwrap();
        assert_eq!(store.names(), vec!["a".to_string(), "b".to_string()]);
        assert!(store.insert(ledger.snapshot("a").unwrap()).is_err());
        assert_eq!(store.get("a").unwrap().slot(), 2);
    }
}
