//! Mempool: submitted-but-uncommitted transactions, kept in strict submission order.
//!
//! # Ordering
//! The next block contains every pending transaction in the order it was submitted. Nothing is
//! ever reordered, and nothing can be withdrawn once submitted; the only way out is `drain`,
//! called by the ledger when it commits a block.
//!
//! # Pending spends
//! The mempool tracks which utxo ids its transactions will consume, so the ledger can reject a
//! second spend before either transaction commits.

use std::collections::BTreeSet;
use crate::core::transaction::{EmulatorTx, TxId, UtxoId};

/// Ordered transaction pool.
#[derive(Debug, Clone, Default)]
pub struct Mempool {
    transactions: Vec<EmulatorTx>,
    /// Inputs of every pending transaction.
    pending_inputs: BTreeSet<UtxoId>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transaction. Validation is the ledger's job; the mempool only records.
    pub fn push(&mut self, tx: EmulatorTx) {
        self.pending_inputs.extend(tx.inputs().iter().cloned());
        self.transactions.push(tx);
    }

    /// True if any pending transaction spends `id`.
    pub fn is_pending_input(&self, id: &UtxoId) -> bool {
        self.pending_inputs.contains(id)
    }

    pub fn contains(&self, tx_id: &TxId) -> bool {
        self.transactions.iter().any(|tx| tx.id() == tx_id)
    }

    /// Pending transactions in submission order.
    pub fn transactions(&self) -> &[EmulatorTx] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Removes and returns every pending transaction, in submission order.
    pub fn drain(&mut self) -> Vec<EmulatorTx> {
        self.pending_inputs.clear();
        std::mem::take(&mut self.transactions)
    }
}
