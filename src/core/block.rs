//! Blocks committed by the emulator.
//!
//! A block is an immutable, ordered list of transactions plus a small header: height, commit
//! slot, previous hash, Merkle root over the transaction ids, and the block hash. Transaction
//! order is significant here, so the Merkle root is computed over ids in block order.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use crate::core::transaction::{EmulatorTx, TxId};

/// Previous-hash value of the first block.
pub const GENESIS_PREVIOUS_HASH: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub height: u64,
    /// Slot reached by the tick that committed this block.
    pub slot: u64,
    pub previous_hash: String,
    pub merkle_root: String,
    pub block_hash: String,
    pub transactions: Vec<EmulatorTx>,
}

impl Block {
    pub fn tx_ids(&self) -> Vec<TxId> {
        self.transactions.iter().map(|tx| tx.id().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }
}

/// Merkle root of `tx_ids` in the given order. Empty list yields "0"; an odd node is paired with
/// itself.
pub fn compute_merkle_root(tx_ids: &[TxId]) -> String {
    if tx_ids.is_empty() {
        return "0".to_string();
    }
    let mut layer: Vec<[u8; 32]> = tx_ids
        .iter()
        .map(|id| {
            let mut hasher = Sha256::new();
            hasher.update(id.as_bytes());
            let mut arr = [0u8; 32];
            arr.copy_from_slice(&hasher.finalize());
            arr
        })
        .collect();
    while layer.len() > 1 {
        let mut next = Vec::with_capacity((layer.len() + 1) / 2);
        for chunk in layer.chunks(2) {
            let mut hasher = Sha256::new();
            hasher.update(chunk[0]);
            hasher.update(if chunk.len() == 2 { chunk[1] } else { chunk[0] });
            let mut arr = [0u8; 32];
            arr.copy_from_slice(&hasher.finalize());
            next.push(arr);
        }
        layer = next;
    }
    hex::encode(layer[0])
}

fn compute_block_hash(height: u64, slot: u64, previous_hash: &str, merkle_root: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(height.to_le_bytes());
    hasher.update(slot.to_le_bytes());
    hasher.update(previous_hash.as_bytes());
    hasher.update(merkle_root.as_bytes());
    hex::encode(hasher.finalize())
}

/// Builds a block over `transactions`, keeping their order.
pub fn assemble_block(
    height: u64,
    slot: u64,
    previous_hash: String,
    transactions: Vec<EmulatorTx>,
) -> Block {
    let ids: Vec<TxId> = transactions.iter().map(|tx| tx.id().clone()).collect();
    let merkle_root = compute_merkle_root(&ids);
    let block_hash = compute_block_hash(height, slot, &previous_hash, &merkle_root);
    Block {
        height,
        slot,
        previous_hash,
        merkle_root,
        block_hash,
        transactions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merkle_empty() {
        assert_eq!(compute_merkle_root(&[]), "0");
    }

    #[test]
    fn test_merkle_order_sensitive() {
        let a = "aa".to_string();
        let b = "bb".to_string();
        let ab = compute_merkle_root(&[a.clone(), b.clone()]);
        let ba = compute_merkle_root(&[b, a]);
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_block_hash_deterministic() {
        let b1 = assemble_block(0, 3, GENESIS_PREVIOUS_HASH.to_string(), vec![]);
        let b2 = assemble_block(0, 3, GENESIS_PREVIOUS_HASH.to_string(), vec![]);
        let b3 = assemble_block(0, 4, GENESIS_PREVIOUS_HASH.to_string(), vec![]);
        assert_eq!(b1.block_hash, b2.block_hash);
        assert_ne!(b1.block_hash, b3.block_hash);
        assert!(b1.is_empty());
    }
}
