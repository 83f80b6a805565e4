//! Wallet collaborator interface.
//!
//! The emulator performs no key management: a wallet is an address plus a way to attach
//! witnesses to a transaction. Utxo state lives in the ledger, so a wallet reads its utxos
//! through a [`UtxoSource`].

use crate::core::transaction::{Address, Signature, Transaction, Utxo, UtxoId};

/// Read access to unspent outputs, as needed by wallets and the coin selector.
pub trait UtxoSource {
    /// Unconsumed utxos at `address` in committed state.
    fn utxos_at(&self, address: &Address) -> Vec<Utxo>;

    /// True if consumed, or about to be consumed by a pending transaction.
    fn is_consumed(&self, id: &UtxoId) -> bool;
}

/// Actor that owns funds in the emulated ledger.
pub trait Wallet {
    /// Primary address; change and payments to this actor land here.
    fn address(&self) -> &Address;

    fn used_addresses(&self) -> Vec<Address> {
        vec![self.address().clone()]
    }

    /// Witnesses for `tx`. Opaque to the ledger.
    fn sign_tx(&self, tx: &Transaction) -> Vec<Signature>;

    /// Current unconsumed utxos across all used addresses, excluding pending spends.
    fn utxos(&self, source: &dyn UtxoSource) -> Vec<Utxo> {
        self.used_addresses()
            .iter()
            .flat_map(|address| source.utxos_at(address))
            .filter(|utxo| !source.is_consumed(&utxo.id))
            .collect()
    }
}

/// Emulator-created wallet: a single address, signing by tagging the tx id with that address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleWallet {
    address: Address,
}

impl SimpleWallet {
    pub fn new(address: impl Into<Address>) -> Self {
        Self {
            address: address.into(),
        }
    }
}

impl Wallet for SimpleWallet {
    fn address(&self) -> &Address {
        &self.address
    }

    fn sign_tx(&self, tx: &Transaction) -> Vec<Signature> {
        vec![Signature {
            signer: self.address.clone(),
            tx_id: tx.id.clone(),
        }]
    }
}
