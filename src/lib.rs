pub mod utils;
pub mod error;
pub mod config;
pub mod core;

pub use utils::{hash_message, hash_message_hex, lovelace_to_ada_string, DOMAIN_SEPARATOR};
pub use error::{EmulatorError, Result};
pub use config::{EmulatorConfig, TESTNET_NET_NUMBER};

// Core API exports
pub use core::value::{AssetClass, Assets, PolicyId, TokenName, Value, LOVELACE_PER_ADA};
pub use core::transaction::{
    Address,
    EmulatorTx,
    GenesisTx,
    Signature,
    Transaction,
    TxBody,
    TxId,
    TxOutput,
    Utxo,
    UtxoId,
    ValidityRange,
};
pub use core::rng::{mulberry32_step, EmulatorRng, DEFAULT_SEED};
pub use core::params::{
    LiveSlotParams,
    NetworkParameterProvider,
    NetworkParams,
    DEFAULT_COINS_PER_UTXO_BYTE,
    DEFAULT_SLOT_LENGTH_MS,
    UTXO_ENTRY_OVERHEAD_BYTES,
};
pub use core::mempool::Mempool;
pub use core::block::{assemble_block, compute_merkle_root, Block, GENESIS_PREVIOUS_HASH};
pub use core::emulator::{InvariantViolation, LedgerEmulator, StateError, ValidationError};
pub use core::snapshot::{Snapshot, SnapshotStore};
pub use core::wallet::{SimpleWallet, UtxoSource, Wallet};
pub use core::reservation::ReservationTracker;
pub use core::coin_selection::{
    compare_sort_info,
    sort_info,
    CoinSelector,
    NotFoundReason,
    SelectionError,
    SelectionRequest,
    SelectorConfig,
    SortInfo,
    Spendable,
    ValuePredicate,
    ValueTarget,
    DEFAULT_SPARE_FEE_BUFFER,
};
