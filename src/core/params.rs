//! Network parameters: slot/time conversion and the minimum-ADA rule for outputs.
//!
//! The ledger calls a [`NetworkParameterProvider`]; it does not own the rules. [`NetworkParams`]
//! is the default, a Cardano-style `coins_per_utxo_byte * (160 + size)` estimate.
//! [`LiveSlotParams`] is the cached helper view that tracks the emulator's current slot and is
//! re-derived whenever the slot moves (tick, snapshot load).

use serde::{Deserialize, Serialize};
use crate::core::value::Value;

/// Default slot length (1 second).
pub const DEFAULT_SLOT_LENGTH_MS: u64 = 1_000;
/// Default lovelace charged per serialized output byte.
pub const DEFAULT_COINS_PER_UTXO_BYTE: u64 = 4_310;
/// Constant overhead added to every output size by the min-ADA rule.
pub const UTXO_ENTRY_OVERHEAD_BYTES: u64 = 160;

// Byte-size estimate of an output: address + lovelace envelope, then per policy and per token.
const OUTPUT_BASE_BYTES: u64 = 65;
const POLICY_BYTES: u64 = 28 + 4;
const TOKEN_BASE_BYTES: u64 = 12;

/// Parameter functions the ledger and the coin selector depend on.
pub trait NetworkParameterProvider {
    /// POSIX milliseconds at the start of `slot`.
    fn slot_to_time(&self, slot: u64) -> i64;

    /// Slot containing POSIX millisecond `time`. Times before slot zero map to slot 0.
    fn time_to_slot(&self, time: i64) -> u64;

    /// Minimum lovelace an output holding `value` must carry.
    fn min_ada_for(&self, value: &Value) -> u64;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkParams {
    /// POSIX milliseconds of slot 0.
    pub slot_zero_time_ms: i64,
    pub slot_length_ms: u64,
    pub coins_per_utxo_byte: u64,
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self {
            slot_zero_time_ms: 0,
            slot_length_ms: DEFAULT_SLOT_LENGTH_MS,
            coins_per_utxo_byte: DEFAULT_COINS_PER_UTXO_BYTE,
        }
    }
}

impl NetworkParams {
    /// Estimated serialized size of an output holding `value`.
    pub fn output_size_bytes(value: &Value) -> u64 {
        let mut size = OUTPUT_BASE_BYTES;
        for (_, tokens) in value.assets.policies() {
            size += POLICY_BYTES;
            for name in tokens.keys() {
                size += TOKEN_BASE_BYTES + (name.len() as u64 / 2);
            }
        }
        size
    }
}

impl NetworkParameterProvider for NetworkParams {
    fn slot_to_time(&self, slot: u64) -> i64 {
        let offset = slot.saturating_mul(self.slot_length_ms);
        self.slot_zero_time_ms
            .saturating_add(i64::try_from(offset).unwrap_or(i64::MAX))
    }

    fn time_to_slot(&self, time: i64) -> u64 {
        if time <= self.slot_zero_time_ms || self.slot_length_ms == 0 {
            return 0;
        }
        let elapsed = (time - self.slot_zero_time_ms) as u64;
        elapsed / self.slot_length_ms
    }

    fn min_ada_for(&self, value: &Value) -> u64 {
        let size = UTXO_ENTRY_OVERHEAD_BYTES + Self::output_size_bytes(value);
        self.coins_per_utxo_byte.saturating_mul(size)
    }
}

/// Parameter view pinned to the emulator's live slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSlotParams {
    params: NetworkParams,
    live_slot: u64,
}

impl LiveSlotParams {
    pub fn new(params: NetworkParams, live_slot: u64) -> Self {
        Self { params, live_slot }
    }

    pub fn live_slot(&self) -> u64 {
        self.live_slot
    }

    /// POSIX milliseconds of the live slot.
    pub fn live_time(&self) -> i64 {
        self.params.slot_to_time(self.live_slot)
    }

    pub fn params(&self) -> &NetworkParams {
        &self.params
    }

    pub(crate) fn refresh(&mut self, live_slot: u64) {
        self.live_slot = live_slot;
    }
}

impl NetworkParameterProvider for LiveSlotParams {
    fn slot_to_time(&self, slot: u64) -> i64 {
        self.params.slot_to_time(slot)
    }

    fn time_to_slot(&self, time: i64) -> u64 {
        self.params.time_to_slot(time)
    }

    fn min_ada_for(&self, value: &Value) -> u64 {
        self.params.min_ada_for(value)
    }
}
