// Core ledger emulator
//
// DETERMINISM GUARANTEES:
// =======================
// 1. Same seed + same call sequence → same addresses, tx ids, blocks and indices
// 2. All randomness comes from the emulator's own mulberry32 stream
// 3. No system time: the clock is the slot counter and the network parameters
// 4. Ordered collections only (BTreeMap/BTreeSet/Vec), so iteration order is stable
// 5. Transactions commit in exact submission order
//
// INVARIANTS:
// - A utxo id is consumed at most once
// - Every unconsumed utxo sits in exactly one address bucket
// - Snapshots are never observably aliased to live state

pub mod value;
pub mod transaction;
pub mod rng;
pub mod params;
pub mod mempool;
pub mod block;
pub mod emulator;
pub mod snapshot;
pub mod wallet;
pub mod reservation;
pub mod coin_selection;
