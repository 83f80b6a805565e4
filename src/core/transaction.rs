//! Transaction model stored by the emulator.
//!
//! **Identity:** a regular transaction id is the content hash of its body (inputs, reference
//! inputs, collateral, outputs, validity range). A genesis transaction id is the hash of the
//! emulator id, its genesis index, the target address, and the minted value. Output `i` of
//! transaction `t` is identified by `t#i`.
//!
//! The ledger treats both kinds through [`EmulatorTx`]: it only asks for the id, the inputs,
//! the reference inputs, slot validity, the outputs it creates, and the ids it consumes.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use crate::core::value::Value;
use crate::error::Result;
use crate::utils::hash_message_hex;

/// Hex-encoded transaction hash.
pub type TxId = String;

/// Bech32-like address string. The emulator never decodes it.
pub type Address = String;

/// Reference to one output of a transaction (`tx_id#index`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UtxoId {
    pub tx_id: TxId,
    pub index: u32,
}

impl UtxoId {
    pub fn new(tx_id: impl Into<TxId>, index: u32) -> Self {
        Self {
            tx_id: tx_id.into(),
            index,
        }
    }
}

impl fmt::Display for UtxoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tx_id, self.index)
    }
}

impl FromStr for UtxoId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (tx_id, index) = s
            .rsplit_once('#')
            .ok_or_else(|| format!("missing '#' in utxo id {:?}", s))?;
        if tx_id.is_empty() {
            return Err(format!("empty tx id in utxo id {:?}", s));
        }
        let index = index
            .parse::<u32>()
            .map_err(|e| format!("bad output index in {:?}: {}", s, e))?;
        Ok(Self::new(tx_id, index))
    }
}

// Serialized as `tx_id#index` so ids can be JSON map keys in snapshots.
impl Serialize for UtxoId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for UtxoId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        UtxoId::from_str(&s).map_err(D::Error::custom)
    }
}

/// Output of a transaction: value locked at an address, with an optional inline datum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub address: Address,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datum: Option<String>,
}

impl TxOutput {
    pub fn new(address: impl Into<Address>, value: Value) -> Self {
        Self {
            address: address.into(),
            value,
            datum: None,
        }
    }

    pub fn with_datum(mut self, datum: impl Into<String>) -> Self {
        self.datum = Some(datum.into());
        self
    }
}

/// Unspent transaction output: an id plus the output it refers to. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub id: UtxoId,
    pub output: TxOutput,
}

impl Utxo {
    pub fn new(id: UtxoId, output: TxOutput) -> Self {
        Self { id, output }
    }

    pub fn address(&self) -> &Address {
        &self.output.address
    }

    pub fn value(&self) -> &Value {
        &self.output.value
    }

    pub fn lovelace(&self) -> u64 {
        self.output.value.lovelace
    }

    pub fn is_pure_ada(&self) -> bool {
        self.output.value.is_pure_ada()
    }
}

impl fmt::Display for Utxo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}: {}", self.id, self.output.address, self.output.value)
    }
}

/// Slot interval in which a transaction may be included: `valid_from` inclusive, `valid_to`
/// exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityRange {
    pub valid_from: Option<u64>,
    pub valid_to: Option<u64>,
}

impl ValidityRange {
    /// Valid in every slot.
    pub fn always() -> Self {
        Self::default()
    }

    pub fn between(valid_from: u64, valid_to: u64) -> Self {
        Self {
            valid_from: Some(valid_from),
            valid_to: Some(valid_to),
        }
    }

    pub fn contains(&self, slot: u64) -> bool {
        self.valid_from.map_or(true, |from| slot >= from)
            && self.valid_to.map_or(true, |to| slot < to)
    }
}

/// Body of a regular transaction. The id is computed over this structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxBody {
    pub inputs: Vec<UtxoId>,
    #[serde(default)]
    pub ref_inputs: Vec<UtxoId>,
    #[serde(default)]
    pub collateral: Option<UtxoId>,
    pub outputs: Vec<TxOutput>,
    #[serde(default)]
    pub validity: ValidityRange,
}

/// Opaque witness attached by a wallet. The emulator stores it but never verifies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub signer: Address,
    pub tx_id: TxId,
}

/// Regular transaction as produced by an external transaction builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxId,
    pub body: TxBody,
    #[serde(default)]
    pub signatures: Vec<Signature>,
}

impl Transaction {
    /// Wraps a body and computes its id.
    pub fn new(body: TxBody) -> Result<Self> {
        let id = Self::compute_id(&body)?;
        Ok(Self {
            id,
            body,
            signatures: Vec::new(),
        })
    }

    /// Content hash of the body. Same body -> same id.
    pub fn compute_id(body: &TxBody) -> Result<TxId> {
        hash_message_hex(body)
    }

    pub fn add_signatures(&mut self, signatures: impl IntoIterator<Item = Signature>) {
        self.signatures.extend(signatures);
    }
}

/// No-cost minting transaction used to seed funds at an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisTx {
    pub id: TxId,
    /// Position in the emulator's genesis list; part of the id.
    pub genesis_index: u64,
    pub output: TxOutput,
}

impl GenesisTx {
    pub fn new(emulator_id: u64, genesis_index: u64, output: TxOutput) -> Result<Self> {
        #[derive(Serialize)]
        struct GenesisHashData<'a> {
            kind: &'static str,
            emulator_id: u64,
            genesis_index: u64,
            output: &'a TxOutput,
        }
        let id = hash_message_hex(&GenesisHashData {
            kind: "genesis",
            emulator_id,
            genesis_index,
            output: &output,
        })?;
        Ok(Self {
            id,
            genesis_index,
            output,
        })
    }
}

/// Transaction as stored in the mempool and in blocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EmulatorTx {
    Genesis(GenesisTx),
    Regular(Transaction),
}

impl EmulatorTx {
    pub fn id(&self) -> &TxId {
        match self {
            EmulatorTx::Genesis(g) => &g.id,
            EmulatorTx::Regular(tx) => &tx.id,
        }
    }

    pub fn inputs(&self) -> &[UtxoId] {
        match self {
            EmulatorTx::Genesis(_) => &[],
            EmulatorTx::Regular(tx) => &tx.body.inputs,
        }
    }

    pub fn ref_inputs(&self) -> &[UtxoId] {
        match self {
            EmulatorTx::Genesis(_) => &[],
            EmulatorTx::Regular(tx) => &tx.body.ref_inputs,
        }
    }

    pub fn collateral(&self) -> Option<&UtxoId> {
        match self {
            EmulatorTx::Genesis(_) => None,
            EmulatorTx::Regular(tx) => tx.body.collateral.as_ref(),
        }
    }

    /// Genesis transactions are valid in every slot.
    pub fn is_valid_slot(&self, slot: u64) -> bool {
        match self {
            EmulatorTx::Genesis(_) => true,
            EmulatorTx::Regular(tx) => tx.body.validity.contains(slot),
        }
    }

    /// Outputs created when this transaction commits, indexed in output order.
    pub fn new_utxos(&self) -> Vec<Utxo> {
        match self {
            EmulatorTx::Genesis(g) => {
                vec![Utxo::new(UtxoId::new(g.id.clone(), 0), g.output.clone())]
            }
            EmulatorTx::Regular(tx) => tx
                .body
                .outputs
                .iter()
                .enumerate()
                .map(|(i, out)| Utxo::new(UtxoId::new(tx.id.clone(), i as u32), out.clone()))
                .collect(),
        }
    }

    /// Ids spent when this transaction commits. Reference inputs and collateral are not spent.
    pub fn consumed_utxos(&self) -> Vec<UtxoId> {
        self.inputs().to_vec()
    }

    pub fn is_genesis(&self) -> bool {
        matches!(self, EmulatorTx::Genesis(_))
    }
}

impl From<Transaction> for EmulatorTx {
    fn from(tx: Transaction) -> Self {
        EmulatorTx::Regular(tx)
    }
}

impl From<GenesisTx> for EmulatorTx {
    fn from(tx: GenesisTx) -> Self {
        EmulatorTx::Genesis(tx)
    }
}
