//! Per-draft reservation tracking.
//!
//! A [`ReservationTracker`] belongs to exactly one transaction draft. It records the utxos that
//! draft already spends (inputs) or pledges (collateral) so that later coin selection within the
//! same draft never picks them again. Reservations only grow; the tracker is consumed by
//! [`ReservationTracker::finish`] when the draft becomes a transaction.

use log::debug;
use crate::core::emulator::InvariantViolation;
use crate::core::transaction::{Transaction, TxBody, TxOutput, Utxo, UtxoId, ValidityRange};
use crate::error::Result;

#[derive(Debug, Default)]
pub struct ReservationTracker {
    inputs: Vec<Utxo>,
    ref_inputs: Vec<Utxo>,
    collateral: Option<Utxo>,
    outputs: Vec<TxOutput>,
}

impl ReservationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves `utxo` as an input. Reserving the same utxo twice is a programmer error.
    pub fn add_input(&mut self, utxo: Utxo) -> Result<&mut Self> {
        if self.is_reserved(&utxo.id) {
            return Err(InvariantViolation::InvalidArgument(format!(
                "utxo {} is already reserved in this draft",
                utxo.id
            ))
            .into());
        }
        debug!("reserve input {}", utxo.id);
        self.inputs.push(utxo);
        Ok(self)
    }

    pub fn add_inputs(&mut self, utxos: impl IntoIterator<Item = Utxo>) -> Result<&mut Self> {
        for utxo in utxos {
            self.add_input(utxo)?;
        }
        Ok(self)
    }

    /// Records a reference input. Reference inputs are read, not spent, so they do not reserve.
    pub fn add_ref_input(&mut self, utxo: Utxo) -> &mut Self {
        self.ref_inputs.push(utxo);
        self
    }

    pub fn add_output(&mut self, output: TxOutput) -> &mut Self {
        self.outputs.push(output);
        self
    }

    /// Pledges `utxo` as collateral. It must be pure ADA, and only one collateral may be set.
    pub fn add_collateral(&mut self, utxo: Utxo) -> Result<&mut Self> {
        if !utxo.is_pure_ada() {
            return Err(InvariantViolation::CollateralNotPure(utxo.id).into());
        }
        if let Some(existing) = &self.collateral {
            return Err(InvariantViolation::CollateralAlreadySet {
                existing: existing.id.clone(),
                attempted: utxo.id,
            }
            .into());
        }
        if self.is_reserved(&utxo.id) {
            return Err(InvariantViolation::InvalidArgument(format!(
                "utxo {} is already reserved as an input in this draft",
                utxo.id
            ))
            .into());
        }
        debug!("reserve collateral {}", utxo.id);
        self.collateral = Some(utxo);
        Ok(self)
    }

    pub fn inputs(&self) -> &[Utxo] {
        &self.inputs
    }

    pub fn ref_inputs(&self) -> &[Utxo] {
        &self.ref_inputs
    }

    pub fn outputs(&self) -> &[TxOutput] {
        &self.outputs
    }

    pub fn collateral(&self) -> Option<&Utxo> {
        self.collateral.as_ref()
    }

    /// Declared inputs followed by the collateral, if any.
    pub fn reserved_utxos(&self) -> Vec<&Utxo> {
        self.inputs.iter().chain(self.collateral.iter()).collect()
    }

    pub fn is_reserved(&self, id: &UtxoId) -> bool {
        self.inputs.iter().any(|u| &u.id == id)
            || self.collateral.as_ref().map_or(false, |c| &c.id == id)
    }

    /// Returns `utxo` if this draft has not reserved it; used to filter candidate sets.
    pub fn utxo_not_reserved<'a>(&self, utxo: &'a Utxo) -> Option<&'a Utxo> {
        if self.is_reserved(&utxo.id) {
            None
        } else {
            Some(utxo)
        }
    }

    /// Closes the draft and produces the transaction it describes.
    pub fn finish(self, validity: ValidityRange) -> Result<Transaction> {
        Transaction::new(TxBody {
            inputs: self.inputs.into_iter().map(|u| u.id).collect(),
            ref_inputs: self.ref_inputs.into_iter().map(|u| u.id).collect(),
            collateral: self.collateral.map(|u| u.id),
            outputs: self.outputs,
            validity,
        })
    }
}
