//! Value model: lovelace plus a multi-asset bundle keyed by policy id and token name.
//!
//! Quantities are integer minimal units. Zero quantities are never stored, so two values
//! holding the same non-zero amounts always compare equal.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 1 ADA = 1_000_000 lovelace.
pub const LOVELACE_PER_ADA: u64 = 1_000_000;

/// Hex-encoded minting policy hash.
pub type PolicyId = String;

/// Hex-encoded token name.
pub type TokenName = String;

/// Identifies one native token: policy id plus token name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetClass {
    pub policy_id: PolicyId,
    pub token_name: TokenName,
}

impl AssetClass {
    pub fn new(policy_id: impl Into<PolicyId>, token_name: impl Into<TokenName>) -> Self {
        Self {
            policy_id: policy_id.into(),
            token_name: token_name.into(),
        }
    }

    /// Returns a canonical string for logging and ordering (`policy.token`).
    pub fn as_canonical(&self) -> String {
        format!("{}.{}", self.policy_id, self.token_name)
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_canonical())
    }
}

/// Multi-asset bundle. Policies and token names are kept sorted for deterministic iteration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assets(BTreeMap<PolicyId, BTreeMap<TokenName, u64>>);

impl Assets {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Bundle holding a single token quantity.
    pub fn from_asset(class: &AssetClass, quantity: u64) -> Self {
        let mut assets = Self::new();
        assets.add_asset(class, quantity);
        assets
    }

    /// Adds `quantity` of `class`. Zero is a no-op so the bundle stays normalised.
    pub fn add_asset(&mut self, class: &AssetClass, quantity: u64) {
        if quantity == 0 {
            return;
        }
        let tokens = self.0.entry(class.policy_id.clone()).or_default();
        let current = tokens.entry(class.token_name.clone()).or_insert(0);
        *current = current.saturating_add(quantity);
    }

    pub fn get(&self, class: &AssetClass) -> u64 {
        self.0
            .get(&class.policy_id)
            .and_then(|tokens| tokens.get(&class.token_name))
            .copied()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(|tokens| tokens.values().all(|q| *q == 0))
    }

    pub fn policy_count(&self) -> usize {
        self.0.len()
    }

    pub fn token_count(&self) -> usize {
        self.0.values().map(|tokens| tokens.len()).sum()
    }

    /// Iterates `(asset class, quantity)` in policy then token-name order.
    pub fn iter(&self) -> impl Iterator<Item = (AssetClass, u64)> + '_ {
        self.0.iter().flat_map(|(policy, tokens)| {
            tokens
                .iter()
                .map(move |(name, q)| (AssetClass::new(policy.clone(), name.clone()), *q))
        })
    }

    /// Per-policy view used by min-ADA size estimation.
    pub fn policies(&self) -> impl Iterator<Item = (&PolicyId, &BTreeMap<TokenName, u64>)> {
        self.0.iter()
    }

    /// Component-wise `self ⊇ other`: every token in `other` is held in at least that quantity.
    pub fn contains(&self, other: &Assets) -> bool {
        other.iter().all(|(class, q)| self.get(&class) >= q)
    }

    pub fn merged(&self, other: &Assets) -> Assets {
        let mut out = self.clone();
        for (class, q) in other.iter() {
            out.add_asset(&class, q);
        }
        out
    }
}

/// Lovelace amount plus native-token bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    pub lovelace: u64,
    pub assets: Assets,
}

impl Value {
    pub fn new(lovelace: u64, assets: Assets) -> Self {
        Self { lovelace, assets }
    }

    pub fn lovelace(lovelace: u64) -> Self {
        Self::new(lovelace, Assets::new())
    }

    pub fn ada(ada: u64) -> Self {
        Self::lovelace(ada.saturating_mul(LOVELACE_PER_ADA))
    }

    /// Token-only value (zero lovelace).
    pub fn from_asset(class: &AssetClass, quantity: u64) -> Self {
        Self::new(0, Assets::from_asset(class, quantity))
    }

    pub fn is_zero(&self) -> bool {
        self.lovelace == 0 && self.assets.is_empty()
    }

    /// True when the value carries no native tokens.
    pub fn is_pure_ada(&self) -> bool {
        self.assets.is_empty()
    }

    /// Component-wise `self ⊇ other` over lovelace and every asset.
    pub fn contains(&self, other: &Value) -> bool {
        self.lovelace >= other.lovelace && self.assets.contains(&other.assets)
    }

    pub fn add(&self, other: &Value) -> Value {
        Value {
            lovelace: self.lovelace.saturating_add(other.lovelace),
            assets: self.assets.merged(&other.assets),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} lovelace", self.lovelace)?;
        for (class, q) in self.assets.iter() {
            write!(f, " + {} {}", q, class)?;
        }
        Ok(())
    }
}
