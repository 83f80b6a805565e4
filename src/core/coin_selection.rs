//! Coin selection over the emulated ledger.
//!
//! # Sort info
//! For each candidate utxo and a requested range `(min, max)`:
//! - `min_ada_requirement` is 0 for pure-ADA utxos, otherwise the min-ADA of an output holding
//!   only the utxo's asset bundle;
//! - `free = lovelace - min_ada_requirement`;
//! - `sufficient = free > min && (max is None || free < max)`.
//!
//! # Ordering
//! Pure-ADA utxos come before asset-bearing ones regardless of size. Within a purity class the
//! smaller `free` comes first. Ties fall back to the utxo id so the order is total. The first
//! sufficient candidate is the one selected.
//!
//! # Sessions
//! Selection is stateless; the caller passes its [`ReservationTracker`] so already-reserved
//! utxos are skipped. On failure the error carries a dump of every searched candidate and says
//! whether a match exists but is reserved by the session.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use log::debug;
use thiserror::Error;
use crate::core::emulator::LedgerEmulator;
use crate::core::params::NetworkParameterProvider;
use crate::core::reservation::ReservationTracker;
use crate::core::transaction::{Address, TxOutput, Utxo, UtxoId};
use crate::core::value::{AssetClass, Assets, PolicyId, TokenName, Value, LOVELACE_PER_ADA};
use crate::core::wallet::{UtxoSource, Wallet};
use crate::error::{EmulatorError, Result};

/// Default free-ADA threshold a spare (fee/change) utxo must exceed.
pub const DEFAULT_SPARE_FEE_BUFFER: u64 = 2 * LOVELACE_PER_ADA;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Free lovelace a utxo must exceed to count as spare for fees.
    pub spare_fee_buffer: u64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            spare_fee_buffer: DEFAULT_SPARE_FEE_BUFFER,
        }
    }
}

/// Why a search came back empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundReason {
    /// No unspent candidate matches at all.
    NotPresent,
    /// Matching utxos exist but this session has already reserved them.
    AlreadyReserved(Vec<UtxoId>),
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundReason::NotPresent => write!(f, "no matching utxo exists"),
            NotFoundReason::AlreadyReserved(ids) => {
                write!(f, "matching utxo(s) already reserved in this session:")?;
                for id in ids {
                    write!(f, " {}", id)?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Utxo not found for {purpose}: {reason}\nsearched:\n{searched}")]
    UtxoNotFound {
        purpose: String,
        reason: NotFoundReason,
        /// Diagnostic dump of the candidate set, one utxo per line.
        searched: String,
    },

    #[error(
        "Insufficient funds for {purpose}: searched {} wallet address(es)",
        .searched_addresses.len()
    )]
    InsufficientFunds {
        purpose: String,
        searched_addresses: Vec<Address>,
    },
}

impl From<SelectionError> for EmulatorError {
    fn from(err: SelectionError) -> Self {
        EmulatorError::Selection(err)
    }
}

/// Per-utxo selection metrics. Computed on demand, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortInfo {
    pub utxo: Utxo,
    pub sufficient: bool,
    /// Lovelace above the utxo's own min-ADA; negative if underfunded.
    pub free: i128,
    pub min_ada_requirement: u64,
}

impl SortInfo {
    pub fn is_pure(&self) -> bool {
        self.utxo.is_pure_ada()
    }
}

/// Computes the sort info of `utxo` for a request of more than `min` and less than `max` free
/// lovelace.
pub fn sort_info(
    utxo: &Utxo,
    params: &dyn NetworkParameterProvider,
    min: u64,
    max: Option<u64>,
) -> SortInfo {
    let assets = &utxo.value().assets;
    let min_ada_requirement = if assets.is_empty() {
        0
    } else {
        params.min_ada_for(&Value::new(0, assets.clone()))
    };
    let free = i128::from(utxo.lovelace()) - i128::from(min_ada_requirement);
    let sufficient = free > i128::from(min) && max.map_or(true, |m| free < i128::from(m));
    SortInfo {
        utxo: utxo.clone(),
        sufficient,
        free,
        min_ada_requirement,
    }
}

/// Preference order: pure before asset-bearing, then smaller `free`, then utxo id.
pub fn compare_sort_info(a: &SortInfo, b: &SortInfo) -> Ordering {
    b.is_pure()
        .cmp(&a.is_pure())
        .then_with(|| a.free.cmp(&b.free))
        .then_with(|| a.utxo.id.cmp(&b.utxo.id))
}

/// Something whose value can be tested against a target.
#[derive(Debug, Clone, Copy)]
pub enum Spendable<'a> {
    Input(&'a Utxo),
    Output(&'a TxOutput),
    Assets(&'a Assets),
}

/// Accepted forms of a value target; all normalise to one [`Value`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueTarget {
    Value(Value),
    Token {
        policy_id: PolicyId,
        token_name: TokenName,
        quantity: u64,
    },
    AssetClass(AssetClass, u64),
}

impl ValueTarget {
    pub fn normalize(&self) -> Value {
        match self {
            ValueTarget::Value(v) => v.clone(),
            ValueTarget::Token {
                policy_id,
                token_name,
                quantity,
            } => Value::from_asset(
                &AssetClass::new(policy_id.clone(), token_name.clone()),
                *quantity,
            ),
            ValueTarget::AssetClass(class, quantity) => Value::from_asset(class, *quantity),
        }
    }
}

impl From<Value> for ValueTarget {
    fn from(value: Value) -> Self {
        ValueTarget::Value(value)
    }
}

impl From<(AssetClass, u64)> for ValueTarget {
    fn from((class, quantity): (AssetClass, u64)) -> Self {
        ValueTarget::AssetClass(class, quantity)
    }
}

/// `value(x) ⊇ target` over any [`Spendable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValuePredicate {
    target: Value,
}

impl ValuePredicate {
    pub fn new(target: impl Into<ValueTarget>) -> Self {
        Self {
            target: target.into().normalize(),
        }
    }

    pub fn for_token(
        policy_id: impl Into<PolicyId>,
        token_name: impl Into<TokenName>,
        quantity: u64,
    ) -> Self {
        Self::new(ValueTarget::Token {
            policy_id: policy_id.into(),
            token_name: token_name.into(),
            quantity,
        })
    }

    pub fn for_asset_class(class: AssetClass, quantity: u64) -> Self {
        Self::new((class, quantity))
    }

    pub fn target(&self) -> &Value {
        &self.target
    }

    pub fn matches(&self, item: Spendable<'_>) -> bool {
        match item {
            Spendable::Input(utxo) => utxo.value().contains(&self.target),
            Spendable::Output(output) => output.value.contains(&self.target),
            Spendable::Assets(assets) => {
                self.target.lovelace == 0 && assets.contains(&self.target.assets)
            }
        }
    }

    pub fn matches_utxo(&self, utxo: &Utxo) -> bool {
        self.matches(Spendable::Input(utxo))
    }
}

/// Free-lovelace range plus an optional required bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionRequest {
    pub min_lovelace: u64,
    pub max_lovelace: Option<u64>,
    pub required_assets: Assets,
}

impl SelectionRequest {
    pub fn lovelace(min_lovelace: u64) -> Self {
        Self {
            min_lovelace,
            ..Self::default()
        }
    }

    pub fn with_max(mut self, max_lovelace: u64) -> Self {
        self.max_lovelace = Some(max_lovelace);
        self
    }

    pub fn with_assets(mut self, assets: Assets) -> Self {
        self.required_assets = assets;
        self
    }

    fn describe(&self) -> String {
        let mut out = format!("free lovelace > {}", self.min_lovelace);
        if let Some(max) = self.max_lovelace {
            out.push_str(&format!(" and < {}", max));
        }
        if !self.required_assets.is_empty() {
            out.push_str(&format!(" with {}", Value::new(0, self.required_assets.clone())));
        }
        out
    }
}

/// Candidate utxos split by whether the current session already reserved them.
struct Candidates {
    available: Vec<Utxo>,
    reserved: Vec<Utxo>,
}

pub struct CoinSelector<'a> {
    source: &'a dyn UtxoSource,
    params: &'a dyn NetworkParameterProvider,
    config: SelectorConfig,
}

impl<'a> CoinSelector<'a> {
    pub fn new(
        source: &'a dyn UtxoSource,
        params: &'a dyn NetworkParameterProvider,
        config: SelectorConfig,
    ) -> Self {
        Self {
            source,
            params,
            config,
        }
    }

    /// Selector reading utxos and parameters from `ledger`.
    pub fn for_ledger(ledger: &'a LedgerEmulator, config: SelectorConfig) -> Self {
        Self::new(ledger, ledger.params(), config)
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    fn sort_info_for(&self, utxo: &Utxo, request: &SelectionRequest) -> SortInfo {
        let mut info = sort_info(utxo, self.params, request.min_lovelace, request.max_lovelace);
        info.sufficient = info.sufficient && utxo.value().assets.contains(&request.required_assets);
        info
    }

    /// Sort infos of all `candidates` in preference order, sufficient or not.
    pub fn sort_infos(&self, candidates: &[Utxo], request: &SelectionRequest) -> Vec<SortInfo> {
        let mut infos: Vec<SortInfo> = candidates
            .iter()
            .map(|u| self.sort_info_for(u, request))
            .collect();
        infos.sort_by(compare_sort_info);
        infos
    }

    /// Sufficient candidates in preference order.
    pub fn sufficient(&self, candidates: &[Utxo], request: &SelectionRequest) -> Vec<Utxo> {
        self.sort_infos(candidates, request)
            .into_iter()
            .filter(|info| info.sufficient)
            .map(|info| info.utxo)
            .collect()
    }

    /// Most preferred sufficient candidate.
    pub fn select(&self, candidates: &[Utxo], request: &SelectionRequest) -> Option<Utxo> {
        self.sufficient(candidates, request).into_iter().next()
    }

    /// Spare utxos for fees: free lovelace above the configured buffer. Pure-ADA matches only
    /// if there are any, otherwise every sufficient match.
    pub fn spare(&self, candidates: &[Utxo]) -> Vec<Utxo> {
        let request = SelectionRequest::lovelace(self.config.spare_fee_buffer);
        let all = self.sufficient(candidates, &request);
        if all.iter().any(|u| u.is_pure_ada()) {
            all.into_iter().filter(|u| u.is_pure_ada()).collect()
        } else {
            all
        }
    }

    fn candidates(&self, addresses: &[Address], tcx: Option<&ReservationTracker>) -> Candidates {
        let mut available = Vec::new();
        let mut reserved = Vec::new();
        for address in addresses {
            for utxo in self.source.utxos_at(address) {
                if self.source.is_consumed(&utxo.id) {
                    continue;
                }
                match tcx {
                    Some(t) if t.utxo_not_reserved(&utxo).is_none() => reserved.push(utxo),
                    _ => available.push(utxo),
                }
            }
        }
        Candidates { available, reserved }
    }

    fn not_found(
        &self,
        purpose: &str,
        candidates: &Candidates,
        reserved_matches: Vec<UtxoId>,
    ) -> SelectionError {
        let mut searched = String::new();
        for utxo in &candidates.available {
            searched.push_str(&format!("  {}\n", utxo));
        }
        for utxo in &candidates.reserved {
            searched.push_str(&format!("  {} (reserved)\n", utxo));
        }
        if searched.is_empty() {
            searched.push_str("  (no unspent utxos)\n");
        }
        let reason = if reserved_matches.is_empty() {
            NotFoundReason::NotPresent
        } else {
            NotFoundReason::AlreadyReserved(reserved_matches)
        };
        debug!("coin selection for {} failed: {}", purpose, reason);
        SelectionError::UtxoNotFound {
            purpose: purpose.to_string(),
            reason,
            searched,
        }
    }

    /// Most preferred unreserved utxo at `address` satisfying `request`.
    pub fn find_sufficient_utxo(
        &self,
        address: &Address,
        request: &SelectionRequest,
        tcx: Option<&ReservationTracker>,
        purpose: &str,
    ) -> Result<Utxo> {
        self.find_sufficient_at(std::slice::from_ref(address), request, tcx, purpose)
    }

    fn find_sufficient_at(
        &self,
        addresses: &[Address],
        request: &SelectionRequest,
        tcx: Option<&ReservationTracker>,
        purpose: &str,
    ) -> Result<Utxo> {
        let candidates = self.candidates(addresses, tcx);
        if let Some(found) = self.select(&candidates.available, request) {
            debug!("coin selection for {} ({}): {}", purpose, request.describe(), found.id);
            return Ok(found);
        }
        let reserved_matches = self
            .sufficient(&candidates.reserved, request)
            .into_iter()
            .map(|u| u.id)
            .collect();
        let purpose = format!("{} ({})", purpose, request.describe());
        Err(self.not_found(&purpose, &candidates, reserved_matches).into())
    }

    /// Most preferred unreserved utxo at `address` whose value contains the predicate's target.
    pub fn find_by_value(
        &self,
        address: &Address,
        predicate: &ValuePredicate,
        tcx: Option<&ReservationTracker>,
        purpose: &str,
    ) -> Result<Utxo> {
        let candidates = self.candidates(std::slice::from_ref(address), tcx);
        let request = SelectionRequest::default();
        let mut matching: Vec<SortInfo> = candidates
            .available
            .iter()
            .filter(|u| predicate.matches_utxo(u))
            .map(|u| self.sort_info_for(u, &request))
            .collect();
        matching.sort_by(compare_sort_info);
        if let Some(first) = matching.into_iter().next() {
            debug!("value search for {}: {}", purpose, first.utxo.id);
            return Ok(first.utxo);
        }
        let reserved_matches = candidates
            .reserved
            .iter()
            .filter(|u| predicate.matches_utxo(u))
            .map(|u| u.id.clone())
            .collect();
        let purpose = format!("{} (value >= {})", purpose, predicate.target());
        Err(self.not_found(&purpose, &candidates, reserved_matches).into())
    }

    /// Unreserved spare utxos at `address`, in preference order.
    pub fn find_spare_utxos(
        &self,
        address: &Address,
        tcx: Option<&ReservationTracker>,
    ) -> Result<Vec<Utxo>> {
        let candidates = self.candidates(std::slice::from_ref(address), tcx);
        let spares = self.spare(&candidates.available);
        if !spares.is_empty() {
            return Ok(spares);
        }
        let reserved_matches = self.spare(&candidates.reserved).into_iter().map(|u| u.id).collect();
        let purpose = format!("spare utxos (free lovelace > {})", self.config.spare_fee_buffer);
        Err(self.not_found(&purpose, &candidates, reserved_matches).into())
    }

    /// Tries each wallet in order and returns the first hit with the wallet's index. Fails with
    /// an aggregate `InsufficientFunds` only after every wallet has been searched.
    pub fn find_in_wallets(
        &self,
        wallets: &[&dyn Wallet],
        request: &SelectionRequest,
        tcx: Option<&ReservationTracker>,
        purpose: &str,
    ) -> Result<(usize, Utxo)> {
        let mut searched_addresses = Vec::new();
        for (idx, wallet) in wallets.iter().enumerate() {
            let addresses = wallet.used_addresses();
            match self.find_sufficient_at(&addresses, request, tcx, purpose) {
                Ok(utxo) => return Ok((idx, utxo)),
                Err(EmulatorError::Selection(SelectionError::UtxoNotFound { .. })) => {
                    searched_addresses.extend(addresses);
                }
                Err(other) => return Err(other),
            }
        }
        Err(SelectionError::InsufficientFunds {
            purpose: format!("{} ({})", purpose, request.describe()),
            searched_addresses,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::NetworkParams;
    use std::collections::BTreeMap;

    /// In-memory utxo source for selector tests.
    #[derive(Default)]
    struct FixedSource {
        utxos: BTreeMap<Address, Vec<Utxo>>,
    }

    impl FixedSource {
        fn with(utxos: Vec<Utxo>) -> Self {
            let mut source = Self::default();
            for u in utxos {
                source.utxos.entry(u.address().clone()).or_default().push(u);
            }
            source
        }
    }

    impl UtxoSource for FixedSource {
        fn utxos_at(&self, address: &Address) -> Vec<Utxo> {
            self.utxos.get(address).cloned().unwrap_or_default()
        }

        fn is_consumed(&self, _id: &UtxoId) -> bool {
            false
        }
    }

    const ADDR: &str = "addr_test1owner";

    fn token() -> AssetClass {
        AssetClass::new("cc".repeat(28), hex::encode("charter"))
    }

    fn pure(tag: &str, ada: u64) -> Utxo {
        Utxo::new(UtxoId::new(tag, 0), TxOutput::new(ADDR, Value::ada(ada)))
    }

    fn tokened(tag: &str, ada: u64) -> Utxo {
        Utxo::new(
            UtxoId::new(tag, 0),
            TxOutput::new(
                ADDR,
                Value::new(ada * LOVELACE_PER_ADA, Assets::from_asset(&token(), 1)),
            ),
        )
    }

    fn selector<'a>(source: &'a FixedSource, params: &'a NetworkParams) -> CoinSelector<'a> {
        CoinSelector::new(source, params, SelectorConfig::default())
    }

    #[test]
    fn test_sort_info_pure() {
        let params = NetworkParams::default();
        let info = sort_info(&pure("a", 10), &params, 5 * LOVELACE_PER_ADA, None);
        assert_eq!(info.min_ada_requirement, 0);
        assert_eq!(info.free, 10_000_000);
        assert!(info.sufficient);
    }

    #[test]
    fn test_sort_info_tokened_subtracts_min_ada() {
        let params = NetworkParams::default();
        let utxo = tokened("t", 10);
        let info = sort_info(&utxo, &params, 0, None);
        let expected_min = params.min_ada_for(&Value::new(0, Assets::from_asset(&token(), 1)));
        assert_eq!(info.min_ada_requirement, expected_min);
        assert_eq!(info.free, 10_000_000 - i128::from(expected_min));
    }

    #[test]
    fn test_sufficiency_bounds_are_strict() {
        let params = NetworkParams::default();
        let u = pure("a", 10);
        assert!(!sort_info(&u, &params, 10 * LOVELACE_PER_ADA, None).sufficient);
        assert!(sort_info(&u, &params, 9 * LOVELACE_PER_ADA, None).sufficient);
        assert!(!sort_info(&u, &params, 0, Some(10 * LOVELACE_PER_ADA)).sufficient);
        assert!(sort_info(&u, &params, 0, Some(11 * LOVELACE_PER_ADA)).sufficient);
    }

    #[test]
    fn test_purity_preference() {
        let source = FixedSource::default();
        let params = NetworkParams::default();
        let a = tokened("a", 10);
        let b = pure("b", 8);
        let chosen = selector(&source, &params)
            .select(&[a, b.clone()], &SelectionRequest::lovelace(5 * LOVELACE_PER_ADA))
            .unwrap();
        assert_eq!(chosen, b);
    }

    #[test]
    fn test_smallest_first() {
        let source = FixedSource::default();
        let params = NetworkParams::default();
        let big = pure("big", 50);
        let small = pure("small", 20);
        let chosen = selector(&source, &params)
            .select(&[big, small.clone()], &SelectionRequest::lovelace(10 * LOVELACE_PER_ADA))
            .unwrap();
        assert_eq!(chosen, small);
    }

    #[test]
    fn test_purity_dominates_size() {
        let source = FixedSource::default();
        let params = NetworkParams::default();
        let infos = selector(&source, &params).sort_infos(
            &[tokened("t", 3), pure("p", 1000)],
            &SelectionRequest::default(),
        );
        assert!(infos[0].is_pure());
        assert!(!infos[1].is_pure());
    }

    #[test]
    fn test_insufficient_candidates_skipped() {
        let source = FixedSource::default();
        let params = NetworkParams::default();
        let chosen = selector(&source, &params)
            .select(
                &[pure("tiny", 1), tokened("t", 20)],
                &SelectionRequest::lovelace(5 * LOVELACE_PER_ADA),
            )
            .unwrap();
        assert_eq!(chosen.id, UtxoId::new("t", 0));
    }

    #[test]
    fn test_required_assets_filter() {
        let source = FixedSource::default();
        let params = NetworkParams::default();
        let request = SelectionRequest::lovelace(0).with_assets(Assets::from_asset(&token(), 1));
        let chosen = selector(&source, &params)
            .select(&[pure("p", 5), tokened("t", 5)], &request)
            .unwrap();
        assert_eq!(chosen.id, UtxoId::new("t", 0));
    }

    #[test]
    fn test_spare_prefers_pure_only() {
        let source = FixedSource::default();
        let params = NetworkParams::default();
        let spares =
            selector(&source, &params).spare(&[tokened("t", 50), pure("p", 5), pure("q", 1)]);
        assert_eq!(spares.len(), 1);
        assert_eq!(spares[0].id, UtxoId::new("p", 0));
    }

    #[test]
    fn test_spare_falls_back_to_tokened() {
        let source = FixedSource::default();
        let params = NetworkParams::default();
        let spares = selector(&source, &params).spare(&[tokened("t", 50), pure("q", 1)]);
        assert_eq!(spares.len(), 1);
        assert_eq!(spares[0].id, UtxoId::new("t", 0));
    }

    #[test]
    fn test_spare_buffer_configurable() {
        let source = FixedSource::default();
        let params = NetworkParams::default();
        let config = SelectorConfig {
            spare_fee_buffer: 10 * LOVELACE_PER_ADA,
        };
        let sel = CoinSelector::new(&source, &params, config);
        assert!(sel.spare(&[pure("p", 5)]).is_empty());
    }

    #[test]
    fn test_value_predicate_forms_normalize() {
        let class = token();
        let by_value = ValuePredicate::new(Value::from_asset(&class, 2));
        let by_token =
            ValuePredicate::for_token(class.policy_id.clone(), class.token_name.clone(), 2);
        let by_class = ValuePredicate::for_asset_class(class.clone(), 2);
        assert_eq!(by_value, by_token);
        assert_eq!(by_token, by_class);
    }

    #[test]
    fn test_value_predicate_over_spendables() {
        let class = token();
        let pred = ValuePredicate::for_asset_class(class.clone(), 1);
        let utxo = tokened("t", 3);
        let output = TxOutput::new(ADDR, Value::new(0, Assets::from_asset(&class, 5)));
        let bundle = Assets::from_asset(&class, 1);
        assert!(pred.matches(Spendable::Input(&utxo)));
        assert!(pred.matches(Spendable::Output(&output)));
        assert!(pred.matches(Spendable::Assets(&bundle)));
        assert!(!pred.matches(Spendable::Input(&pure("p", 100))));

        let with_ada = ValuePredicate::new(Value::new(1, Assets::from_asset(&class, 1)));
        assert!(!with_ada.matches(Spendable::Assets(&bundle)));
    }

    #[test]
    fn test_find_reports_reserved_match() {
        let b = pure("b", 8);
        let source = FixedSource::with(vec![b.clone()]);
        let params = NetworkParams::default();
        let sel = selector(&source, &params);
        let mut tcx = ReservationTracker::new();
        let request = SelectionRequest::lovelace(LOVELACE_PER_ADA);
        let address = ADDR.to_string();

        let found = sel.find_sufficient_utxo(&address, &request, Some(&tcx), "payment").unwrap();
        assert_eq!(found, b);
        tcx.add_input(found).unwrap();

        let err = sel
            .find_sufficient_utxo(&address, &request, Some(&tcx), "payment")
            .unwrap_err();
        match err {
            EmulatorError::Selection(SelectionError::UtxoNotFound { reason, searched, .. }) => {
                assert_eq!(reason, NotFoundReason::AlreadyReserved(vec![b.id.clone()]));
                assert!(searched.contains("(reserved)"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_find_reports_not_present() {
        let source = FixedSource::with(vec![pure("small", 1)]);
        let params = NetworkParams::default();
        let err = selector(&source, &params)
            .find_sufficient_utxo(
                &ADDR.to_string(),
                &SelectionRequest::lovelace(50 * LOVELACE_PER_ADA),
                None,
                "big payment",
            )
            .unwrap_err();
        match err {
            EmulatorError::Selection(SelectionError::UtxoNotFound {
                reason,
                searched,
                purpose,
            }) => {
                assert_eq!(reason, NotFoundReason::NotPresent);
                assert!(searched.contains("small#0"));
                assert!(purpose.starts_with("big payment"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_find_by_value() {
        let t = tokened("t", 4);
        let source = FixedSource::with(vec![pure("p", 100), t.clone()]);
        let params = NetworkParams::default();
        let sel = selector(&source, &params);
        let pred = ValuePredicate::for_asset_class(token(), 1);
        let found = sel.find_by_value(&ADDR.to_string(), &pred, None, "charter").unwrap();
        assert_eq!(found, t);

        let mut tcx = ReservationTracker::new();
        tcx.add_input(t.clone()).unwrap();
        let err = sel.find_by_value(&ADDR.to_string(), &pred, Some(&tcx), "charter").unwrap_err();
        assert!(matches!(
            err,
            EmulatorError::Selection(SelectionError::UtxoNotFound {
                reason: NotFoundReason::AlreadyReserved(_),
                ..
            })
        ));
    }

    #[test]
    fn test_find_spare_utxos_empty_is_error() {
        let source = FixedSource::with(vec![pure("q", 1)]);
        let params = NetworkParams::default();
        let err = selector(&source, &params)
            .find_spare_utxos(&ADDR.to_string(), None)
            .unwrap_err();
        assert!(matches!(err, EmulatorError::Selection(SelectionError::UtxoNotFound { .. })));
    }
}
