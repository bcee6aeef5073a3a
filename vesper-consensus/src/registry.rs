use std::collections::HashMap;

use tracing::{debug, warn};

pub const MINIMUM_STAKE: f64 = 1000.0;

#[derive(Debug, Clone)]
pub struct Validator {
    pub address: String,
    pub stake: f64,
    pub reputation: f64,
    pub blocks_validated: u64,
    pub last_validation_time: f64,
    pub is_active: bool,
}

impl Validator {
    fn new(address: String, stake: f64) -> Self {
        Self {
            address,
            stake,
            reputation: 1.0,
            blocks_validated: 0,
            last_validation_time: 0.0,
            is_active: true,
        }
    }
}

/// Reason a validator is slashed; determines the fraction of stake burned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashReason {
    DoubleSigning,
    InvalidBlock,
    Offline,
    Malicious,
}

impl SlashReason {
    fn fraction(self) -> f64 {
        match self {
            SlashReason::DoubleSigning => 0.10,
            SlashReason::InvalidBlock => 0.05,
            SlashReason::Offline => 0.01,
            SlashReason::Malicious => 0.50,
        }
    }
}

/// All known validators, keyed by address. Owned exclusively by the
/// consensus component; the P2P layer only ever calls through here.
#[derive(Debug, Default)]
pub struct ValidatorRegistry {
    validators: HashMap<String, Validator>,
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `address` with `stake`. If already present, stake is
    /// *added* to the existing entry rather than replacing it — repeated
    /// local re-registration across restarts can therefore double-count
    /// stake. Left uncorrected deliberately.
    pub fn register(&mut self, address: &str, stake: f64) -> bool {
        if stake < MINIMUM_STAKE {
            debug!(address, stake, "stake below minimum, registration refused");
            return false;
        }
        self.validators
            .entry(address.to_string())
            .and_modify(|v| v.stake += stake)
            .or_insert_with(|| Validator::new(address.to_string(), stake));
        true
    }

    /// Registers an entry received from peer sync only if it is not already
    /// known locally. Stake is never merged into an existing entry here.
    pub fn register_if_absent(&mut self, validator: Validator) {
        self.validators
            .entry(validator.address.clone())
            .or_insert(validator);
    }

    pub fn unregister(&mut self, address: &str) -> f64 {
        self.validators
            .remove(address)
            .map(|v| v.stake)
            .unwrap_or(0.0)
    }

    pub fn get(&self, address: &str) -> Option<&Validator> {
        self.validators.get(address)
    }

    pub fn active_addresses_sorted(&self) -> Vec<String> {
        let mut addrs: Vec<String> = self
            .validators
            .values()
            .filter(|v| v.is_active)
            .map(|v| v.address.clone())
            .collect();
        addrs.sort();
        addrs
    }

    pub fn active_validators(&self) -> impl Iterator<Item = &Validator> {
        self.validators.values().filter(|v| v.is_active)
    }

    pub fn record_validation(&mut self, address: &str, timestamp: f64) {
        if let Some(v) = self.validators.get_mut(address) {
            v.blocks_validated += 1;
            v.last_validation_time = timestamp;
            v.reputation = (v.reputation * 1.01).min(2.0);
        }
    }

    /// Reduces stake by a reason-dependent fraction, halves reputation, and
    /// drops the validator entirely if stake falls below the minimum.
    pub fn slash(&mut self, address: &str, reason: SlashReason) -> f64 {
        let Some(v) = self.validators.get_mut(address) else {
            return 0.0;
        };
        let amount = v.stake * reason.fraction();
        v.stake -= amount;
        v.reputation *= 0.5;
        warn!(address, ?reason, amount, "validator slashed");
        if v.stake < MINIMUM_STAKE {
            self.validators.remove(address);
        }
        amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_below_minimum_stake_fails() {
        let mut reg = ValidatorRegistry::new();
        assert!(!reg.register("v1", 999.0));
    }

    #[test]
    fn reregistering_adds_stake() {
        let mut reg = ValidatorRegistry::new();
        reg.register("v1", 1000.0);
        reg.register("v1", 500.0);
        assert_eq!(reg.get("v1").unwrap().stake, 1500.0);
    }

    #[test]
    fn active_addresses_are_lexicographically_sorted() {
        let mut reg = ValidatorRegistry::new();
        reg.register("v_c", 1000.0);
        reg.register("v_a", 1000.0);
        reg.register("v_b", 1000.0);
        assert_eq!(
            reg.active_addresses_sorted(),
            vec!["v_a".to_string(), "v_b".to_string(), "v_c".to_string()]
        );
    }

    #[test]
    fn slash_below_minimum_removes_validator() {
        let mut reg = ValidatorRegistry::new();
        reg.register("v1", 1000.0);
        reg.slash("v1", SlashReason::Malicious);
        assert!(reg.get("v1").is_none());
    }

    #[test]
    fn sync_does_not_merge_stake_for_known_validator() {
        let mut reg = ValidatorRegistry::new();
        reg.register("v1", 1000.0);
        reg.register_if_absent(Validator::new("v1".to_string(), 5000.0));
        assert_eq!(reg.get("v1").unwrap().stake, 1000.0);
    }
}
