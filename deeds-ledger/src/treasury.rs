use deeds_core::id::AccountKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Pooled platform balance plus per-account payout bookkeeping
///
/// Registration fees and any platform cut of a sale accumulate in the
/// platform balance, which only the admin may drain. Sale and lease
/// proceeds are settled to the counterparty at commit time and recorded
/// here so the books always reconcile against the event stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Treasury {
    /// Platform balance awaiting admin withdrawal
    platform: u64,

    /// Cumulative proceeds settled to each account
    payouts: HashMap<AccountKey, u64>,
}

impl Treasury {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit the platform balance. Never fails.
    pub fn deposit(&mut self, amount: u64) {
        self.platform = self.platform.saturating_add(amount);
    }

    /// Settle proceeds to an account
    pub fn settle(&mut self, to: AccountKey, amount: u64) {
        let entry = self.payouts.entry(to).or_insert(0);
        *entry = entry.saturating_add(amount);
    }

    /// Drain the entire platform balance, returning the drained amount
    ///
    /// A zero balance drain is a valid no-op returning 0.
    pub fn withdraw_all(&mut self) -> u64 {
        std::mem::take(&mut self.platform)
    }

    /// Current platform balance
    pub fn balance(&self) -> u64 {
        self.platform
    }

    /// Cumulative proceeds settled to `key`
    pub fn payout_total(&self, key: &AccountKey) -> u64 {
        self.payouts.get(key).copied().unwrap_or(0)
    }
}
