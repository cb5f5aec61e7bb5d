//! Payment ledger
//!
//! Running totals keyed by user id. Entries are created on first credit and
//! never removed. There are no debits.

use dashmap::DashMap;
use tracing::debug;

/// Per-user running payment total
pub struct Ledger {
    balances: DashMap<String, f64>,
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            balances: DashMap::new(),
        }
    }

    /// Add `amount` to the balance of `uid`, returning the new balance
    pub fn credit(&self, uid: &str, amount: f64) -> f64 {
        let mut entry = self.balances.entry(uid.to_string()).or_insert(0.0);
        *entry += amount;
        let balance = *entry;
        drop(entry);

        debug!(uid = %uid, amount, balance, "Ledger credited");
        balance
    }

    /// Current balance; zero for users that never paid
    pub fn balance(&self, uid: &str) -> f64 {
        self.balances.get(uid).map(|b| *b).unwrap_or(0.0)
    }

    /// Whether `uid` has ever been credited
    pub fn contains(&self, uid: &str) -> bool {
        self.balances.contains_key(uid)
    }

    /// Number of accounts
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}
