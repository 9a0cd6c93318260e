// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::gateway::Snapshot;
use crate::models::{Account, Category, Transaction, DEFAULT_CATEGORIES};

/// Local copy of the user's data, replaced wholesale on every snapshot.
#[derive(Debug, Clone)]
pub struct Mirror {
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
    pub categories: Vec<Category>,
    generation: u64,
}

impl Default for Mirror {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            transactions: Vec::new(),
            categories: DEFAULT_CATEGORIES.clone(),
            generation: 0,
        }
    }
}

impl Mirror {
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut m = Self::default();
        m.replace(snapshot);
        m
    }

    pub fn replace(&mut self, snapshot: Snapshot) {
        self.accounts = snapshot.accounts;
        self.transactions = snapshot.transactions;
        self.generation += 1;
        tracing::debug!(
            generation = self.generation,
            accounts = self.accounts.len(),
            transactions = self.transactions.len(),
            "local mirror replaced"
        );
    }

    /// Number of snapshots applied so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn account(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    /// Look an account up by id, or by name when no id matches.
    pub fn resolve_account(&self, key: &str) -> Option<&Account> {
        let key = key.trim();
        self.account(key)
            .or_else(|| self.accounts.iter().find(|a| a.name.eq_ignore_ascii_case(key)))
    }

    /// Look a category up by id or by name.
    pub fn resolve_category(&self, key: &str) -> Option<&Category> {
        let key = key.trim();
        self.categories
            .iter()
            .find(|c| c.id == key)
            .or_else(|| self.categories.iter().find(|c| c.name.eq_ignore_ascii_case(key)))
    }

    pub fn history(&self, account_id: &str) -> Vec<&Transaction> {
        self.transactions
            .iter()
            .filter(|t| t.account_id == account_id)
            .collect()
    }
}
