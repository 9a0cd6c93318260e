// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Sync gateway: mirrors a user's accounts and transactions out of the
//! document store and applies mutations to it.
//!
//! The store is the source of truth. Every emission is a full replacement of
//! both collections; nothing is merged locally and no write is applied
//! optimistically.
//!
//! Posting a transaction is two independent writes (the transaction, then
//! the account balance). When the second write fails the first one stays,
//! and the caller gets [`SyncError::BalanceNotAdjusted`] naming the recorded
//! transaction.

use crate::db::{DocumentStore, StoreError, WatchId, ACCOUNTS, TRANSACTIONS};
use crate::models::{Account, AccountKind, AccountPatch, NewAccount, NewTransaction, Transaction, TxKind};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("could not encode document: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(String),

    #[error("account '{0}' is not in the current snapshot")]
    UnknownAccount(String),

    #[error("the change feed was closed by the store")]
    FeedClosed,

    #[error(
        "transaction {transaction_id} was recorded but the balance of account {account_id} was not adjusted: {source}"
    )]
    BalanceNotAdjusted {
        transaction_id: String,
        account_id: String,
        #[source]
        source: StoreError,
    },
}

pub type SyncResult<T> = Result<T, SyncError>;

/// Full contents of one user's partition.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
}

/// Where the gateway reads and writes.
pub enum Backend {
    Remote(Arc<dyn DocumentStore>),
    /// No store configured: serve a fixed dataset, ignore writes.
    Fixture(Snapshot),
}

/// Outcome of a successful posting.
#[derive(Debug, Clone, PartialEq)]
pub struct Posted {
    pub transaction_id: String,
    pub new_balance: Decimal,
}

pub struct SyncGateway {
    backend: Backend,
}

impl SyncGateway {
    pub fn new(backend: Backend) -> Self {
        match &backend {
            Backend::Remote(_) => tracing::info!("sync gateway using document store"),
            Backend::Fixture(_) => tracing::warn!("no store configured; running on fixture data"),
        }
        Self { backend }
    }

    pub fn fixture() -> Self {
        Self::new(Backend::Fixture(fixture_snapshot()))
    }

    pub fn is_fixture(&self) -> bool {
        matches!(self.backend, Backend::Fixture(_))
    }

    /// One-shot read of the user's partition.
    pub fn snapshot(&self, user_id: &str) -> SyncResult<Snapshot> {
        match &self.backend {
            Backend::Remote(store) => read_snapshot(store.as_ref(), user_id),
            Backend::Fixture(snap) => Ok(snap.clone()),
        }
    }

    /// Live feed of snapshots. Fires once right away, then after every
    /// change in the user's partition. In fixture mode it never fires.
    pub fn subscribe(&self, user_id: &str) -> SyncResult<Subscription> {
        let Backend::Remote(store) = &self.backend else {
            return Ok(Subscription {
                live: None,
                user_id: user_id.to_string(),
            });
        };
        let (tx, rx) = mpsc::channel();
        let watch = store.watch(user_id, tx)?;
        Ok(Subscription {
            live: Some(Live {
                store: Arc::clone(store),
                watch,
                pings: rx,
            }),
            user_id: user_id.to_string(),
        })
    }

    /// Pick up writes made by other processes.
    pub fn poll(&self) -> SyncResult<bool> {
        match &self.backend {
            Backend::Remote(store) => Ok(store.poll_external()?),
            Backend::Fixture(_) => Ok(false),
        }
    }

    pub fn create_account(&self, user_id: &str, data: &NewAccount) -> SyncResult<String> {
        let Backend::Remote(store) = &self.backend else {
            tracing::info!(name = %data.name, "fixture mode: account not saved");
            return Ok(String::new());
        };
        if data.name.trim().is_empty() {
            return Err(SyncError::Invalid("account name must not be empty".into()));
        }
        let id = store.insert(ACCOUNTS, user_id, serde_json::to_value(data)?)?;
        tracing::info!(%id, name = %data.name, "created account");
        Ok(id)
    }

    /// Only accounts in `user_id`'s partition can be changed; any other id
    /// is reported as not found.
    pub fn update_account(&self, user_id: &str, id: &str, patch: &AccountPatch) -> SyncResult<()> {
        let Backend::Remote(store) = &self.backend else {
            tracing::info!(id, "fixture mode: account update ignored");
            return Ok(());
        };
        if patch.is_empty() {
            return Err(SyncError::Invalid("nothing to update".into()));
        }
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(SyncError::Invalid("account name must not be empty".into()));
        }
        store.update(ACCOUNTS, user_id, id, serde_json::to_value(patch)?)?;
        tracing::info!(id, "updated account");
        Ok(())
    }

    /// Transactions pointing at the account are left in place. Ids outside
    /// `user_id`'s partition are ignored.
    pub fn delete_account(&self, user_id: &str, id: &str) -> SyncResult<()> {
        let Backend::Remote(store) = &self.backend else {
            tracing::info!(id, "fixture mode: account delete ignored");
            return Ok(());
        };
        store.delete(ACCOUNTS, user_id, id)?;
        tracing::info!(id, "deleted account");
        Ok(())
    }

    /// Record a transaction and move the account balance by its amount.
    ///
    /// The new balance is computed from `accounts`, the caller's current
    /// local view, not re-read from the store. Nothing is written when the
    /// account is missing from that view. In fixture mode nothing is written
    /// at all and the balance is reported unchanged.
    pub fn create_transaction(
        &self,
        user_id: &str,
        data: &NewTransaction,
        accounts: &[Account],
    ) -> SyncResult<Posted> {
        let Backend::Remote(store) = &self.backend else {
            tracing::info!(account = %data.account_id, "fixture mode: transaction not saved");
            let unchanged = accounts
                .iter()
                .find(|a| a.id == data.account_id)
                .map(|a| a.balance)
                .unwrap_or_default();
            return Ok(Posted {
                transaction_id: String::new(),
                new_balance: unchanged,
            });
        };
        validate_transaction(data)?;
        let account = accounts
            .iter()
            .find(|a| a.id == data.account_id)
            .ok_or_else(|| SyncError::UnknownAccount(data.account_id.clone()))?;
        let new_balance = data.kind.apply(account.balance, data.amount);

        let transaction_id = store.insert(TRANSACTIONS, user_id, serde_json::to_value(data)?)?;
        tracing::info!(id = %transaction_id, account = %account.id, amount = %data.amount, kind = %data.kind, "recorded transaction");

        let patch = serde_json::to_value(AccountPatch {
            balance: Some(new_balance),
            ..Default::default()
        })?;
        if let Err(source) = store.update(ACCOUNTS, user_id, &account.id, patch) {
            tracing::error!(id = %transaction_id, account = %account.id, error = %source, "balance update failed after recording transaction");
            return Err(SyncError::BalanceNotAdjusted {
                transaction_id,
                account_id: account.id.clone(),
                source,
            });
        }
        Ok(Posted {
            transaction_id,
            new_balance,
        })
    }
}

fn validate_transaction(data: &NewTransaction) -> SyncResult<()> {
    if data.amount.is_sign_negative() && !data.amount.is_zero() {
        return Err(SyncError::Invalid(format!(
            "amount must not be negative (got {}); use the income/expense type for direction",
            data.amount
        )));
    }
    if chrono::NaiveDate::parse_from_str(&data.date, "%Y-%m-%d").is_err() {
        return Err(SyncError::Invalid(format!(
            "invalid date '{}', expected YYYY-MM-DD",
            data.date
        )));
    }
    if data.account_id.is_empty() || data.category_id.is_empty() {
        return Err(SyncError::Invalid("account and category are required".into()));
    }
    Ok(())
}

fn read_collection<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
    user_id: &str,
) -> SyncResult<Vec<T>> {
    let docs = store.query(collection, user_id)?;
    let mut out = Vec::with_capacity(docs.len());
    for doc in docs {
        let mut body = doc.body;
        if let Value::Object(m) = &mut body {
            m.insert("id".into(), Value::String(doc.id.clone()));
        }
        match serde_json::from_value(body) {
            Ok(v) => out.push(v),
            Err(e) => {
                // one bad document should not blank the whole view
                tracing::warn!(collection, id = %doc.id, error = %e, "skipping undecodable document");
            }
        }
    }
    Ok(out)
}

fn read_snapshot(store: &dyn DocumentStore, user_id: &str) -> SyncResult<Snapshot> {
    Ok(Snapshot {
        accounts: read_collection(store, ACCOUNTS, user_id)?,
        transactions: read_collection(store, TRANSACTIONS, user_id)?,
    })
}

struct Live {
    store: Arc<dyn DocumentStore>,
    watch: WatchId,
    pings: Receiver<()>,
}

/// Handle on a snapshot feed. Dropping it releases the store watch.
pub struct Subscription {
    live: Option<Live>,
    user_id: String,
}

impl Subscription {
    pub fn is_live(&self) -> bool {
        self.live.is_some()
    }

    /// Wait up to `timeout` for the next snapshot. `None` when nothing
    /// changed in time or the feed cannot fire; [`SyncError::FeedClosed`]
    /// once the store has dropped the watch.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<SyncResult<Snapshot>> {
        let live = self.live.as_ref()?;
        match live.pings.recv_timeout(timeout) {
            Ok(()) => Some(self.drain_and_read(live)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(SyncError::FeedClosed)),
        }
    }

    /// Next snapshot if a change is already pending.
    pub fn try_recv(&self) -> Option<SyncResult<Snapshot>> {
        let live = self.live.as_ref()?;
        match live.pings.try_recv() {
            Ok(()) => Some(self.drain_and_read(live)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(SyncError::FeedClosed)),
        }
    }

    pub fn cancel(self) {}

    fn drain_and_read(&self, live: &Live) -> SyncResult<Snapshot> {
        // coalesce a burst of writes into one snapshot
        while live.pings.try_recv().is_ok() {}
        read_snapshot(live.store.as_ref(), &self.user_id)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(live) = self.live.take() {
            live.store.unwatch(live.watch);
        }
    }
}

fn account(id: &str, name: &str, balance: i64, kind: AccountKind, color: &str) -> Account {
    Account {
        id: id.to_string(),
        name: name.to_string(),
        balance: Decimal::from(balance),
        kind,
        color: color.to_string(),
    }
}

fn transaction(id: &str, account_id: &str, amount: i64, kind: TxKind, category_id: &str, date: &str, note: &str) -> Transaction {
    Transaction {
        id: id.to_string(),
        account_id: account_id.to_string(),
        amount: Decimal::from(amount),
        kind,
        category_id: category_id.to_string(),
        date: date.to_string(),
        note: note.to_string(),
    }
}

/// Dataset served when no store is configured.
pub fn fixture_snapshot() -> Snapshot {
    Snapshot {
        accounts: vec![
            account("1", "CTBC Bank", 50000, AccountKind::Savings, "green"),
            account("2", "Cathay United", 12000, AccountKind::Checking, "red"),
        ],
        transactions: vec![
            transaction("t1", "1", 30000, TxKind::Income, "cat-8", "2024-03-01", "Salary deposit"),
            transaction("t2", "1", 150, TxKind::Expense, "cat-1", "2024-03-02", "Lunch"),
            transaction("t3", "2", 1200, TxKind::Expense, "cat-2", "2024-03-03", "Fuel"),
        ],
    }
}
