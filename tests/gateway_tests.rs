// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pennywise::db::{
    DocumentStore, SqliteStore, StoreError, StoreResult, WatchId, ACCOUNTS, TRANSACTIONS,
};
use pennywise::gateway::{Backend, SyncError, SyncGateway};
use pennywise::models::{AccountKind, AccountPatch, NewAccount, NewTransaction, TxKind};
use pennywise::state::Mirror;
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

fn gateway() -> (SyncGateway, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    let gw = SyncGateway::new(Backend::Remote(store.clone()));
    (gw, store)
}

fn new_account(name: &str, balance: i64) -> NewAccount {
    NewAccount {
        name: name.into(),
        balance: Decimal::from(balance),
        kind: AccountKind::Savings,
        color: "green".into(),
    }
}

fn expense(account_id: &str, amount: i64) -> NewTransaction {
    NewTransaction {
        account_id: account_id.into(),
        amount: Decimal::from(amount),
        kind: TxKind::Expense,
        category_id: "cat-1".into(),
        date: "2024-03-02".into(),
        note: "Lunch".into(),
    }
}

#[test]
fn posting_expense_adjusts_balance_and_history() {
    let (gw, _) = gateway();
    let id = gw.create_account("u1", &new_account("CTBC", 50000)).unwrap();
    let mirror = Mirror::from_snapshot(gw.snapshot("u1").unwrap());

    let posted = gw
        .create_transaction("u1", &expense(&id, 150), &mirror.accounts)
        .unwrap();
    assert_eq!(posted.new_balance, Decimal::from(49850));

    let mirror = Mirror::from_snapshot(gw.snapshot("u1").unwrap());
    assert_eq!(mirror.account(&id).unwrap().balance, Decimal::from(49850));
    let history = mirror.history(&id);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, posted.transaction_id);
    assert_eq!(history[0].amount, Decimal::from(150));
}

#[test]
fn income_uses_local_balance_not_store_balance() {
    let (gw, _) = gateway();
    let id = gw.create_account("u1", &new_account("Cash", 100)).unwrap();
    let stale = gw.snapshot("u1").unwrap().accounts;

    gw.update_account("u1", &id, &AccountPatch { balance: Some(Decimal::from(500)), ..Default::default() })
        .unwrap();
    let mut income = expense(&id, 25);
    income.kind = TxKind::Income;
    let posted = gw.create_transaction("u1", &income, &stale).unwrap();
    // computed from the 100 held locally, overwriting the 500 in the store
    assert_eq!(posted.new_balance, Decimal::from(125));
    assert_eq!(gw.snapshot("u1").unwrap().accounts[0].balance, Decimal::from(125));
}

#[test]
fn partitions_are_isolated() {
    let (gw, _) = gateway();
    gw.create_account("alice", &new_account("A", 1)).unwrap();
    gw.create_account("bob", &new_account("B", 2)).unwrap();
    let a = gw.snapshot("alice").unwrap();
    assert_eq!(a.accounts.len(), 1);
    assert_eq!(a.accounts[0].name, "A");
    assert!(gw.snapshot("carol").unwrap().accounts.is_empty());
}

#[test]
fn update_and_delete_account() {
    let (gw, _) = gateway();
    let id = gw.create_account("u1", &new_account("Old", 10)).unwrap();
    gw.update_account(
        "u1",
        &id,
        &AccountPatch {
            name: Some("New".into()),
            kind: Some(AccountKind::Investment),
            ..Default::default()
        },
    )
    .unwrap();
    let acct = gw.snapshot("u1").unwrap().accounts.remove(0);
    assert_eq!(acct.name, "New");
    assert_eq!(acct.kind, AccountKind::Investment);
    assert_eq!(acct.balance, Decimal::from(10));

    gw.delete_account("u1", &id).unwrap();
    assert!(gw.snapshot("u1").unwrap().accounts.is_empty());
    // deleting again is harmless
    gw.delete_account("u1", &id).unwrap();
}

#[test]
fn update_missing_account_fails() {
    let (gw, _) = gateway();
    let err = gw
        .update_account("u1", "nope", &AccountPatch { name: Some("X".into()), ..Default::default() })
        .unwrap_err();
    assert!(matches!(err, SyncError::Store(StoreError::NotFound { .. })));
}

#[test]
fn accounts_cannot_be_changed_from_another_partition() {
    let (gw, _) = gateway();
    let id = gw.create_account("alice", &new_account("Mine", 700)).unwrap();

    let err = gw
        .update_account("bob", &id, &AccountPatch { balance: Some(Decimal::ZERO), ..Default::default() })
        .unwrap_err();
    assert!(matches!(err, SyncError::Store(StoreError::NotFound { .. })));
    gw.delete_account("bob", &id).unwrap();

    let snap = gw.snapshot("alice").unwrap();
    assert_eq!(snap.accounts.len(), 1);
    assert_eq!(snap.accounts[0].balance, Decimal::from(700));
}

#[test]
fn deleting_account_orphans_transactions() {
    let (gw, _) = gateway();
    let id = gw.create_account("u1", &new_account("Gone", 100)).unwrap();
    let accounts = gw.snapshot("u1").unwrap().accounts;
    gw.create_transaction("u1", &expense(&id, 5), &accounts).unwrap();
    gw.delete_account("u1", &id).unwrap();

    let mirror = Mirror::from_snapshot(gw.snapshot("u1").unwrap());
    assert!(mirror.accounts.is_empty());
    assert_eq!(mirror.transactions.len(), 1);
    assert_eq!(
        pennywise::models::account_name(&mirror.accounts, &mirror.transactions[0].account_id),
        "unknown"
    );
}

#[test]
fn invalid_input_writes_nothing() {
    let (gw, store) = gateway();
    let id = gw.create_account("u1", &new_account("A", 10)).unwrap();
    let accounts = gw.snapshot("u1").unwrap().accounts;

    let mut negative = expense(&id, 5);
    negative.amount = Decimal::from(-5);
    assert!(matches!(
        gw.create_transaction("u1", &negative, &accounts),
        Err(SyncError::Invalid(_))
    ));

    let mut bad_date = expense(&id, 5);
    bad_date.date = "03/02/2024".into();
    assert!(matches!(
        gw.create_transaction("u1", &bad_date, &accounts),
        Err(SyncError::Invalid(_))
    ));

    assert!(matches!(
        gw.create_transaction("u1", &expense("missing", 5), &accounts),
        Err(SyncError::UnknownAccount(_))
    ));
    assert!(matches!(
        gw.create_account("u1", &new_account("  ", 0)),
        Err(SyncError::Invalid(_))
    ));
    assert!(store.query(TRANSACTIONS, "u1").unwrap().is_empty());
    assert_eq!(store.query(ACCOUNTS, "u1").unwrap().len(), 1);
}

#[test]
fn subscription_emits_initial_and_after_changes() {
    let (gw, _) = gateway();
    let sub = gw.subscribe("u1").unwrap();
    assert!(sub.is_live());

    let first = sub.try_recv().unwrap().unwrap();
    assert!(first.accounts.is_empty() && first.transactions.is_empty());
    assert!(sub.try_recv().is_none());

    let id = gw.create_account("u1", &new_account("A", 100)).unwrap();
    let second = sub.recv_timeout(Duration::from_secs(1)).unwrap().unwrap();
    assert_eq!(second.accounts.len(), 1);

    // two writes, one coalesced snapshot
    gw.create_transaction("u1", &expense(&id, 30), &second.accounts)
        .unwrap();
    let third = sub.try_recv().unwrap().unwrap();
    assert_eq!(third.transactions.len(), 1);
    assert_eq!(third.accounts[0].balance, Decimal::from(70));
    assert!(sub.try_recv().is_none());

    // other users' writes do not wake us
    gw.create_account("u2", &new_account("B", 1)).unwrap();
    assert!(sub.try_recv().is_none());
}

#[test]
fn cancelled_subscription_releases_watch() {
    let (gw, store) = gateway();
    let sub = gw.subscribe("u1").unwrap();
    sub.cancel();
    gw.create_account("u1", &new_account("A", 1)).unwrap();

    let again = gw.subscribe("u1").unwrap();
    let snap = again.try_recv().unwrap().unwrap();
    assert_eq!(snap.accounts.len(), 1);
    drop(again);
    // no watches left to ping; the write still succeeds
    store.insert(ACCOUNTS, "u1", serde_json::json!({"name": "B"})).unwrap();
}

#[test]
fn dropped_watch_ends_the_feed() {
    let (gw, store) = gateway();
    let sub = gw.subscribe("u1").unwrap();
    // first watch on a fresh store
    store.unwatch(1);
    // the ping queued at subscribe time is still delivered
    sub.recv_timeout(Duration::from_millis(10)).unwrap().unwrap();
    assert!(matches!(
        sub.recv_timeout(Duration::from_millis(10)),
        Some(Err(SyncError::FeedClosed))
    ));
    assert!(matches!(sub.try_recv(), Some(Err(SyncError::FeedClosed))));
}

#[test]
fn external_writes_are_picked_up_by_poll() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.sqlite");
    let ours = Arc::new(SqliteStore::open(&path).unwrap());
    let gw = SyncGateway::new(Backend::Remote(ours.clone()));
    let sub = gw.subscribe("u1").unwrap();
    sub.try_recv().unwrap().unwrap();

    assert!(!gw.poll().unwrap());
    let theirs = SqliteStore::open(&path).unwrap();
    theirs
        .insert(
            ACCOUNTS,
            "u1",
            serde_json::json!({"name": "Elsewhere", "balance": "5", "type": "Cash", "color": "slate"}),
        )
        .unwrap();
    assert!(sub.try_recv().is_none());
    assert!(gw.poll().unwrap());
    let snap = sub.try_recv().unwrap().unwrap();
    assert_eq!(snap.accounts[0].name, "Elsewhere");
}

#[test]
fn undecodable_documents_are_skipped() {
    let (gw, store) = gateway();
    store
        .insert(ACCOUNTS, "u1", serde_json::json!({"name": "half a record"}))
        .unwrap();
    gw.create_account("u1", &new_account("Whole", 3)).unwrap();
    let snap = gw.snapshot("u1").unwrap();
    assert_eq!(snap.accounts.len(), 1);
    assert_eq!(snap.accounts[0].name, "Whole");
}

#[test]
fn fixture_mode_serves_sample_data_and_ignores_writes() {
    let gw = SyncGateway::fixture();
    assert!(gw.is_fixture());

    let snap = gw.snapshot("anyone").unwrap();
    assert_eq!(snap.accounts.len(), 2);
    assert_eq!(snap.transactions.len(), 3);

    let sub = gw.subscribe("anyone").unwrap();
    assert!(!sub.is_live());
    assert!(sub.try_recv().is_none());
    assert!(sub.recv_timeout(Duration::from_millis(10)).is_none());

    assert_eq!(gw.create_account("anyone", &new_account("X", 1)).unwrap(), "");
    gw.update_account("anyone", "1", &AccountPatch::default()).unwrap();
    gw.delete_account("anyone", "1").unwrap();
    let posted = gw
        .create_transaction("anyone", &expense("1", 150), &snap.accounts)
        .unwrap();
    assert_eq!(posted.new_balance, Decimal::from(50000));
    assert!(!gw.poll().unwrap());
    assert_eq!(gw.snapshot("anyone").unwrap(), snap);
}

/// Store whose account updates always fail.
struct BrokenUpdates(SqliteStore);

impl DocumentStore for BrokenUpdates {
    fn insert(&self, collection: &str, user_id: &str, body: Value) -> StoreResult<String> {
        self.0.insert(collection, user_id, body)
    }
    fn update(&self, collection: &str, _user_id: &str, id: &str, _patch: Value) -> StoreResult<()> {
        Err(StoreError::NotFound {
            collection: collection.into(),
            id: id.into(),
        })
    }
    fn delete(&self, collection: &str, user_id: &str, id: &str) -> StoreResult<()> {
        self.0.delete(collection, user_id, id)
    }
    fn query(&self, collection: &str, user_id: &str) -> StoreResult<Vec<pennywise::db::Document>> {
        self.0.query(collection, user_id)
    }
    fn watch(&self, user_id: &str, ping: Sender<()>) -> StoreResult<WatchId> {
        self.0.watch(user_id, ping)
    }
    fn unwatch(&self, id: WatchId) {
        self.0.unwatch(id)
    }
    fn poll_external(&self) -> StoreResult<bool> {
        self.0.poll_external()
    }
}

#[test]
fn failed_balance_write_reports_recorded_transaction() {
    let gw = SyncGateway::new(Backend::Remote(Arc::new(BrokenUpdates(
        SqliteStore::open_in_memory().unwrap(),
    ))));
    let id = gw.create_account("u1", &new_account("A", 50000)).unwrap();
    let accounts = gw.snapshot("u1").unwrap().accounts;

    let err = gw
        .create_transaction("u1", &expense(&id, 150), &accounts)
        .unwrap_err();
    let SyncError::BalanceNotAdjusted {
        transaction_id,
        account_id,
        ..
    } = err
    else {
        panic!("expected BalanceNotAdjusted");
    };
    assert_eq!(account_id, id);

    let snap = gw.snapshot("u1").unwrap();
    assert_eq!(snap.transactions.len(), 1);
    assert_eq!(snap.transactions[0].id, transaction_id);
    assert_eq!(snap.accounts[0].balance, Decimal::from(50000));
}
