// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use pennywise::models::{
    account_name, category_name, Account, AccountKind, AccountPatch, Transaction, TxKind,
    DEFAULT_CATEGORIES, UNKNOWN,
};
use rust_decimal::Decimal;

#[test]
fn account_serializes_type_field() {
    let acct = Account {
        id: "1".into(),
        name: "Wallet".into(),
        balance: Decimal::new(1250, 2),
        kind: AccountKind::Cash,
        color: "green".into(),
    };
    let v = serde_json::to_value(&acct).unwrap();
    assert_eq!(v["type"], "Cash");
    assert_eq!(v["balance"], "12.50");
}

#[test]
fn transaction_uses_camel_case_and_lowercase_kind() {
    let v = serde_json::json!({
        "id": "t1", "accountId": "1", "amount": "30", "type": "income",
        "categoryId": "cat-8", "date": "2024-03-01"
    });
    let tx: Transaction = serde_json::from_value(v).unwrap();
    assert_eq!(tx.kind, TxKind::Income);
    assert_eq!(tx.note, "");
    assert_eq!(tx.parsed_date(), NaiveDate::from_ymd_opt(2024, 3, 1));
}

#[test]
fn malformed_date_parses_to_none() {
    let mut tx = Transaction {
        id: "t".into(),
        account_id: "1".into(),
        amount: Decimal::ONE,
        kind: TxKind::Expense,
        category_id: "cat-1".into(),
        date: "2024-13-01".into(),
        note: String::new(),
    };
    assert!(tx.parsed_date().is_none());
    tx.date = "yesterday".into();
    assert!(tx.parsed_date().is_none());
}

#[test]
fn kinds_parse_case_insensitively() {
    assert_eq!(" Savings ".parse::<AccountKind>().unwrap(), AccountKind::Savings);
    assert_eq!("EXPENSE".parse::<TxKind>().unwrap(), TxKind::Expense);
    assert!("brokerage".parse::<AccountKind>().is_err());
    assert!("transfer".parse::<TxKind>().is_err());
}

#[test]
fn posting_direction_follows_kind() {
    let bal = Decimal::from(50000);
    assert_eq!(TxKind::Expense.apply(bal, Decimal::from(150)), Decimal::from(49850));
    assert_eq!(TxKind::Income.apply(bal, Decimal::from(150)), Decimal::from(50150));
}

#[test]
fn patch_skips_unset_fields() {
    let patch = AccountPatch {
        balance: Some(Decimal::from(49850)),
        ..Default::default()
    };
    let v = serde_json::to_value(&patch).unwrap();
    assert_eq!(v, serde_json::json!({ "balance": "49850" }));
    assert!(!patch.is_empty());
    assert!(AccountPatch::default().is_empty());
}

#[test]
fn unresolved_references_render_unknown() {
    assert_eq!(category_name(&DEFAULT_CATEGORIES, "cat-8"), "Salary");
    assert_eq!(category_name(&DEFAULT_CATEGORIES, "cat-99"), UNKNOWN);
    assert_eq!(account_name(&[], "1"), UNKNOWN);
}

#[test]
fn default_categories_are_fixed() {
    assert_eq!(DEFAULT_CATEGORIES.len(), 11);
    assert_eq!(DEFAULT_CATEGORIES[0].id, "cat-1");
    assert_eq!(DEFAULT_CATEGORIES.last().unwrap().id, "cat-other");
}
