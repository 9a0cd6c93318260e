// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Dashboard and report computations over the local mirror.
//!
//! Everything here is a pure function of its inputs. Transactions whose
//! stored date does not parse are left out of every date-bucketed sum and
//! reported through [`scan`] (and a `warn` log line) instead.

use crate::models::{Account, Category, Transaction, TxKind};
use chrono::Datelike;
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Reverse;

pub fn total_balance(accounts: &[Account]) -> Decimal {
    accounts.iter().map(|a| a.balance).sum()
}

/// Sum of `kind` amounts dated within `year`-`month`.
pub fn monthly_totals(transactions: &[Transaction], year: i32, month: u32, kind: TxKind) -> Decimal {
    let mut total = Decimal::ZERO;
    for tx in transactions.iter().filter(|t| t.kind == kind) {
        match tx.parsed_date() {
            Some(d) if d.year() == year && d.month() == month => total += tx.amount,
            Some(_) => {}
            None => warn_malformed(tx),
        }
    }
    total
}

/// Newest first; equal dates keep their input order. Undated entries go last.
pub fn recent_transactions(transactions: &[Transaction], limit: usize) -> Vec<Transaction> {
    let mut sorted: Vec<Transaction> = transactions.to_vec();
    // sort_by_key is stable
    sorted.sort_by_key(|t| Reverse(t.parsed_date()));
    sorted.truncate(limit);
    sorted
}

/// Case-insensitive note search, newest first.
pub fn filter_by_note(transactions: &[Transaction], needle: &str) -> Vec<Transaction> {
    let needle = needle.to_lowercase();
    let hits: Vec<Transaction> = transactions
        .iter()
        .filter(|t| t.note.to_lowercase().contains(&needle))
        .cloned()
        .collect();
    recent_transactions(&hits, hits.len())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpend {
    pub category_id: String,
    pub name: String,
    pub color: String,
    pub value: Decimal,
}

/// Expense totals per category, in category order, zero totals dropped.
pub fn expense_by_category(transactions: &[Transaction], categories: &[Category]) -> Vec<CategorySpend> {
    categories
        .iter()
        .filter_map(|cat| {
            let value: Decimal = transactions
                .iter()
                .filter(|t| t.kind == TxKind::Expense && t.category_id == cat.id)
                .map(|t| t.amount)
                .sum();
            if value.is_zero() {
                return None;
            }
            Some(CategorySpend {
                category_id: cat.id.clone(),
                name: cat.name.clone(),
                color: cat.color.clone(),
                value,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthTotals {
    pub month: u32, // 1..=12
    pub income: Decimal,
    pub expense: Decimal,
}

/// Twelve entries for `year`, January first, zero-filled.
pub fn monthly_trend(transactions: &[Transaction], year: i32) -> Vec<MonthTotals> {
    let mut months: Vec<MonthTotals> = (1..=12)
        .map(|month| MonthTotals {
            month,
            income: Decimal::ZERO,
            expense: Decimal::ZERO,
        })
        .collect();
    for tx in transactions {
        let Some(d) = tx.parsed_date() else {
            warn_malformed(tx);
            continue;
        };
        if d.year() != year {
            continue;
        }
        let slot = &mut months[d.month0() as usize];
        match tx.kind {
            TxKind::Income => slot.income += tx.amount,
            TxKind::Expense => slot.expense += tx.amount,
        }
    }
    months
}

fn warn_malformed(tx: &Transaction) {
    tracing::warn!(id = %tx.id, date = %tx.date, "transaction has malformed date; excluded from totals");
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: &'static str,
    pub transaction_id: String,
    pub detail: String,
}

/// Data-quality findings for the doctor report.
pub fn scan(accounts: &[Account], transactions: &[Transaction], categories: &[Category]) -> Vec<Issue> {
    let mut issues = Vec::new();
    for tx in transactions {
        if tx.parsed_date().is_none() {
            issues.push(Issue {
                kind: "malformed_date",
                transaction_id: tx.id.clone(),
                detail: format!("'{}'", tx.date),
            });
        }
        if tx.amount.is_sign_negative() && !tx.amount.is_zero() {
            issues.push(Issue {
                kind: "negative_amount",
                transaction_id: tx.id.clone(),
                detail: tx.amount.to_string(),
            });
        }
        if !accounts.iter().any(|a| a.id == tx.account_id) {
            issues.push(Issue {
                kind: "unknown_account",
                transaction_id: tx.id.clone(),
                detail: tx.account_id.clone(),
            });
        }
        if !categories.iter().any(|c| c.id == tx.category_id) {
            issues.push(Issue {
                kind: "unknown_category",
                transaction_id: tx.id.clone(),
                detail: tx.category_id.clone(),
            });
        }
    }
    issues
}
