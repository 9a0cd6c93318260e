// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::App;
use crate::aggregate::{filter_by_note, recent_transactions};
use crate::gateway::SyncError;
use crate::models::{account_name, category_name, NewTransaction, TxKind};
use crate::state::Mirror;
use crate::utils::{fmt_money, fmt_signed, maybe_print_json, parse_date, parse_decimal, pretty_table, required};
use anyhow::{anyhow, Context, Result};
use chrono::Local;
use serde::Serialize;

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(app, sub)?,
        Some(("list", sub)) => list(app, sub)?,
        _ => {}
    }
    Ok(())
}

/// Build the posting payload, resolving account and category names.
pub fn new_transaction_from(mirror: &Mirror, sub: &clap::ArgMatches) -> Result<NewTransaction> {
    let account_key = required(sub, "account")?;
    let account = mirror
        .resolve_account(account_key)
        .with_context(|| format!("Account '{}' not found", account_key.trim()))?;
    let category_key = required(sub, "category")?;
    let category = mirror
        .resolve_category(category_key)
        .with_context(|| format!("Category '{}' not found", category_key.trim()))?;
    let amount = parse_decimal(required(sub, "amount")?)?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(anyhow!(
            "Amount must not be negative; use --type income|expense for direction"
        ));
    }
    let kind = required(sub, "type")?
        .parse::<TxKind>()
        .map_err(|e| anyhow!(e))?;
    let date = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => Local::now().date_naive(),
    };
    Ok(NewTransaction {
        account_id: account.id.clone(),
        amount,
        kind,
        category_id: category.id.clone(),
        date: date.to_string(),
        note: sub
            .get_one::<String>("note")
            .map(|s| s.to_string())
            .unwrap_or_default(),
    })
}

fn add(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let mirror = app.mirror()?;
    let data = new_transaction_from(&mirror, sub)?;
    let account = account_name(&mirror.accounts, &data.account_id).to_string();
    let what = format!(
        "{} {} on {} ({})",
        data.kind,
        fmt_money(&data.amount),
        data.date,
        account
    );

    match app
        .gateway
        .create_transaction(&app.session.user_id, &data, &mirror.accounts)
    {
        Ok(_) if app.gateway.is_fixture() => {
            println!("Demo mode: {} was not saved", what);
        }
        Ok(posted) => {
            println!(
                "Recorded {}; balance now {}",
                what,
                fmt_money(&posted.new_balance)
            );
        }
        Err(SyncError::BalanceNotAdjusted {
            transaction_id,
            source,
            ..
        }) => {
            // the transaction itself is stored; say so rather than fail silently
            return Err(anyhow!(
                "Recorded {} as {} but could not update the balance of '{}': {}. \
                 Fix it with `pennywise account update --account {} --balance <amount>`",
                what,
                transaction_id,
                account,
                source,
                data.account_id
            ));
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Could not record {}", what));
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct TransactionRow {
    pub id: String,
    pub date: String,
    pub account: String,
    pub category: String,
    pub note: String,
    pub amount: String,
}

pub fn query_rows(mirror: &Mirror, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let mut txs = match sub.get_one::<String>("search") {
        Some(needle) => filter_by_note(&mirror.transactions, needle),
        None => recent_transactions(&mirror.transactions, mirror.transactions.len()),
    };
    if let Some(key) = sub.get_one::<String>("account") {
        let acct = mirror
            .resolve_account(key)
            .with_context(|| format!("Account '{}' not found", key.trim()))?;
        txs.retain(|t| t.account_id == acct.id);
    }
    if let Some(limit) = sub.get_one::<usize>("limit") {
        txs.truncate(*limit);
    }
    Ok(txs
        .into_iter()
        .map(|t| TransactionRow {
            account: account_name(&mirror.accounts, &t.account_id).to_string(),
            category: category_name(&mirror.categories, &t.category_id).to_string(),
            amount: fmt_signed(t.kind.sign(), &t.amount),
            id: t.id,
            date: t.date,
            note: t.note,
        })
        .collect())
}

fn list(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let mirror = app.mirror()?;
    let data = query_rows(&mirror, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        if data.is_empty() {
            println!("No transactions found.");
            return Ok(());
        }
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.date.clone(),
                    r.category.clone(),
                    r.account.clone(),
                    r.note.clone(),
                    r.amount.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Category", "Account", "Note", "Amount"], rows)
        );
    }
    Ok(())
}
