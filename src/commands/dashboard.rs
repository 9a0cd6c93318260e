// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::App;
use crate::aggregate::{monthly_totals, recent_transactions, total_balance};
use crate::models::{account_name, category_name, TxKind};
use crate::state::Mirror;
use crate::utils::{fmt_money, fmt_signed, maybe_print_json, parse_month, pretty_table};
use anyhow::Result;
use chrono::{Datelike, Local};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct RecentRow {
    pub date: String,
    pub category: String,
    pub account: String,
    pub note: String,
    pub amount: String,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub year: i32,
    pub month: u32,
    pub total_balance: Decimal,
    pub monthly_income: Decimal,
    pub monthly_expense: Decimal,
    pub recent: Vec<RecentRow>,
}

pub fn summarize(mirror: &Mirror, year: i32, month: u32, recent: usize) -> Summary {
    let recent = recent_transactions(&mirror.transactions, recent)
        .into_iter()
        .map(|t| RecentRow {
            category: category_name(&mirror.categories, &t.category_id).to_string(),
            account: account_name(&mirror.accounts, &t.account_id).to_string(),
            amount: fmt_signed(t.kind.sign(), &t.amount),
            date: t.date,
            note: t.note,
        })
        .collect();
    Summary {
        year,
        month,
        total_balance: total_balance(&mirror.accounts),
        monthly_income: monthly_totals(&mirror.transactions, year, month, TxKind::Income),
        monthly_expense: monthly_totals(&mirror.transactions, year, month, TxKind::Expense),
        recent,
    }
}

pub fn render(s: &Summary) -> String {
    let head = pretty_table(
        &["Total balance", "Income", "Expense"],
        vec![vec![
            fmt_money(&s.total_balance),
            fmt_money(&s.monthly_income),
            fmt_money(&s.monthly_expense),
        ]],
    );
    let mut out = format!("{:04}-{:02}\n{}\n", s.year, s.month, head);
    if s.recent.is_empty() {
        out.push_str("No transactions yet.\n");
    } else {
        let rows = s
            .recent
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
        out.push_str(&format!(
            "Recent transactions\n{}\n",
            pretty_table(&["Date", "Category", "Account", "Note", "Amount"], rows)
        ));
    }
    out
}

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    let (year, month) = match m.get_one::<String>("month") {
        Some(s) => parse_month(s)?,
        None => {
            let today = Local::now().date_naive();
            (today.year(), today.month())
        }
    };
    let recent = m.get_one::<usize>("recent").copied().unwrap_or(5);
    let mirror = app.mirror()?;
    let summary = summarize(&mirror, year, month, recent);

    if maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &summary)? {
        return Ok(());
    }
    println!("{}", app.banner().unwrap_or_else(|| app.identity()));
    print!("{}", render(&summary));
    if m.get_flag("advice") {
        println!("AI advice\n{}", super::advice::fetch(app, &mirror));
    }
    Ok(())
}
