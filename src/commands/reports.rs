// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::App;
use crate::aggregate::{expense_by_category, monthly_trend, CategorySpend, MonthTotals};
use crate::models::Transaction;
use crate::state::Mirror;
use crate::utils::{fmt_money, maybe_print_json, parse_month, pretty_table};
use anyhow::Result;
use chrono::{Datelike, Local};

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("by-category", sub)) => by_category(app, sub)?,
        Some(("trend", sub)) => trend(app, sub)?,
        _ => {}
    }
    Ok(())
}

/// Category breakdown, optionally restricted to one month.
pub fn category_report(mirror: &Mirror, month: Option<(i32, u32)>) -> Vec<CategorySpend> {
    let scoped: Vec<Transaction> = match month {
        Some((y, m)) => mirror
            .transactions
            .iter()
            .filter(|t| {
                t.parsed_date()
                    .is_some_and(|d| d.year() == y && d.month() == m)
            })
            .cloned()
            .collect(),
        None => mirror.transactions.clone(),
    };
    expense_by_category(&scoped, &mirror.categories)
}

fn by_category(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let month = sub.get_one::<String>("month").map(|s| parse_month(s)).transpose()?;
    let mirror = app.mirror()?;
    let data = category_report(&mirror, month);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    if data.is_empty() {
        println!("No expenses recorded.");
        return Ok(());
    }
    let total: rust_decimal::Decimal = data.iter().map(|c| c.value).sum();
    let rows = data
        .iter()
        .map(|c| {
            let share = if total.is_zero() {
                rust_decimal::Decimal::ZERO
            } else {
                (c.value * rust_decimal::Decimal::ONE_HUNDRED / total).round_dp(1)
            };
            vec![c.name.clone(), fmt_money(&c.value), format!("{}%", share)]
        })
        .collect();
    println!("{}", pretty_table(&["Category", "Spent", "Share"], rows));
    Ok(())
}

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

fn month_label(m: u32) -> String {
    MONTHS
        .get(m.wrapping_sub(1) as usize)
        .map(|s| s.to_string())
        .unwrap_or_else(|| m.to_string())
}

pub fn render_trend(months: &[MonthTotals]) -> String {
    let rows = months
        .iter()
        .map(|t| {
            vec![
                month_label(t.month),
                fmt_money(&t.income),
                fmt_money(&t.expense),
            ]
        })
        .collect();
    pretty_table(&["Month", "Income", "Expense"], rows).to_string()
}

fn trend(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let year = sub
        .get_one::<i32>("year")
        .copied()
        .unwrap_or_else(|| Local::now().year());
    let mirror = app.mirror()?;
    let data = monthly_trend(&mirror.transactions, year);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    println!("{}\n{}", year, render_trend(&data));
    Ok(())
}
