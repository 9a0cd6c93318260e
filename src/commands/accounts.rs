// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::App;
use crate::models::{Account, AccountKind, AccountPatch, NewAccount, DEFAULT_ACCOUNT_COLOR};
use crate::state::Mirror;
use crate::utils::{fmt_money, maybe_print_json, parse_decimal, pretty_table, required};
use anyhow::{anyhow, Context, Result};

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(app, sub)?,
        Some(("list", sub)) => list(app, sub)?,
        Some(("update", sub)) => update(app, sub)?,
        Some(("rm", sub)) => remove(app, sub)?,
        _ => {}
    }
    Ok(())
}

fn parse_kind(s: &str) -> Result<AccountKind> {
    s.parse::<AccountKind>().map_err(|e| anyhow!(e))
}

pub fn new_account_from(sub: &clap::ArgMatches) -> Result<NewAccount> {
    Ok(NewAccount {
        name: required(sub, "name")?.trim().to_string(),
        balance: parse_decimal(required(sub, "balance")?)?,
        kind: parse_kind(required(sub, "type")?)?,
        color: sub
            .get_one::<String>("color")
            .map(|c| c.trim().to_string())
            .unwrap_or_else(|| DEFAULT_ACCOUNT_COLOR.to_string()),
    })
}

pub fn patch_from(sub: &clap::ArgMatches) -> Result<AccountPatch> {
    Ok(AccountPatch {
        name: sub.get_one::<String>("name").map(|s| s.trim().to_string()),
        balance: sub
            .get_one::<String>("balance")
            .map(|s| parse_decimal(s))
            .transpose()?,
        kind: sub
            .get_one::<String>("type")
            .map(|s| parse_kind(s))
            .transpose()?,
        color: sub.get_one::<String>("color").map(|s| s.trim().to_string()),
    })
}

fn add(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let data = new_account_from(sub)?;
    let id = app
        .gateway
        .create_account(&app.session.user_id, &data)
        .with_context(|| format!("Could not save account '{}'", data.name))?;
    if app.gateway.is_fixture() {
        println!("Demo mode: account '{}' was not saved", data.name);
    } else {
        println!(
            "Added account '{}' ({}, {}) id {}",
            data.name,
            data.kind,
            fmt_money(&data.balance),
            id
        );
    }
    Ok(())
}

fn resolve<'a>(mirror: &'a Mirror, key: &str) -> Result<&'a Account> {
    mirror
        .resolve_account(key)
        .with_context(|| format!("Account '{}' not found", key.trim()))
}

fn update(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let mirror = app.mirror()?;
    let acct = resolve(&mirror, required(sub, "account")?)?;
    let patch = patch_from(sub)?;
    app.gateway
        .update_account(&app.session.user_id, &acct.id, &patch)
        .with_context(|| format!("Could not update account '{}'", acct.name))?;
    if app.gateway.is_fixture() {
        println!("Demo mode: account '{}' was not changed", acct.name);
        return Ok(());
    }
    println!("Updated account '{}'", acct.name);
    Ok(())
}

fn remove(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let mirror = app.mirror()?;
    let acct = resolve(&mirror, required(sub, "account")?)?;
    let orphaned = mirror.history(&acct.id).len();
    app.gateway
        .delete_account(&app.session.user_id, &acct.id)
        .with_context(|| format!("Could not remove account '{}'", acct.name))?;
    if app.gateway.is_fixture() {
        println!("Demo mode: account '{}' was not removed", acct.name);
        return Ok(());
    }
    println!("Removed account '{}'", acct.name);
    if orphaned > 0 {
        println!(
            "{} transaction(s) still reference it and will show as 'unknown'",
            orphaned
        );
    }
    Ok(())
}

fn list(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let mirror = app.mirror()?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &mirror.accounts)? {
        return Ok(());
    }
    let data: Vec<Vec<String>> = mirror
        .accounts
        .iter()
        .map(|a| {
            vec![
                a.id.clone(),
                a.name.clone(),
                a.kind.to_string(),
                a.color.clone(),
                fmt_money(&a.balance),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Id", "Name", "Type", "Color", "Balance"], data)
    );
    Ok(())
}
