// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::dashboard::{render, summarize};
use super::App;
use crate::state::Mirror;
use anyhow::{Context, Result};
use chrono::{Datelike, Local};
use std::time::Duration;

/// Feed snapshots into a local mirror and call `on_update` after each one.
/// Stops after `limit` snapshots, or never when `None`. Returns how many
/// snapshots were applied.
pub fn run<F>(app: &App, interval: Duration, limit: Option<usize>, mut on_update: F) -> Result<usize>
where
    F: FnMut(&Mirror),
{
    let sub = app
        .gateway
        .subscribe(&app.session.user_id)
        .context("Could not subscribe to store changes")?;
    let mut mirror = Mirror::default();

    if !sub.is_live() {
        // fixture data never changes, show it once
        mirror.replace(app.gateway.snapshot(&app.session.user_id)?);
        on_update(&mirror);
        return Ok(1);
    }

    let mut applied = 0;
    while limit.is_none_or(|n| applied < n) {
        match sub.recv_timeout(interval) {
            Some(snap) => {
                mirror.replace(snap.context("Could not refresh from the store")?);
                applied += 1;
                on_update(&mirror);
            }
            None => {
                app.gateway.poll().context("Could not poll the store")?;
            }
        }
    }
    sub.cancel();
    Ok(applied)
}

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    let interval = Duration::from_millis(m.get_one::<u64>("interval-ms").copied().unwrap_or(1000));
    let limit = m.get_one::<usize>("count").copied();
    match app.banner() {
        Some(b) => println!("{} Live updates are off.", b),
        None => println!("{}", app.identity()),
    }
    run(app, interval, limit, |mirror| {
        let today = Local::now().date_naive();
        let summary = summarize(mirror, today.year(), today.month(), 5);
        println!("--- update #{} ---", mirror.generation());
        print!("{}", render(&summary));
    })?;
    Ok(())
}
