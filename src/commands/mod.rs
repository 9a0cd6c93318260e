// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod advice;
pub mod categories;
pub mod dashboard;
pub mod doctor;
pub mod reports;
pub mod transactions;
pub mod watch;

use crate::advisor::Advisor;
use crate::config::{Session, Settings};
use crate::gateway::SyncGateway;
use crate::state::Mirror;
use anyhow::{Context, Result};

/// Run the selected subcommand. Returns `false` when none was given.
pub fn dispatch(matches: &clap::ArgMatches) -> Result<bool> {
    // categories are fixed and need no store
    if let Some(("category", sub)) = matches.subcommand() {
        categories::handle(sub)?;
        return Ok(true);
    }
    if matches.subcommand().is_none() {
        return Ok(false);
    }

    let settings = Settings::from_matches(matches)?;
    let app = App::from_settings(&settings)?;
    tracing::debug!(user = %app.session.user_id, fixture = app.gateway.is_fixture(), "session ready");

    match matches.subcommand() {
        Some(("dashboard", sub)) => dashboard::handle(&app, sub)?,
        Some(("account", sub)) => accounts::handle(&app, sub)?,
        Some(("tx", sub)) => transactions::handle(&app, sub)?,
        Some(("report", sub)) => reports::handle(&app, sub)?,
        Some(("advice", _)) => advice::handle(&app)?,
        Some(("watch", sub)) => watch::handle(&app, sub)?,
        Some(("doctor", _)) => doctor::handle(&app)?,
        _ => return Ok(false),
    }
    Ok(true)
}

/// What every command runs against.
pub struct App {
    pub gateway: SyncGateway,
    pub session: Session,
    pub advisor: Advisor,
}

impl App {
    /// Checks sign-in before the store is opened, so a rejected session
    /// never creates a database file.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let session = settings.session()?;
        Ok(Self {
            gateway: settings.gateway()?,
            session,
            advisor: settings.advisor(),
        })
    }

    /// Fresh local mirror from the store.
    pub fn mirror(&self) -> Result<Mirror> {
        let snap = self
            .gateway
            .snapshot(&self.session.user_id)
            .context("Could not load your data from the store")?;
        Ok(Mirror::from_snapshot(snap))
    }

    /// Who the output is for: the signed-in email (or user id), or the
    /// guest label in demo mode.
    pub fn identity(&self) -> String {
        if self.gateway.is_fixture() {
            return "Guest (demo)".to_string();
        }
        let who = self
            .session
            .email
            .as_deref()
            .unwrap_or(&self.session.user_id);
        format!("Signed in as {}", who)
    }

    pub fn banner(&self) -> Option<String> {
        if self.gateway.is_fixture() {
            Some(format!(
                "{}: no store configured, showing sample data; changes are not saved.",
                self.identity()
            ))
        } else {
            None
        }
    }
}
