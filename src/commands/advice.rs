// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::App;
use crate::state::Mirror;
use anyhow::Result;

pub fn fetch(app: &App, mirror: &Mirror) -> String {
    app.advisor
        .get_advice(&mirror.transactions, &mirror.accounts, &mirror.categories)
}

pub fn handle(app: &App) -> Result<()> {
    let mirror = app.mirror()?;
    if !app.advisor.is_configured() {
        tracing::debug!("no API key; advice falls back to the setup hint");
    }
    println!("{}", fetch(app, &mirror));
    Ok(())
}
