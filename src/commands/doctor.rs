// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::App;
use crate::aggregate::scan;
use crate::utils::pretty_table;
use anyhow::Result;

pub fn handle(app: &App) -> Result<()> {
    let mirror = app.mirror()?;
    let issues = scan(&mirror.accounts, &mirror.transactions, &mirror.categories);

    if let Some(b) = app.banner() {
        println!("{}", b);
    }
    if issues.is_empty() {
        println!("doctor: no issues found");
    } else {
        let rows = issues
            .into_iter()
            .map(|i| vec![i.kind.to_string(), i.transaction_id, i.detail])
            .collect();
        println!("{}", pretty_table(&["Issue", "Transaction", "Detail"], rows));
    }
    Ok(())
}
