// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::DateRange;
use crate::store::Store;
use crate::utils::parse_date;
use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;

pub fn handle(store: &Store, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("json", sub)) => {
            let out = out_path(sub)?;
            std::fs::write(out, store.export_json()).with_context(|| format!("Write {}", out))?;
            println!("Exported ledger to {}", out);
        }
        Some(("csv", sub)) => {
            let out = out_path(sub)?;
            let range = export_range(sub)?;
            let csv = store.export_csv(range)?;
            std::fs::write(out, csv).with_context(|| format!("Write {}", out))?;
            println!("Exported transactions to {}", out);
        }
        _ => {}
    }
    Ok(())
}

fn out_path(sub: &clap::ArgMatches) -> Result<&str> {
    sub.get_one::<String>("out")
        .map(|s| s.trim())
        .context("--out is required")
}

/// Open-ended bounds default to the widest representable dates.
fn export_range(sub: &clap::ArgMatches) -> Result<Option<DateRange>> {
    let from = sub.get_one::<String>("from").map(|s| parse_date(s)).transpose()?;
    let to = sub.get_one::<String>("to").map(|s| parse_date(s)).transpose()?;
    if from.is_none() && to.is_none() {
        return Ok(None);
    }
    let range = DateRange {
        from: from.unwrap_or(NaiveDate::MIN),
        to: to.unwrap_or(NaiveDate::MAX),
    };
    if range.from > range.to {
        return Err(anyhow!("--from {} is after --to {}", range.from, range.to));
    }
    Ok(Some(range))
}
