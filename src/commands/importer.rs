// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::{ImportSummary, Store};
use anyhow::{Context, Result, anyhow};

pub fn handle(store: &Store, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("csv", sub)) => import_csv(store, sub).map(|_| ()),
        Some(("json", sub)) => import_json(store, sub).map(|_| ()),
        _ => Ok(()),
    }
}

fn read_input(sub: &clap::ArgMatches) -> Result<(String, String)> {
    let path = sub
        .get_one::<String>("path")
        .context("--path is required")?
        .trim()
        .to_string();
    let text = std::fs::read_to_string(&path).with_context(|| format!("Open {}", path))?;
    Ok((path, text))
}

/// Rows are appended; a malformed row never aborts the import.
pub fn import_csv(store: &Store, sub: &clap::ArgMatches) -> Result<ImportSummary> {
    let (path, text) = read_input(sub)?;
    let summary = store.import_csv(&text);
    println!("{} from {}", summary.message(), path);
    Ok(summary)
}

/// Replaces the ledger; a document without a transactions list leaves it untouched.
pub fn import_json(store: &Store, sub: &clap::ArgMatches) -> Result<ImportSummary> {
    let (path, text) = read_input(sub)?;
    let summary = store
        .import_json(&text)
        .map_err(|e| anyhow!("Import from {} rejected: {}", path, e))?;
    println!("{} from {}", summary.message(), path);
    Ok(summary)
}
