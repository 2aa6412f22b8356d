// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use tracing::debug;

use pocketledger::config::Config;
use pocketledger::storage::{JsonFileStorage, StateStorage};
use pocketledger::{Store, cli, commands, logging};

fn main() -> Result<()> {
    logging::init_tracing();
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let cfg = Config::resolve(matches.get_one::<String>("data").map(|s| s.as_str()))?;
    let storage = JsonFileStorage::new(cfg.data_file.clone());
    let store = Store::load_from(&storage)?;
    let baseline = store.export_json();

    let dirty = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&dirty);
    store.subscribe(move |_| flag.store(true, Ordering::SeqCst));

    match matches.subcommand() {
        Some(("init", _)) => {
            if storage.load()?.is_none() {
                store.save_to(&storage)?;
            }
            println!("Ledger at {}", storage.path().display());
        }
        Some(("tx", sub)) => commands::transactions::handle(&store, &cfg, sub)?,
        Some(("category", sub)) => commands::categories::handle(&store, sub)?,
        Some(("report", sub)) => commands::reports::handle(&store, &cfg, sub)?,
        Some(("import", sub)) => commands::importer::handle(&store, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&store, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }

    if dirty.load(Ordering::SeqCst) && store.export_json() != baseline {
        debug!(path = %storage.path().display(), "saving ledger");
        store.save_to(&storage)?;
    }
    Ok(())
}
