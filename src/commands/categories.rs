// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{Category, Kind};
use crate::normalizer::{category_id_for, icon_for};
use crate::store::Store;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::{Context, Result};

pub fn handle(store: &Store, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let name = sub
                .get_one::<String>("name")
                .context("--name is required")?
                .trim();
            let kind: Kind = sub
                .get_one::<String>("type")
                .context("--type is required")?
                .parse()?;
            let id = sub
                .get_one::<String>("id")
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| category_id_for(name));
            let icon = sub
                .get_one::<String>("icon")
                .map(|s| s.trim().to_string())
                .unwrap_or_else(|| icon_for(&id).to_string());
            store.add_category(Category {
                id: id.clone(),
                name: name.to_string(),
                icon,
                kind,
            })?;
            println!("Added category '{}' ({})", name, id);
        }
        Some(("list", sub)) => {
            let mut cats = store.categories();
            cats.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.name.cmp(&b.name)));
            if !maybe_print_json(sub.get_flag("json"), &cats)? {
                let data = cats
                    .into_iter()
                    .map(|c| vec![c.icon, c.name, c.id, c.kind.to_string()])
                    .collect();
                println!("{}", pretty_table(&["", "Category", "Id", "Type"], data));
            }
        }
        _ => {}
    }
    Ok(())
}
