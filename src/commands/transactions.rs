// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Config;
use crate::models::{Kind, TransactionDraft, TransactionPatch};
use crate::store::Store;
use crate::utils::{
    fmt_money, maybe_print_json, parse_day_start, parse_decimal, parse_month, pretty_table,
};
use anyhow::{Result, anyhow};
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(store: &Store, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(store, cfg, sub)?,
        Some(("update", sub)) => update(store, sub)?,
        Some(("rm", sub)) => remove(store, sub)?,
        Some(("list", sub)) => list(store, cfg, sub)?,
        _ => {}
    }
    Ok(())
}

fn required<'a>(sub: &'a clap::ArgMatches, name: &str) -> Result<&'a String> {
    sub.get_one::<String>(name)
        .ok_or_else(|| anyhow!("--{} is required", name))
}

fn add(store: &Store, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let occurred_at = parse_day_start(required(sub, "date")?)?;
    let kind: Kind = required(sub, "type")?.parse()?;
    let amount = parse_decimal(required(sub, "amount")?)?;
    if amount.is_sign_negative() {
        return Err(anyhow!("Amount must not be negative; use --type instead"));
    }
    let category_id = required(sub, "category")?.trim().to_string();
    let description = sub
        .get_one::<String>("memo")
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    let tx = store.add_transaction(TransactionDraft {
        amount,
        description,
        occurred_at,
        category_id,
        kind,
    });
    println!(
        "Recorded {} {} on {} in '{}' (id: {})",
        tx.kind,
        fmt_money(&tx.amount, &cfg.currency),
        tx.occurred_at.date_naive(),
        store.category_label(&tx.category_id),
        tx.id
    );
    Ok(())
}

fn update(store: &Store, sub: &clap::ArgMatches) -> Result<()> {
    let id = required(sub, "id")?.trim();
    let patch = TransactionPatch {
        amount: sub
            .get_one::<String>("amount")
            .map(|s| parse_decimal(s))
            .transpose()?,
        description: sub.get_one::<String>("memo").map(|s| s.trim().to_string()),
        occurred_at: sub
            .get_one::<String>("date")
            .map(|s| parse_day_start(s))
            .transpose()?,
        category_id: sub.get_one::<String>("category").map(|s| s.trim().to_string()),
        kind: sub
            .get_one::<String>("type")
            .map(|s| s.parse::<Kind>())
            .transpose()?,
    };
    if patch.is_empty() {
        println!("Nothing to update");
        return Ok(());
    }
    let tx = store.update_transaction(id, patch)?;
    println!("Updated transaction {}", tx.id);
    Ok(())
}

fn remove(store: &Store, sub: &clap::ArgMatches) -> Result<()> {
    let id = required(sub, "id")?.trim();
    let tx = store.delete_transaction(id)?;
    println!("Removed transaction {}", tx.id);
    Ok(())
}

fn list(store: &Store, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(store, sub)?;
    if !maybe_print_json(sub.get_flag("json"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.date.clone(),
                    r.kind.clone(),
                    r.category.clone(),
                    r.memo.clone(),
                    fmt_money(&r.amount, &cfg.currency),
                    r.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Type", "Category", "Memo", "Amount", "Id"], rows)
        );
    }
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: String,
    pub date: String,
    pub kind: String,
    pub category: String,
    pub memo: String,
    pub amount: Decimal,
}

/// Newest first, optionally restricted to one month and truncated to `--limit`.
pub fn query_rows(store: &Store, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let mut txs = match sub.get_one::<String>("month") {
        Some(month) => store
            .month_aggregate(parse_month(month)?)
            .map(|agg| agg.transactions)
            .unwrap_or_default(),
        None => store.transactions(),
    };
    txs.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    if let Some(limit) = sub.get_one::<usize>("limit") {
        txs.truncate(*limit);
    }
    Ok(txs
        .into_iter()
        .map(|t| TransactionRow {
            date: t.occurred_at.date_naive().to_string(),
            kind: t.kind.to_string(),
            category: store.category_label(&t.category_id),
            memo: t.description,
            amount: t.amount,
            id: t.id,
        })
        .collect())
}
