// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Config;
use crate::models::Kind;
use crate::store::Store;
use crate::utils::{fmt_money, maybe_print_json, parse_month, pretty_table};
use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(store: &Store, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("month", sub)) => month(store, cfg, sub)?,
        Some(("months", sub)) => months(store, cfg, sub)?,
        Some(("breakdown", sub)) => breakdown(store, cfg, sub)?,
        _ => {}
    }
    Ok(())
}

fn month(store: &Store, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    if let Some(m) = sub.get_one::<String>("month") {
        store.set_current_month(parse_month(m)?);
    }
    let agg = store.current_aggregate();
    if maybe_print_json(sub.get_flag("json"), &agg)? {
        return Ok(());
    }
    println!(
        "{}",
        pretty_table(
            &["Month", "Income", "Expense", "Balance", "Transactions"],
            vec![vec![
                agg.month.to_string(),
                fmt_money(&agg.total_income, &cfg.currency),
                fmt_money(&agg.total_expense, &cfg.currency),
                fmt_money(&agg.balance, &cfg.currency),
                agg.transactions.len().to_string(),
            ]],
        )
    );
    Ok(())
}

#[derive(Serialize)]
struct MonthRow {
    month: String,
    income: Decimal,
    expense: Decimal,
    balance: Decimal,
    count: usize,
}

fn months(store: &Store, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let snapshot = store.snapshot();
    let data: Vec<MonthRow> = snapshot
        .aggregates
        .values()
        .rev()
        .map(|agg| MonthRow {
            month: agg.month.to_string(),
            income: agg.total_income,
            expense: agg.total_expense,
            balance: agg.balance,
            count: agg.transactions.len(),
        })
        .collect();
    if !maybe_print_json(sub.get_flag("json"), &data)? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.month.clone(),
                    fmt_money(&r.income, &cfg.currency),
                    fmt_money(&r.expense, &cfg.currency),
                    fmt_money(&r.balance, &cfg.currency),
                    r.count.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Month", "Income", "Expense", "Balance", "Count"], rows)
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct BreakdownRow {
    category_id: String,
    category: String,
    total: Decimal,
    percent: Decimal,
}

fn breakdown(store: &Store, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    let kind: Kind = sub
        .get_one::<String>("type")
        .map(|s| s.as_str())
        .unwrap_or("expense")
        .parse()?;
    let month = if sub.get_flag("all") {
        None
    } else {
        let m = match sub.get_one::<String>("month") {
            Some(m) => parse_month(m)?,
            None => store.current_month(),
        };
        store.set_current_month(m);
        Some(m)
    };
    let bd = store.breakdown(kind, month);
    let mut data: Vec<BreakdownRow> = bd
        .totals
        .iter()
        .map(|(id, total)| BreakdownRow {
            category_id: id.clone(),
            category: store.category_label(id),
            total: *total,
            percent: bd.percentages.get(id).copied().unwrap_or_default(),
        })
        .collect();
    data.sort_by(|a, b| b.total.cmp(&a.total));
    if !maybe_print_json(sub.get_flag("json"), &data)? {
        let rows = data
            .iter()
            .map(|r| {
                vec![
                    r.category.clone(),
                    fmt_money(&r.total, &cfg.currency),
                    format!("{:.1}%", r.percent.round_dp(1)),
                ]
            })
            .collect();
        let hdr = match month {
            Some(m) => format!("{} {}", m, kind),
            None => format!("All {}", kind),
        };
        println!("{}", hdr);
        println!("{}", pretty_table(&["Category", "Total", "Share"], rows));
    }
    Ok(())
}
