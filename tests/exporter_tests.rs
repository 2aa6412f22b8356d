// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{TimeZone, Utc};
use pocketledger::models::{Kind, TransactionDraft};
use pocketledger::{Store, cli, commands::exporter};
use rust_decimal::Decimal;
use tempfile::tempdir;

fn seeded() -> Store {
    let store = Store::new();
    for (d, kind, amount, cat, memo) in [
        (5, Kind::Expense, Decimal::new(1250, 2), "food", "Lunch, team"),
        (15, Kind::Income, Decimal::from(5000), "salary", ""),
    ] {
        store.add_transaction(TransactionDraft {
            amount,
            description: memo.into(),
            occurred_at: Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap(),
            category_id: cat.into(),
            kind,
        });
    }
    store
}

fn run(store: &Store, args: &[&str]) -> anyhow::Result<()> {
    let cli = cli::build_cli();
    let matches = cli.get_matches_from(args);
    if let Some(("export", export_m)) = matches.subcommand() {
        exporter::handle(store, export_m)
    } else {
        panic!("no export subcommand");
    }
}

#[test]
fn export_csv_writes_legacy_layout() {
    let store = seeded();
    let dir = tempdir().unwrap();
    let out = dir.path().join("export.csv");
    let out_str = out.to_string_lossy().to_string();

    run(&store, &["pocketledger", "export", "csv", "--out", &out_str]).unwrap();

    let contents = std::fs::read_to_string(&out).unwrap();
    assert_eq!(
        contents,
        "Date,Income/Expenses,Category,Memo,Amount\n\
         2024-3-5,Expenses,Food,\"Lunch, team\",-12.5\n\
         2024-3-15,Income,Salary,,5000\n"
    );
}

#[test]
fn export_csv_filters_by_date_range() {
    let store = seeded();
    let dir = tempdir().unwrap();
    let out = dir.path().join("export.csv");
    let out_str = out.to_string_lossy().to_string();

    run(
        &store,
        &["pocketledger", "export", "csv", "--out", &out_str, "--from", "2024-03-10"],
    )
    .unwrap();

    let contents = std::fs::read_to_string(&out).unwrap();
    assert_eq!(contents.lines().count(), 2);
    assert!(contents.contains("Salary"));
}

#[test]
fn export_csv_rejects_inverted_range() {
    let store = seeded();
    let dir = tempdir().unwrap();
    let out = dir.path().join("export.csv");
    let out_str = out.to_string_lossy().to_string();

    let err = run(
        &store,
        &[
            "pocketledger", "export", "csv", "--out", &out_str, "--from", "2024-04-01", "--to",
            "2024-03-01",
        ],
    )
    .unwrap_err();
    assert!(err.to_string().contains("is after"));
    assert!(!out.exists());
}

#[test]
fn export_json_reimports_into_fresh_store() {
    let store = seeded();
    let dir = tempdir().unwrap();
    let out = dir.path().join("ledger.json");
    let out_str = out.to_string_lossy().to_string();

    run(&store, &["pocketledger", "export", "json", "--out", &out_str]).unwrap();

    let restored = Store::new();
    restored
        .import_json(&std::fs::read_to_string(&out).unwrap())
        .unwrap();
    assert_eq!(restored.transactions(), store.transactions());
}
