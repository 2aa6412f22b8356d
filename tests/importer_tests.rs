// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pocketledger::{Store, cli, commands::importer};
use rust_decimal::Decimal;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn importer_trims_cli_path_argument() {
    let store = Store::new();
    let file = write_temp("Date,Income/Expenses,Category,Memo,Amount\n2025-2-3,Expenses,Food,Shop,5.00\n");
    let path = file.path().to_str().unwrap().to_string();
    let padded = format!("  {}  ", path);

    let cli = cli::build_cli();
    let matches = cli.get_matches_from(["pocketledger", "import", "csv", "--path", &padded]);
    if let Some(("import", import_m)) = matches.subcommand() {
        if let Some(("csv", csv_m)) = import_m.subcommand() {
            let summary = importer::import_csv(&store, csv_m).unwrap();
            assert_eq!(summary.imported, 1);
        } else {
            panic!("no csv subcommand");
        }
    } else {
        panic!("no import subcommand");
    }
    assert_eq!(store.transactions()[0].amount, Decimal::from(5));
}

#[test]
fn importer_keeps_going_past_bad_rows() {
    let store = Store::new();
    let file = write_temp(
        "Date,Income/Expenses,Category,Memo,Amount\n\
         2025-13-03,Expenses,Food,Shop,abc\n\
         2025-2-4,Income,Salary,,\"3,100\"\n",
    );
    let path = file.path().to_str().unwrap().to_string();

    let cli = cli::build_cli();
    let matches = cli.get_matches_from(["pocketledger", "import", "csv", "--path", &path]);
    if let Some(("import", import_m)) = matches.subcommand() {
        importer::handle(&store, import_m).unwrap();
    } else {
        panic!("no import subcommand");
    }
    let txs = store.transactions();
    assert_eq!(txs.len(), 1);
    assert_eq!(txs[0].amount, Decimal::from(3100));
    assert_eq!(txs[0].category_id, "salary");
}

#[test]
fn json_import_rejection_leaves_ledger_untouched() {
    let store = Store::new();
    store.import_csv("Date,Income/Expenses,Category,Memo,Amount\n2025-2-3,Expenses,Food,Shop,5\n");
    let before = store.export_json();
    let file = write_temp(r#"{"categories": []}"#);
    let path = file.path().to_str().unwrap().to_string();

    let cli = cli::build_cli();
    let matches = cli.get_matches_from(["pocketledger", "import", "json", "--path", &path]);
    if let Some(("import", import_m)) = matches.subcommand() {
        let err = importer::handle(&store, import_m).unwrap_err();
        assert!(err.to_string().contains("rejected"));
    } else {
        panic!("no import subcommand");
    }
    assert_eq!(store.export_json(), before);
}

#[test]
fn importer_reports_missing_file() {
    let store = Store::new();
    let cli = cli::build_cli();
    let matches = cli.get_matches_from([
        "pocketledger",
        "import",
        "csv",
        "--path",
        "/definitely/not/here.csv",
    ]);
    if let Some(("import", import_m)) = matches.subcommand() {
        let err = importer::handle(&store, import_m).unwrap_err();
        assert!(err.to_string().contains("Open /definitely/not/here.csv"));
    } else {
        panic!("no import subcommand");
    }
}
