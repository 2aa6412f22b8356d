// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use pocketledger::models::{
    Category, DateRange, Kind, Transaction, TransactionDraft, TransactionPatch, YearMonth,
};
use pocketledger::{LedgerError, Store};
use rust_decimal::Decimal;

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn ym(y: i32, m: u32) -> YearMonth {
    YearMonth::new(y, m).unwrap()
}

fn draft(kind: Kind, amount: Decimal, when: DateTime<Utc>, cat: &str, memo: &str) -> TransactionDraft {
    TransactionDraft {
        amount,
        description: memo.into(),
        occurred_at: when,
        category_id: cat.into(),
        kind,
    }
}

fn store_in_march() -> Store {
    let store = Store::new();
    store.set_current_month(ym(2024, 3));
    store
}

fn sorted_transactions(store: &Store) -> Vec<Transaction> {
    let mut txs = store.transactions();
    txs.sort_by(|a, b| a.id.cmp(&b.id));
    txs
}

fn sorted_categories(store: &Store) -> Vec<Category> {
    let mut cats = store.categories();
    cats.sort_by(|a, b| a.id.cmp(&b.id));
    cats
}

#[test]
fn add_assigns_unique_ids_and_updates_cache() {
    let store = store_in_march();
    let a = store.add_transaction(draft(Kind::Income, Decimal::from(5000), at(2024, 3, 1), "salary", ""));
    let b = store.add_transaction(draft(Kind::Expense, Decimal::from(40), at(2024, 3, 2), "food", "Lunch"));
    assert_ne!(a.id, b.id);
    assert!(!a.id.is_empty());

    let agg = store.current_aggregate();
    assert_eq!(agg.total_income, Decimal::from(5000));
    assert_eq!(agg.total_expense, Decimal::from(40));
    assert_eq!(agg.balance, Decimal::from(4960));
    assert_eq!(agg.transactions.len(), 2);
}

#[test]
fn empty_selected_month_stays_cached() {
    let store = store_in_march();
    store.add_transaction(draft(Kind::Expense, Decimal::TEN, at(2024, 3, 2), "food", ""));
    store.set_current_month(ym(2030, 1));

    let agg = store.month_aggregate(ym(2030, 1)).expect("selected month cached");
    assert!(agg.transactions.is_empty());
    assert!(agg.total_income.is_zero());
    assert!(agg.total_expense.is_zero());
    assert!(agg.balance.is_zero());
    assert_eq!(store.months(), vec![ym(2024, 3), ym(2030, 1)]);
    assert!(store.month_aggregate(ym(2024, 4)).is_none());
}

#[test]
fn update_patches_fields_and_moves_months() {
    let store = store_in_march();
    let tx = store.add_transaction(draft(Kind::Expense, Decimal::TEN, at(2024, 2, 10), "food", "Snack"));
    assert!(store.month_aggregate(ym(2024, 2)).is_some());

    let updated = store
        .update_transaction(
            &tx.id,
            TransactionPatch {
                amount: Some(Decimal::from(12)),
                occurred_at: Some(at(2024, 3, 5)),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.id, tx.id);
    assert_eq!(updated.amount, Decimal::from(12));
    assert_eq!(updated.description, "Snack");
    assert_eq!(updated.category_id, "food");

    assert!(store.month_aggregate(ym(2024, 2)).is_none());
    assert_eq!(store.current_aggregate().total_expense, Decimal::from(12));
}

#[test]
fn update_and_delete_unknown_id_fail_without_notifying() {
    let store = store_in_march();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    store.subscribe(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });

    let err = store
        .update_transaction("missing", TransactionPatch::default())
        .unwrap_err();
    assert!(matches!(err, LedgerError::TransactionNotFound(ref id) if id == "missing"));
    assert!(matches!(
        store.delete_transaction("missing"),
        Err(LedgerError::TransactionNotFound(_))
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn delete_removes_from_cache() {
    let store = store_in_march();
    let tx = store.add_transaction(draft(Kind::Expense, Decimal::TEN, at(2024, 3, 2), "food", ""));
    let removed = store.delete_transaction(&tx.id).unwrap();
    assert_eq!(removed, tx);
    assert!(store.transactions().is_empty());
    assert!(store.current_aggregate().transactions.is_empty());
    assert!(store.transaction(&tx.id).is_none());
}

#[test]
fn subscribers_receive_fresh_snapshots() {
    let store = store_in_march();
    let counts = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&counts);
    store.subscribe(move |snap| {
        seen.store(snap.transactions.len(), Ordering::SeqCst);
        assert!(snap.aggregates.contains_key(&snap.current_month));
    });
    store.add_transaction(draft(Kind::Expense, Decimal::ONE, at(2024, 3, 2), "food", ""));
    store.add_transaction(draft(Kind::Expense, Decimal::ONE, at(2024, 5, 2), "food", ""));
    assert_eq!(counts.load(Ordering::SeqCst), 2);
}

#[test]
fn json_round_trip_reproduces_ledger() {
    let store = store_in_march();
    store.add_transaction(draft(Kind::Income, Decimal::from(5000), at(2024, 3, 1), "salary", ""));
    store.add_transaction(draft(Kind::Expense, Decimal::new(1250, 2), at(2024, 3, 2), "food", "Lunch, team"));
    store.add_transaction(draft(Kind::Expense, Decimal::new(1, 1), at(2024, 4, 9), "gone", ""));
    store.import_csv("Date,Income/Expenses,Category,Memo,Amount\n2024-3-9,Expense,Self Care,Massage,80");

    let exported = store.export_json();
    let restored = Store::new();
    let summary = restored.import_json(&exported).unwrap();
    assert_eq!(summary.imported, 4);

    assert_eq!(sorted_transactions(&restored), sorted_transactions(&store));
    assert_eq!(sorted_categories(&restored), sorted_categories(&store));
    assert_eq!(restored.export_json(), exported);
}

#[test]
fn export_json_uses_documented_field_names() {
    let store = store_in_march();
    store.add_transaction(draft(Kind::Expense, Decimal::new(1250, 2), at(2024, 3, 2), "food", "Lunch"));
    let doc: serde_json::Value = serde_json::from_str(&store.export_json()).unwrap();
    let tx = &doc["transactions"][0];
    assert_eq!(tx["amount"], serde_json::json!(12.5));
    assert_eq!(tx["date"], "2024-03-02T00:00:00Z");
    assert_eq!(tx["categoryId"], "food");
    assert_eq!(tx["type"], "expense");
    assert_eq!(tx["description"], "Lunch");
    assert!(doc["categories"].as_array().unwrap().iter().any(|c| c["id"] == "salary" && c["type"] == "income"));
}

#[test]
fn import_json_rejects_documents_without_transactions() {
    let store = store_in_march();
    store.add_transaction(draft(Kind::Expense, Decimal::TEN, at(2024, 3, 2), "food", ""));
    let before = store.export_json();

    for bad in [r#"{"categories": []}"#, r#"{"transactions": 5}"#, "[]", "not json"] {
        assert!(store.import_json(bad).is_err(), "accepted {}", bad);
    }
    assert!(matches!(
        store.import_json(r#"{"categories": []}"#),
        Err(LedgerError::InvalidDocument(_))
    ));
    assert_eq!(store.export_json(), before);
}

#[test]
fn import_json_without_categories_keeps_existing_ones() {
    let store = store_in_march();
    store
        .add_category(Category::new("pets", "Pets", "🐶", Kind::Expense))
        .unwrap();
    let doc = r#"{"transactions": [
        {"id": 17, "amount": "1,200", "date": "2024-03-04", "categoryId": "pets", "type": "expense"},
        {"id": "b", "amount": 3.5, "description": "x", "date": "2024-03-05T10:00:00.000Z", "categoryId": "food", "type": "income"}
    ]}"#;
    let summary = store.import_json(doc).unwrap();
    assert_eq!(summary.imported, 2);
    assert!(store.categories().iter().any(|c| c.id == "pets"));

    let first = store.transaction("17").unwrap();
    assert_eq!(first.amount, Decimal::from(1200));
    assert_eq!(first.description, "");
    assert_eq!(first.occurred_at, at(2024, 3, 4));
    assert_eq!(store.current_aggregate().total_income, Decimal::new(35, 1));
}

#[test]
fn csv_import_appends_and_merges_categories() {
    let store = store_in_march();
    store.add_transaction(draft(Kind::Expense, Decimal::TEN, at(2024, 3, 2), "food", ""));
    let csv = "Date,Income/Expenses,Category,Memo,Amount\n\
               2024-3-15,Income,Salary,,5000\n\
               2024-3-16,Expenses,Self Care,Massage,80\n\
               bad-date,Expenses,Food,,1";

    let summary = store.import_csv(csv);
    assert_eq!(summary.imported, 2);
    assert_eq!(summary.new_categories, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.message(), "Imported 2 transactions, 1 new categories, 1 rows skipped");
    assert_eq!(store.transactions().len(), 3);
    assert_eq!(store.current_aggregate().total_expense, Decimal::from(90));

    let again = store.import_csv(csv);
    assert_eq!(again.new_categories, 0);
    assert_eq!(
        store.categories().iter().filter(|c| c.id == "self_care").count(),
        1
    );
    let ids: std::collections::HashSet<String> =
        store.transactions().into_iter().map(|t| t.id).collect();
    assert_eq!(ids.len(), 5);
}

#[test]
fn duplicate_category_is_rejected() {
    let store = Store::new();
    let err = store
        .add_category(Category::new("food", "Food 2", "🍕", Kind::Expense))
        .unwrap_err();
    assert!(matches!(err, LedgerError::DuplicateCategory(ref id) if id == "food"));
}

#[test]
fn orphaned_category_reads_as_uncategorized() {
    let store = Store::new();
    assert_eq!(store.category_label("food"), "Food");
    assert_eq!(store.category_label("no_such_thing"), "Uncategorized");
}

#[test]
fn breakdown_for_month_and_overall() {
    let store = store_in_march();
    store.add_transaction(draft(Kind::Expense, Decimal::from(30), at(2024, 3, 2), "food", ""));
    store.add_transaction(draft(Kind::Expense, Decimal::from(10), at(2024, 3, 3), "transport", ""));
    store.add_transaction(draft(Kind::Expense, Decimal::from(60), at(2024, 4, 3), "food", ""));

    let march = store.breakdown(Kind::Expense, Some(ym(2024, 3)));
    assert_eq!(march.totals["food"], Decimal::from(30));
    assert_eq!(march.percentages["food"], Decimal::from(75));

    let all = store.breakdown(Kind::Expense, None);
    assert_eq!(all.totals["food"], Decimal::from(90));
    assert_eq!(all.percentages["transport"], Decimal::from(10));

    assert!(store.breakdown(Kind::Expense, Some(ym(1999, 1))).totals.is_empty());
}

#[test]
fn csv_export_formats_rows_and_honours_range() {
    let store = store_in_march();
    store.add_transaction(draft(Kind::Income, Decimal::from(5000), at(2024, 3, 15), "salary", ""));
    store.add_transaction(draft(Kind::Expense, Decimal::new(1250, 2), at(2024, 3, 5), "food", "Lunch, team"));
    store.add_transaction(draft(Kind::Expense, Decimal::from(3), at(2024, 4, 1), "nowhere", "Gum"));

    let all = store.export_csv(None).unwrap();
    assert_eq!(
        all,
        "Date,Income/Expenses,Category,Memo,Amount\n\
         2024-3-5,Expenses,Food,\"Lunch, team\",-12.5\n\
         2024-3-15,Income,Salary,,5000\n\
         2024-4-1,Expenses,Uncategorized,Gum,-3\n"
    );

    let range = DateRange {
        from: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        to: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
    };
    let some = store.export_csv(Some(range)).unwrap();
    assert_eq!(some.lines().count(), 3);
    assert!(!some.contains("Lunch"));
}

#[test]
fn exported_csv_reimports_equivalently() {
    let source = store_in_march();
    source.add_transaction(draft(Kind::Income, Decimal::from(40000), at(2024, 3, 1), "salary", ""));
    source.add_transaction(draft(Kind::Expense, Decimal::new(1250, 2), at(2024, 3, 5), "food", "Lunch, team"));
    let csv = source.export_csv(None).unwrap();

    let target = store_in_march();
    let summary = target.import_csv(&csv);
    assert_eq!(summary.imported, 2);
    let (want, got) = (source.current_aggregate(), target.current_aggregate());
    assert_eq!(got.total_income, want.total_income);
    assert_eq!(got.total_expense, want.total_expense);
    assert_eq!(got.balance, want.balance);
    let memo: Vec<String> = target.transactions().into_iter().map(|t| t.description).collect();
    assert!(memo.contains(&"Lunch, team".to_string()));
}

#[test]
fn import_json_with_huge_amounts_saturates_month_totals() {
    let store = store_in_march();
    let doc = r#"{"transactions": [
        {"id": "a", "amount": "70000000000000000000000000000", "date": "2024-03-01", "categoryId": "food", "type": "expense"},
        {"id": "b", "amount": "70000000000000000000000000000", "date": "2024-03-02", "categoryId": "food", "type": "expense"}
    ]}"#;
    store.import_json(doc).unwrap();
    assert_eq!(store.transactions().len(), 2);
    let agg = store.current_aggregate();
    assert_eq!(agg.total_expense, Decimal::MAX);
    assert_eq!(agg.balance, -Decimal::MAX);
    assert_eq!(agg.transactions.len(), 2);
}

#[test]
fn json_round_trip_keeps_high_precision_amounts() {
    let store = store_in_march();
    let amount = Decimal::from_str_exact("12345678901234567.89").unwrap();
    let tx = store.add_transaction(draft(Kind::Income, amount, at(2024, 3, 1), "salary", ""));

    let exported = store.export_json();
    assert!(exported.contains("12345678901234567.89"));
    let restored = Store::new();
    restored.import_json(&exported).unwrap();
    assert_eq!(restored.transaction(&tx.id).unwrap().amount, amount);
    assert_eq!(restored.export_json(), exported);
}

#[test]
fn import_json_reads_exponent_amounts_and_rejects_fractional_ids() {
    let store = store_in_march();
    let doc = r#"{"transactions": [
        {"id": "e", "amount": 1.5e3, "date": "2024-03-01", "categoryId": "food", "type": "expense"}
    ]}"#;
    store.import_json(doc).unwrap();
    assert_eq!(store.transaction("e").unwrap().amount, Decimal::from(1500));

    let before = store.export_json();
    let bad = r#"{"transactions": [
        {"id": 1e20, "amount": 1, "date": "2024-03-01", "categoryId": "food", "type": "expense"}
    ]}"#;
    assert!(store.import_json(bad).is_err());
    assert_eq!(store.export_json(), before);
}

#[test]
fn listener_may_subscribe_during_notification() {
    let store = Arc::new(store_in_march());
    let late_calls = Arc::new(AtomicUsize::new(0));
    let registered = Arc::new(AtomicUsize::new(0));

    let weak = Arc::downgrade(&store);
    let (late, once) = (Arc::clone(&late_calls), Arc::clone(&registered));
    store.subscribe(move |_| {
        if once.fetch_add(1, Ordering::SeqCst) == 0 {
            if let Some(store) = weak.upgrade() {
                let late = Arc::clone(&late);
                store.subscribe(move |_| {
                    late.fetch_add(1, Ordering::SeqCst);
                });
            }
        }
    });

    store.add_transaction(draft(Kind::Expense, Decimal::ONE, at(2024, 3, 2), "food", ""));
    assert_eq!(late_calls.load(Ordering::SeqCst), 0);
    store.add_transaction(draft(Kind::Expense, Decimal::ONE, at(2024, 3, 3), "food", ""));
    assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    assert_eq!(registered.load(Ordering::SeqCst), 2);
}
