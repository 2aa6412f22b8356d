// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The single source of truth for transactions, categories and the per-month
//! aggregate cache.
//!
//! Every mutation runs read-modify-write under one lock and ends with a full
//! rebuild of the cache, so the cache always matches the transaction list it
//! was built from. Subscribers receive the fresh [`Snapshot`] after the lock
//! is released.

use std::collections::{BTreeMap, HashSet};
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::Datelike;
use serde_json::Value;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::aggregate::{aggregate_month, category_breakdown, months_present};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    Category, CategoryBreakdown, DateRange, ExportDocument, Kind, MonthAggregate, Transaction,
    TransactionDraft, TransactionPatch, UNCATEGORIZED_LABEL, YearMonth,
};
use crate::normalizer::{default_categories, normalize_with_known};
use crate::storage::StateStorage;

pub const CSV_EXPORT_HEADER: [&str; 5] = ["Date", "Income/Expenses", "Category", "Memo", "Amount"];

/// Immutable view of the store at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub transactions: Vec<Transaction>,
    pub categories: Vec<Category>,
    pub current_month: YearMonth,
    pub aggregates: BTreeMap<YearMonth, MonthAggregate>,
}

pub type Listener = Arc<dyn Fn(&Snapshot) + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub new_categories: usize,
    /// CSV rows removed by the final validity filter.
    pub skipped: usize,
}

impl ImportSummary {
    pub fn message(&self) -> String {
        let mut msg = format!(
            "Imported {} transaction{}",
            self.imported,
            if self.imported == 1 { "" } else { "s" }
        );
        if self.new_categories > 0 {
            msg.push_str(&format!(", {} new categories", self.new_categories));
        }
        if self.skipped > 0 {
            msg.push_str(&format!(", {} rows skipped", self.skipped));
        }
        msg
    }
}

struct State {
    transactions: Vec<Transaction>,
    categories: Vec<Category>,
    current_month: YearMonth,
    aggregates: BTreeMap<YearMonth, MonthAggregate>,
}

impl State {
    /// Rebuild the whole cache: every month with a transaction, plus the selected one.
    fn recompute(&mut self) {
        let mut months = months_present(&self.transactions);
        months.insert(self.current_month);
        self.aggregates = months
            .into_iter()
            .map(|m| (m, aggregate_month(&self.transactions, m)))
            .collect();
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            transactions: self.transactions.clone(),
            categories: self.categories.clone(),
            current_month: self.current_month,
            aggregates: self.aggregates.clone(),
        }
    }
}

pub struct Store {
    state: Mutex<State>,
    listeners: Mutex<Vec<Listener>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Empty ledger with the default categories, positioned on the current month.
    pub fn new() -> Self {
        Self::with_data(Vec::new(), default_categories(), YearMonth::current())
    }

    pub fn with_data(
        transactions: Vec<Transaction>,
        categories: Vec<Category>,
        current_month: YearMonth,
    ) -> Self {
        let mut state = State {
            transactions,
            categories,
            current_month,
            aggregates: BTreeMap::new(),
        };
        state.recompute();
        Self {
            state: Mutex::new(state),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Hydrate from persisted state, or start fresh when nothing was saved.
    pub fn load_from(storage: &dyn StateStorage) -> Result<Self> {
        let store = Self::new();
        if let Some(doc) = storage.load()? {
            store
                .import_json(&doc)
                .context("Stored ledger could not be read")?;
        }
        Ok(store)
    }

    pub fn save_to(&self, storage: &dyn StateStorage) -> Result<()> {
        storage.save(&self.export_json())
    }

    /// Register a change listener. Listeners run after the state lock is
    /// released and may call back into the store, including `subscribe`; one
    /// added during a notification first hears the next commit.
    pub fn subscribe(&self, listener: impl Fn(&Snapshot) + Send + Sync + 'static) {
        self.lock_listeners().push(Arc::new(listener));
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_listeners(&self) -> MutexGuard<'_, Vec<Listener>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run one mutation atomically. On `Err` the closure must not have touched
    /// the state; nothing is recomputed or published.
    fn try_commit<T, E>(
        &self,
        op: &'static str,
        f: impl FnOnce(&mut State) -> Result<T, E>,
    ) -> Result<T, E> {
        let (out, snapshot) = {
            let mut state = self.lock();
            let out = f(&mut *state)?;
            state.recompute();
            (out, state.snapshot())
        };
        debug!(
            op,
            transactions = snapshot.transactions.len(),
            months = snapshot.aggregates.len(),
            "store updated"
        );
        let listeners: Vec<Listener> = self.lock_listeners().clone();
        for listener in &listeners {
            listener(&snapshot);
        }
        Ok(out)
    }

    fn commit<T>(&self, op: &'static str, f: impl FnOnce(&mut State) -> T) -> T {
        match self.try_commit::<T, Infallible>(op, |state| Ok(f(state))) {
            Ok(out) => out,
            Err(never) => match never {},
        }
    }

    pub fn add_transaction(&self, draft: TransactionDraft) -> Transaction {
        self.commit("add_transaction", |state| {
            let tx = draft.into_transaction(new_id());
            state.transactions.push(tx.clone());
            tx
        })
    }

    pub fn update_transaction(&self, id: &str, patch: TransactionPatch) -> LedgerResult<Transaction> {
        self.try_commit("update_transaction", |state| {
            let tx = state
                .transactions
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| LedgerError::TransactionNotFound(id.to_string()))?;
            patch.apply(tx);
            Ok(tx.clone())
        })
    }

    pub fn delete_transaction(&self, id: &str) -> LedgerResult<Transaction> {
        self.try_commit("delete_transaction", |state| {
            let pos = state
                .transactions
                .iter()
                .position(|t| t.id == id)
                .ok_or_else(|| LedgerError::TransactionNotFound(id.to_string()))?;
            Ok(state.transactions.remove(pos))
        })
    }

    pub fn set_current_month(&self, month: YearMonth) {
        self.commit("set_current_month", |state| state.current_month = month)
    }

    pub fn add_category(&self, category: Category) -> LedgerResult<()> {
        self.try_commit("add_category", |state| {
            if state.categories.iter().any(|c| c.id == category.id) {
                return Err(LedgerError::DuplicateCategory(category.id));
            }
            state.categories.push(category);
            Ok(())
        })
    }

    /// Replace transactions (and categories, when present) with an export document.
    pub fn import_json(&self, text: &str) -> LedgerResult<ImportSummary> {
        let (transactions, categories) = parse_document(text)?;
        let summary = ImportSummary {
            imported: transactions.len(),
            new_categories: categories.as_ref().map_or(0, Vec::len),
            skipped: 0,
        };
        self.commit("import_json", |state| {
            state.transactions = transactions;
            if let Some(categories) = categories {
                state.categories = categories;
            }
        });
        info!(imported = summary.imported, "JSON import applied");
        Ok(summary)
    }

    /// Append normalized CSV rows with fresh ids and merge newly seen categories.
    pub fn import_csv(&self, text: &str) -> ImportSummary {
        let summary = self.commit("import_csv", |state| {
            let known: HashSet<String> = state.categories.iter().map(|c| c.id.clone()).collect();
            let report = normalize_with_known(text, &known);
            let mut summary = ImportSummary {
                imported: report.transactions.len(),
                new_categories: 0,
                skipped: report.dropped(),
            };
            state.transactions.extend(
                report
                    .transactions
                    .into_iter()
                    .map(|draft| draft.into_transaction(new_id())),
            );
            for category in report.new_categories {
                if state.categories.iter().any(|c| c.id == category.id) {
                    continue;
                }
                state.categories.push(category);
                summary.new_categories += 1;
            }
            summary
        });
        info!(
            imported = summary.imported,
            new_categories = summary.new_categories,
            skipped = summary.skipped,
            "CSV import applied"
        );
        summary
    }

    pub fn export_json(&self) -> String {
        let doc = {
            let state = self.lock();
            ExportDocument {
                transactions: state.transactions.clone(),
                categories: state.categories.clone(),
            }
        };
        serde_json::to_string_pretty(&doc).unwrap_or_else(|e| {
            error!(error = %e, "ledger document failed to serialize");
            String::from(r#"{"transactions":[],"categories":[]}"#)
        })
    }

    /// Legacy CSV layout, oldest first; `range` bounds are inclusive dates.
    pub fn export_csv(&self, range: Option<DateRange>) -> Result<String> {
        let snapshot = self.snapshot();
        let mut rows: Vec<&Transaction> = snapshot
            .transactions
            .iter()
            .filter(|t| range.is_none_or(|r| r.contains(&t.occurred_at)))
            .collect();
        rows.sort_by_key(|t| t.occurred_at);

        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(CSV_EXPORT_HEADER)?;
        for tx in rows {
            let d = tx.occurred_at.date_naive();
            wtr.write_record([
                format!("{}-{}-{}", d.year(), d.month(), d.day()),
                match tx.kind {
                    Kind::Income => "Income".to_string(),
                    Kind::Expense => "Expenses".to_string(),
                },
                label_for(&snapshot.categories, &tx.category_id),
                tx.description.clone(),
                tx.signed_amount().normalize().to_string(),
            ])?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| anyhow::anyhow!("Flush CSV export: {}", e.error()))?;
        String::from_utf8(bytes).context("CSV export is not UTF-8")
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.lock().transactions.clone()
    }

    pub fn transaction(&self, id: &str) -> Option<Transaction> {
        self.lock().transactions.iter().find(|t| t.id == id).cloned()
    }

    pub fn categories(&self) -> Vec<Category> {
        self.lock().categories.clone()
    }

    pub fn current_month(&self) -> YearMonth {
        self.lock().current_month
    }

    pub fn current_aggregate(&self) -> MonthAggregate {
        let state = self.lock();
        state
            .aggregates
            .get(&state.current_month)
            .cloned()
            .unwrap_or_else(|| MonthAggregate::empty(state.current_month))
    }

    /// Cached aggregate; `None` for months that are neither selected nor populated.
    pub fn month_aggregate(&self, month: YearMonth) -> Option<MonthAggregate> {
        self.lock().aggregates.get(&month).cloned()
    }

    pub fn months(&self) -> Vec<YearMonth> {
        self.lock().aggregates.keys().copied().collect()
    }

    /// Category name, or "Uncategorized" when the id does not resolve.
    pub fn category_label(&self, category_id: &str) -> String {
        label_for(&self.lock().categories, category_id)
    }

    /// Breakdown over one cached month, or over every transaction when `month` is `None`.
    pub fn breakdown(&self, kind: Kind, month: Option<YearMonth>) -> CategoryBreakdown {
        let state = self.lock();
        match month {
            Some(m) => state
                .aggregates
                .get(&m)
                .map(|agg| category_breakdown(&agg.transactions, kind))
                .unwrap_or_default(),
            None => category_breakdown(&state.transactions, kind),
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn label_for(categories: &[Category], category_id: &str) -> String {
    categories
        .iter()
        .find(|c| c.id == category_id)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| UNCATEGORIZED_LABEL.to_string())
}

/// Validate an export document without touching any state.
fn parse_document(text: &str) -> LedgerResult<(Vec<Transaction>, Option<Vec<Category>>)> {
    let value: Value = serde_json::from_str(text)?;
    let Some(raw_txs) = value.get("transactions").filter(|v| v.is_array()) else {
        return Err(LedgerError::InvalidDocument(
            "missing transactions list".to_string(),
        ));
    };
    let mut transactions: Vec<Transaction> = serde_json::from_value(raw_txs.clone())?;
    for tx in transactions.iter_mut().filter(|t| t.id.is_empty()) {
        tx.id = new_id();
    }
    let categories = match value.get("categories") {
        Some(v) if v.is_array() => Some(serde_json::from_value::<Vec<Category>>(v.clone())?),
        _ => None,
    };
    Ok((transactions, categories))
}
