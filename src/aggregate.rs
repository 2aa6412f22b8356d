// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;

use crate::models::{CategoryBreakdown, Kind, MonthAggregate, Transaction, YearMonth};

/// Totals and members of `month`, both boundary instants included.
///
/// Sums saturate at the `Decimal` bounds instead of overflowing.
pub fn aggregate_month(transactions: &[Transaction], month: YearMonth) -> MonthAggregate {
    let mut agg = MonthAggregate::empty(month);
    for tx in transactions.iter().filter(|t| month.contains(&t.occurred_at)) {
        match tx.kind {
            Kind::Income => agg.total_income = agg.total_income.saturating_add(tx.amount),
            Kind::Expense => agg.total_expense = agg.total_expense.saturating_add(tx.amount),
        }
        agg.transactions.push(tx.clone());
    }
    agg.balance = agg.total_income.saturating_sub(agg.total_expense);
    agg
}

/// Per-category totals and percentage shares for one kind.
pub fn category_breakdown(transactions: &[Transaction], kind: Kind) -> CategoryBreakdown {
    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    for tx in transactions.iter().filter(|t| t.kind == kind) {
        let total = totals.entry(tx.category_id.clone()).or_insert(Decimal::ZERO);
        *total = total.saturating_add(tx.amount);
    }
    let overall = totals
        .values()
        .fold(Decimal::ZERO, |acc, t| acc.saturating_add(*t));
    let percentages = totals
        .iter()
        .map(|(id, total)| {
            let pct = if overall.is_zero() {
                Decimal::ZERO
            } else {
                *total / overall * Decimal::ONE_HUNDRED
            };
            (id.clone(), pct)
        })
        .collect();
    CategoryBreakdown {
        totals,
        percentages,
    }
}

/// Distinct months touched by `transactions`, ascending.
pub fn months_present(transactions: &[Transaction]) -> BTreeSet<YearMonth> {
    transactions.iter().map(Transaction::month).collect()
}
