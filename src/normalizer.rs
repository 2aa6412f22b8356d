// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! CSV import normalization.
//!
//! Turns the legacy `Date,Income/Expenses,Category,Memo,Amount` export into
//! transaction drafts and newly seen categories. Nothing in here returns an
//! error for bad rows: each row either parses, is repaired, or is dropped,
//! and every repair or drop is recorded as a [`RowIssue`].

use std::borrow::Cow;
use std::collections::HashSet;
use std::ops::Range;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Category, Kind, TransactionDraft};

pub const DEFAULT_INCOME_CATEGORY: &str = "other_income";
pub const DEFAULT_EXPENSE_CATEGORY: &str = "others";
pub const FALLBACK_ICON: &str = "🏷️";

/// Income rows in these categories below this amount are re-checked for a
/// truncated comma-grouped amount.
pub const INCOME_CORRECTION_THRESHOLD: Decimal = Decimal::ONE_THOUSAND;

const MIN_FIELDS: usize = 5;
const AMOUNT_FIELD: usize = 4;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static GROUPED_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d{1,3}(?:,\d{3})+(?:\.\d+)?$").unwrap());
static TRAILING_GROUPED_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?:^|[^0-9])(\d{1,3}(?:,\d{3})+(?:\.\d+)?)"?\s*$"#).unwrap());
static INCOME_CORRECTION_CATEGORY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:salary|bonus)").unwrap());

/// Icon for a category id, falling back to [`FALLBACK_ICON`].
pub fn icon_for(category_id: &str) -> &'static str {
    match category_id {
        "salary" => "💰",
        "bonus" => "🎁",
        "investment" => "📈",
        "other_income" => "💵",
        "food" => "🍔",
        "transport" => "🚌",
        "shopping" => "🛍️",
        "housing" => "🏠",
        "utilities" => "💡",
        "entertainment" => "🎬",
        "health" => "💊",
        "self_care" => "💆",
        "education" => "📚",
        "travel" => "✈️",
        "others" => "📦",
        _ => FALLBACK_ICON,
    }
}

/// Categories every fresh ledger starts with.
pub fn default_categories() -> Vec<Category> {
    [
        ("salary", "Salary", Kind::Income),
        ("bonus", "Bonus", Kind::Income),
        ("investment", "Investment", Kind::Income),
        (DEFAULT_INCOME_CATEGORY, "Other Income", Kind::Income),
        ("food", "Food", Kind::Expense),
        ("transport", "Transport", Kind::Expense),
        ("shopping", "Shopping", Kind::Expense),
        ("housing", "Housing", Kind::Expense),
        ("utilities", "Utilities", Kind::Expense),
        ("entertainment", "Entertainment", Kind::Expense),
        ("health", "Health", Kind::Expense),
        ("education", "Education", Kind::Expense),
        ("travel", "Travel", Kind::Expense),
        (DEFAULT_EXPENSE_CATEGORY, "Others", Kind::Expense),
    ]
    .into_iter()
    .map(|(id, name, kind)| Category::new(id, name, icon_for(id), kind))
    .collect()
}

/// Outcome of the multi-stage amount parse.
#[derive(Debug, Clone, PartialEq)]
pub enum AmountParse {
    Parsed(Decimal),
    /// Every stage failed; the row is kept with amount zero.
    Defaulted { raw: String },
}

impl AmountParse {
    pub fn value(&self) -> Decimal {
        match self {
            AmountParse::Parsed(d) => *d,
            AmountParse::Defaulted { .. } => Decimal::ZERO,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, AmountParse::Defaulted { .. })
    }
}

/// Why a row could not be turned into a draft.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("invalid date '{0}'")]
    InvalidDate(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RowIssueKind {
    /// An unquoted comma-grouped amount was rejoined before splitting.
    AmountRepaired { amount: String },
    /// A truncated income amount was replaced by the trailing grouped number.
    IncomeAmountCorrected { from: Decimal, to: Decimal },
    AmountDefaulted { raw: String },
    /// The row was removed by the final validity filter.
    Dropped { reason: RowError },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowIssue {
    /// 1-based line number in the source text, header included.
    pub line: usize,
    pub kind: RowIssueKind,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizeReport {
    pub transactions: Vec<TransactionDraft>,
    pub new_categories: Vec<Category>,
    pub issues: Vec<RowIssue>,
}

impl NormalizeReport {
    pub fn dropped(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| matches!(i.kind, RowIssueKind::Dropped { .. }))
            .count()
    }
}

/// Normalize CSV text against the default category set.
pub fn normalize(raw: &str) -> NormalizeReport {
    let known: HashSet<String> = default_categories().into_iter().map(|c| c.id).collect();
    normalize_with_known(raw, &known)
}

/// Normalize CSV text; `known` holds category ids that must not be recreated.
pub fn normalize_with_known(raw: &str, known: &HashSet<String>) -> NormalizeReport {
    let mut report = NormalizeReport::default();
    let mut seen: HashSet<String> = HashSet::new();

    let rows = raw
        .trim_start_matches('\u{feff}')
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .skip(1);

    for (idx, line) in rows {
        let line_no = idx + 1;
        match normalize_row(line_no, line, known, &mut seen, &mut report) {
            Ok(draft) => report.transactions.push(draft),
            Err(reason) => {
                warn!(line = line_no, %reason, "CSV row dropped");
                report.issues.push(RowIssue {
                    line: line_no,
                    kind: RowIssueKind::Dropped { reason },
                });
            }
        }
    }

    debug!(
        rows = report.transactions.len(),
        new_categories = report.new_categories.len(),
        issues = report.issues.len(),
        "normalized CSV import"
    );
    report
}

fn normalize_row(
    line_no: usize,
    line: &str,
    known: &HashSet<String>,
    seen: &mut HashSet<String>,
    report: &mut NormalizeReport,
) -> Result<TransactionDraft, RowError> {
    let repaired = repair_grouped_amount(line);
    if let Cow::Owned(fixed) = &repaired {
        let amount = split_fields(fixed)
            .get(AMOUNT_FIELD)
            .cloned()
            .unwrap_or_default();
        debug!(line = line_no, %amount, "rejoined comma-grouped amount");
        report.issues.push(RowIssue {
            line: line_no,
            kind: RowIssueKind::AmountRepaired { amount },
        });
    }
    let mut fields = split_fields(&repaired);
    if fields.len() < MIN_FIELDS {
        fields.resize(MIN_FIELDS, String::new());
    }

    let occurred_at = parse_csv_date(&fields[0])?;
    let kind = Kind::from_label(&fields[1]);

    let label = fields[2].as_str();
    let category_id = if label.is_empty() {
        match kind {
            Kind::Income => DEFAULT_INCOME_CATEGORY.to_string(),
            Kind::Expense => DEFAULT_EXPENSE_CATEGORY.to_string(),
        }
    } else {
        let id = category_id_for(label);
        if !known.contains(&id) && seen.insert(id.clone()) {
            report
                .new_categories
                .push(Category::new(&id, label, icon_for(&id), kind));
        }
        id
    };

    let parsed = parse_amount(&fields[AMOUNT_FIELD]);
    if let AmountParse::Defaulted { raw } = &parsed {
        report.issues.push(RowIssue {
            line: line_no,
            kind: RowIssueKind::AmountDefaulted { raw: raw.clone() },
        });
    }
    let mut amount = parsed.value();
    if let Some(corrected) = correct_truncated_income(kind, &category_id, amount, line) {
        report.issues.push(RowIssue {
            line: line_no,
            kind: RowIssueKind::IncomeAmountCorrected {
                from: amount,
                to: corrected,
            },
        });
        amount = corrected;
    }

    Ok(TransactionDraft {
        amount,
        description: std::mem::take(&mut fields[3]),
        occurred_at,
        category_id,
        kind,
    })
}

/// Byte ranges of each field. Each quote character toggles quoted state and
/// commas inside a quoted segment do not separate fields. An unclosed quote
/// runs to the end of the line; escaped quotes are not supported.
fn field_spans(line: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                spans.push(start..i);
                start = i + 1;
            }
            _ => {}
        }
    }
    spans.push(start..line.len());
    spans
}

/// Split a row into trimmed fields with quote characters removed.
pub fn split_fields(line: &str) -> Vec<String> {
    field_spans(line)
        .into_iter()
        .map(|r| line[r].replace('"', "").trim().to_string())
        .collect()
}

/// Rejoin an unquoted comma-grouped amount such as `2024-3-1,Income,Salary,,40,000`
/// into a single quoted field. Only fires when the row has more than five fields
/// and everything from the amount column onwards reads as one grouped number.
pub fn repair_grouped_amount(line: &str) -> Cow<'_, str> {
    let spans = field_spans(line);
    if spans.len() <= MIN_FIELDS {
        return Cow::Borrowed(line);
    }
    let tail: Vec<&str> = spans[AMOUNT_FIELD..]
        .iter()
        .map(|r| line[r.clone()].trim())
        .collect();
    let joined = tail.join(",");
    if !GROUPED_AMOUNT.is_match(&joined) {
        return Cow::Borrowed(line);
    }
    Cow::Owned(format!(
        "{}\"{}\"",
        &line[..spans[AMOUNT_FIELD].start],
        joined
    ))
}

/// Parse `YYYY-M-D` to midnight UTC of that day.
pub fn parse_csv_date(text: &str) -> Result<DateTime<Utc>, RowError> {
    let invalid = || RowError::InvalidDate(text.to_string());
    let parts: Vec<&str> = text.trim().split('-').collect();
    let [y, m, d] = parts.as_slice() else {
        return Err(invalid());
    };
    let year: i32 = y.trim().parse().map_err(|_| invalid())?;
    let month: u32 = m.trim().parse().map_err(|_| invalid())?;
    let day: u32 = d.trim().parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(invalid)
}

/// Lower-case the label and collapse whitespace runs into underscores.
pub fn category_id_for(label: &str) -> String {
    let lowered = label.trim().to_lowercase();
    WHITESPACE.replace_all(&lowered, "_").into_owned()
}

/// Strip thousands separators and parse; on failure keep only digits, `.` and
/// `-` and try again. The sign is dropped since kind carries it.
pub fn parse_amount(text: &str) -> AmountParse {
    let stripped = text.trim().replace(',', "");
    if let Ok(d) = Decimal::from_str(&stripped) {
        return AmountParse::Parsed(d.abs());
    }
    let digits: String = stripped
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    match Decimal::from_str(&digits) {
        Ok(d) => AmountParse::Parsed(d.abs()),
        Err(_) => AmountParse::Defaulted {
            raw: text.to_string(),
        },
    }
}

/// Known quirk of the legacy export: some salary/bonus rows lose the
/// thousands part of their amount to a stray column. Only income rows in
/// those categories under [`INCOME_CORRECTION_THRESHOLD`] are rechecked.
fn correct_truncated_income(
    kind: Kind,
    category_id: &str,
    parsed: Decimal,
    line: &str,
) -> Option<Decimal> {
    if kind != Kind::Income
        || !INCOME_CORRECTION_CATEGORY.is_match(category_id)
        || parsed >= INCOME_CORRECTION_THRESHOLD
    {
        return None;
    }
    let caps = TRAILING_GROUPED_AMOUNT.captures(line)?;
    let candidate = Decimal::from_str(&caps[1].replace(',', "")).ok()?;
    (candidate > parsed).then_some(candidate)
}
