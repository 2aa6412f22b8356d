// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Errors surfaced by the ledger library.
///
/// Row-level CSV problems never show up here; the normalizer reports those
/// as [`crate::normalizer::RowIssue`] values instead.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A JSON import document was readable but does not have the export shape.
    #[error("Invalid import document: {0}")]
    InvalidDocument(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Category already exists: {0}")]
    DuplicateCategory(String),

    #[error("Invalid month '{0}', expected YYYY-MM")]
    InvalidMonth(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
