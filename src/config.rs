// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Pocketledger", "pocketledger"));

pub const DATA_ENV: &str = "POCKETLEDGER_DATA";
pub const CURRENCY_ENV: &str = "POCKETLEDGER_CURRENCY";
pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_file: PathBuf,
    /// Display-only; amounts are never converted.
    pub currency: String,
}

impl Config {
    /// Resolve from an explicit path, then the environment, then platform defaults.
    pub fn resolve(data_override: Option<&str>) -> Result<Self> {
        let data_file = match data_override
            .map(str::to_string)
            .or_else(|| std::env::var(DATA_ENV).ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
        {
            Some(p) => PathBuf::from(p),
            None => default_data_file()?,
        };
        let currency = std::env::var(CURRENCY_ENV)
            .ok()
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
        Ok(Self {
            data_file,
            currency,
        })
    }
}

pub fn default_data_file() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    Ok(proj.data_dir().join("pocketledger.json"))
}
