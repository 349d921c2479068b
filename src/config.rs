//! Runtime configuration.
//!
//! Settings come from environment variables (optionally via a `.env`
//! file) and a JSON finance settings file that holds the tenant's tax
//! brackets, pension rates, allowance defaults and request caps.

use crate::error::Result;
use crate::models::FinanceSettings;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_SETTINGS_PATH: &str = "config/finance_settings.json";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// `PAYROLL_BIND_ADDR`
    pub bind_addr: String,
    /// `PAYROLL_SETTINGS_PATH`
    pub settings_path: PathBuf,
    /// `PAYROLL_HOLIDAYS_PATH`; no holidays are applied when unset.
    pub holidays_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            bind_addr: lookup("PAYROLL_BIND_ADDR")
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            settings_path: lookup("PAYROLL_SETTINGS_PATH")
                .unwrap_or_else(|| DEFAULT_SETTINGS_PATH.to_string())
                .into(),
            holidays_path: lookup("PAYROLL_HOLIDAYS_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}

/// Reads and validates the finance settings file.
pub fn load_finance_settings(path: &Path) -> Result<FinanceSettings> {
    let data = std::fs::read_to_string(path)?;
    let settings: FinanceSettings = serde_json::from_str(&data)?;
    settings.validate()?;
    info!(
        path = %path.display(),
        brackets = settings.tax_brackets.brackets().len(),
        "loaded finance settings"
    );
    Ok(settings)
}
