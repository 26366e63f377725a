use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use sorter_core::DEFAULT_BANK;
use sorter_import::CategoryRuleTable;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Styled workbook, one worksheet per sheet
    #[default]
    Xlsx,
    /// One JSON file holding every sheet
    Json,
    /// A directory with one CSV per sheet
    Csv,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bank_name: String,
    /// TOML category rules replacing the builtin table.
    pub rules_file: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bank_name: DEFAULT_BANK.to_string(),
            rules_file: None,
            output_dir: PathBuf::from("."),
            format: OutputFormat::Xlsx,
        }
    }
}

/// `<platform config dir>/statement-sorter/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "statement-sorter")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// An explicit path must exist; the default location is optional.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => return Ok(Config::default()),
        },
    };
    let s = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

/// The builtin table, or the one in `path`.
pub fn load_rules(path: Option<&Path>) -> Result<Arc<CategoryRuleTable>> {
    let Some(path) = path else {
        return Ok(CategoryRuleTable::builtin());
    };
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let table = CategoryRuleTable::from_toml(&s)
        .with_context(|| format!("load category rules from {}", path.display()))?;
    Ok(Arc::new(table))
}
