use std::sync::{Arc, OnceLock};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use sorter_core::TransactionType;
use thiserror::Error;

/// Built-in categories, most specific first. A category listed earlier shadows
/// any later category whose patterns would also match, so specific variants
/// (e.g. the HRMS sub-heads) must precede their umbrella category.
const BUILTIN_RULES: &[(&str, &[&str])] = &[
    // Deposits
    ("Salary", &[r"salary", r"SAL\s*TRF", r"NEFT.*SAL", r"SAL\s*FOR"]),
    ("DEP TFR  HRMS Mobile", &[r"HRMS\s*Mobile"]),
    ("DEP TFR  HRMS Labour", &[r"HRMS\s*Labour"]),
    ("DEP TFR  HRMS Cleansing", &[r"HRMS\s*Cleansing"]),
    ("DEP TFR  HRMS Briefcase", &[r"HRMS\s*Briefcase"]),
    ("DEP TFR  HRMS Furniture", &[r"HRMS\s*Furniture"]),
    ("DEP TFR  HRMS  Utility", &[r"HRMS.*Utility"]),
    ("DEP TFR  HRMS Pest", &[r"HRMS.*Pest"]),
    (
        "DEP TFR  HRMS",
        &[
            // HRMS not followed by another word
            r"HRMS\s*(?:[^\w\s]|$)",
            r"DEP\s*TFR.*PF\s*No.*HRMS$",
            r"PF\s*No.*\d+\s*HRMS$",
        ],
    ),
    (
        "DEP BANKS PERFORMANCE PLI",
        &[r"BANKS?\s*PERFORMANCE\s*PLI", r"PERFORMANCE\s*PLI"],
    ),
    ("CDS BASED PLI PAID FOR THE FY", &[r"CDS\s*BASED\s*PLI", r"PLI\s*PAID"]),
    (
        "CEMTEX DEP INTER CIRCLE SPORTS",
        &[r"CEMTEX.*DEP", r"INTER\s*CIRCLE\s*SPORTS", r"HALTING\s*ALLOWANCE"],
    ),
    // Withdrawals
    (
        "Bank INTEREST",
        &[r"TO\s*INTEREST", r"INTEREST\s*(?:DR|DEBIT)?$", r"INT\s*(?:CHARGE|DR)"],
    ),
    (
        "DIRECT DR",
        &[r"DIRECT\s*DR", r"SI\s*DR", r"ECS\s*DR", r"NACH\s*DR", r"OFFICER\s*LEVY"],
    ),
    (
        "Transfer to own A/c",
        &[r"TRF\s*TO\s*(?:OWN|SELF)", r"SELF\s*TRF", r"OWN\s*A/?C", r"INB\s*MBS"],
    ),
    ("WDL TFR", &[r"WDL\s*TFR", r"NBT\s*TFR", r"WEL\s*TFR"]),
    ("UPI Payment", &[r"UPI[/-]", r"UPI\s*(?:DR|DEBIT)"]),
    ("NEFT/RTGS", &[r"NEFT", r"RTGS", r"IMPS"]),
    ("ATM Withdrawal", &[r"ATM", r"CASH\s*WDL"]),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    pub patterns: Vec<String>,
}

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("Failed to parse rules TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Failed to serialize rules: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid pattern '{pattern}' in category '{category}': {source}")]
    InvalidPattern {
        category: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Category '{0}' has no patterns")]
    EmptyCategory(String),
}

/// On-disk layout: an array of `[[category]]` tables, in priority order.
#[derive(Debug, Serialize, Deserialize)]
struct RuleFile {
    category: Vec<CategoryRule>,
}

/// Internal pairing of a category with its precompiled patterns.
#[derive(Debug)]
struct CompiledCategory {
    rule: CategoryRule,
    regexes: Vec<Regex>,
}

/// Ordered, immutable category → patterns table.
#[derive(Debug)]
pub struct CategoryRuleTable {
    categories: Vec<CompiledCategory>,
}

impl CategoryRuleTable {
    /// Compile `rules`, keeping their order. Patterns match case-insensitively.
    pub fn new(rules: Vec<CategoryRule>) -> Result<Self, RulesError> {
        let categories = rules
            .into_iter()
            .map(|rule| {
                if rule.patterns.is_empty() {
                    return Err(RulesError::EmptyCategory(rule.name));
                }
                let regexes = rule
                    .patterns
                    .iter()
                    .map(|p| {
                        RegexBuilder::new(p).case_insensitive(true).build().map_err(|source| {
                            RulesError::InvalidPattern {
                                category: rule.name.clone(),
                                pattern: p.clone(),
                                source,
                            }
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CompiledCategory { rule, regexes })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { categories })
    }

    pub fn from_toml(toml_content: &str) -> Result<Self, RulesError> {
        let file: RuleFile = toml::from_str(toml_content)?;
        Self::new(file.category)
    }

    pub fn to_toml(&self) -> Result<String, RulesError> {
        let file = RuleFile { category: self.rules().cloned().collect() };
        Ok(toml::to_string(&file)?)
    }

    /// The process-wide default table, compiled on first use.
    pub fn builtin() -> Arc<CategoryRuleTable> {
        static TABLE: OnceLock<Arc<CategoryRuleTable>> = OnceLock::new();
        TABLE
            .get_or_init(|| {
                Arc::new(Self::new(builtin_rules()).expect("built-in category patterns are valid"))
            })
            .clone()
    }

    pub fn rules(&self) -> impl Iterator<Item = &CategoryRule> {
        self.categories.iter().map(|c| &c.rule)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// First category (in table order) with any pattern found in `description`.
    pub fn find_category(&self, description: &str) -> Option<&str> {
        let text = description.to_uppercase();
        self.categories
            .iter()
            .find(|c| c.regexes.iter().any(|re| re.is_match(&text)))
            .map(|c| c.rule.name.as_str())
    }
}

pub fn builtin_rules() -> Vec<CategoryRule> {
    BUILTIN_RULES
        .iter()
        .map(|(name, patterns)| CategoryRule {
            name: name.to_string(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        })
        .collect()
}

/// Assigns a category to a description, falling back to
/// `Other Deposit` / `Other Withdrawal`.
#[derive(Debug, Clone)]
pub struct Classifier {
    table: Arc<CategoryRuleTable>,
}

impl Classifier {
    pub fn new(table: Arc<CategoryRuleTable>) -> Self {
        Self { table }
    }

    pub fn classify(&self, description: Option<&str>, is_withdrawal: bool) -> String {
        let fallback = TransactionType::from_withdrawal_flag(is_withdrawal).fallback_category();
        let Some(description) = description else {
            return fallback.to_string();
        };
        self.table
            .find_category(description)
            .unwrap_or(fallback)
            .to_string()
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(CategoryRuleTable::builtin())
    }
}
