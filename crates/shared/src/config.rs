//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Ledger workflow configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Batch import configuration.
    #[serde(default)]
    pub import: ImportConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ledger workflow configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Entry kinds whose approval posts the entry in the same step.
    #[serde(default = "default_auto_post_kinds")]
    pub auto_post_kinds: Vec<String>,
    /// Whether a reversal may be dated before the entry it reverses.
    #[serde(default)]
    pub allow_backdated_reversal: bool,
}

fn default_auto_post_kinds() -> Vec<String> {
    [
        "contra",
        "payment",
        "receipt",
        "sales",
        "purchase",
        "debit_note",
        "credit_note",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            auto_post_kinds: default_auto_post_kinds(),
            allow_backdated_reversal: false,
        }
    }
}

/// Batch import configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    /// Field delimiter.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Header of the column whose value groups rows into one entry.
    #[serde(default = "default_group_column")]
    pub group_column: String,
    /// `chrono` format string for the date column.
    #[serde(default = "default_date_format")]
    pub date_format: String,
    /// Entry kind used when a group has no kind column value.
    #[serde(default = "default_kind")]
    pub default_kind: String,
    /// Whether committed groups are posted immediately instead of left as drafts.
    #[serde(default)]
    pub post_on_commit: bool,
    /// Whether groups are validated in parallel.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_delimiter() -> char {
    ','
}

fn default_group_column() -> String {
    "group".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

fn default_kind() -> String {
    "journal".to_string()
}

fn default_parallel() -> bool {
    true
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            group_column: default_group_column(),
            date_format: default_date_format(),
            default_kind: default_kind(),
            post_on_commit: false,
            parallel: default_parallel(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "ledgerline=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("LEDGERLINE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("ledger.auto_post_kinds")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
