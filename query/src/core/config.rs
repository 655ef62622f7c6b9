use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::filters::{CompilerOptions, OrderPriority, ParseLimits};
use crate::data::sqlite::Pagination;
use crate::utils::file::expand_path;
use crate::utils::sql::IdentQuote;

use super::cli::CliConfig;
use super::constants::{APP_DOT_FOLDER, CONFIG_FILE_NAME};

// =============================================================================
// File Config Sections
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CompilerFileConfig {
    pub alias: Option<String>,
    pub quote: Option<IdentQuote>,
    pub order_priority: Option<OrderPriority>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitsFileConfig {
    pub max_json_bytes: Option<usize>,
    pub max_depth: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaginationFileConfig {
    pub default_take: Option<i64>,
    pub max_take: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DatabaseFileConfig {
    pub path: Option<String>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub compiler: Option<CompilerFileConfig>,
    pub limits: Option<LimitsFileConfig>,
    pub pagination: Option<PaginationFileConfig>,
    pub database: Option<DatabaseFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(compiler) = other.compiler {
            let current = self
                .compiler
                .get_or_insert_with(CompilerFileConfig::default);
            if compiler.alias.is_some() {
                tracing::trace!(alias = ?compiler.alias, "Merging compiler.alias");
                current.alias = compiler.alias;
            }
            if compiler.quote.is_some() {
                tracing::trace!(quote = ?compiler.quote, "Merging compiler.quote");
                current.quote = compiler.quote;
            }
            if compiler.order_priority.is_some() {
                tracing::trace!(
                    order_priority = ?compiler.order_priority,
                    "Merging compiler.order_priority"
                );
                current.order_priority = compiler.order_priority;
            }
        }

        if let Some(limits) = other.limits {
            let current = self.limits.get_or_insert_with(LimitsFileConfig::default);
            if limits.max_json_bytes.is_some() {
                tracing::trace!(max_json_bytes = ?limits.max_json_bytes, "Merging limits.max_json_bytes");
                current.max_json_bytes = limits.max_json_bytes;
            }
            if limits.max_depth.is_some() {
                tracing::trace!(max_depth = ?limits.max_depth, "Merging limits.max_depth");
                current.max_depth = limits.max_depth;
            }
        }

        if let Some(pagination) = other.pagination {
            let current = self
                .pagination
                .get_or_insert_with(PaginationFileConfig::default);
            if pagination.default_take.is_some() {
                tracing::trace!(default_take = ?pagination.default_take, "Merging pagination.default_take");
                current.default_take = pagination.default_take;
            }
            if pagination.max_take.is_some() {
                tracing::trace!(max_take = ?pagination.max_take, "Merging pagination.max_take");
                current.max_take = pagination.max_take;
            }
        }

        if let Some(database) = other.database {
            let current = self
                .database
                .get_or_insert_with(DatabaseFileConfig::default);
            if database.path.is_some() {
                tracing::trace!(path = ?database.path, "Merging database.path");
                current.path = database.path;
            }
        }
    }
}

/// Final merged application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub compiler: CompilerOptions,
    pub limits: ParseLimits,
    pub pagination: Pagination,
    pub database: Option<PathBuf>,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.toolkitq/toolkitq.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        Self::load_from_sources(cli, get_profile_config_path())
    }

    /// Load with an explicit profile config path (`None` skips the profile layer)
    fn load_from_sources(cli: &CliConfig, profile: Option<PathBuf>) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = profile
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let config = Self::layer(cli, file_config);
        config.validate()?;
        tracing::debug!(config = ?config, "Configuration loaded");
        Ok(config)
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    pub(crate) fn layer(cli: &CliConfig, file_config: FileConfig) -> Self {
        let file_compiler = file_config.compiler.unwrap_or_default();
        let file_limits = file_config.limits.unwrap_or_default();
        let file_pagination = file_config.pagination.unwrap_or_default();
        let file_database = file_config.database.unwrap_or_default();

        let default_compiler = CompilerOptions::default();
        let compiler = CompilerOptions {
            alias: cli
                .alias
                .clone()
                .or(file_compiler.alias)
                .unwrap_or(default_compiler.alias),
            quote: cli
                .quote
                .or(file_compiler.quote)
                .unwrap_or(default_compiler.quote),
            order_priority: cli
                .order_priority
                .or(file_compiler.order_priority)
                .unwrap_or(default_compiler.order_priority),
        };

        let default_limits = ParseLimits::default();
        let limits = ParseLimits {
            max_json_bytes: file_limits
                .max_json_bytes
                .unwrap_or(default_limits.max_json_bytes),
            max_depth: file_limits.max_depth.unwrap_or(default_limits.max_depth),
        };

        let default_pagination = Pagination::default();
        let pagination = Pagination {
            default_take: file_pagination
                .default_take
                .unwrap_or(default_pagination.default_take),
            max_take: file_pagination
                .max_take
                .unwrap_or(default_pagination.max_take),
        };

        let database = cli
            .database
            .as_ref()
            .map(|p| expand_path(&p.to_string_lossy()))
            .or_else(|| file_database.path.as_deref().map(expand_path));

        Self {
            compiler,
            limits,
            pagination,
            database,
        }
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.compiler.alias.trim().is_empty() {
            anyhow::bail!("Configuration error: compiler.alias must not be empty");
        }
        if self.limits.max_json_bytes == 0 {
            anyhow::bail!("Configuration error: limits.max_json_bytes must be greater than 0");
        }
        if self.limits.max_depth == 0 {
            anyhow::bail!("Configuration error: limits.max_depth must be greater than 0");
        }
        if self.pagination.default_take <= 0 {
            anyhow::bail!("Configuration error: pagination.default_take must be greater than 0");
        }
        if self.pagination.max_take < self.pagination.default_take {
            anyhow::bail!(
                "Configuration error: pagination.max_take ({}) must not be less than \
                 pagination.default_take ({})",
                self.pagination.max_take,
                self.pagination.default_take
            );
        }
        Ok(())
    }
}

/// Get the profile config path (~/.toolkitq/toolkitq.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}
