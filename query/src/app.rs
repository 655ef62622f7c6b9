//! Command-line application

use anyhow::{Context, Result};
use serde_json::json;

use crate::core::cli::{self, Commands, QueryArgs};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME, APP_NAME_LOWER, ENV_LOG};
use crate::data::filters::{CompiledQuery, QueryCompiler, parse_keys, parse_query};
use crate::data::sqlite::{self, SelectPlan};
use crate::utils::file::read_json_arg;

pub struct CoreApp {
    pub config: AppConfig,
    compiler: QueryCompiler,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!(
            app = APP_NAME,
            version = env!("CARGO_PKG_VERSION"),
            "Application starting"
        );

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self::new(AppConfig::load(&cli_config)?);

        match command {
            Commands::Compile { input } => app.handle_compile(&input),
            Commands::Explain { table, input } => app.handle_explain(&table, &input),
            Commands::Count { table, input } => app.handle_count(&table, &input).await,
        }
    }

    pub fn new(config: AppConfig) -> Self {
        let compiler = QueryCompiler::new(config.compiler.clone());
        Self { config, compiler }
    }

    /// Decode and compile the keys/query pair given on the command line
    pub fn compile_input(&self, input: &QueryArgs) -> Result<CompiledQuery> {
        let keys = match input.keys.as_deref() {
            Some(arg) => parse_keys(&read_json_arg(arg)?)
                .map_err(|e| anyhow::anyhow!("Invalid --keys: {}", e))?,
            None => Default::default(),
        };
        let query = parse_query(&read_json_arg(&input.query)?, &self.config.limits)
            .map_err(|e| anyhow::anyhow!("Invalid --query: {}", e))?;
        Ok(self.compiler.compile(&keys, &query))
    }

    fn handle_compile(&self, input: &QueryArgs) -> Result<()> {
        let compiled = self.compile_input(input)?;
        println!("{}", serde_json::to_string_pretty(&compiled)?);
        Ok(())
    }

    fn handle_explain(&self, table: &str, input: &QueryArgs) -> Result<()> {
        let compiled = self.compile_input(input)?;
        let plan = SelectPlan::new(table, self.compiler.options(), &compiled);
        let select = plan.select(&self.config.pagination)?;
        let output = json!({
            "sql": select.sql,
            "values": select.values,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    async fn handle_count(&self, table: &str, input: &QueryArgs) -> Result<()> {
        let Some(path) = self.config.database.as_ref() else {
            anyhow::bail!("No database given. Use --database or set database.path in the config");
        };
        let compiled = self.compile_input(input)?;
        let plan = SelectPlan::new(table, self.compiler.options(), &compiled);

        let pool = sqlite::open_read_only(path)
            .await
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let total = sqlite::count(&pool, &plan).await?;
        pool.close().await;

        println!("{}", total);
        Ok(())
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        // stdout carries command output
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }
}
