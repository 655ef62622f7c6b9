use clap::{Args, Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{ENV_ALIAS, ENV_CONFIG, ENV_DATABASE, ENV_ORDER_PRIORITY, ENV_QUOTE};
use crate::data::filters::OrderPriority;
use crate::utils::sql::IdentQuote;

#[derive(Parser)]
#[command(name = "toolkitq")]
#[command(version, about = "Compile ToolkitQuery filters into parameterized SQL", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Table alias used to qualify columns
    #[arg(long, short = 'a', global = true, env = ENV_ALIAS)]
    pub alias: Option<String>,

    /// Identifier quoting (none, backtick or double)
    #[arg(long, global = true, env = ENV_QUOTE, value_parser = parse_quote)]
    pub quote: Option<IdentQuote>,

    /// Sort column priority (insertion or magnitude)
    #[arg(long, global = true, env = ENV_ORDER_PRIORITY, value_parser = parse_order_priority)]
    pub order_priority: Option<OrderPriority>,

    /// SQLite database file
    #[arg(long, short = 'd', global = true, env = ENV_DATABASE)]
    pub database: Option<PathBuf>,
}

/// Parse identifier quoting from CLI/env string
fn parse_quote(s: &str) -> Result<IdentQuote, String> {
    match s.to_lowercase().as_str() {
        "none" | "" => Ok(IdentQuote::None),
        "backtick" | "`" => Ok(IdentQuote::Backtick),
        "double" | "\"" => Ok(IdentQuote::Double),
        _ => Err(format!(
            "Invalid quote style '{}'. Valid options: none, backtick, double",
            s
        )),
    }
}

/// Parse order priority from CLI/env string
fn parse_order_priority(s: &str) -> Result<OrderPriority, String> {
    match s.to_lowercase().as_str() {
        "insertion" => Ok(OrderPriority::Insertion),
        "magnitude" => Ok(OrderPriority::Magnitude),
        _ => Err(format!(
            "Invalid order priority '{}'. Valid options: insertion, magnitude",
            s
        )),
    }
}

/// Filter input shared by every command
#[derive(Args, Clone, Debug)]
pub struct QueryArgs {
    /// Key constraints as a JSON object (`@file` or `-` for stdin)
    #[arg(long, short = 'k')]
    pub keys: Option<String>,

    /// ToolkitQuery JSON (`@file` or `-` for stdin)
    #[arg(long, short = 'q', default_value = "{}")]
    pub query: String,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Print the compiled predicate, parameters, order and pagination as JSON
    Compile {
        #[command(flatten)]
        input: QueryArgs,
    },
    /// Print the positional SELECT statement and its bound values
    Explain {
        /// Table to select from
        #[arg(long, short = 't')]
        table: String,

        #[command(flatten)]
        input: QueryArgs,
    },
    /// Count matching rows in a SQLite database
    Count {
        /// Table to count in
        #[arg(long, short = 't')]
        table: String,

        #[command(flatten)]
        input: QueryArgs,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub alias: Option<String>,
    pub quote: Option<IdentQuote>,
    pub order_priority: Option<OrderPriority>,
    pub database: Option<PathBuf>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        alias: cli.alias,
        quote: cli.quote,
        order_priority: cli.order_priority,
        database: cli.database,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_quote() {
        assert_eq!(parse_quote("none").unwrap(), IdentQuote::None);
        assert_eq!(parse_quote("Backtick").unwrap(), IdentQuote::Backtick);
        assert_eq!(parse_quote("double").unwrap(), IdentQuote::Double);
        assert!(parse_quote("single").is_err());
    }

    #[test]
    fn test_parse_order_priority() {
        assert_eq!(
            parse_order_priority("insertion").unwrap(),
            OrderPriority::Insertion
        );
        assert_eq!(
            parse_order_priority("MAGNITUDE").unwrap(),
            OrderPriority::Magnitude
        );
        assert!(parse_order_priority("random").is_err());
    }

    #[test]
    fn test_compile_command_args() {
        let cli = Cli::try_parse_from([
            "toolkitq",
            "compile",
            "--keys",
            r#"{"id": 1}"#,
            "--query",
            r#"{"eq": {"a": 1}}"#,
            "--quote",
            "double",
        ])
        .unwrap();

        assert_eq!(cli.quote, Some(IdentQuote::Double));
        match cli.command {
            Commands::Compile { input } => {
                assert_eq!(input.keys.as_deref(), Some(r#"{"id": 1}"#));
                assert_eq!(input.query, r#"{"eq": {"a": 1}}"#);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_query_defaults_to_empty_object() {
        let cli = Cli::try_parse_from(["toolkitq", "explain", "--table", "tickets"]).unwrap();
        match cli.command {
            Commands::Explain { table, input } => {
                assert_eq!(table, "tickets");
                assert_eq!(input.query, "{}");
                assert!(input.keys.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_quote_is_rejected() {
        let result = Cli::try_parse_from(["toolkitq", "compile", "--quote", "single"]);
        assert!(result.is_err());
    }
}
