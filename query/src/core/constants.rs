// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "ToolkitQuery";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "toolkitq";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".toolkitq";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "toolkitq.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "TOOLKITQ_CONFIG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "TOOLKITQ_LOG";

// =============================================================================
// Environment Variables - Compiler
// =============================================================================

/// Environment variable for the target table alias
pub const ENV_ALIAS: &str = "TOOLKITQ_ALIAS";

/// Environment variable for identifier quoting (none, backtick, double)
pub const ENV_QUOTE: &str = "TOOLKITQ_QUOTE";

/// Environment variable for sort priority (insertion, magnitude)
pub const ENV_ORDER_PRIORITY: &str = "TOOLKITQ_ORDER_PRIORITY";

// =============================================================================
// Environment Variables - Database
// =============================================================================

/// Environment variable for the SQLite database path
pub const ENV_DATABASE: &str = "TOOLKITQ_DATABASE";

// =============================================================================
// Compiler Defaults
// =============================================================================

/// Alias every column is qualified with
pub const DEFAULT_TARGET_ALIAS: &str = "target";

/// Maximum size of client query JSON (64KB)
pub const DEFAULT_MAX_QUERY_JSON_SIZE: usize = 64 * 1024;

/// Maximum nesting depth of a query expression
pub const DEFAULT_MAX_QUERY_DEPTH: usize = 32;

// =============================================================================
// Pagination Defaults
// =============================================================================

/// Rows per page when the query gives no `take`
pub const DEFAULT_TAKE: i64 = 50;

/// Hard cap on `take`
pub const MAX_TAKE: i64 = 500;

// =============================================================================
// SQLite Database
// =============================================================================

/// SQLite connection pool max connections
pub const SQLITE_MAX_CONNECTIONS: u32 = 2;

/// SQLite busy timeout in seconds
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 30;
