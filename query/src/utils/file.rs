//! File and argument helpers

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Expand `~` and make relative paths absolute against the working directory.
///
/// ```text
/// expand_path("~/.toolkitq")  // -> /home/user/.toolkitq
/// expand_path("filters.json") // -> /current/dir/filters.json
/// expand_path("/etc/q.json")  // -> /etc/q.json
/// ```
pub fn expand_path(path: &str) -> PathBuf {
    let path = path.trim();

    if path.is_empty() {
        return std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    }

    let expanded = match path.strip_prefix('~') {
        Some("") => dirs::home_dir().unwrap_or_else(|| PathBuf::from(path)),
        Some(rest) if rest.starts_with('/') => match dirs::home_dir() {
            Some(home) => home.join(&rest[1..]),
            None => PathBuf::from(path),
        },
        _ => PathBuf::from(path),
    };

    if expanded.is_relative() {
        std::env::current_dir()
            .map(|cwd| cwd.join(&expanded))
            .unwrap_or(expanded)
    } else {
        expanded
    }
}

/// Resolve a CLI JSON argument.
///
/// `@path` reads the file, `-` reads stdin, anything else is taken as JSON text.
pub fn read_json_arg(arg: &str) -> Result<String> {
    if arg == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read JSON from stdin")?;
        return Ok(buf);
    }
    if let Some(path) = arg.strip_prefix('@') {
        let path = expand_path(path);
        return std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read JSON file: {}", path.display()));
    }
    Ok(arg.to_string())
}
