//! ToolkitQuery: compile JSON filter documents into parameterized SQL
//!
//! See [`data::filters`] for the compiler and [`data::sqlite`] for running
//! compiled queries against SQLite.

pub mod app;
pub mod core;
pub mod data;
pub mod utils;
