//! Utility functions shared by the compiler and the CLI

pub mod file;
pub mod sql;
