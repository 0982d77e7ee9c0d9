//! Shared utilities for neurobox crates.
//!
//! This crate provides common utilities used across the neurobox workspace,
//! mostly Polars `AnyValue` conversions and column extraction helpers.

pub mod polars;

// Re-export commonly used functions at crate root for convenience
pub use self::polars::{
    any_is_missing, any_to_f64, any_to_string, column_f64, column_keys, format_numeric,
    group_key, has_column, parse_f64,
};
