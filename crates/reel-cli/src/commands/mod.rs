//! Subcommand implementations.

pub mod config;
pub mod filter;
pub mod ngrams;
pub mod query;
pub mod status;
