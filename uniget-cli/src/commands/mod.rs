//! CLI subcommands.

pub mod config;
pub mod install;
pub mod manifest;
pub mod resolve;
