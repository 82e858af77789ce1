//! Subcommand handlers for the binary.

pub mod commandlet;
pub mod config;
pub mod inspect;
