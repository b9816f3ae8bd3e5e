//! CLI subcommands

pub mod costs;
pub mod export;
pub mod inventory;
pub mod optimize;
pub mod setup;
