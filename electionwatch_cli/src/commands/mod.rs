//! CLI subcommand implementations.

pub mod chamber;
pub mod contest;
pub mod election;
pub mod results;
