pub mod bridge;
pub mod commands;
pub mod config;
pub mod helper;
pub mod mock;
pub mod nexus;
pub mod snapshot;
pub mod tss;
pub mod vote;

#[cfg(test)]
mod tests;
