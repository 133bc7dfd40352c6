//! Wallboard CLI: run a node, or drive one as a client.

pub mod cli;
pub mod client;
pub mod commands;
pub mod error;
pub mod shell;
