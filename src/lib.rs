//! rbcli: cluster administration for redborder appliances.
//!
//! The binary in `main.rs` wires real collaborators (consul membership,
//! ssh remote execution) into [`commands::CommandContext`]; everything
//! below that seam is mockable.

pub mod cli;
pub mod cluster;
pub mod commands;
pub mod config;
pub mod error;
pub mod executor;
pub mod output;
pub mod services;
