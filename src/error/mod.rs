//! Error handling module.

mod types;

pub use types::{CliError, CliResult, NotFoundKind, PolicyKind};
