//! Local command execution.

mod subprocess;
pub mod systemctl;

pub use subprocess::{run_command, SubprocessBuilder, SubprocessResult};
