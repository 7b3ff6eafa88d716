//! `rbcli setup`: hand the terminal to the interactive setup wizard.

use crate::error::CliResult;
use crate::executor::SubprocessBuilder;

pub fn wizard() -> CliResult<()> {
    SubprocessBuilder::new("rb_setup_wizard")
        .inherit_io()
        .no_timeout()
        .run()?;
    Ok(())
}
