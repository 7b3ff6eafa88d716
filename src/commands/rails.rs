//! `rbcli rails console`: attach to the web UI rails console.

use crate::error::CliResult;
use crate::executor::SubprocessBuilder;

const CONSOLE_SCRIPT: &str = "/usr/lib/redborder/bin/rb_rails_console.sh";

pub fn console() -> CliResult<()> {
    SubprocessBuilder::new(CONSOLE_SCRIPT)
        .inherit_io()
        .no_timeout()
        .run()?;
    Ok(())
}
