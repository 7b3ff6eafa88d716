//! Tee-style output duplication.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::CliResult;

/// Writes lines to stdout, duplicating them into an optional file.
pub struct TeeOutput {
    file: Option<File>,
}

impl TeeOutput {
    /// Create a tee target; `path` of `None` means stdout only.
    pub fn create(path: Option<&Path>) -> CliResult<Self> {
        let file = match path {
            Some(p) => Some(File::create(p)?),
            None => None,
        };
        Ok(Self { file })
    }

    /// Emit one line.
    pub fn line(&mut self, text: &str) {
        println!("{}", text);
        if let Some(file) = self.file.as_mut() {
            // A full output file should not abort the checks themselves.
            let _ = writeln!(file, "{}", text);
        }
    }
}
