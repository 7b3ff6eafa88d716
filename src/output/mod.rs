//! Output formatting: colors, tee duplication, humanizers.

mod color;
mod format;
mod tee;

pub use color::Palette;
pub use format::{format_elapsed, humanize_bytes, is_recent_runtime, parse_memory_to_bytes};
pub use tee::TeeOutput;
