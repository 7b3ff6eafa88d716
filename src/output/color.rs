//! Terminal color palette.
//!
//! Wraps `console` styles behind a palette that honors the
//! `--no-color`/`--colorless` flags. Styling is forced on when enabled so
//! that output piped into `less -R` keeps its colors, as the historical
//! tool did.

use console::Style;

/// Color palette for the status tables.
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(no_color: bool) -> Self {
        Self { enabled: !no_color }
    }

    fn apply(&self, style: Style, text: &str) -> String {
        if self.enabled {
            style.force_styling(true).apply_to(text).to_string()
        } else {
            text.to_string()
        }
    }

    pub fn green(&self, text: &str) -> String {
        self.apply(Style::new().green(), text)
    }

    pub fn yellow(&self, text: &str) -> String {
        self.apply(Style::new().yellow(), text)
    }

    pub fn blue(&self, text: &str) -> String {
        self.apply(Style::new().blue(), text)
    }

    pub fn red(&self, text: &str) -> String {
        self.apply(Style::new().red(), text)
    }

    pub fn blink(&self, text: &str) -> String {
        self.apply(Style::new().blink(), text)
    }
}
