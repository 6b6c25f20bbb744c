//! Console sink implementation

use crate::core::{format_line, Record, Result, Sink};
use colored::Colorize;
use std::io::Write;

/// Mirrors every record to stdout with the level colorized.
pub struct ConsoleSink {
    use_colors: bool,
    line_buf: String,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::with_colors(true)
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            line_buf: String::with_capacity(256),
        }
    }

    /// Render a record the way it appears on the terminal, without the newline
    pub fn render(&mut self, record: &Record) -> &str {
        self.line_buf.clear();
        if self.use_colors {
            let level = record.level.to_str().color(record.level.color_code());
            format_line(record, &level, &mut self.line_buf);
        } else {
            format_line(record, &record.level, &mut self.line_buf);
        }
        &self.line_buf
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for ConsoleSink {
    fn write(&mut self, record: &Record) -> Result<()> {
        self.render(record);
        self.line_buf.push('\n');

        // One locked write per line keeps lines from interleaving
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(self.line_buf.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        std::io::stdout().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
