//! Output formatting and display system
//!
//! Reports are plain data produced by the executor; this module turns them
//! into console tables (plain or colored) or JSON, and reports progress on
//! stderr while a run is in flight.

mod colored;
mod formatter;
mod json;
mod progress;

pub use self::colored::{ColorScheme, ColoredFormatter, PerformanceLevel};
pub use formatter::{
    format_duration, format_percentage, Alignment, Cell, Column, FormattingOptions, Monochrome, OutputFormatter,
    Palette, PlainFormatter, RowData, TableFormatter, Tone,
};
pub use json::JsonFormatter;
pub use progress::ConsoleObserver;

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on output mode, color support and verbosity
    pub fn create_formatter(json: bool, enable_color: bool, verbose: bool) -> Box<dyn OutputFormatter> {
        if json {
            return Box::new(JsonFormatter);
        }

        let options = FormattingOptions { verbose_mode: verbose };

        if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }

    /// Create a formatter from the loaded configuration
    pub fn from_config(config: &crate::models::Config) -> Box<dyn OutputFormatter> {
        Self::create_formatter(config.json_output, config.enable_color, config.verbose)
    }
}
