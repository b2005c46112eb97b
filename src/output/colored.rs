//! Colored palette for terminal output
//!
//! Latencies are colored by [`PerformanceLevel`], error rates and statuses
//! by the [`ColorScheme`].

use super::formatter::{FormattingOptions, Palette, TableFormatter, Tone};
use colored::*;

/// Performance level classification for color coding
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PerformanceLevel {
    Excellent, // < 10ms
    Good,      // 10-50ms
    Fair,      // 50-200ms
    Poor,      // 200-1000ms
    VeryPoor,  // > 1000ms
}

impl PerformanceLevel {
    /// Determine performance level from a latency in milliseconds
    pub fn from_latency(latency_ms: f64) -> Self {
        if latency_ms < 10.0 {
            Self::Excellent
        } else if latency_ms < 50.0 {
            Self::Good
        } else if latency_ms < 200.0 {
            Self::Fair
        } else if latency_ms < 1000.0 {
            Self::Poor
        } else {
            Self::VeryPoor
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Excellent => Color::Green,
            Self::Good => Color::Cyan,
            Self::Fair => Color::Yellow,
            Self::Poor => Color::Magenta,
            Self::VeryPoor => Color::Red,
        }
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub muted: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            muted: Color::BrightBlack,
        }
    }
}

impl ColorScheme {
    fn error_rate_color(&self, error_rate: f64) -> Color {
        if error_rate == 0.0 {
            self.success
        } else if error_rate < 5.0 {
            self.warning
        } else {
            self.error
        }
    }
}

impl Palette for ColorScheme {
    fn paint(&self, text: &str, tone: Tone) -> String {
        match tone {
            Tone::Plain => text.to_string(),
            Tone::Emphasis => text.bold().to_string(),
            Tone::Muted => text.color(self.muted).to_string(),
            Tone::Latency(ms) => text.color(PerformanceLevel::from_latency(ms).color()).to_string(),
            Tone::ErrorRate(rate) => text.color(self.error_rate_color(rate)).to_string(),
            Tone::Status(true) => text.color(self.success).to_string(),
            Tone::Status(false) => text.color(self.error).to_string(),
        }
    }

    fn title(&self, text: &str) -> String {
        text.bold().color(self.header).to_string()
    }
}

/// Colored formatter
pub type ColoredFormatter = TableFormatter<ColorScheme>;

impl ColoredFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self::with_palette(options, ColorScheme::default())
    }
}
