//! Core formatting traits and the table renderer
//!
//! Every report is rendered by one [`TableFormatter`], generic over the
//! [`Palette`] that decides how cells are styled. The plain formatter uses a
//! palette that leaves text untouched.

use crate::{
    demo::{StepOutcome, Walkthrough},
    error::{AppError, Result},
    executor::fastest,
    models::{
        metrics::{ComparisonEntry, HealthReport, RunStatistics, StressReport, SuiteReport},
        Record,
    },
    types::Protocol,
};
use std::fmt::Write as _;

/// Main trait for output formatting
pub trait OutputFormatter: Send + Sync {
    /// Format a header section
    fn format_header(&self, title: &str) -> Result<String>;

    /// Format a full-suite load test report
    fn format_suite_report(&self, report: &SuiteReport) -> Result<String>;

    /// Format a progressive stress report
    fn format_stress_report(&self, report: &StressReport) -> Result<String>;

    /// Format the health of the four protocols
    fn format_health_report(&self, report: &HealthReport) -> Result<String>;

    /// Format a quick single-shot comparison
    fn format_comparison(&self, entries: &[ComparisonEntry]) -> Result<String>;

    /// Format the run-all-examples walkthrough
    fn format_walkthrough(&self, walkthrough: &Walkthrough) -> Result<String>;

    /// Format warning messages
    fn format_warning(&self, warning: &str) -> Result<String>;
}

/// Configuration options for formatting
#[derive(Debug, Clone, Default)]
pub struct FormattingOptions {
    /// Show per-run error details and timestamps
    pub verbose_mode: bool,
}

/// How a cell should be styled once padded
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tone {
    Plain,
    Emphasis,
    Muted,
    /// A latency in milliseconds
    Latency(f64),
    /// An error rate in percent
    ErrorRate(f64),
    /// Healthy / unhealthy, passed / failed
    Status(bool),
}

/// One table cell
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub text: String,
    pub tone: Tone,
}

impl Cell {
    pub fn new<S: Into<String>>(text: S, tone: Tone) -> Self {
        Self { text: text.into(), tone }
    }

    pub fn plain<S: Into<String>>(text: S) -> Self {
        Self::new(text, Tone::Plain)
    }
}

/// Row data for table formatting
pub type RowData = Vec<Cell>;

/// Text alignment options
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Alignment {
    Left,
    Right,
}

/// Column definition for table formatting
#[derive(Debug, Clone)]
pub struct Column {
    pub header: String,
    pub alignment: Alignment,
    pub min_width: usize,
    pub max_width: usize,
}

impl Column {
    pub fn left(header: &str) -> Self {
        Self { header: header.to_string(), alignment: Alignment::Left, min_width: 4, max_width: 48 }
    }

    pub fn right(header: &str) -> Self {
        Self { header: header.to_string(), alignment: Alignment::Right, min_width: 4, max_width: 16 }
    }
}

/// Styles already-padded text
pub trait Palette: Send + Sync {
    fn paint(&self, text: &str, tone: Tone) -> String;

    fn title(&self, text: &str) -> String;
}

/// Palette that leaves every cell untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct Monochrome;

impl Palette for Monochrome {
    fn paint(&self, text: &str, _tone: Tone) -> String {
        text.to_string()
    }

    fn title(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Renders every report as aligned text tables
pub struct TableFormatter<P: Palette> {
    options: FormattingOptions,
    palette: P,
}

/// Plain text formatter
pub type PlainFormatter = TableFormatter<Monochrome>;

impl PlainFormatter {
    pub fn new(options: FormattingOptions) -> Self {
        Self::with_palette(options, Monochrome)
    }
}

fn write_failed(e: std::fmt::Error) -> AppError {
    AppError::io(format!("Failed to format output: {}", e))
}

impl<P: Palette> TableFormatter<P> {
    pub fn with_palette(options: FormattingOptions, palette: P) -> Self {
        Self { options, palette }
    }

    /// Create a bordered table with the given columns and data
    pub fn create_table(&self, columns: &[Column], rows: &[RowData]) -> String {
        if rows.is_empty() {
            return String::new();
        }

        let widths = calculate_column_widths(columns, rows);
        let border = horizontal_border(&widths);
        let headers: RowData = columns.iter().map(|c| Cell::new(c.header.clone(), Tone::Emphasis)).collect();

        let mut lines = vec![border.clone(), self.create_row(&headers, &widths, columns), border.clone()];
        lines.extend(rows.iter().map(|row| self.create_row(row, &widths, columns)));
        lines.push(border);

        let mut output = lines.join("\n");
        output.push('\n');
        output
    }

    fn create_row(&self, cells: &[Cell], widths: &[usize], columns: &[Column]) -> String {
        let mut row = String::from("|");
        for (idx, (cell, &width)) in cells.iter().zip(widths.iter()).enumerate() {
            let alignment = columns.get(idx).map(|c| c.alignment).unwrap_or(Alignment::Left);
            let padded = align_text(&cell.text, width, alignment);
            row.push(' ');
            row.push_str(&self.palette.paint(&padded, cell.tone));
            row.push_str(" |");
        }
        row
    }

    fn run_row(&self, stats: &RunStatistics) -> RowData {
        vec![
            Cell::plain(stats.operation.clone()),
            Cell::new(stats.protocol.label(), Tone::Emphasis),
            Cell::plain(stats.total_requests.to_string()),
            Cell::new(stats.failed_requests.to_string(), Tone::Status(stats.failed_requests == 0)),
            Cell::new(format_duration(stats.mean_ms), Tone::Latency(stats.mean_ms)),
            Cell::new(format_duration(stats.min_ms), Tone::Latency(stats.min_ms)),
            Cell::new(format_duration(stats.max_ms), Tone::Latency(stats.max_ms)),
            Cell::new(format_duration(stats.median_ms), Tone::Latency(stats.median_ms)),
            Cell::new(format_duration(stats.p95_ms), Tone::Latency(stats.p95_ms)),
            Cell::new(format_duration(stats.p99_ms), Tone::Latency(stats.p99_ms)),
            Cell::plain(format!("{:.1}", stats.requests_per_second)),
            Cell::new(format_percentage(stats.error_rate), Tone::ErrorRate(stats.error_rate)),
        ]
    }

    fn run_columns(&self) -> Vec<Column> {
        vec![
            Column::left("Operation"),
            Column::left("Protocol"),
            Column::right("Requests"),
            Column::right("Failed"),
            Column::right("Mean"),
            Column::right("Min"),
            Column::right("Max"),
            Column::right("Median"),
            Column::right("P95"),
            Column::right("P99"),
            Column::right("Req/s"),
            Column::right("Errors"),
        ]
    }

    fn write_first_errors(&self, output: &mut String, runs: &[RunStatistics]) -> Result<()> {
        let failing: Vec<&RunStatistics> = runs.iter().filter(|run| run.first_error.is_some()).collect();
        if failing.is_empty() {
            return Ok(());
        }

        writeln!(output, "\n{}", self.palette.title("First error per failing run:")).map_err(write_failed)?;
        for run in failing {
            if let Some(error) = &run.first_error {
                writeln!(
                    output,
                    "  {} / {}: {}",
                    run.protocol,
                    run.operation,
                    self.palette.paint(error, Tone::Status(false))
                )
                .map_err(write_failed)?;
            }
        }
        Ok(())
    }
}

impl<P: Palette> OutputFormatter for TableFormatter<P> {
    fn format_header(&self, title: &str) -> Result<String> {
        let mut output = String::new();
        let border = "=".repeat(title.chars().count() + 4);

        writeln!(output, "{}", border).map_err(write_failed)?;
        writeln!(output, "  {}", self.palette.title(title)).map_err(write_failed)?;
        write!(output, "{}", border).map_err(write_failed)?;

        Ok(output)
    }

    fn format_suite_report(&self, report: &SuiteReport) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "{}", self.format_header("Full load test")?).map_err(write_failed)?;
        writeln!(output, "Requests per operation and protocol: {}", report.request_count).map_err(write_failed)?;
        if self.options.verbose_mode {
            writeln!(output, "Run {} ({} .. {})", report.run_id, report.started_at, report.completed_at)
                .map_err(write_failed)?;
        }
        writeln!(output).map_err(write_failed)?;

        let rows: Vec<RowData> = report.runs.iter().map(|run| self.run_row(run)).collect();
        output.push_str(&self.create_table(&self.run_columns(), &rows));

        writeln!(output, "\n{}", self.palette.title("Protocol ranking (by mean latency)")).map_err(write_failed)?;
        let ranking_rows: Vec<RowData> = report
            .ranking
            .iter()
            .map(|ranked| {
                let summary = &ranked.summary;
                vec![
                    Cell::plain(format!("#{}", ranked.rank)),
                    Cell::new(summary.protocol.label(), Tone::Emphasis),
                    Cell::new(format_duration(summary.mean_latency_ms), Tone::Latency(summary.mean_latency_ms)),
                    Cell::new(format_duration(summary.mean_p95_ms), Tone::Latency(summary.mean_p95_ms)),
                    Cell::plain(format!("{:.1}", summary.mean_requests_per_second)),
                    Cell::plain(summary.total_requests.to_string()),
                    Cell::new(summary.failed_requests.to_string(), Tone::Status(summary.failed_requests == 0)),
                ]
            })
            .collect();
        let ranking_columns = [
            Column::right("Rank"),
            Column::left("Protocol"),
            Column::right("Mean"),
            Column::right("Mean P95"),
            Column::right("Req/s"),
            Column::right("Requests"),
            Column::right("Failed"),
        ];
        output.push_str(&self.create_table(&ranking_columns, &ranking_rows));

        let totals = &report.totals;
        writeln!(
            output,
            "\nTotal: {} requests, {} ok, {} failed, mean {}, {:.1} req/s",
            totals.total_requests,
            totals.successful_requests,
            self.palette.paint(&totals.failed_requests.to_string(), Tone::Status(totals.failed_requests == 0)),
            format_duration(totals.mean_latency_ms),
            totals.mean_requests_per_second
        )
        .map_err(write_failed)?;
        if let Some(winner) = report.ranking.first() {
            write!(output, "Fastest: {}", self.palette.paint(winner.summary.protocol.label(), Tone::Status(true)))
                .map_err(write_failed)?;
        }

        if self.options.verbose_mode {
            self.write_first_errors(&mut output, &report.runs)?;
        }

        Ok(output)
    }

    fn format_stress_report(&self, report: &StressReport) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "{}", self.format_header(&format!("Stress test: {}", report.operation))?)
            .map_err(write_failed)?;
        if self.options.verbose_mode {
            writeln!(output, "Run {}", report.run_id).map_err(write_failed)?;
        }

        let total_levels = report.levels.len();
        for (index, level) in report.levels.iter().enumerate() {
            writeln!(
                output,
                "\n{}",
                self.palette.title(&format!("Level {}/{}: {} requests", index + 1, total_levels, level.request_count))
            )
            .map_err(write_failed)?;

            let rows: Vec<RowData> = level
                .results
                .iter()
                .map(|stats| {
                    vec![
                        Cell::new(stats.protocol.label(), Tone::Emphasis),
                        Cell::new(format_duration(stats.mean_ms), Tone::Latency(stats.mean_ms)),
                        Cell::new(format_duration(stats.median_ms), Tone::Latency(stats.median_ms)),
                        Cell::new(format_duration(stats.p95_ms), Tone::Latency(stats.p95_ms)),
                        Cell::new(format_duration(stats.p99_ms), Tone::Latency(stats.p99_ms)),
                        Cell::plain(format!("{:.1}", stats.requests_per_second)),
                        Cell::new(format_percentage(stats.error_rate), Tone::ErrorRate(stats.error_rate)),
                    ]
                })
                .collect();
            let columns = [
                Column::left("Protocol"),
                Column::right("Mean"),
                Column::right("Median"),
                Column::right("P95"),
                Column::right("P99"),
                Column::right("Req/s"),
                Column::right("Errors"),
            ];
            output.push_str(&self.create_table(&columns, &rows));

            if self.options.verbose_mode {
                self.write_first_errors(&mut output, &level.results)?;
            }
        }

        Ok(output.trim_end().to_string())
    }

    fn format_health_report(&self, report: &HealthReport) -> Result<String> {
        let mut output = String::new();
        writeln!(output, "{}", self.format_header("Health check")?).map_err(write_failed)?;

        let rows: Vec<RowData> = Protocol::ALL
            .iter()
            .map(|&protocol| {
                let healthy = report.get(protocol);
                vec![
                    Cell::new(protocol.label(), Tone::Emphasis),
                    Cell::new(if healthy { "healthy" } else { "unreachable" }, Tone::Status(healthy)),
                ]
            })
            .collect();
        output.push_str(&self.create_table(&[Column::left("Protocol"), Column::left("Status")], &rows));

        let healthy = Protocol::ALL.iter().filter(|&&p| report.get(p)).count();
        write!(output, "{}/{} protocols healthy", healthy, Protocol::ALL.len()).map_err(write_failed)?;
        Ok(output)
    }

    fn format_comparison(&self, entries: &[ComparisonEntry]) -> Result<String> {
        let mut output = String::new();
        writeln!(output, "{}", self.format_header("Quick comparison")?).map_err(write_failed)?;

        let rows: Vec<RowData> = entries
            .iter()
            .map(|entry| {
                let mean = match entry.mean_ms {
                    Some(ms) => Cell::new(format_duration(ms), Tone::Latency(ms)),
                    None => Cell::new("n/a", Tone::Muted),
                };
                vec![
                    Cell::new(entry.protocol.label(), Tone::Emphasis),
                    mean,
                    Cell::new(entry.errors.len().to_string(), Tone::Status(entry.errors.is_empty())),
                ]
            })
            .collect();
        let columns = [Column::left("Protocol"), Column::right("Mean"), Column::right("Errors")];
        output.push_str(&self.create_table(&columns, &rows));

        for entry in entries.iter().filter(|e| !e.errors.is_empty()) {
            for error in &entry.errors {
                writeln!(output, "  {}: {}", entry.protocol, self.palette.paint(error, Tone::Status(false)))
                    .map_err(write_failed)?;
            }
        }

        let verdict = match fastest(entries) {
            Some(protocol) => format!("Fastest: {}", self.palette.paint(protocol.label(), Tone::Status(true))),
            None => self.palette.paint("No protocol answered", Tone::Status(false)),
        };
        output.push_str(&verdict);

        Ok(output)
    }

    fn format_walkthrough(&self, walkthrough: &Walkthrough) -> Result<String> {
        let mut output = String::new();

        for section in &walkthrough.protocols {
            writeln!(output, "{}", self.format_header(&format!("{} examples", section.protocol))?)
                .map_err(write_failed)?;

            for (index, step) in section.steps.iter().enumerate() {
                match &step.outcome {
                    StepOutcome::Records { count, preview } => {
                        writeln!(
                            output,
                            "{}. {}: {}",
                            index + 1,
                            step.operation,
                            self.palette.paint(&format!("{} found", count), Tone::Status(true))
                        )
                        .map_err(write_failed)?;
                        for record in preview {
                            writeln!(output, "     - {}", describe_record(record)).map_err(write_failed)?;
                        }
                    }
                    StepOutcome::Failed { error } => {
                        writeln!(
                            output,
                            "{}. {}: {}",
                            index + 1,
                            step.operation,
                            self.palette.paint(&format!("failed: {}", error), Tone::Status(false))
                        )
                        .map_err(write_failed)?;
                    }
                }
            }
            writeln!(output).map_err(write_failed)?;
        }

        Ok(output.trim_end().to_string())
    }

    fn format_warning(&self, warning: &str) -> Result<String> {
        Ok(self.palette.paint(&format!("Warning: {}", warning), Tone::ErrorRate(100.0)))
    }
}

fn describe_record(record: &Record) -> String {
    match record {
        Record::User(user) => match user.age {
            Some(age) => format!("{} (ID: {}, age {})", user.name, user.id, age),
            None => format!("{} (ID: {})", user.name, user.id),
        },
        Record::Track(track) if !track.artist.is_empty() => {
            format!("{} by {} (ID: {})", track.name, track.artist, track.id)
        }
        other => format!("{} (ID: {})", other.name(), other.id()),
    }
}

/// Calculate column widths from headers and content, capped per column
fn calculate_column_widths(columns: &[Column], rows: &[RowData]) -> Vec<usize> {
    let num_columns = columns.len().max(rows.iter().map(|r| r.len()).max().unwrap_or(0));

    (0..num_columns)
        .map(|idx| {
            let column = columns.get(idx);
            let mut width = column.map(|c| c.min_width.max(c.header.chars().count())).unwrap_or(0);
            for row in rows {
                if let Some(cell) = row.get(idx) {
                    width = width.max(cell.text.chars().count());
                }
            }
            match column {
                Some(c) => width.min(c.max_width.max(c.header.chars().count())),
                None => width,
            }
        })
        .collect()
}

fn horizontal_border(widths: &[usize]) -> String {
    let mut border = String::from("+");
    for &width in widths {
        border.push_str(&"-".repeat(width + 2));
        border.push('+');
    }
    border
}

/// Align text within the given width, truncating what does not fit
fn align_text(text: &str, width: usize, alignment: Alignment) -> String {
    let len = text.chars().count();
    if len >= width {
        return text.chars().take(width).collect();
    }

    let padding = width - len;
    match alignment {
        Alignment::Left => format!("{}{}", text, " ".repeat(padding)),
        Alignment::Right => format!("{}{}", " ".repeat(padding), text),
    }
}

/// Format a millisecond duration in a human-readable unit
pub fn format_duration(duration_ms: f64) -> String {
    if duration_ms < 1.0 {
        format!("{:.0}µs", duration_ms * 1000.0)
    } else if duration_ms < 1000.0 {
        format!("{:.2}ms", duration_ms)
    } else if duration_ms < 60000.0 {
        format!("{:.2}s", duration_ms / 1000.0)
    } else {
        let minutes = (duration_ms / 60000.0) as u32;
        let seconds = (duration_ms % 60000.0) / 1000.0;
        format!("{}m{:.1}s", minutes, seconds)
    }
}

/// Format a percentage with one decimal
pub fn format_percentage(percentage: f64) -> String {
    format!("{:.1}%", percentage)
}
