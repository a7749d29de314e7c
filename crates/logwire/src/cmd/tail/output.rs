//! Output formatting for delivered lines

use chrono::DateTime;
use clap::ValueEnum;
use logwire_client::Delivery;
use owo_colors::{OwoColorize, Style};

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// `time app[proc] host: line`
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Color styles for terminal output
struct ColorStyles {
    timestamp: Style,
    app: Style,
    label: Style,
}

impl ColorStyles {
    fn new(enabled: bool) -> Self {
        if enabled {
            Self {
                timestamp: Style::new().dimmed(),
                app: Style::new().cyan(),
                label: Style::new().dimmed(),
            }
        } else {
            Self {
                timestamp: Style::new(),
                app: Style::new(),
                label: Style::new(),
            }
        }
    }
}

/// Output formatter
pub struct Formatter {
    format: Format,
    styles: ColorStyles,
}

impl Formatter {
    pub fn new(format: Format, use_color: bool) -> Self {
        Self {
            format,
            // JSON output is meant for pipes
            styles: ColorStyles::new(use_color && format == Format::Text),
        }
    }

    /// Print a delivery to stdout
    pub fn print(&self, delivery: &Delivery) {
        println!("{}", self.format(delivery));
    }

    pub fn format(&self, delivery: &Delivery) -> String {
        match self.format {
            Format::Text => self.format_text(delivery),
            Format::Json => format_json(delivery),
        }
    }

    fn format_text(&self, delivery: &Delivery) -> String {
        let styles = &self.styles;
        let topic = &delivery.topic;
        format!(
            "{} {}{} {}{} {}",
            format_timestamp(delivery.timestamp).style(styles.timestamp),
            topic.app().style(styles.app),
            format!("[{}]", topic.process()).style(styles.label),
            topic.host().style(styles.label),
            ":".style(styles.label),
            delivery.line,
        )
    }
}

fn format_json(delivery: &Delivery) -> String {
    serde_json::to_string(delivery)
        .unwrap_or_else(|e| format!(r#"{{"error":"serialization failed: {e}"}}"#))
}

/// Format nanoseconds since the epoch as `YYYY-MM-DD HH:MM:SS.mmm` UTC
fn format_timestamp(ts_nanos: i64) -> String {
    DateTime::from_timestamp_nanos(ts_nanos)
        .format("%Y-%m-%d %H:%M:%S%.3f")
        .to_string()
}

#[cfg(test)]
#[path = "output_test.rs"]
mod tests;
