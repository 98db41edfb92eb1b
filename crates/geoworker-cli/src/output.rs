use console::style;
use serde::Serialize;
use std::fmt::Display;
use tabled::{settings::Style, Table, Tabled};

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Writes command results either as styled text or as one JSON document.
///
/// In JSON mode only [`OutputWriter::result`] and [`OutputWriter::table`]
/// print anything, so stdout always parses as a single value.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self { format: if json { OutputFormat::Json } else { OutputFormat::Human } }
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    pub fn info(&self, message: impl Display) {
        if !self.is_json() {
            println!("{} {}", style("ℹ").blue().bold(), message);
        }
    }

    pub fn kv(&self, key: impl Display, value: impl Display) {
        if !self.is_json() {
            println!("{}: {}", style(key).bold(), value);
        }
    }

    pub fn section(&self, title: impl Display) {
        if !self.is_json() {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    /// Rows as a rounded table, or as the JSON `data` array
    pub fn table<T: Tabled + Serialize>(&self, rows: Vec<T>) -> anyhow::Result<()> {
        if self.is_json() {
            return self.result(rows);
        }
        if rows.is_empty() {
            println!("{}", style("(no data)").dim());
        } else {
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{}", table);
        }
        Ok(())
    }

    /// Pretty-printed JSON regardless of mode
    pub fn data<T: Serialize>(&self, data: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(data)?);
        Ok(())
    }

    /// The command's payload, wrapped in a `status`/`data` envelope in JSON mode
    pub fn result<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.is_json() {
            self.data(&serde_json::json!({ "status": "success", "data": data }))
        } else {
            self.data(&data)
        }
    }
}
