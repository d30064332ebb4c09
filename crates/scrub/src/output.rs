//! Writing cleaned tables and cleaning logs.

use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, ScrubError};
use crate::input::SourceMetadata;
use crate::scrub::CleaningRun;
use crate::table::{CellValue, Table};
use crate::transform::{CleaningSummary, LogEntry};

/// File format for a written table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    #[default]
    Csv,
    Tsv,
    /// An array of row objects.
    Json,
}

impl TableFormat {
    /// Conventional file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::Tsv => "tsv",
            TableFormat::Json => "json",
        }
    }

    /// Guess the format from a file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?;
        ext.parse().ok()
    }
}

impl FromStr for TableFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(TableFormat::Csv),
            "tsv" | "tab" => Ok(TableFormat::Tsv),
            "json" => Ok(TableFormat::Json),
            _ => Err(format!("Unknown format: {}. Use csv, tsv, or json.", s)),
        }
    }
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Write a table to `path`, creating parent directories as needed.
///
/// Missing cells become empty fields in delimited output and `null` in JSON.
pub fn write_table(table: &Table, path: impl AsRef<Path>, format: TableFormat) -> Result<()> {
    let path = path.as_ref();
    let file = create_file(path)?;

    match format {
        TableFormat::Csv => write_delimited(table, file, b',')?,
        TableFormat::Tsv => write_delimited(table, file, b'\t')?,
        TableFormat::Json => write_json(table, file)?,
    }

    info!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.column_count(),
        %format,
        "wrote table"
    );
    Ok(())
}

fn write_delimited(table: &Table, file: File, delimiter: u8) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(BufWriter::new(file));

    writer.write_record(table.column_names())?;
    for row in 0..table.row_count() {
        let record = table
            .columns()
            .map(|(_, values)| values.get(row).and_then(CellValue::render).unwrap_or_default());
        writer.write_record(record)?;
    }
    writer.flush().map_err(|e| ScrubError::Persistence(format!("Failed to flush table: {}", e)))?;
    Ok(())
}

fn write_json(table: &Table, file: File) -> Result<()> {
    let missing = CellValue::Missing;
    let rows: Vec<IndexMap<&str, &CellValue>> = (0..table.row_count())
        .map(|row| {
            table
                .columns()
                .map(|(name, values)| (name, values.get(row).unwrap_or(&missing)))
                .collect()
        })
        .collect();

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &rows)?;
    writer
        .flush()
        .map_err(|e| ScrubError::Persistence(format!("Failed to flush table: {}", e)))?;
    Ok(())
}

fn create_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| {
                ScrubError::Persistence(format!(
                    "Failed to create directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    File::create(path).map_err(|e| {
        ScrubError::Persistence(format!("Failed to create file '{}': {}", path.display(), e))
    })
}

/// The cleaning log file written next to a cleaned table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningLogDocument {
    pub applied_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceMetadata>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_file: Option<PathBuf>,

    /// Number of rules attempted, whatever their outcome.
    pub total_rules_applied: usize,

    /// (rows, columns) before cleaning.
    pub original_shape: (usize, usize),

    /// (rows, columns) after cleaning.
    pub cleaned_shape: (usize, usize),

    /// Columns present after cleaning that were not in the input.
    pub columns_added: Vec<String>,

    /// Rules dropped before application for low confidence.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules_skipped: Vec<String>,

    pub summary: CleaningSummary,

    pub rules_applied: Vec<LogEntry>,
}

impl CleaningLogDocument {
    /// Build the log document for a finished run.
    pub fn new(run: &CleaningRun, rules_file: Option<&Path>) -> Self {
        let columns_added = run
            .table
            .column_names()
            .filter(|name| !run.original_columns.iter().any(|c| c == name))
            .map(|name| name.to_string())
            .collect();

        Self {
            applied_at: Utc::now(),
            source: run.source.clone(),
            rules_file: rules_file.map(Path::to_path_buf),
            total_rules_applied: run.report.log.len(),
            original_shape: run.original_shape,
            cleaned_shape: run.table.shape(),
            columns_added,
            rules_skipped: run.rules_skipped.clone(),
            summary: run.report.summary.clone(),
            rules_applied: run.report.log.clone(),
        }
    }

    /// Save the document as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = create_file(path)?;

        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self).map_err(|e| {
            ScrubError::Persistence(format!("Failed to serialize cleaning log: {}", e))
        })?;

        info!(path = %path.display(), "wrote cleaning log");
        Ok(())
    }

    /// Load a previously saved document.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ScrubError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            ScrubError::Persistence(format!(
                "Failed to parse cleaning log '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
