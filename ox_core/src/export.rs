//! Rendering report tables as aligned text, CSV or JSON.

use crate::analytics::{Cell, ReportTable};
use crate::{Error, Result};
use serde_json::{Map, Value};
use std::io::Write;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "table" => Ok(OutputFormat::Table),
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(Error::Config(format!(
                "Unknown output format '{}'. Choose from: table, csv, json",
                other
            ))),
        }
    }
}

pub fn write_table<W: Write>(table: &ReportTable, format: OutputFormat, out: W) -> Result<()> {
    match format {
        OutputFormat::Table => write_text(table, out),
        OutputFormat::Csv => write_csv(table, out),
        OutputFormat::Json => write_json(table, out),
    }
}

/// Space-padded columns under a dashed rule
fn write_text<W: Write>(table: &ReportTable, mut out: W) -> Result<()> {
    let rendered: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.iter().map(Cell::to_string).collect())
        .collect();

    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &rendered {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    writeln!(out, "{}", line(&table.columns))?;
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    writeln!(out, "{}", line(&rule))?;
    for row in &rendered {
        writeln!(out, "{}", line(row))?;
    }
    Ok(())
}

fn write_csv<W: Write>(table: &ReportTable, out: W) -> Result<()> {
    let mut writer = csv::WriterBuilder::new().from_writer(out);
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(Cell::to_string))?;
    }
    writer.flush()?;
    Ok(())
}

/// Array of `{column: value}` objects
fn write_json<W: Write>(table: &ReportTable, mut out: W) -> Result<()> {
    let records: Vec<Value> = table
        .rows
        .iter()
        .map(|row| -> serde_json::Result<Value> {
            let object: Map<String, Value> = table
                .columns
                .iter()
                .cloned()
                .zip(row.iter().map(serde_json::to_value))
                .map(|(column, value)| value.map(|v| (column, v)))
                .collect::<serde_json::Result<_>>()?;
            Ok(Value::Object(object))
        })
        .collect::<serde_json::Result<_>>()?;

    serde_json::to_writer_pretty(&mut out, &records)?;
    writeln!(out)?;
    Ok(())
}
