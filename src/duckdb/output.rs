//! Output formatting for query results.

use super::QueryResult;

/// Longest cell rendered in table output, in characters
const MAX_CELL_WIDTH: usize = 50;

/// Output format for query results
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OutputFormat {
    /// Box-drawn table (default)
    #[default]
    Table,
    /// JSON array of objects
    Json,
    /// CSV with a header row
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Valid: table, json, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Formatter for query results
pub struct QueryResultFormatter;

impl QueryResultFormatter {
    /// Format at most `limit` rows of a result
    pub fn format(result: &QueryResult, format: OutputFormat, limit: Option<usize>) -> String {
        let shown = &result.rows[..limit.map_or(result.rows.len(), |n| n.min(result.rows.len()))];
        match format {
            OutputFormat::Table => Self::format_table(&result.columns, shown),
            OutputFormat::Json => Self::format_json(&result.columns, shown),
            OutputFormat::Csv => Self::format_csv(&result.columns, shown),
        }
    }

    fn format_table(columns: &[String], rows: &[Vec<String>]) -> String {
        if columns.is_empty() {
            return String::new();
        }

        let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
        for row in rows {
            for (width, val) in widths.iter_mut().zip(row) {
                *width = (*width).max(val.chars().count());
            }
        }
        widths.iter_mut().for_each(|w| *w = (*w).min(MAX_CELL_WIDTH));

        let mut output = String::new();
        Self::push_border(&mut output, &widths, '┌', '┬', '┐');
        Self::push_row(&mut output, &widths, columns);
        Self::push_border(&mut output, &widths, '├', '┼', '┤');
        for row in rows {
            Self::push_row(&mut output, &widths, row);
        }
        Self::push_border(&mut output, &widths, '└', '┴', '┘');
        output
    }

    fn push_border(output: &mut String, widths: &[usize], left: char, mid: char, right: char) {
        output.push(left);
        for (i, width) in widths.iter().enumerate() {
            output.push_str(&"─".repeat(*width + 2));
            if i < widths.len() - 1 {
                output.push(mid);
            }
        }
        output.push(right);
        output.push('\n');
    }

    fn push_row(output: &mut String, widths: &[usize], values: &[String]) {
        output.push('│');
        for (width, val) in widths.iter().zip(values) {
            let cell = Self::truncate(val, *width);
            output.push_str(&format!(" {:width$} │", cell, width = *width));
        }
        output.push('\n');
    }

    /// Truncate a string to at most `max_len` characters
    fn truncate(s: &str, max_len: usize) -> String {
        if s.chars().count() <= max_len {
            s.to_string()
        } else {
            let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
            format!("{}…", kept)
        }
    }

    fn format_json(columns: &[String], rows: &[Vec<String>]) -> String {
        let rows: Vec<serde_json::Value> = rows
            .iter()
            .map(|row| {
                let obj: serde_json::Map<String, serde_json::Value> = columns
                    .iter()
                    .zip(row.iter())
                    .map(|(col, val)| (col.clone(), Self::json_value(val)))
                    .collect();
                serde_json::Value::Object(obj)
            })
            .collect();

        let mut output = serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string());
        output.push('\n');
        output
    }

    /// Convert a string value to appropriate JSON type
    fn json_value(val: &str) -> serde_json::Value {
        if val == "NULL" {
            return serde_json::Value::Null;
        }

        if let Ok(n) = val.parse::<i64>() {
            return serde_json::Value::Number(n.into());
        }
        if let Ok(n) = val.parse::<f64>() {
            if let Some(num) = serde_json::Number::from_f64(n) {
                return serde_json::Value::Number(num);
            }
        }

        if val.eq_ignore_ascii_case("true") {
            return serde_json::Value::Bool(true);
        }
        if val.eq_ignore_ascii_case("false") {
            return serde_json::Value::Bool(false);
        }

        serde_json::Value::String(val.to_string())
    }

    fn format_csv(columns: &[String], rows: &[Vec<String>]) -> String {
        let mut writer = csv::Writer::from_writer(Vec::new());
        let written = writer
            .write_record(columns)
            .and_then(|_| rows.iter().try_for_each(|row| writer.write_record(row)));
        if written.is_err() {
            return String::new();
        }
        match writer.into_inner() {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(_) => String::new(),
        }
    }
}
