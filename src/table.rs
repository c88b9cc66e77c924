//! Delimited text tables with columns resolved by header name.

use std::collections::HashMap;

use crate::error::DatasetError;

#[derive(Debug, Clone)]
pub struct Table {
    header: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
    short_rows: usize,
}

impl Table {
    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Rows dropped because they had fewer fields than the header.
    pub fn short_rows(&self) -> usize {
        self.short_rows
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn require(&self, table: &'static str, name: &str) -> Result<usize, DatasetError> {
        self.column(name).ok_or_else(|| DatasetError::MissingColumn {
            table,
            column: name.to_string(),
        })
    }
}

/// Read `text` as a delimited table with a header line. Quoted fields may
/// contain the delimiter. Rows shorter than the header are dropped and
/// counted, as are rows the reader rejects; extra trailing fields are kept
/// and ignored by column lookups.
pub fn parse_table(text: &str, delimiter: char) -> Table {
    let delimiter = u8::try_from(delimiter).unwrap_or(b',');
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let header: Vec<String> = reader
        .headers()
        .map(|record| {
            record
                .iter()
                .enumerate()
                .map(|(i, h)| {
                    let h = if i == 0 { h.trim_start_matches('\u{feff}') } else { h };
                    h.trim().to_string()
                })
                .collect()
        })
        .unwrap_or_default();

    let index = header
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect();

    let mut rows = Vec::new();
    let mut short_rows = 0usize;
    for result in reader.records() {
        let Ok(record) = result else {
            short_rows += 1;
            continue;
        };
        if record.len() == 1 && record[0].trim().is_empty() {
            continue;
        }
        if record.len() < header.len() {
            short_rows += 1;
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Table {
        header,
        index,
        rows,
        short_rows,
    }
}

/// Empty or unparsable cells read as zero.
pub fn parse_number(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

pub fn parse_year(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok()
}
