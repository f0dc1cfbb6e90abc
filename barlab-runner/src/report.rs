//! Comparison table.

use crate::result::FormatResult;
use std::fmt;

/// One row of the comparison table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub format: String,
    pub time_seconds: f64,
    pub size_mb: f64,
}

/// Results of a run laid out as rows, in benchmark order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonTable {
    pub rows: Vec<TableRow>,
}

const HEADERS: [&str; 3] = ["Format", "Time (seconds)", "Size (MB)"];

impl ComparisonTable {
    pub fn from_results(results: &[FormatResult]) -> Self {
        Self {
            rows: results
                .iter()
                .map(|r| TableRow {
                    format: r.label().to_string(),
                    time_seconds: r.seconds(),
                    size_mb: r.size_mb(),
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Table as CSV text with a header row.
    pub fn to_csv(&self) -> Result<String, csv::Error> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        wtr.write_record(HEADERS)?;
        for row in &self.rows {
            wtr.write_record([
                row.format.clone(),
                format!("{:.6}", row.time_seconds),
                format!("{:.6}", row.size_mb),
            ])?;
        }
        let data = wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}

impl fmt::Display for ComparisonTable {
    /// Aligned text table with a zero-based index column:
    ///
    /// ```text
    /// Comparison Table:
    ///     Format  Time (seconds)  Size (MB)
    /// 0      CSV        0.012000   0.071234
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells: Vec<[String; 3]> = self
            .rows
            .iter()
            .map(|r| {
                [
                    r.format.clone(),
                    format!("{:.6}", r.time_seconds),
                    format!("{:.6}", r.size_mb),
                ]
            })
            .collect();

        let index_width = self.rows.len().saturating_sub(1).to_string().len();
        let mut widths = HEADERS.map(str::len);
        for row in &cells {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.len());
            }
        }

        writeln!(f, "Comparison Table:")?;
        write!(f, "{:index_width$}", "")?;
        for (header, w) in HEADERS.iter().zip(widths) {
            write!(f, "  {header:>w$}")?;
        }
        writeln!(f)?;
        for (i, row) in cells.iter().enumerate() {
            write!(f, "{i:<index_width$}")?;
            for (cell, w) in row.iter().zip(widths) {
                write!(f, "  {cell:>w$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
