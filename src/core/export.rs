//! CSV export of tables and correlation matrices.

use crate::core::correlation::CorrelationMatrix;
use crate::core::table::Table;
use anyhow::{Context, Result, anyhow};
use std::io::Write;
use std::path::Path;

/// Shortest representation that parses back to the same `f64`.
fn format_cell(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => v.to_string(),
        _ => String::new(),
    }
}

pub fn write_table<W: Write>(table: &Table, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec!["Date".to_string()];
    header.extend(table.tickers().iter().cloned());
    writer.write_record(&header)?;

    for (date, row) in table.dates().iter().zip(table.rows()) {
        let mut record = vec![date.format("%Y-%m-%d").to_string()];
        record.extend(row.iter().map(|v| format_cell(*v)));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_matrix<W: Write>(matrix: &CorrelationMatrix, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);

    let mut header = vec!["Ticker".to_string()];
    header.extend(matrix.tickers().iter().cloned());
    writer.write_record(&header)?;

    for (ticker, row) in matrix.tickers().iter().zip(matrix.values()) {
        let mut record = vec![ticker.clone()];
        record.extend(row.iter().map(|v| format_cell(Some(*v))));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn table_to_csv(table: &Table) -> Result<String> {
    let mut buf = Vec::new();
    write_table(table, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}

pub fn matrix_to_csv(matrix: &CorrelationMatrix) -> Result<String> {
    let mut buf = Vec::new();
    write_matrix(matrix, &mut buf)?;
    Ok(String::from_utf8(buf)?)
}

/// Parses a matrix written by [`write_matrix`]. Empty cells read as `NaN`.
pub fn matrix_from_csv(text: &str) -> Result<CorrelationMatrix> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let tickers: Vec<String> = reader.headers()?.iter().skip(1).map(String::from).collect();

    let mut values = Vec::with_capacity(tickers.len());
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let label = record.get(0).unwrap_or_default();
        if tickers.get(i).map(String::as_str) != Some(label) {
            return Err(anyhow!(
                "Row {} is labelled '{}' but column {} is '{}'",
                i + 1,
                label,
                i + 1,
                tickers.get(i).map(String::as_str).unwrap_or_default()
            ));
        }
        let row = record
            .iter()
            .skip(1)
            .map(|cell| {
                if cell.trim().is_empty() {
                    Ok(f64::NAN)
                } else {
                    cell.trim()
                        .parse::<f64>()
                        .with_context(|| format!("Invalid number '{cell}' in row {label}"))
                }
            })
            .collect::<Result<Vec<f64>>>()?;
        values.push(row);
    }

    CorrelationMatrix::new(tickers, values)
}

pub fn export_table(table: &Table, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_table(table, file).with_context(|| format!("Failed to write {}", path.display()))
}

pub fn export_matrix(matrix: &CorrelationMatrix, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_matrix(matrix, file).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::correlation::correlate;
    use crate::core::table::tests::table;

    #[test]
    fn table_csv_has_date_column_and_full_precision() {
        let t = table(
            &["A", "B"],
            &[
                ("2024-01-03", vec![Some(0.1 + 0.2), None]),
                ("2024-01-04", vec![Some(-0.5), Some(1.0)]),
            ],
        );
        let csv = table_to_csv(&t).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Date,A,B");
        assert_eq!(lines[1], "2024-01-03,0.30000000000000004,");
        assert_eq!(lines[2], "2024-01-04,-0.5,1");
    }

    #[test]
    fn matrix_round_trips_through_csv() {
        let returns = table(
            &["AAPL", "MSFT", "XOM"],
            &[
                ("2024-01-02", vec![Some(0.011), Some(0.02), Some(-0.013)]),
                ("2024-01-03", vec![Some(-0.024), Some(-0.01), Some(0.031)]),
                ("2024-01-04", vec![Some(0.033), Some(0.017), Some(-0.002)]),
                ("2024-01-05", vec![Some(0.004), Some(0.021), Some(0.012)]),
            ],
        );
        let matrix = correlate(&returns).unwrap();
        let csv = matrix_to_csv(&matrix).unwrap();
        assert!(csv.starts_with("Ticker,AAPL,MSFT,XOM\n"));

        let parsed = matrix_from_csv(&csv).unwrap();
        assert_eq!(parsed.tickers(), matrix.tickers());
        for (a, b) in parsed.values().iter().flatten().zip(matrix.values().iter().flatten()) {
            assert!((a - b).abs() < 1e-15);
        }
    }

    #[test]
    fn undefined_correlation_exports_as_empty_cell() {
        let matrix = CorrelationMatrix::new(
            vec!["A".to_string(), "B".to_string()],
            vec![vec![1.0, f64::NAN], vec![f64::NAN, 1.0]],
        )
        .unwrap();
        let csv = matrix_to_csv(&matrix).unwrap();
        assert!(csv.contains("A,1,\n"));
        let parsed = matrix_from_csv(&csv).unwrap();
        assert!(parsed.values()[0][1].is_nan());
    }

    #[test]
    fn rejects_mislabelled_rows() {
        let err = matrix_from_csv("Ticker,A,B\nB,1,0.5\nA,0.5,1\n").unwrap_err();
        assert!(err.to_string().contains("labelled 'B'"));
    }

    #[test]
    fn exports_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("returns.csv");
        let t = table(&["A"], &[("2024-01-03", vec![Some(0.25)])]);
        export_table(&t, &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Date,A\n2024-01-03,0.25\n");
    }
}
