//! CSV dataset merging. Repeated runs accumulate: the prior file's rows are
//! kept in order and the new run's records are appended after them.
//!
//! Known limitation, kept on purpose: nothing deduplicates across runs, so
//! re-running against the same listing appends duplicate rows.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use csv::{ReaderBuilder, WriterBuilder};
use tracing::info;

use crate::error::CrawlError;
use crate::fields::ProductRecord;

/// Appends `records` to the dataset at `path`, creating it when absent.
/// Returns the total row count after the merge.
///
/// The header is recomputed as the union of the existing columns (in their
/// original order) and the record columns, so prior rows survive a schema
/// change and simply gain empty cells for columns they predate.
pub fn merge_into(path: &Path, records: &[ProductRecord]) -> Result<usize, CrawlError> {
    merge_impl(path, records).map_err(|cause| CrawlError::Persistence {
        path: path.display().to_string(),
        cause,
    })
}

fn merge_impl(path: &Path, records: &[ProductRecord]) -> Result<usize> {
    let (mut headers, mut rows) = read_existing(path)?;
    let prior = rows.len();

    for column in ProductRecord::COLUMNS {
        if !headers.iter().any(|h| h == column) {
            headers.push(column.to_string());
        }
    }
    for record in records {
        rows.push(record.to_columns()?);
    }

    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(&headers)?;
    for row in &rows {
        let cells: Vec<&str> = headers
            .iter()
            .map(|h| row.get(h).map(String::as_str).unwrap_or(""))
            .collect();
        writer.write_record(&cells)?;
    }
    writer.flush()?;

    info!(
        path = %path.display(),
        prior,
        appended = records.len(),
        total = rows.len(),
        "dataset merged"
    );
    Ok(rows.len())
}

fn read_existing(path: &Path) -> Result<(Vec<String>, Vec<HashMap<String, String>>)> {
    if !path.exists() {
        return Ok((Vec::new(), Vec::new()));
    }
    let mut reader = ReaderBuilder::new().from_path(path)?;
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let row = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        rows.push(row);
    }
    Ok((headers, rows))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn record(title: &str, price: Option<f64>) -> ProductRecord {
        ProductRecord {
            title: title.to_string(),
            category: "Pickle".to_string(),
            subtype: "Pickle".to_string(),
            price,
            description: "No description available.".to_string(),
            ..ProductRecord::default()
        }
    }

    fn read_rows(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = ReaderBuilder::new().from_path(path).unwrap();
        let headers = reader.headers().unwrap().iter().map(str::to_string).collect();
        let rows = reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect();
        (headers, rows)
    }

    #[test]
    fn fresh_file_contains_exactly_the_new_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let total = merge_into(&path, &[record("a", Some(10.0)), record("b", None)]).unwrap();
        assert_eq!(total, 2);

        let (headers, rows) = read_rows(&path);
        assert_eq!(headers, ProductRecord::COLUMNS);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], "a");
        assert_eq!(rows[1][0], "b");
    }

    #[test]
    fn second_run_appends_after_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        merge_into(&path, &[record("a1", Some(1.0)), record("a2", Some(2.0))]).unwrap();
        let total = merge_into(&path, &[record("b1", None)]).unwrap();
        assert_eq!(total, 3);

        let (_, rows) = read_rows(&path);
        let titles: Vec<&str> = rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(titles, vec!["a1", "a2", "b1"]);
    }

    #[test]
    fn written_rows_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        merge_into(&path, &[record("a", Some(1299.0)), record("b", None)]).unwrap();

        let (headers, rows) = read_existing(&path).unwrap();
        assert_eq!(rows[0], record("a", Some(1299.0)).to_columns().unwrap());
        assert_eq!(rows[1], record("b", None).to_columns().unwrap());
        assert_eq!(headers, ProductRecord::COLUMNS);
    }

    #[test]
    fn price_cells_distinguish_unknown_from_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        merge_into(&path, &[record("free", Some(0.0)), record("unknown", None)]).unwrap();

        let (headers, rows) = read_rows(&path);
        let price_idx = headers.iter().position(|h| h == "price").unwrap();
        assert_eq!(rows[0][price_idx], "0.0");
        assert_eq!(rows[1][price_idx], "");
    }

    #[test]
    fn prior_rows_gain_empty_cells_for_new_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        // A file from an older run that knew fewer columns.
        fs::write(&path, "title,type\nold product,Pickle\n").unwrap();

        merge_into(&path, &[record("new product", Some(5.0))]).unwrap();

        let (headers, rows) = read_rows(&path);
        assert_eq!(&headers[..2], &["title", "type"]);
        assert_eq!(headers.len(), ProductRecord::COLUMNS.len());
        assert_eq!(rows[0][0], "old product");
        assert_eq!(rows[0][1], "Pickle");
        // Every column the old row predates is empty, not missing.
        assert!(rows[0][2..].iter().all(String::is_empty));
        assert_eq!(rows[1][0], "new product");
    }
}
