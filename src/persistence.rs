use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info};
use thiserror::Error;

const HEADER: [&str; 2] = ["x", "y"];

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("CSV file is empty")]
    Empty,
    #[error("Expected header x,y, got {}", .0.join(","))]
    Header(Vec<String>),
    #[error("Row {row}: expected 2 values, got {count}")]
    FieldCount { row: usize, count: usize },
    #[error("Row {row}: invalid numeric value '{value}'")]
    InvalidNumber { row: usize, value: String },
    #[error("Failed to access CSV: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Writes the `x,y` header and one row per point. Missing parent directories
/// are created. Returns the number of rows written.
pub fn write_csv<I>(path: &Path, points: I) -> Result<usize, CsvError>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    let result = write_rows(path, points);
    match &result {
        Ok(count) => info!("Saved {count} points to {}", path.display()),
        Err(err) => error!("Failed to write CSV {}: {err}", path.display()),
    }
    result
}

fn write_rows<I>(path: &Path, points: I) -> Result<usize, CsvError>
where
    I: IntoIterator<Item = (f64, f64)>,
{
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(HEADER)?;
    let mut count = 0;
    for (x, y) in points {
        writer.write_record([x.to_string(), y.to_string()])?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

/// Reads a file written by [`write_csv`]. Any malformed row rejects the whole
/// file.
pub fn read_csv(path: &Path) -> Result<Vec<(f64, f64)>, CsvError> {
    let result = read_rows(path);
    match &result {
        Ok(points) => info!("Loaded {} points from {}", points.len(), path.display()),
        Err(err) => error!("Failed to read CSV {}: {err}", path.display()),
    }
    result
}

fn read_rows(path: &Path) -> Result<Vec<(f64, f64)>, CsvError> {
    if !path.exists() {
        return Err(CsvError::NotFound(path.to_path_buf()));
    }
    let contents = fs::read_to_string(path)?;
    // Rows are physical lines. The csv reader skips blank ones, so they are
    // tracked alongside it and rejected as rows with no fields.
    let mut lines = (1..).zip(contents.lines());
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(contents.as_bytes());
    let mut records = reader.records();

    let header = records.next().ok_or(CsvError::Empty)??;
    if next_row(&mut lines).is_err() {
        return Err(CsvError::Header(Vec::new()));
    }
    if header.len() != HEADER.len() || header.iter().zip(HEADER).any(|(a, b)| a != b) {
        return Err(CsvError::Header(header.iter().map(str::to_string).collect()));
    }

    let mut points = Vec::new();
    for record in records {
        let record = record?;
        let row = next_row(&mut lines).map_err(|row| CsvError::FieldCount { row, count: 0 })?;
        if record.len() != 2 {
            return Err(CsvError::FieldCount {
                row,
                count: record.len(),
            });
        }
        let x = parse_field(&record[0], row)?;
        let y = parse_field(&record[1], row)?;
        points.push((x, y));
    }
    // Anything left over is blank.
    if let Some((row, _)) = lines.next() {
        return Err(CsvError::FieldCount { row, count: 0 });
    }
    Ok(points)
}

/// Line number of the row the reader returned next, or `Err` with the number
/// of a blank line that comes first.
fn next_row<'a, I>(lines: &mut I) -> Result<usize, usize>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    match lines.next() {
        Some((row, "")) => Err(row),
        Some((row, _)) => Ok(row),
        None => Ok(0),
    }
}

fn parse_field(value: &str, row: usize) -> Result<f64, CsvError> {
    match value.trim().parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Ok(parsed),
        _ => Err(CsvError::InvalidNumber {
            row,
            value: value.to_string(),
        }),
    }
}
