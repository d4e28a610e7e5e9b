// External crates
use log::info;
use polars::prelude::*;
use std::fs::{self, File};
use std::io;
use std::path::Path;

// Local modules
use crate::error::Result;

/// Reads a CSV file with a header row into a DataFrame
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
///
/// # Returns
///
/// The parsed frame, or an `Io` error of kind `NotFound` when the file does
/// not exist
pub fn read_csv_file<P: AsRef<Path>>(file_path: P) -> Result<DataFrame> {
    let path = file_path.as_ref();
    info!("Loading data from: {}", path.display());

    if !path.exists() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("File not found: {}", path.display()),
        )
        .into());
    }

    let file = File::open(path)?;
    let df = CsvReader::new(file).finish()?;
    Ok(df)
}

/// Writes a DataFrame to CSV with a header row, creating missing parent
/// directories
pub fn write_csv_file<P: AsRef<Path>>(df: &DataFrame, file_path: P) -> Result<()> {
    let path = file_path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(path)?;
    let mut out = df.clone();
    CsvWriter::new(&mut file).include_header(true).finish(&mut out)?;
    info!(
        "Wrote {} rows x {} columns to {}",
        df.height(),
        df.width(),
        path.display()
    );
    Ok(())
}
