// External imports
use anyhow::Result;
use std::io::ErrorKind;
use tempfile::tempdir;

// Internal imports
use crate::error::PrepError;
use crate::util::file_utils::{read_csv_file, write_csv_file};
use crate::util::test_utils::generate_vendor_dataframe;

#[test]
fn test_csv_round_trip() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("bars.csv");
    let df = generate_vendor_dataframe(25, 8)?;

    write_csv_file(&df, &path)?;
    let back = read_csv_file(&path)?;

    assert_eq!(back.height(), 25);
    assert_eq!(back.get_column_names(), df.get_column_names());
    let first = back.column("datetime")?.as_materialized_series().str()?.get(0);
    assert_eq!(first, Some("2023-01-02 09:30:00"));
    Ok(())
}

#[test]
fn test_write_creates_parent_directories() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("nested").join("out").join("target.csv");
    let df = generate_vendor_dataframe(3, 1)?;
    write_csv_file(&df, &path)?;
    assert!(path.exists());
    Ok(())
}

#[test]
fn test_missing_file_is_not_found() -> Result<()> {
    let dir = tempdir()?;
    match read_csv_file(dir.path().join("absent.csv")) {
        Err(PrepError::Io(e)) => assert_eq!(e.kind(), ErrorKind::NotFound),
        other => panic!("expected NotFound, got {:?}", other.map(|df| df.height())),
    }
    Ok(())
}
