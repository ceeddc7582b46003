//! Writes a small sample spreadsheet for trying the analysis locally.
//!
//! The workbook has the layout of the hospital general information export,
//! including missing cells and `Not Available` ratings.

use std::path::PathBuf;

use hospital_eda::test_fixtures::write_hospital_workbook;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("Hospital_General_Information.xlsx"));

    write_hospital_workbook(&path)?;
    println!("Sample workbook written to '{}'", path.display());
    Ok(())
}
