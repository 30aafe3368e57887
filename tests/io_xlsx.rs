#![cfg(feature = "io-xlsx")]

use anyhow::Result;
use std::io::Cursor;
use tabmap::io::TabularSource;
use tabmap::io::memory::GridSource;
use tabmap::io::xlsx::{XlsxSink, XlsxSource, read_xlsx_vec, write_xlsx_vec};
use tabmap::testing::*;
use tabmap::*;

fn workbook_bytes(employees: &[Employee], options: &Options) -> Result<Vec<u8>> {
    let mut writer = TypeWriter::<Employee, _>::new(XlsxSink::in_memory(), options.clone())?;
    writer.write(employees)?;
    writer.finalize()?;
    writer
        .into_sink()
        .into_buffer()
        .ok_or_else(|| anyhow::anyhow!("no workbook saved"))
}

#[test]
fn in_memory_workbook_round_trip() -> Result<()> {
    let bytes = workbook_bytes(&sample_employees(), &Options::default())?;

    let mut source = XlsxSource::from_reader(Cursor::new(bytes.clone()))?;
    assert_grid_eq(&source.read_grid()?, &sample_employee_grid());

    let mut source = XlsxSource::from_reader(Cursor::new(bytes))?;
    let back: Vec<Employee> = read_source(&mut source, &Options::default())?;
    assert_eq!(back, sample_employees());
    Ok(())
}

#[test]
fn leading_blank_rows_keep_their_place() -> Result<()> {
    let opts = Options::default().with_header_row(3).with_data_start_row(4);
    let bytes = workbook_bytes(&sample_employees()[..1], &opts)?;

    let mut source = XlsxSource::from_reader(Cursor::new(bytes))?;
    let grid = source.read_grid()?;
    assert_eq!(grid.len(), 5);
    assert_eq!(grid.row(2).map(|r| r[0].as_str()), Some("Name"));

    let back: Vec<Employee> = read_source(&mut GridSource::from(grid), &opts)?;
    assert_eq!(back, sample_employees()[..1]);
    Ok(())
}

#[test]
fn named_sheet_file_round_trip() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("reports/staff.xlsx");
    let opts = Options::default().with_sheet("Staff");

    assert_eq!(write_xlsx_vec(&path, &sample_employees(), &opts)?, 3);
    let back: Vec<Employee> = read_xlsx_vec(&path, &opts)?;
    assert_eq!(back, sample_employees());

    // The first sheet is read when none is configured.
    let back: Vec<Employee> = read_xlsx_vec(&path, &Options::default())?;
    assert_eq!(back.len(), 3);

    let err = read_xlsx_vec::<Employee>(&path, &Options::default().with_sheet("Missing")).unwrap_err();
    assert!(format!("{err:#}").contains("Missing"), "{err:#}");
    Ok(())
}
