#![cfg(feature = "io-csv")]

use anyhow::Result;
use std::fs;
use tabmap::io::csv::{CsvSink, CsvSource, read_csv_vec, write_csv_vec};
use tabmap::io::TabularSource;
use tabmap::testing::*;
use tabmap::*;

#[test]
fn employees_round_trip_through_a_csv_file() -> Result<()> {
    let dir = TempDirPath::new()?;
    let path = dir.file_path("nested/out.csv");

    let written = write_csv_vec(&path, &sample_employees(), &Options::default())?;
    assert_eq!(written, 3);

    let text = fs::read_to_string(&path)?;
    assert_eq!(
        text.lines().next(),
        Some("Name,Age,Email,Addr_street,Addr_city,Job_position,Job_company,Job_years")
    );
    assert_eq!(text.lines().count(), 5);

    let back: Vec<Employee> = read_csv_vec(&path, &Options::default())?;
    assert_eq!(back, sample_employees());
    Ok(())
}

#[test]
fn handwritten_csv_is_decoded() -> Result<()> {
    let file = mock_csv_file(&handwritten_employee_grid())?;

    let mut source = CsvSource::open(file.path())?;
    assert_grid_eq(&source.read_grid()?, &handwritten_employee_grid());

    let employees: Vec<Employee> = read_csv_vec(file.path(), &Options::default())?;
    assert_eq!(employees.len(), 2);
    assert_eq!(employees[0].jobs.len(), 2);
    assert_eq!(employees[0].email.as_deref(), Some("john@example.com"));
    assert!(employees[1].jobs.is_empty());
    Ok(())
}

#[test]
fn decode_errors_survive_the_file_context() -> Result<()> {
    let file = mock_csv_file(&RowGrid::from_rows([["Age"], ["3"]]))?;
    let err = read_csv_vec::<Employee>(file.path(), &Options::default()).unwrap_err();
    let cause = err.downcast_ref::<Error>().expect("typed cause");
    assert!(matches!(
        cause,
        Error::Row(RowError {
            row: None,
            source: DecodeError::MissingRequiredColumn(column),
        }) if column == "name"
    ));
    Ok(())
}

#[test]
fn missing_file_is_an_error() {
    let dir = TempDirPath::new().unwrap();
    let err = read_csv_vec::<Employee>(dir.file_path("absent.csv"), &Options::default()).unwrap_err();
    assert!(format!("{err:#}").contains("absent.csv"));
}

tabular! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Pair {
        pub name: String,
        pub age: u32,
    }
}

#[test]
fn csv_sink_writes_into_any_writer() -> Result<()> {
    let records = vec![
        Pair {
            name: "Ann".into(),
            age: 30,
        },
        Pair {
            name: "Smith, J".into(),
            age: 41,
        },
    ];
    let mut writer = TypeWriter::<Pair, _>::new(CsvSink::from_writer(Vec::new()), Options::default())?;
    writer.write(&records)?;
    assert_eq!(writer.sink().grid().len(), 3);
    writer.finalize()?;

    let bytes = writer.into_sink().into_inner()?;
    assert_eq!(String::from_utf8(bytes)?, "Name,Age\nAnn,30\n\"Smith, J\",41\n");

    let mut source = CsvSource::from_reader("Name,Age\nAnn,30\n\"Smith, J\",41\n".as_bytes());
    let back: Vec<Pair> = read_source(&mut source, &Options::default())?;
    assert_eq!(back, records);
    Ok(())
}

#[test]
fn ragged_csv_rows_are_padded() -> Result<()> {
    let mut source = CsvSource::from_reader("Name,Age\nAnn\nBen,7,extra\n".as_bytes());
    let pairs: Vec<Pair> = read_source(&mut source, &Options::default())?;
    assert_eq!(
        pairs,
        vec![
            Pair {
                name: "Ann".into(),
                age: 0,
            },
            Pair {
                name: "Ben".into(),
                age: 7,
            },
        ]
    );
    Ok(())
}
