use anyhow::Result;
use tabmap::io::TabularSink;
use tabmap::io::memory::GridSink;
use tabmap::testing::*;
use tabmap::*;

#[test]
fn employees_encode_to_the_expected_grid() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let grid = write_grid(&sample_employees(), &Options::default())?;
    assert_grid_eq(&grid, &sample_employee_grid());
    assert_column_absent(&grid, "addr_zip");
    Ok(())
}

#[test]
fn scalars_fill_down_across_collection_rows() -> Result<()> {
    let schema = schema_for::<Employee>()?;
    let mut encoder = RowEncoder::<Employee>::new(schema);
    let employees = sample_employees();

    let rows = encoder.encode_one(&employees[0]);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][..5], rows[1][..5]);
    assert_eq!(rows[0][6..8], ["Engineer", "Acme"]);
    assert_eq!(rows[1][6..8], ["Manager", "Initech"]);

    // No jobs still yields one row for the scalar columns.
    let rows = encoder.encode_one(&employees[1]);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "Jane");
    assert!(rows[0][3..].iter().all(String::is_empty));

    assert_eq!(encoder.headers().len(), 9);
    assert_eq!(encoder.seen().len(), 9);
    Ok(())
}

tabular! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Contact {
        pub name: String,
        pub phone: Option<String> => "omitempty",
        pub score: u32 => "omitempty",
        pub email: String,
    }
}

fn contact(name: &str, phone: Option<&str>, score: u32) -> Contact {
    Contact {
        name: name.into(),
        phone: phone.map(String::from),
        score,
        email: String::new(),
    }
}

#[test]
fn omitempty_columns_that_stay_empty_are_pruned() -> Result<()> {
    let schema = schema_for::<Contact>()?;
    let full_width = RowEncoder::<Contact>::new(schema).headers().len();

    let grid = write_grid(&[contact("Ann", None, 3), contact("Ben", None, 0)], &Options::default())?;
    assert_eq!(grid.width(), full_width - 1);
    assert_headers(&grid, &["Name", "Score", "Email"]);
    assert_column_absent(&grid, "phone");

    // Zero values count as empty for pruning; plain columns are always kept.
    let grid = write_grid(&[contact("Ann", Some("555"), 0)], &Options::default())?;
    assert_headers(&grid, &["Name", "Phone", "Email"]);
    assert_eq!(grid.row(1).unwrap(), ["Ann", "555", ""]);
    Ok(())
}

#[test]
fn writer_lifecycle() -> Result<()> {
    let mut writer = TypeWriter::<Employee, _>::new(GridSink::new(), Options::default())?;
    assert_eq!(writer.state(), WriterState::Created);

    writer.write(&[])?;
    assert_eq!(writer.state(), WriterState::Created);
    assert!(writer.sink().grid().is_empty());

    let employees = sample_employees();
    writer.write(&employees[..1])?;
    assert_eq!(writer.state(), WriterState::DataAppended);
    writer.write(&employees[1..])?;

    writer.finalize()?;
    assert_eq!(writer.state(), WriterState::Finalized);
    writer.finalize()?;

    let err = writer.write(&employees).unwrap_err();
    assert!(matches!(err, Error::Encode(EncodeError::Finalized)));

    let sink = writer.into_sink();
    assert!(sink.is_finalized());
    assert_grid_eq(sink.grid(), &sample_employee_grid());
    Ok(())
}

#[test]
fn header_lands_on_the_configured_row() -> Result<()> {
    let opts = Options::default().with_header_row(2).with_data_start_row(4);
    let grid = write_grid(&sample_employees()[1..2], &opts)?;
    assert_eq!(grid.len(), 4);
    assert!(grid.row(0).unwrap().is_empty());
    assert_eq!(grid.row(1).unwrap()[0], "Name");
    assert!(grid.row(2).unwrap().is_empty());
    assert_eq!(grid.row(3).unwrap()[..2], ["Jane", "28"]);

    let back: Vec<Employee> = read_grid(grid, &opts)?;
    assert_eq!(back, sample_employees()[1..2]);
    Ok(())
}

#[derive(Debug, Default)]
struct RecordingSink {
    calls: Vec<String>,
}

impl TabularSink for RecordingSink {
    fn write_header_row(&mut self, row: usize, cells: &[String]) -> anyhow::Result<()> {
        self.calls.push(format!("header {row} {}", cells.join("|")));
        Ok(())
    }

    fn write_row(&mut self, row: usize, cells: &[String]) -> anyhow::Result<()> {
        self.calls.push(format!("row {row} {}", cells.join("|")));
        Ok(())
    }

    fn remove_column(&mut self, letter: &str) -> anyhow::Result<()> {
        self.calls.push(format!("remove {letter}"));
        Ok(())
    }

    fn finalize(&mut self) -> anyhow::Result<()> {
        self.calls.push("finalize".into());
        Ok(())
    }
}

#[test]
fn sink_sees_rows_then_removals_right_to_left() -> Result<()> {
    let mut sink = RecordingSink::default();
    {
        let mut writer = TypeWriter::<Contact, _>::new(&mut sink, Options::default())?;
        writer.write(&[contact("Ann", None, 0)])?;
        writer.finalize()?;
        writer.finalize()?;
    }
    assert_eq!(
        sink.calls,
        [
            "header 1 Name|Phone|Score|Email",
            "row 2 Ann||0|",
            "remove C",
            "remove B",
            "finalize",
        ]
    );
    Ok(())
}

#[derive(Debug, Default)]
struct FailingSink;

impl TabularSink for FailingSink {
    fn write_header_row(&mut self, _row: usize, _cells: &[String]) -> anyhow::Result<()> {
        Ok(())
    }

    fn write_row(&mut self, _row: usize, _cells: &[String]) -> anyhow::Result<()> {
        anyhow::bail!("disk full")
    }

    fn remove_column(&mut self, _letter: &str) -> anyhow::Result<()> {
        Ok(())
    }

    fn finalize(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[test]
fn sink_failures_abort_the_batch() -> Result<()> {
    let mut writer = TypeWriter::<Contact, _>::new(FailingSink, Options::default())?;
    let err = writer.write(&[contact("Ann", None, 1)]).unwrap_err();
    assert!(matches!(err, Error::Encode(EncodeError::Sink(_))));
    assert_eq!(format!("{err:#}"), "write row 2: disk full");
    Ok(())
}

#[cfg(feature = "parallel-io")]
#[test]
fn parallel_encode_matches_sequential() -> Result<()> {
    let mut employees = Vec::new();
    for i in 0..25 {
        for mut e in sample_employees() {
            e.name = format!("{}-{i}", e.name);
            employees.push(e);
        }
    }
    let schema = schema_for::<Employee>()?;
    let mut sequential = RowEncoder::<Employee>::new(schema.clone());
    let mut parallel = RowEncoder::<Employee>::new(schema);

    let expected = sequential.encode(&employees);
    let actual = parallel.encode_par(&employees, Some(4));
    assert_grid_eq(&actual, &expected);
    assert_eq!(parallel.seen(), sequential.seen());
    assert_eq!(parallel.prunable_columns(), sequential.prunable_columns());

    assert!(parallel.encode_par(&[], None).is_empty());
    Ok(())
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Volatile(String);

impl CellValue for Volatile {
    fn from_cell(text: &str) -> std::result::Result<Self, CellError> {
        Ok(Volatile(text.to_string()))
    }

    fn to_cell(&self) -> String {
        if self.0 == "boom" {
            panic!("to_cell exploded");
        }
        self.0.clone()
    }

    fn is_zero(&self) -> bool {
        self.0.is_empty()
    }
}

cell_field!(Volatile);

tabular! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Reading {
        pub label: String,
        pub value: Volatile,
        pub note: Option<String> => "omitempty",
    }
}

fn reading(label: &str, value: &str) -> Reading {
    Reading {
        label: label.into(),
        value: Volatile(value.into()),
        note: None,
    }
}

#[test]
fn panicking_cell_values_fail_the_batch_but_not_the_writer() -> Result<()> {
    let mut writer = TypeWriter::<Reading, _>::new(GridSink::new(), Options::default())?;
    writer.write(&[reading("a", "1")])?;

    let err = writer.write(&[reading("b", "boom")]).unwrap_err();
    match err {
        Error::Internal(message) => assert!(message.contains("to_cell exploded"), "{message}"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(writer.state(), WriterState::DataAppended);

    writer.write(&[reading("c", "3")])?;
    writer.finalize()?;
    assert_eq!(writer.state(), WriterState::Finalized);

    let grid = writer.into_sink().into_grid();
    assert_grid_eq(
        &grid,
        &RowGrid::from_rows([["Label", "Value"], ["a", "1"], ["c", "3"]]),
    );
    Ok(())
}

#[test]
fn a_panic_in_the_first_batch_leaves_nothing_behind() -> Result<()> {
    let mut writer = TypeWriter::<Reading, _>::new(GridSink::new(), Options::default())?;
    assert!(matches!(
        writer.write(&[reading("x", "boom")]),
        Err(Error::Internal(_))
    ));
    assert_eq!(writer.state(), WriterState::Created);
    writer.finalize()?;
    assert!(writer.sink().grid().is_empty());
    Ok(())
}
