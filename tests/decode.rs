use anyhow::Result;
use tabmap::io::memory::GridSource;
use tabmap::testing::*;
use tabmap::*;

tabular! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Person {
        pub name: String => "required",
        pub age: u32 => "default:18",
        pub nickname: Option<String> => "aliases:nick|alias",
        pub active: bool,
    }
}

fn person(name: &str, age: u32, nickname: Option<&str>, active: bool) -> Person {
    Person {
        name: name.into(),
        age,
        nickname: nickname.map(String::from),
        active,
    }
}

#[test]
fn headers_match_case_insensitively_and_through_aliases() -> Result<()> {
    let grid = RowGrid::from_rows([
        ["Name", " AGE ", "Nick", "active"],
        ["Ann", "30", "annie", "yes"],
        ["Ben", "", "", "0"],
        ["  Cy", "41", "", "T"],
    ]);
    let people: Vec<Person> = read_grid(grid, &Options::default())?;
    assert_eq!(
        people,
        vec![
            person("Ann", 30, Some("annie"), true),
            person("Ben", 18, None, false),
            person("  Cy", 41, None, true),
        ]
    );
    Ok(())
}

#[test]
fn missing_required_column_fails_before_any_row() {
    let grid = RowGrid::from_rows([["Age", "Nick"], ["30", "annie"]]);
    let err = read_grid::<Person>(grid, &Options::default()).unwrap_err();
    assert_eq!(err.row(), None);
    assert!(matches!(
        err,
        Error::Row(RowError {
            row: None,
            source: DecodeError::MissingRequiredColumn(ref column),
        }) if column == "name"
    ));
}

#[test]
fn row_errors_carry_the_sheet_row() {
    let empty = RowGrid::from_rows([["Name", "Age"], ["Ann", "30"], ["", "31"]]);
    let err = read_grid::<Person>(empty, &Options::default()).unwrap_err();
    assert_eq!(err.row(), Some(3));
    assert_eq!(err.to_string(), "row 3: required column name is empty");

    let invalid = RowGrid::from_rows([["Name", "Age"], ["Ann", "thirty"]]);
    let err = read_grid::<Person>(invalid, &Options::default()).unwrap_err();
    match err {
        Error::Row(RowError {
            row: Some(2),
            source:
                DecodeError::InvalidCell {
                    column,
                    value,
                    source: CellError::InvalidInt { .. },
                },
        }) => {
            assert_eq!(column, "age");
            assert_eq!(value, "thirty");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn header_and_data_rows_are_configurable() -> Result<()> {
    let grid = RowGrid::from_rows(vec![
        vec!["Staff export"],
        vec![],
        vec!["Name", "Age"],
        vec!["(units)", "years"],
        vec!["Ann", "30"],
        vec!["Ben", "x"],
    ]);
    let opts = Options::default().with_header_row(3).with_data_start_row(5);

    let mut reader = TypeReader::<Person>::new(grid.clone(), &opts)?;
    assert_eq!(reader.headers(), ["Name", "Age"]);
    let err = reader.read().unwrap_err();
    assert_eq!(err.row(), Some(6));

    let mut fixed = grid.into_rows();
    fixed[5][1] = "31".into();
    let people: Vec<Person> = read_grid(RowGrid::new(fixed), &opts)?;
    assert_eq!(people, vec![person("Ann", 30, None, false), person("Ben", 31, None, false)]);
    Ok(())
}

#[test]
fn header_row_out_of_bounds() {
    let grid = RowGrid::from_rows([["Name"]]);
    let opts = Options::default().with_header_row(3).with_data_start_row(4);
    let err = read_grid::<Person>(grid, &opts).unwrap_err();
    assert!(matches!(
        err,
        Error::Row(RowError {
            row: None,
            source: DecodeError::HeaderOutOfBounds {
                header_row: 3,
                rows: 1
            },
        })
    ));

    let bad = Options::default().with_data_start_row(1);
    assert!(matches!(
        read_grid::<Person>(RowGrid::default(), &bad),
        Err(Error::InvalidOptions(_))
    ));
}

#[test]
fn trailing_blank_rows_are_trimmed() -> Result<()> {
    let grid = RowGrid::from_rows(vec![
        vec!["Name", "Age"],
        vec!["Ann", "30"],
        vec!["", ""],
        vec![""],
    ]);
    let people: Vec<Person> = read_grid(grid.clone(), &Options::default())?;
    assert_eq!(people.len(), 1);

    let untrimmed = Options::default().with_trim_empty_rows(false);
    let err = read_grid::<Person>(grid, &untrimmed).unwrap_err();
    assert_eq!(err.row(), Some(3));
    Ok(())
}

tabular! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Line {
        pub sku: String,
        pub qty: u32,
    }
}

tabular! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Order {
        pub id: String => "primary",
        pub lines: Vec<Line>,
    }
}

fn line(sku: &str, qty: u32) -> Line {
    Line {
        sku: sku.into(),
        qty,
    }
}

#[test]
fn consecutive_rows_with_the_same_key_are_grouped() -> Result<()> {
    let grid = RowGrid::from_rows([
        ["Id", "Lines.sku", "Lines.qty"],
        ["A", "x", "1"],
        ["a ", "y", "2"],
        ["B", "z", "3"],
    ]);
    let orders: Vec<Order> = read_grid(grid, &Options::default())?;
    assert_eq!(
        orders,
        vec![
            Order {
                id: "A".into(),
                lines: vec![line("x", 1), line("y", 2)],
            },
            Order {
                id: "B".into(),
                lines: vec![line("z", 3)],
            },
        ]
    );
    Ok(())
}

#[test]
fn grouping_needs_adjacent_rows() -> Result<()> {
    let grid = RowGrid::from_rows([
        ["Id", "Lines.sku", "Lines.qty"],
        ["A", "x", "1"],
        ["B", "y", "2"],
        ["A", "z", "3"],
    ]);
    let orders: Vec<Order> = read_grid(grid, &Options::default())?;
    let ids: Vec<&str> = orders.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, ["A", "B", "A"]);
    Ok(())
}

#[test]
fn key_only_rows_add_no_elements() -> Result<()> {
    let grid = RowGrid::from_rows([
        ["Id", "Lines.sku", "Lines.qty"],
        ["A", "", ""],
        ["A", "x", "1"],
        ["A", "", ""],
        ["B", "", ""],
    ]);
    let orders: Vec<Order> = read_grid(grid, &Options::default())?;
    assert_eq!(
        orders,
        vec![
            Order {
                id: "A".into(),
                lines: vec![line("x", 1)],
            },
            Order {
                id: "B".into(),
                lines: vec![],
            },
        ]
    );
    Ok(())
}

tabular! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Keyed {
        pub id: String => "primary",
        pub value: i32,
    }
}

#[test]
fn without_a_collection_every_row_is_a_record() -> Result<()> {
    let grid = RowGrid::from_rows([["Id", "Value"], ["A", "1"], ["A", "2"]]);
    let records: Vec<Keyed> = read_grid(grid, &Options::default())?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].value, 2);
    Ok(())
}

#[test]
fn handwritten_sheet() -> Result<()> {
    let mut source = GridSource::new(handwritten_employee_grid());
    let employees: Vec<Employee> = read_source(&mut source, &Options::default())?;
    assert_eq!(
        employees,
        vec![
            Employee {
                name: "John".into(),
                age: 35,
                email: Some("john@example.com".into()),
                address: None,
                jobs: vec![
                    Job {
                        position: "Engineer".into(),
                        company: "Acme".into(),
                        years: None,
                    },
                    Job {
                        position: "Manager".into(),
                        company: "Initech".into(),
                        years: None,
                    },
                ],
            },
            Employee {
                name: "Jane".into(),
                age: 28,
                ..Employee::default()
            },
        ]
    );
    Ok(())
}

#[test]
fn optional_records_materialize_only_when_a_field_has_a_value() -> Result<()> {
    let grid = RowGrid::from_rows([
        ["Name", "Age", "Addr_street", "Addr_city", "Addr_zip"],
        ["Ann", "30", "", "Paris", ""],
        ["Ben", "31", "", "", ""],
    ]);
    let employees: Vec<Employee> = read_grid(grid, &Options::default())?;
    assert_eq!(
        employees[0].address,
        Some(Address {
            street: String::new(),
            city: "Paris".into(),
            zip: None,
        })
    );
    assert_eq!(employees[1].address, None);
    Ok(())
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Fragile(String);

impl CellValue for Fragile {
    fn from_cell(text: &str) -> std::result::Result<Self, CellError> {
        if text == "boom" {
            panic!("cell exploded");
        }
        if text == "bad" {
            return Err(CellError::custom("not allowed here"));
        }
        Ok(Fragile(text.to_uppercase()))
    }

    fn to_cell(&self) -> String {
        self.0.clone()
    }

    fn is_zero(&self) -> bool {
        self.0.is_empty()
    }
}

cell_field!(Fragile);

tabular! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Holder {
        pub value: Fragile,
    }
}

#[test]
fn custom_cell_values() -> Result<()> {
    let grid = RowGrid::from_rows([["Value"], ["abc"]]);
    let ok: Vec<Holder> = read_grid(grid, &Options::default())?;
    assert_eq!(ok[0].value, Fragile("ABC".into()));

    let grid = RowGrid::from_rows([["Value"], ["bad"]]);
    let err = read_grid::<Holder>(grid, &Options::default()).unwrap_err();
    assert!(err.to_string().contains("not allowed here"), "{err}");

    let grid = RowGrid::from_rows([["Value"], ["boom"]]);
    let err = read_grid::<Holder>(grid, &Options::default()).unwrap_err();
    match err {
        Error::Internal(message) => assert!(message.contains("cell exploded"), "{message}"),
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[test]
fn decoder_can_be_driven_row_by_row() -> Result<()> {
    let schema = schema_for::<Order>()?;
    let headers: Vec<String> = vec!["id".into(), "lines.qty".into()];
    let decoder = RowDecoder::<Order>::new(schema, &headers)?;

    let (order, key) = decoder.decode_one(&["  Q7 ".to_string(), "4".to_string()], 9)?;
    assert_eq!(key.as_deref(), Some("q7"));
    assert_eq!(order.lines, vec![line("", 4)]);

    let (order, key) = decoder.decode_one(&["Q7".to_string(), String::new()], 10)?;
    assert_eq!(key.as_deref(), Some("q7"));
    assert!(order.lines.is_empty());

    let err = decoder
        .decode_one(&[String::new(), "1".to_string()], 11)
        .unwrap_err();
    assert_eq!(err.row, Some(11));
    assert_eq!(err.source, DecodeError::EmptyRequiredColumn("id".into()));
    Ok(())
}
