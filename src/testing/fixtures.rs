//! Sample record types and datasets.
//!
//! `Employee` exercises every structural feature at once: a primary key, an
//! aliased optional scalar, an optional nested record with a custom prefix,
//! and a one-to-many collection.

use crate::grid::RowGrid;

tabular! {
    /// Postal address, nested under [`Employee::address`].
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct Address {
        pub street: String,
        pub city: String,
        pub zip: Option<String> => "omitempty",
    }
}

tabular! {
    /// One position held by an [`Employee`].
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct Job {
        pub position: String,
        pub company: String,
        pub years: Option<u32>,
    }
}

tabular! {
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct Employee {
        pub name: String => "primary",
        pub age: u32,
        pub email: Option<String> => "omitempty,aliases:mail|e-mail",
        pub address: Option<Address> => "prefix:addr_",
        pub jobs: Vec<Job> => "prefix:job_",
    }
}

/// Three employees: one with two jobs, one with nothing but a name and age,
/// one with a single job.
#[must_use]
pub fn sample_employees() -> Vec<Employee> {
    vec![
        Employee {
            name: "John".into(),
            age: 35,
            email: Some("john@example.com".into()),
            address: Some(Address {
                street: "1 Main St".into(),
                city: "Springfield".into(),
                zip: None,
            }),
            jobs: vec![
                Job {
                    position: "Engineer".into(),
                    company: "Acme".into(),
                    years: Some(5),
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
        Employee {
            name: "Bob".into(),
            age: 42,
            email: Some("bob@example.com".into()),
            address: Some(Address {
                street: "9 Elm St".into(),
                city: "Shelbyville".into(),
                zip: None,
            }),
            jobs: vec![Job {
                position: "Analyst".into(),
                company: "Globex".into(),
                years: Some(3),
            }],
        },
    ]
}

/// The grid [`sample_employees`] encodes to with default options, after
/// the never-filled `Addr_zip` column has been pruned.
#[must_use]
pub fn sample_employee_grid() -> RowGrid {
    RowGrid::from_rows([
        [
            "Name",
            "Age",
            "Email",
            "Addr_street",
            "Addr_city",
            "Job_position",
            "Job_company",
            "Job_years",
        ],
        [
            "John",
            "35",
            "john@example.com",
            "1 Main St",
            "Springfield",
            "Engineer",
            "Acme",
            "5",
        ],
        [
            "John",
            "35",
            "john@example.com",
            "1 Main St",
            "Springfield",
            "Manager",
            "Initech",
            "",
        ],
        ["Jane", "28", "", "", "", "", "", ""],
        [
            "Bob",
            "42",
            "bob@example.com",
            "9 Elm St",
            "Shelbyville",
            "Analyst",
            "Globex",
            "3",
        ],
    ])
}

/// A hand-written sheet for [`Employee`] with shuffled, differently cased
/// headers, an alias (`E-Mail`), and an extra column the schema ignores.
#[must_use]
pub fn handwritten_employee_grid() -> RowGrid {
    RowGrid::from_rows([
        ["JOB_POSITION", "name", "Notes", "e-mail", "age", "Job_Company"],
        ["Engineer", "John", "first", "john@example.com", "35", "Acme"],
        ["Manager", "john ", "", "", "35", "Initech"],
        ["", "Jane", "no jobs", "", "28", ""],
    ])
}
