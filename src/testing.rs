//! Testing utilities for record mappings.
//!
//! - **Fixtures**: sample record types ([`Employee`], [`Job`], [`Address`])
//!   with matching data and grids
//! - **Assertions**: compare grids with readable failure messages
//! - **Mock I/O**: temporary files for file-backed sources and sinks
//!
//! # Quick Start
//!
//! ```no_run
//! use tabmap::*;
//! use tabmap::testing::*;
//!
//! #[test]
//! fn employees_round_trip() -> anyhow::Result<()> {
//!     let grid = write_grid(&sample_employees(), &Options::default())?;
//!     assert_grid_eq(&grid, &sample_employee_grid());
//!
//!     let back: Vec<Employee> = read_grid(grid, &Options::default())?;
//!     assert_eq!(back, sample_employees());
//!     Ok(())
//! }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod mock_io;

pub use assertions::*;
pub use fixtures::*;
pub use mock_io::*;
