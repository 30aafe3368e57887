//! Assertion functions for grids.

use crate::grid::RowGrid;
use crate::schema::fold;

/// Assert that the first row of `grid` is exactly `expected`.
///
/// # Panics
///
/// Panics if the grid is empty or its header differs.
///
/// # Example
///
/// ```
/// use tabmap::RowGrid;
/// use tabmap::testing::assert_headers;
///
/// let grid = RowGrid::from_rows([["Name", "Age"], ["John", "20"]]);
/// assert_headers(&grid, &["Name", "Age"]);
/// ```
pub fn assert_headers(grid: &RowGrid, expected: &[&str]) {
    let Some(header) = grid.row(0) else {
        panic!("Grid has no header row; expected {expected:?}");
    };
    assert_eq!(
        header, expected,
        "Header mismatch:\n  Expected: {expected:?}\n  Actual: {header:?}"
    );
}

/// Assert that two grids are equal row by row.
///
/// # Panics
///
/// Panics with the first differing row if the grids differ.
pub fn assert_grid_eq(actual: &RowGrid, expected: &RowGrid) {
    for (i, (a, e)) in actual.rows().iter().zip(expected.rows()).enumerate() {
        assert_eq!(
            a,
            e,
            "Grid mismatch at sheet row {}:\n  Expected: {e:?}\n  Actual: {a:?}",
            i + 1
        );
    }
    assert_eq!(
        actual.len(),
        expected.len(),
        "Grid length mismatch:\n  Expected rows: {}\n  Actual rows: {}\n  Expected: {expected:?}\n  Actual: {actual:?}",
        expected.len(),
        actual.len()
    );
}

/// Assert that no header cell of `grid` names `column` (case-insensitive).
///
/// # Panics
///
/// Panics if the column is present.
pub fn assert_column_absent(grid: &RowGrid, column: &str) {
    let header = grid.row(0).unwrap_or_default();
    let wanted = fold(column);
    if let Some(position) = header.iter().position(|h| fold(h) == wanted) {
        panic!("Column {column:?} unexpectedly present at position {position} in {header:?}");
    }
}
