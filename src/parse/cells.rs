//! Position-addressed cell lists.
//!
//! Some structure services return a flat list of `{row, col, text}` records
//! instead of markup. Field names vary between service versions, so each
//! coordinate accepts an alias (`row_start`, `col_start`, `content`).
//!
//! Coordinates come from untrusted JSON, so the dense grid is capped at
//! [`MAX_GRID_CELLS`]; anything larger is rejected rather than allocated.

use crate::table::Table;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Largest `rows × columns` grid [`parse_cell_grid`] will materialise.
pub const MAX_GRID_CELLS: usize = 100_000;

/// One cell of a position-addressed grid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRecord {
    pub row: usize,
    pub col: usize,
    pub text: String,
}

impl CellRecord {
    pub fn new(row: usize, col: usize, text: impl Into<String>) -> Self {
        Self {
            row,
            col,
            text: text.into(),
        }
    }

    /// Read a record from loosely-typed JSON.
    ///
    /// Each coordinate takes the first non-zero value among its aliases, so
    /// `{"row": 0, "row_start": 3}` is row 3. Whole floats such as `1.0`
    /// count; missing or non-numeric coordinates become 0. Missing text
    /// becomes an empty string. Returns `None` only when `value` is not an
    /// object.
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let coord = |keys: [&str; 2]| {
            keys.iter()
                .filter_map(|k| obj.get(*k).and_then(as_index))
                .find(|&v| v != 0)
                .unwrap_or(0)
        };
        let text = ["text", "content"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_str).filter(|s| !s.is_empty()))
            .unwrap_or_default();
        Some(Self::new(coord(["row", "row_start"]), coord(["col", "col_start"]), text))
    }
}

fn as_index(v: &Value) -> Option<usize> {
    v.as_u64()
        .or_else(|| {
            v.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        })
        .and_then(|n| usize::try_from(n).ok())
}

/// Number of cells in the dense grid spanned by `cells`, or `None` on overflow.
pub fn grid_size(cells: &[CellRecord]) -> Option<usize> {
    let rows = cells.iter().map(|c| c.row).max().unwrap_or(0).checked_add(1)?;
    let cols = cells.iter().map(|c| c.col).max().unwrap_or(0).checked_add(1)?;
    rows.checked_mul(cols)
}

/// True when the grid spanned by `cells` is within [`MAX_GRID_CELLS`].
pub fn grid_fits(cells: &[CellRecord]) -> bool {
    grid_size(cells).is_some_and(|n| n <= MAX_GRID_CELLS)
}

/// Rebuild a table from sparse cells.
///
/// The grid spans `0..=max_row × 0..=max_col`; gaps are empty strings. Rows
/// where every cell is empty are dropped, then the first remaining row
/// becomes the header. Returns `None` when no body row is left after that,
/// or when the grid would exceed [`MAX_GRID_CELLS`].
pub fn parse_cell_grid(cells: &[CellRecord]) -> Option<Table> {
    if !grid_fits(cells) {
        warn!(
            "Cell grid of {} records spans more than {} cells, ignored",
            cells.len(),
            MAX_GRID_CELLS
        );
        return None;
    }

    let mut grid: HashMap<(usize, usize), &str> = HashMap::with_capacity(cells.len());
    let mut max_row = 0;
    let mut max_col = 0;

    for cell in cells {
        grid.insert((cell.row, cell.col), cell.text.as_str());
        max_row = max_row.max(cell.row);
        max_col = max_col.max(cell.col);
    }

    let mut rows: Vec<Vec<String>> = (0..=max_row)
        .map(|r| {
            (0..=max_col)
                .map(|c| grid.get(&(r, c)).copied().unwrap_or("").to_string())
                .collect::<Vec<_>>()
        })
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .collect();

    if rows.len() < 2 {
        debug!("Cell grid of {} records has no body rows", cells.len());
        return None;
    }

    let column_names = rows.remove(0);
    Some(Table::new(column_names, rows))
}
