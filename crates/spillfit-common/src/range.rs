//! Sheet-scoped rectangular ranges.
//!
//! `CellRange` is an immutable value type: resizing never mutates in place,
//! it constructs the new target range.

use std::error::Error;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stable sheet identifier handed out by the host.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SheetId(pub u32);

impl fmt::Display for SheetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sheet#{}", self.0)
    }
}

/// Errors that can occur while constructing ranges.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RangeError {
    /// Start/end coordinates were not ordered (first <= last).
    Inverted,
    /// Row/column arithmetic overflowed the coordinate type.
    Overflow,
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeError::Inverted => {
                write!(f, "range must be ordered so the first cell is above/left of the last")
            }
            RangeError::Overflow => write!(f, "range coordinates overflow"),
        }
    }
}

impl Error for RangeError {}

/// A rectangular region on one sheet, 0-based, both bounds inclusive.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub sheet: SheetId,
    pub row_first: u32,
    pub row_last: u32,
    pub col_first: u32,
    pub col_last: u32,
}

impl CellRange {
    pub fn new(
        sheet: SheetId,
        row_first: u32,
        row_last: u32,
        col_first: u32,
        col_last: u32,
    ) -> Result<Self, RangeError> {
        if row_first > row_last || col_first > col_last {
            return Err(RangeError::Inverted);
        }
        Ok(Self {
            sheet,
            row_first,
            row_last,
            col_first,
            col_last,
        })
    }

    /// The single-cell range at (row, col).
    pub fn cell(sheet: SheetId, row: u32, col: u32) -> Self {
        Self {
            sheet,
            row_first: row,
            row_last: row,
            col_first: col,
            col_last: col,
        }
    }

    pub fn height(&self) -> u32 {
        self.row_last - self.row_first + 1
    }

    pub fn width(&self) -> u32 {
        self.col_last - self.col_first + 1
    }

    pub fn is_single_cell(&self) -> bool {
        self.row_first == self.row_last && self.col_first == self.col_last
    }

    /// The single-cell range at this range's top-left corner.
    pub fn top_left(&self) -> CellRange {
        CellRange::cell(self.sheet, self.row_first, self.col_first)
    }

    /// A new range anchored at this range's top-left corner spanning
    /// `rows` × `cols` cells. Fails on zero sizes or coordinate overflow.
    pub fn resized(&self, rows: u32, cols: u32) -> Result<CellRange, RangeError> {
        if rows == 0 || cols == 0 {
            return Err(RangeError::Inverted);
        }
        let row_last = self
            .row_first
            .checked_add(rows - 1)
            .ok_or(RangeError::Overflow)?;
        let col_last = self
            .col_first
            .checked_add(cols - 1)
            .ok_or(RangeError::Overflow)?;
        Ok(CellRange {
            sheet: self.sheet,
            row_first: self.row_first,
            row_last,
            col_first: self.col_first,
            col_last,
        })
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.row_first && row <= self.row_last && col >= self.col_first && col <= self.col_last
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}!R{}C{}:R{}C{}",
            self.sheet,
            self.row_first + 1,
            self.col_first + 1,
            self.row_last + 1,
            self.col_last + 1
        )
    }
}

/// Hard bounds of the host's sheet grid.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLimits {
    pub max_rows: u32,
    pub max_cols: u32,
}

impl SheetLimits {
    /// Modern hosts: 1_048_576 rows × 16_384 columns.
    pub const MODERN: SheetLimits = SheetLimits {
        max_rows: 1_048_576,
        max_cols: 16_384,
    };

    /// Whether `range` lies fully inside the sheet (0-based, exclusive max).
    pub fn contains(&self, range: &CellRange) -> bool {
        range.row_last < self.max_rows && range.col_last < self.max_cols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_bounds_rejected() {
        let err = CellRange::new(SheetId(0), 5, 4, 0, 0).unwrap_err();
        assert_eq!(err, RangeError::Inverted);
        let err = CellRange::new(SheetId(0), 0, 0, 3, 2).unwrap_err();
        assert_eq!(err, RangeError::Inverted);
    }

    #[test]
    fn shape_accessors() {
        let r = CellRange::new(SheetId(1), 4, 6, 1, 4).unwrap();
        assert_eq!(r.height(), 3);
        assert_eq!(r.width(), 4);
        assert!(!r.is_single_cell());
        assert!(CellRange::cell(SheetId(1), 4, 1).is_single_cell());
        assert_eq!(r.top_left(), CellRange::cell(SheetId(1), 4, 1));
    }

    #[test]
    fn resized_anchors_at_top_left() {
        let caller = CellRange::cell(SheetId(0), 4, 1);
        let target = caller.resized(3, 4).unwrap();
        assert_eq!(target, CellRange::new(SheetId(0), 4, 6, 1, 4).unwrap());
    }

    #[test]
    fn resized_rejects_zero_and_overflow() {
        let caller = CellRange::cell(SheetId(0), 4, 1);
        assert_eq!(caller.resized(0, 3).unwrap_err(), RangeError::Inverted);
        let far = CellRange::cell(SheetId(0), u32::MAX - 1, 0);
        assert_eq!(far.resized(4, 1).unwrap_err(), RangeError::Overflow);
    }

    #[test]
    fn limits_contain() {
        let limits = SheetLimits {
            max_rows: 100,
            max_cols: 10,
        };
        assert!(limits.contains(&CellRange::new(SheetId(0), 0, 99, 0, 9).unwrap()));
        assert!(!limits.contains(&CellRange::new(SheetId(0), 0, 100, 0, 9).unwrap()));
        assert!(!limits.contains(&CellRange::new(SheetId(0), 0, 99, 0, 10).unwrap()));
    }
}
