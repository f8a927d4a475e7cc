use std::fmt::{self, Display};

use crate::CellError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One typed cell of a computed array result.
///
/// This is the marshaled form a formula hands back to the host — not the
/// richer set of types a cell can *store*. Exactly these variants survive
/// the literal-text fallback round trip.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Int(i64),
    Number(f64),
    Text(String),
    Boolean(bool),
    Empty,

    Error(CellError),
}

impl Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellValue::Error(e) => write!(f, "{e}"),
            CellValue::Empty => write!(f, ""),
        }
    }
}

impl CellValue {
    pub fn is_truthy(&self) -> bool {
        match self {
            CellValue::Boolean(b) => *b,
            CellValue::Int(i) => *i != 0,
            CellValue::Number(n) => *n != 0.0,
            CellValue::Text(s) => !s.is_empty(),
            CellValue::Error(_) => false,
            CellValue::Empty => false,
        }
    }
}

/// Rectangular grid of [`CellValue`]s — the computed array result a formula
/// hands to the resize engine. The engine only ever reads its shape.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueGrid {
    rows: Vec<Vec<CellValue>>,
}

/// Error raised when grid rows are not all the same width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaggedGrid {
    pub row: usize,
    pub expected: usize,
    pub found: usize,
}

impl Display for RaggedGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "grid row {} has {} cells, expected {}",
            self.row, self.found, self.expected
        )
    }
}

impl std::error::Error for RaggedGrid {}

impl ValueGrid {
    /// Build a grid, enforcing rectangularity.
    pub fn new(rows: Vec<Vec<CellValue>>) -> Result<Self, RaggedGrid> {
        if let Some(first) = rows.first() {
            let expected = first.len();
            for (i, row) in rows.iter().enumerate().skip(1) {
                if row.len() != expected {
                    return Err(RaggedGrid {
                        row: i,
                        expected,
                        found: row.len(),
                    });
                }
            }
        }
        Ok(Self { rows })
    }

    /// Grid from a rectangular block of numbers (the numeric-only variant).
    pub fn from_numbers(rows: &[Vec<f64>]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|r| r.iter().map(|n| CellValue::Number(*n)).collect())
                .collect(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn cols(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// A grid with zero rows or zero columns has no sensible resize target.
    pub fn is_degenerate(&self) -> bool {
        self.rows() == 0 || self.cols() == 0
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    pub fn into_rows(self) -> Vec<Vec<CellValue>> {
        self.rows
    }

    pub fn as_rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }
}
