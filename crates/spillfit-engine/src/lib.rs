//! Automatic array-result range resizing for spreadsheet-host add-ins.
//!
//! When a formula computes a two-dimensional result, the cell range calling
//! it rarely has the right shape. [`ArrayResizer`] inspects the caller's
//! range on the recalculation thread, and — when the shapes differ — queues
//! a rewrite of the caller's array formula into the host's macro-execution
//! context, returning the computed array unchanged in the meantime so the
//! user never sees a "value unavailable" flash. The deferred rewrite clears
//! any stale legacy array, rebinds the formula over the new range under
//! suppressed repaint and manual calculation, and lets the host's own
//! recalculation fill in the values.

pub mod decision;
pub mod guards;
pub mod probe;
pub mod rewrite;

pub use decision::{Action, decide_resize};
pub use guards::{ManualCalculation, RepaintSuppressed, SelectionGuard};
pub use probe::DynamicArrayProbe;
pub use rewrite::RewriteRequest;

use std::sync::Arc;

use tracing::debug;

use spillfit_common::{CellError, CellErrorKind, ValueGrid};
use spillfit_host::SpreadsheetHost;

/// What a resize-aware formula hands back to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum ResizeResult {
    /// The computed array, returned as-is (possibly with a rewrite pending).
    Array(ValueGrid),
    /// The result cannot fit on the sheet; show this error at the caller.
    Error(CellError),
}

/// The resize engine, bound to one host document.
///
/// Construct one per add-in instance and share it across recalculation
/// threads: [`ArrayResizer::resize`] is read-only with respect to the host
/// and the capability probe resolves idempotently.
pub struct ArrayResizer<H: SpreadsheetHost> {
    host: Arc<H>,
    probe: DynamicArrayProbe,
}

impl<H: SpreadsheetHost> ArrayResizer<H> {
    pub fn new(host: Arc<H>) -> Self {
        Self {
            host,
            probe: DynamicArrayProbe::new(),
        }
    }

    /// Resize the caller to fit `grid`, generic-value variant.
    ///
    /// Oversize results surface as `#VALUE!`. When a resize is needed, the
    /// rewrite is queued and the original array returned unchanged.
    pub fn resize(&self, grid: ValueGrid) -> ResizeResult {
        match self.decide(grid.rows(), grid.cols()) {
            Action::ReturnUnchanged => ResizeResult::Array(grid),
            Action::ReturnError => ResizeResult::Error(
                CellError::new(CellErrorKind::Value)
                    .with_message("result does not fit on the sheet"),
            ),
            Action::ScheduleResize(target) => {
                self.schedule(target);
                ResizeResult::Array(grid)
            }
        }
    }

    /// Resize the caller to fit a numeric-only grid.
    ///
    /// Same decision logic as [`Self::resize`]; only the oversize sentinel
    /// differs — `None`, which the embedding marshals to its numeric error
    /// code.
    pub fn resize_numeric(&self, grid: Vec<Vec<f64>>) -> Option<Vec<Vec<f64>>> {
        let rows = grid.len();
        let cols = grid.first().map_or(0, Vec::len);
        match self.decide(rows, cols) {
            Action::ReturnUnchanged => Some(grid),
            Action::ReturnError => None,
            Action::ScheduleResize(target) => {
                self.schedule(target);
                Some(grid)
            }
        }
    }

    /// Memoized host capability: does it spill single-cell array formulas
    /// itself?
    pub fn supports_dynamic_arrays(&self) -> bool {
        self.probe.supports_dynamic_arrays(self.host.as_ref())
    }

    fn decide(&self, rows: usize, cols: usize) -> Action {
        // Not called from a cell: nothing to resize, hand the value back.
        let Some(caller) = self.host.caller_range() else {
            return Action::ReturnUnchanged;
        };
        let dynamic = self.probe.supports_dynamic_arrays(self.host.as_ref());
        decide_resize(rows, cols, &caller, self.host.sheet_limits(), dynamic)
    }

    fn schedule(&self, target: spillfit_common::CellRange) {
        let request = RewriteRequest { target };
        debug!(%target, "queueing deferred resize");
        self.host
            .enqueue_macro_task(Box::new(move |host| rewrite::perform(host, &request)));
    }
}
