//! The automation surface the resize engine needs from a live spreadsheet
//! host.
//!
//! Everything here is a synchronous request/response call into the host,
//! except [`SpreadsheetHost::enqueue_macro_task`], which defers work into the
//! host's privileged macro-execution context — the only context allowed to
//! mutate sheet structure. Implementations wrap a concrete automation layer
//! (an XLL callback table, a COM bridge, a UNO proxy); the engine never sees
//! anything below this trait.

use spillfit_common::{CellRange, SheetId, SheetLimits};

/// Deferred unit of work executed inside the host's macro context.
///
/// Tasks run one at a time, in submission order, with full mutation rights
/// on the sheet. The host passes itself back in so the task does not have to
/// capture a host handle of its own.
pub type MacroTask = Box<dyn FnOnce(&dyn SpreadsheetHost) + Send + 'static>;

/// Failures raised by individual host automation calls.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    /// The formula cannot be expressed in the relative reference
    /// convention (typically: too long once converted).
    #[error("formula cannot be converted to the relative reference convention")]
    InconvertibleFormula,

    /// The target range collides with a different existing array formula.
    #[error("target range overlaps another array formula")]
    ArrayOverlap,

    /// The call has no meaning in the current context (e.g. a capability
    /// the host predates).
    #[error("host call not available")]
    NotAvailable,

    /// Any other rejection, with the host's own diagnostic text.
    #[error("host rejected the call: {0}")]
    Rejected(String),
}

/// The host's recalculation trigger mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalculationMode {
    Automatic,
    AutomaticExceptTables,
    Manual,
}

/// One live spreadsheet host document.
///
/// Implementations must be callable from the host's recalculation worker
/// threads (`Send + Sync`); only the macro context may be used for
/// structural mutation, which the engine honours by routing every write
/// through [`Self::enqueue_macro_task`].
pub trait SpreadsheetHost: Send + Sync {
    /// The range invoking the formula under evaluation. `None` means the
    /// formula was not called from a cell, which is a valid state — the
    /// engine returns results unchanged.
    fn caller_range(&self) -> Option<CellRange>;

    /// Hard row/column bounds of the sheet grid.
    fn sheet_limits(&self) -> SheetLimits;

    /// Defer `task` into the privileged macro context. Returns immediately;
    /// tasks execute serialized, in submission order.
    fn enqueue_macro_task(&self, task: MacroTask);

    /// Formula text currently stored in `cell` ("" when the cell holds no
    /// formula).
    fn cell_formula_text(&self, cell: &CellRange) -> Result<String, HostError>;

    /// Whether `cell` belongs to a legacy multi-cell array formula.
    fn is_part_of_array_formula(&self, cell: &CellRange) -> Result<bool, HostError>;

    /// Full extent of the array formula containing `cell` (the host's
    /// "select special: current array" query).
    fn array_formula_extent(&self, cell: &CellRange) -> Result<CellRange, HostError>;

    /// Clear every cell value in `range`.
    fn clear_range(&self, range: &CellRange) -> Result<(), HostError>;

    /// Whether the host's formula display mode is already the relative
    /// (R1C1-style) convention.
    fn reference_mode_is_relative(&self) -> Result<bool, HostError>;

    /// Convert `formula` into the relative convention, anchored at `anchor`.
    fn convert_formula_to_relative(
        &self,
        formula: &str,
        anchor: &CellRange,
    ) -> Result<String, HostError>;

    /// Bind `formula` (relative convention) as an array formula spanning
    /// exactly `target`. The host re-evaluates the range on its next pass.
    fn submit_array_formula(&self, formula: &str, target: &CellRange) -> Result<(), HostError>;

    /// Write literal text into a single cell (used to preserve a formula
    /// that could not be rewritten).
    fn set_cell_literal(&self, cell: &CellRange, text: &str) -> Result<(), HostError>;

    /// Human-readable address of `cell` for alert messages.
    fn cell_address_text(&self, cell: &CellRange) -> String;

    /// Show a modal alert. Only permitted from the macro context.
    fn show_alert(&self, message: &str);

    /// Current selection on the active sheet (the range carries the active
    /// sheet's id).
    fn selection(&self) -> Result<CellRange, HostError>;
    fn set_selection(&self, range: &CellRange) -> Result<(), HostError>;

    /// Active cell within the selection, as a single-cell range.
    fn active_cell(&self) -> Result<CellRange, HostError>;
    fn set_active_cell(&self, cell: &CellRange) -> Result<(), HostError>;

    /// Make `sheet` the active sheet.
    fn select_sheet(&self, sheet: SheetId) -> Result<(), HostError>;

    /// Screen repaint ("echo") flag.
    fn repaint_enabled(&self) -> Result<bool, HostError>;
    fn set_repaint_enabled(&self, enabled: bool) -> Result<(), HostError>;

    fn calculation_mode(&self) -> Result<CalculationMode, HostError>;
    fn set_calculation_mode(&self, mode: CalculationMode) -> Result<(), HostError>;

    /// Whether the host natively spills single-cell array formulas. May
    /// itself fail on hosts that predate the capability query; callers
    /// treat any error as `false`.
    fn probe_dynamic_array_support(&self) -> Result<bool, HostError>;
}
