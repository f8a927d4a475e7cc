//! In-memory scripted host for unit and property tests.
//!
//! Builder-style construction (`with_*`), interior mutability so the trait's
//! `&self` methods work, and full recording of everything the engine does to
//! it: alerts shown, ranges cleared, formulas submitted, literals written,
//! UI-state transitions. Queued macro tasks are held and run serially via
//! [`ScriptedHost::drain_macro_tasks`] so tests stay deterministic.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use spillfit_common::{CellRange, SheetId, SheetLimits};

use crate::traits::{CalculationMode, HostError, MacroTask, SpreadsheetHost};

type CellKey = (SheetId, u32, u32); // (sheet, row, col), 0-based

/// Snapshot of the globally shared UI state the engine must restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiSnapshot {
    pub repaint_enabled: bool,
    pub calculation_mode: CalculationMode,
    pub active_sheet: SheetId,
    pub selection: CellRange,
    pub active_cell: CellRange,
}

#[derive(Debug, Default)]
struct Recorded {
    alerts: Vec<String>,
    cleared: Vec<CellRange>,
    submitted: Vec<(String, CellRange)>,
    conversions: Vec<String>,
}

struct State {
    caller: Option<CellRange>,
    limits: SheetLimits,
    relative_mode: bool,
    probe_result: Result<bool, HostError>,
    probe_calls: usize,

    formulas: FxHashMap<CellKey, String>,
    literals: FxHashMap<CellKey, String>,
    array_extents: Vec<CellRange>,

    convert_failure: Option<HostError>,
    submit_failure: Option<HostError>,

    repaint_enabled: bool,
    calculation_mode: CalculationMode,
    active_sheet: SheetId,
    // Per-sheet selection + active cell, like a real host keeps per sheet.
    selections: FxHashMap<SheetId, (CellRange, CellRange)>,

    recorded: Recorded,
}

impl Default for State {
    fn default() -> Self {
        Self {
            caller: None,
            limits: SheetLimits::MODERN,
            relative_mode: false,
            probe_result: Ok(false),
            probe_calls: 0,
            formulas: FxHashMap::default(),
            literals: FxHashMap::default(),
            array_extents: Vec::new(),
            convert_failure: None,
            submit_failure: None,
            repaint_enabled: true,
            calculation_mode: CalculationMode::Automatic,
            active_sheet: SheetId(0),
            selections: FxHashMap::default(),
            recorded: Recorded::default(),
        }
    }
}

impl State {
    fn selection_on(&self, sheet: SheetId) -> (CellRange, CellRange) {
        let home = CellRange::cell(sheet, 0, 0);
        self.selections.get(&sheet).copied().unwrap_or((home, home))
    }
}

#[derive(Default)]
pub struct ScriptedHost {
    state: Mutex<State>,
    tasks: Mutex<Vec<MacroTask>>,
}

impl ScriptedHost {
    /* ─────────────── constructors ─────────────── */
    pub fn new() -> Self {
        Self::default()
    }

    /* ─────────────── scripting ─────────────── */
    pub fn with_caller(self, caller: CellRange) -> Self {
        self.state.lock().caller = Some(caller);
        self
    }

    pub fn with_limits(self, limits: SheetLimits) -> Self {
        self.state.lock().limits = limits;
        self
    }

    pub fn with_relative_reference_mode(self, relative: bool) -> Self {
        self.state.lock().relative_mode = relative;
        self
    }

    pub fn with_dynamic_arrays(self, supported: bool) -> Self {
        self.state.lock().probe_result = Ok(supported);
        self
    }

    /// Script the capability probe itself to fail, as on hosts that predate
    /// the query.
    pub fn with_probe_error(self) -> Self {
        self.state.lock().probe_result = Err(HostError::NotAvailable);
        self
    }

    pub fn with_formula(self, cell: CellRange, formula: impl Into<String>) -> Self {
        {
            let mut st = self.state.lock();
            st.formulas
                .insert((cell.sheet, cell.row_first, cell.col_first), formula.into());
        }
        self
    }

    /// Script a legacy multi-cell array formula spanning `extent`, with the
    /// formula text stored at its top-left cell.
    pub fn with_array_formula(self, extent: CellRange, formula: impl Into<String>) -> Self {
        {
            let mut st = self.state.lock();
            let anchor = extent.top_left();
            st.formulas.insert(
                (anchor.sheet, anchor.row_first, anchor.col_first),
                formula.into(),
            );
            st.array_extents.push(extent);
        }
        self
    }

    pub fn with_conversion_failure(self, err: HostError) -> Self {
        self.state.lock().convert_failure = Some(err);
        self
    }

    pub fn with_submission_failure(self, err: HostError) -> Self {
        self.state.lock().submit_failure = Some(err);
        self
    }

    pub fn with_active_sheet(self, sheet: SheetId) -> Self {
        self.state.lock().active_sheet = sheet;
        self
    }

    pub fn with_selection(self, selection: CellRange, active_cell: CellRange) -> Self {
        {
            let mut st = self.state.lock();
            st.selections
                .insert(selection.sheet, (selection, active_cell));
        }
        self
    }

    /* ─────────────── macro task draining ─────────────── */

    /// Run every queued macro task serially, in submission order, against
    /// this host. Tasks queued by tasks are run too.
    pub fn drain_macro_tasks(&self) {
        loop {
            let batch: Vec<MacroTask> = std::mem::take(&mut *self.tasks.lock());
            if batch.is_empty() {
                return;
            }
            for task in batch {
                task(self);
            }
        }
    }

    pub fn pending_macro_tasks(&self) -> usize {
        self.tasks.lock().len()
    }

    /* ─────────────── inspection ─────────────── */

    pub fn ui_snapshot(&self) -> UiSnapshot {
        let st = self.state.lock();
        let (selection, active_cell) = st.selection_on(st.active_sheet);
        UiSnapshot {
            repaint_enabled: st.repaint_enabled,
            calculation_mode: st.calculation_mode,
            active_sheet: st.active_sheet,
            selection,
            active_cell,
        }
    }

    pub fn alerts(&self) -> Vec<String> {
        self.state.lock().recorded.alerts.clone()
    }

    pub fn cleared_ranges(&self) -> Vec<CellRange> {
        self.state.lock().recorded.cleared.clone()
    }

    pub fn submitted_formulas(&self) -> Vec<(String, CellRange)> {
        self.state.lock().recorded.submitted.clone()
    }

    /// Formulas the engine asked to convert to the relative convention.
    pub fn conversion_requests(&self) -> Vec<String> {
        self.state.lock().recorded.conversions.clone()
    }

    pub fn probe_call_count(&self) -> usize {
        self.state.lock().probe_calls
    }

    pub fn formula_at(&self, cell: &CellRange) -> Option<String> {
        self.state
            .lock()
            .formulas
            .get(&(cell.sheet, cell.row_first, cell.col_first))
            .cloned()
    }

    pub fn literal_at(&self, cell: &CellRange) -> Option<String> {
        self.state
            .lock()
            .literals
            .get(&(cell.sheet, cell.row_first, cell.col_first))
            .cloned()
    }
}

impl SpreadsheetHost for ScriptedHost {
    fn caller_range(&self) -> Option<CellRange> {
        self.state.lock().caller
    }

    fn sheet_limits(&self) -> SheetLimits {
        self.state.lock().limits
    }

    fn enqueue_macro_task(&self, task: MacroTask) {
        self.tasks.lock().push(task);
    }

    fn cell_formula_text(&self, cell: &CellRange) -> Result<String, HostError> {
        Ok(self.formula_at(cell).unwrap_or_default())
    }

    fn is_part_of_array_formula(&self, cell: &CellRange) -> Result<bool, HostError> {
        let st = self.state.lock();
        Ok(st
            .array_extents
            .iter()
            .any(|e| e.contains(cell.row_first, cell.col_first) && e.sheet == cell.sheet))
    }

    fn array_formula_extent(&self, cell: &CellRange) -> Result<CellRange, HostError> {
        let st = self.state.lock();
        st.array_extents
            .iter()
            .find(|e| e.contains(cell.row_first, cell.col_first) && e.sheet == cell.sheet)
            .copied()
            .ok_or(HostError::NotAvailable)
    }

    fn clear_range(&self, range: &CellRange) -> Result<(), HostError> {
        let mut st = self.state.lock();
        st.recorded.cleared.push(*range);
        st.formulas.retain(|(sheet, row, col), _| {
            *sheet != range.sheet || !range.contains(*row, *col)
        });
        st.literals.retain(|(sheet, row, col), _| {
            *sheet != range.sheet || !range.contains(*row, *col)
        });
        st.array_extents.retain(|e| e != range);
        Ok(())
    }

    fn reference_mode_is_relative(&self) -> Result<bool, HostError> {
        Ok(self.state.lock().relative_mode)
    }

    fn convert_formula_to_relative(
        &self,
        formula: &str,
        _anchor: &CellRange,
    ) -> Result<String, HostError> {
        let mut st = self.state.lock();
        if let Some(err) = st.convert_failure.clone() {
            return Err(err);
        }
        st.recorded.conversions.push(formula.to_string());
        Ok(formula.to_string())
    }

    fn submit_array_formula(&self, formula: &str, target: &CellRange) -> Result<(), HostError> {
        let mut st = self.state.lock();
        if let Some(err) = st.submit_failure.clone() {
            return Err(err);
        }
        let anchor = target.top_left();
        let overlaps_foreign = st.array_extents.iter().any(|e| {
            e.sheet == target.sheet
                && e.top_left() != anchor
                && e.row_first <= target.row_last
                && target.row_first <= e.row_last
                && e.col_first <= target.col_last
                && target.col_first <= e.col_last
        });
        if overlaps_foreign {
            return Err(HostError::ArrayOverlap);
        }
        st.array_extents.retain(|e| e.top_left() != anchor);
        st.array_extents.push(*target);
        st.formulas.insert(
            (anchor.sheet, anchor.row_first, anchor.col_first),
            formula.to_string(),
        );
        st.recorded.submitted.push((formula.to_string(), *target));
        Ok(())
    }

    fn set_cell_literal(&self, cell: &CellRange, text: &str) -> Result<(), HostError> {
        let mut st = self.state.lock();
        st.literals
            .insert((cell.sheet, cell.row_first, cell.col_first), text.to_string());
        Ok(())
    }

    fn cell_address_text(&self, cell: &CellRange) -> String {
        format!(
            "{}!R{}C{}",
            cell.sheet,
            cell.row_first + 1,
            cell.col_first + 1
        )
    }

    fn show_alert(&self, message: &str) {
        self.state.lock().recorded.alerts.push(message.to_string());
    }

    fn selection(&self) -> Result<CellRange, HostError> {
        let st = self.state.lock();
        Ok(st.selection_on(st.active_sheet).0)
    }

    fn set_selection(&self, range: &CellRange) -> Result<(), HostError> {
        let mut st = self.state.lock();
        let sheet = st.active_sheet;
        let active_cell = st.selection_on(sheet).1;
        st.selections.insert(sheet, (*range, active_cell));
        Ok(())
    }

    fn active_cell(&self) -> Result<CellRange, HostError> {
        let st = self.state.lock();
        Ok(st.selection_on(st.active_sheet).1)
    }

    fn set_active_cell(&self, cell: &CellRange) -> Result<(), HostError> {
        let mut st = self.state.lock();
        let sheet = st.active_sheet;
        let selection = st.selection_on(sheet).0;
        st.selections.insert(sheet, (selection, *cell));
        Ok(())
    }

    fn select_sheet(&self, sheet: SheetId) -> Result<(), HostError> {
        self.state.lock().active_sheet = sheet;
        Ok(())
    }

    fn repaint_enabled(&self) -> Result<bool, HostError> {
        Ok(self.state.lock().repaint_enabled)
    }

    fn set_repaint_enabled(&self, enabled: bool) -> Result<(), HostError> {
        self.state.lock().repaint_enabled = enabled;
        Ok(())
    }

    fn calculation_mode(&self) -> Result<CalculationMode, HostError> {
        Ok(self.state.lock().calculation_mode)
    }

    fn set_calculation_mode(&self, mode: CalculationMode) -> Result<(), HostError> {
        self.state.lock().calculation_mode = mode;
        Ok(())
    }

    fn probe_dynamic_array_support(&self) -> Result<bool, HostError> {
        let mut st = self.state.lock();
        st.probe_calls += 1;
        st.probe_result.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(r1: u32, r2: u32, c1: u32, c2: u32) -> CellRange {
        CellRange::new(SheetId(0), r1, r2, c1, c2).unwrap()
    }

    #[test]
    fn array_formula_membership_and_extent() {
        let host = ScriptedHost::new().with_array_formula(range(2, 4, 1, 3), "=SEQ()");
        assert!(host
            .is_part_of_array_formula(&CellRange::cell(SheetId(0), 3, 2))
            .unwrap());
        assert!(!host
            .is_part_of_array_formula(&CellRange::cell(SheetId(0), 5, 2))
            .unwrap());
        assert_eq!(
            host.array_formula_extent(&CellRange::cell(SheetId(0), 2, 1))
                .unwrap(),
            range(2, 4, 1, 3)
        );
    }

    #[test]
    fn submit_rejects_foreign_overlap_only() {
        let host = ScriptedHost::new().with_array_formula(range(0, 2, 0, 2), "=OLD()");
        // Same anchor: resizing the same formula is allowed.
        host.submit_array_formula("=OLD()", &range(0, 5, 0, 5)).unwrap();
        // A different anchor overlapping the (now larger) extent is not.
        let err = host
            .submit_array_formula("=NEW()", &range(4, 6, 4, 6))
            .unwrap_err();
        assert_eq!(err, HostError::ArrayOverlap);
    }

    #[test]
    fn clear_range_drops_formulas_inside() {
        let host = ScriptedHost::new()
            .with_formula(CellRange::cell(SheetId(0), 1, 1), "=A1")
            .with_formula(CellRange::cell(SheetId(0), 9, 9), "=B2");
        host.clear_range(&range(0, 5, 0, 5)).unwrap();
        assert_eq!(host.formula_at(&CellRange::cell(SheetId(0), 1, 1)), None);
        assert_eq!(
            host.formula_at(&CellRange::cell(SheetId(0), 9, 9)),
            Some("=B2".to_string())
        );
        assert_eq!(host.cleared_ranges(), vec![range(0, 5, 0, 5)]);
    }

    #[test]
    fn selection_state_is_per_sheet() {
        let host = ScriptedHost::new();
        host.select_sheet(SheetId(1)).unwrap();
        host.set_selection(&range(3, 3, 3, 3)).unwrap();
        host.select_sheet(SheetId(0)).unwrap();
        assert_eq!(host.selection().unwrap(), CellRange::cell(SheetId(0), 0, 0));
        host.select_sheet(SheetId(1)).unwrap();
        assert_eq!(host.selection().unwrap(), range(3, 3, 3, 3));
    }
}
