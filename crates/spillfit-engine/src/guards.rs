//! Scope guards for the host's globally shared UI state.
//!
//! Every guard snapshots the state it is about to disturb when engaged and
//! restores it in `Drop`, so the rewrite procedure cannot leak a suppressed
//! repaint, a manual calculation mode, or a moved selection on any exit
//! path. `Drop` cannot propagate errors; a failed restore is logged and
//! swallowed.

use tracing::warn;

use spillfit_common::CellRange;
use spillfit_host::{CalculationMode, HostError, SpreadsheetHost};

/// Screen repaint ("echo") turned off for the scope.
pub struct RepaintSuppressed<'a> {
    host: &'a dyn SpreadsheetHost,
    previous: bool,
}

impl<'a> RepaintSuppressed<'a> {
    pub fn engage(host: &'a dyn SpreadsheetHost) -> Result<Self, HostError> {
        let previous = host.repaint_enabled()?;
        host.set_repaint_enabled(false)?;
        Ok(Self { host, previous })
    }
}

impl Drop for RepaintSuppressed<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.host.set_repaint_enabled(self.previous) {
            warn!(%err, "failed to restore repaint state");
        }
    }
}

/// Calculation forced to manual for the scope; the prior mode (whatever it
/// was) comes back on exit.
pub struct ManualCalculation<'a> {
    host: &'a dyn SpreadsheetHost,
    previous: CalculationMode,
}

impl<'a> ManualCalculation<'a> {
    pub fn engage(host: &'a dyn SpreadsheetHost) -> Result<Self, HostError> {
        let previous = host.calculation_mode()?;
        host.set_calculation_mode(CalculationMode::Manual)?;
        Ok(Self { host, previous })
    }
}

impl Drop for ManualCalculation<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.host.set_calculation_mode(self.previous) {
            warn!(%err, "failed to restore calculation mode");
        }
    }
}

/// Selects a cell — possibly on another sheet — and puts every piece of
/// selection state back on exit: selection and active cell on the sheet we
/// selected into, the originally active sheet, and its selection and active
/// cell.
///
/// Not suitable for work that creates or deletes sheets.
pub struct SelectionGuard<'a> {
    host: &'a dyn SpreadsheetHost,
    old_selection_active: CellRange,
    old_active_cell_active: CellRange,
    old_selection_target: CellRange,
    old_active_cell_target: CellRange,
}

impl<'a> SelectionGuard<'a> {
    pub fn engage(host: &'a dyn SpreadsheetHost, select: &CellRange) -> Result<Self, HostError> {
        // Remember selection state on the currently active sheet.
        let old_selection_active = host.selection()?;
        let old_active_cell_active = host.active_cell()?;

        // Switch to the sheet we want to select on.
        host.select_sheet(select.sheet)?;

        // Remember selection state there too; some hosts disturb both.
        let old_selection_target = host.selection()?;
        let old_active_cell_target = host.active_cell()?;

        host.set_selection(select)?;
        host.set_active_cell(&select.top_left())?;

        Ok(Self {
            host,
            old_selection_active,
            old_active_cell_active,
            old_selection_target,
            old_active_cell_target,
        })
    }
}

impl Drop for SelectionGuard<'_> {
    fn drop(&mut self) {
        // Reset the selection on the sheet we selected into.
        if let Err(err) = self.host.set_selection(&self.old_selection_target) {
            warn!(%err, "failed to restore selection on target sheet");
        }
        if let Err(err) = self.host.set_active_cell(&self.old_active_cell_target) {
            warn!(%err, "failed to restore active cell on target sheet");
        }

        // Back to the sheet that was active, with its old selection.
        if let Err(err) = self.host.select_sheet(self.old_selection_active.sheet) {
            warn!(%err, "failed to restore active sheet");
        }
        if let Err(err) = self.host.set_selection(&self.old_selection_active) {
            warn!(%err, "failed to restore selection on active sheet");
        }
        if let Err(err) = self.host.set_active_cell(&self.old_active_cell_active) {
            warn!(%err, "failed to restore active cell on active sheet");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spillfit_common::SheetId;
    use spillfit_host::ScriptedHost;

    #[test]
    fn repaint_restores_on_early_return() {
        let host = ScriptedHost::new();
        let before = host.ui_snapshot();
        {
            let _guard = RepaintSuppressed::engage(&host).unwrap();
            assert!(!host.repaint_enabled().unwrap());
        }
        assert_eq!(host.ui_snapshot(), before);
    }

    #[test]
    fn calculation_mode_restores_even_when_it_was_manual() {
        let host = ScriptedHost::new();
        host.set_calculation_mode(CalculationMode::Manual).unwrap();
        {
            let _guard = ManualCalculation::engage(&host).unwrap();
        }
        assert_eq!(
            host.calculation_mode().unwrap(),
            CalculationMode::Manual
        );
    }

    #[test]
    fn selection_guard_restores_both_sheets() {
        let host = ScriptedHost::new()
            .with_active_sheet(SheetId(0))
            .with_selection(
                CellRange::new(SheetId(0), 7, 9, 0, 1).unwrap(),
                CellRange::cell(SheetId(0), 7, 0),
            );
        let before = host.ui_snapshot();
        {
            let target = CellRange::cell(SheetId(2), 4, 4);
            let _guard = SelectionGuard::engage(&host, &target).unwrap();
            assert_eq!(host.selection().unwrap(), target);
        }
        assert_eq!(host.ui_snapshot(), before);
        // The other sheet's selection also went back to what it was.
        host.select_sheet(SheetId(2)).unwrap();
        assert_eq!(host.selection().unwrap(), CellRange::cell(SheetId(2), 0, 0));
    }

    #[test]
    fn guards_restore_when_the_scope_panics() {
        let host = ScriptedHost::new();
        let before = host.ui_snapshot();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _repaint = RepaintSuppressed::engage(&host).unwrap();
            let _calc = ManualCalculation::engage(&host).unwrap();
            panic!("mid-scope failure");
        }));
        assert!(result.is_err());
        assert_eq!(host.ui_snapshot(), before);
    }
}
