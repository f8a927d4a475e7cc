//! The resize decision: pure, side-effect-free, safe to call from any
//! recalculation worker thread. It only reads shapes; scheduling the actual
//! rewrite is the caller's business.

use spillfit_common::{CellRange, SheetLimits};

/// What the engine should do with an array result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Hand the array back to the host as-is.
    ReturnUnchanged,
    /// The computed target would run off the sheet; surface the caller's
    /// "unsupported size" sentinel instead. Nothing is scheduled — cell
    /// mutation is forbidden from the synchronous evaluation context.
    ReturnError,
    /// Queue a deferred rewrite of the caller's formula over this range.
    ScheduleResize(CellRange),
}

/// Decide whether `caller` must be resized to hold a `rows` × `cols` result.
///
/// Rules, evaluated in order:
/// 1. degenerate result (zero rows or columns) — unchanged;
/// 2. host spills single-cell array formulas itself and the caller is a
///    single cell — unchanged, the host will expand;
/// 3. caller already has the result's shape — unchanged (fast path, no
///    host mutation, no flicker);
/// 4. anchor the target at the caller's top-left corner;
/// 5. target exceeds the sheet — error sentinel;
/// 6. otherwise schedule the rewrite.
pub fn decide_resize(
    rows: usize,
    cols: usize,
    caller: &CellRange,
    limits: SheetLimits,
    dynamic_arrays: bool,
) -> Action {
    if rows == 0 || cols == 0 {
        return Action::ReturnUnchanged;
    }

    if dynamic_arrays && caller.is_single_cell() {
        return Action::ReturnUnchanged;
    }

    if caller.height() as usize == rows && caller.width() as usize == cols {
        return Action::ReturnUnchanged;
    }

    let (Ok(rows), Ok(cols)) = (u32::try_from(rows), u32::try_from(cols)) else {
        return Action::ReturnError;
    };
    let Ok(target) = caller.resized(rows, cols) else {
        return Action::ReturnError;
    };

    if !limits.contains(&target) {
        return Action::ReturnError;
    }

    Action::ScheduleResize(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use spillfit_common::SheetId;

    fn caller_at(row: u32, col: u32) -> CellRange {
        CellRange::cell(SheetId(0), row, col)
    }

    const LIMITS: SheetLimits = SheetLimits::MODERN;

    #[test]
    fn degenerate_results_are_left_alone() {
        assert_eq!(
            decide_resize(0, 4, &caller_at(0, 0), LIMITS, false),
            Action::ReturnUnchanged
        );
        assert_eq!(
            decide_resize(3, 0, &caller_at(0, 0), LIMITS, false),
            Action::ReturnUnchanged
        );
        assert_eq!(
            decide_resize(0, 0, &caller_at(0, 0), LIMITS, true),
            Action::ReturnUnchanged
        );
    }

    #[test]
    fn dynamic_array_host_spills_single_cell_callers() {
        assert_eq!(
            decide_resize(3, 4, &caller_at(5, 2), LIMITS, true),
            Action::ReturnUnchanged
        );
        // A multi-cell caller still gets the manual treatment.
        let caller = CellRange::new(SheetId(0), 5, 6, 2, 2).unwrap();
        assert!(matches!(
            decide_resize(3, 4, &caller, LIMITS, true),
            Action::ScheduleResize(_)
        ));
    }

    #[test]
    fn matching_shape_is_a_no_op() {
        let caller = CellRange::new(SheetId(0), 5, 7, 2, 5).unwrap();
        assert_eq!(
            decide_resize(3, 4, &caller, LIMITS, false),
            Action::ReturnUnchanged
        );
    }

    #[test]
    fn target_is_anchored_at_the_caller_top_left() {
        // 3×4 result at (row 5, col 2) → rows 5..7, cols 2..5.
        assert_eq!(
            decide_resize(3, 4, &caller_at(5, 2), LIMITS, false),
            Action::ScheduleResize(CellRange::new(SheetId(0), 5, 7, 2, 5).unwrap())
        );
    }

    #[test]
    fn shrinking_a_wide_caller_schedules_too() {
        let caller = CellRange::new(SheetId(0), 5, 20, 2, 9).unwrap();
        assert_eq!(
            decide_resize(3, 4, &caller, LIMITS, false),
            Action::ScheduleResize(CellRange::new(SheetId(0), 5, 7, 2, 5).unwrap())
        );
    }

    #[test]
    fn sheet_boundary_overflow_is_an_error() {
        let limits = SheetLimits {
            max_rows: 100,
            max_cols: 20,
        };
        assert_eq!(
            decide_resize(8, 2, &caller_at(95, 0), limits, false),
            Action::ReturnError
        );
        assert_eq!(
            decide_resize(2, 8, &caller_at(0, 15), limits, false),
            Action::ReturnError
        );
        // Exactly at the boundary is fine.
        assert_eq!(
            decide_resize(5, 2, &caller_at(95, 0), limits, false),
            Action::ScheduleResize(CellRange::new(SheetId(0), 95, 99, 0, 1).unwrap())
        );
    }

    #[test]
    fn coordinate_overflow_is_an_error_not_a_panic() {
        assert_eq!(
            decide_resize(usize::MAX, 1, &caller_at(0, 0), LIMITS, false),
            Action::ReturnError
        );
    }

    proptest! {
        /// Pure function of its inputs: two calls agree.
        #[test]
        fn decision_is_idempotent(
            rows in 0usize..4096,
            cols in 0usize..4096,
            row in 0u32..1_048_576,
            col in 0u32..16_384,
            dynamic in any::<bool>(),
        ) {
            let caller = caller_at(row, col);
            let first = decide_resize(rows, cols, &caller, LIMITS, dynamic);
            let second = decide_resize(rows, cols, &caller, LIMITS, dynamic);
            prop_assert_eq!(first, second);
        }

        /// Whenever a resize is scheduled, the target has exactly the
        /// result's shape, shares the caller's top-left corner, and stays
        /// inside the sheet.
        #[test]
        fn scheduled_targets_fit_the_result(
            rows in 1usize..4096,
            cols in 1usize..4096,
            row in 0u32..1_048_576,
            col in 0u32..16_384,
        ) {
            let caller = caller_at(row, col);
            if let Action::ScheduleResize(target) =
                decide_resize(rows, cols, &caller, LIMITS, false)
            {
                prop_assert_eq!(target.height() as usize, rows);
                prop_assert_eq!(target.width() as usize, cols);
                prop_assert_eq!(target.top_left(), caller.top_left());
                prop_assert!(LIMITS.contains(&target));
            }
        }
    }
}
