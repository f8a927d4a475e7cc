//! The deferred range rewrite.
//!
//! Runs inside the host's macro-execution context, the only place sheet
//! structure may be mutated. Never panics out and never loses the caller's
//! formula: every failure path ends with an alert and the original formula
//! text written back as a literal.

use tracing::{debug, warn};

use spillfit_common::CellRange;
use spillfit_host::SpreadsheetHost;

use crate::guards::{ManualCalculation, RepaintSuppressed, SelectionGuard};

/// Description of one pending rewrite, produced by the decision phase and
/// carried through the macro queue. The decision phase never touches the
/// host; this struct is all it hands over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteRequest {
    pub target: CellRange,
}

/// Rewrite the array formula at `request.target`'s top-left cell so it
/// spans exactly the target range. The host's own recalculation fills the
/// range with values afterwards; this procedure writes only the formula.
pub fn perform(host: &dyn SpreadsheetHost, request: &RewriteRequest) {
    let target = request.target;
    let first_cell = target.top_left();
    debug!(%target, "performing deferred resize");

    // Suppression is cosmetic; a host that cannot answer still gets the
    // rewrite, just with visible flicker.
    let _repaint = RepaintSuppressed::engage(host)
        .map_err(|err| warn!(%err, "could not suppress repaint"))
        .ok();
    let _calc = ManualCalculation::engage(host)
        .map_err(|err| warn!(%err, "could not force manual calculation"))
        .ok();

    // The formula we must not lose, read before anything is cleared.
    let formula = match host.cell_formula_text(&first_cell) {
        Ok(formula) => formula,
        Err(err) => {
            // Nothing read means nothing can be preserved; alert is all
            // that is left.
            host.show_alert(&format!(
                "Cannot resize array formula at {} - {err}.",
                host.cell_address_text(&first_cell)
            ));
            return;
        }
    };

    // If the cell belongs to a legacy array formula, clear that array's
    // whole extent first so stale cells outside the new target do not
    // linger.
    match host.is_part_of_array_formula(&first_cell) {
        Ok(true) => {
            if let Err(err) = clear_old_array(host, &first_cell) {
                abandon(host, &first_cell, &formula, &err.to_string());
                return;
            }
        }
        Ok(false) => {}
        Err(err) => {
            abandon(host, &first_cell, &formula, &err.to_string());
            return;
        }
    }

    // Array submission wants the relative reference convention; convert
    // unless the host already displays formulas that way.
    let relative = if host.reference_mode_is_relative().unwrap_or(false) {
        formula.clone()
    } else {
        match host.convert_formula_to_relative(&formula, &first_cell) {
            Ok(converted) => converted,
            Err(err) => {
                warn!(%err, "formula conversion failed");
                abandon(
                    host,
                    &first_cell,
                    &formula,
                    "formula might be too long when converted to relative references",
                );
                return;
            }
        }
    };

    if let Err(err) = host.submit_array_formula(&relative, &target) {
        warn!(%err, %target, "array formula submission rejected");
        abandon(
            host,
            &first_cell,
            &formula,
            "result might overlap another array",
        );
        return;
    }

    debug!(%target, "resize submitted; host recalculation will fill the range");
}

/// Select the old array (select-special needs the cell selected, possibly
/// on another sheet), query its full extent, and clear it. The selection
/// guard restores all selection state on exit.
fn clear_old_array(
    host: &dyn SpreadsheetHost,
    first_cell: &CellRange,
) -> Result<(), spillfit_host::HostError> {
    let _selection = SelectionGuard::engage(host, first_cell)?;
    let extent = host.array_formula_extent(first_cell)?;
    debug!(%extent, "clearing previous array extent");
    host.clear_range(&extent)
}

/// Terminal failure path: tell the user, then park the formula as literal
/// text in the first cell so it is recoverable by hand.
fn abandon(host: &dyn SpreadsheetHost, first_cell: &CellRange, formula: &str, why: &str) {
    let address = host.cell_address_text(first_cell);
    host.show_alert(&format!(
        "Cannot resize array formula at {address} - {why}."
    ));
    if let Err(err) = host.set_cell_literal(first_cell, &format!("'{formula}")) {
        warn!(%err, "failed to preserve original formula as literal text");
    }
}
