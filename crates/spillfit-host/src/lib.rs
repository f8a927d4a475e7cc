pub mod queue;
pub mod scripted;
pub mod traits;

pub use queue::{MacroQueue, QueueClosed};
pub use scripted::{ScriptedHost, UiSnapshot};
pub use traits::{CalculationMode, HostError, MacroTask, SpreadsheetHost};

// Re-export for convenience
pub use spillfit_common::{CellRange, SheetId, SheetLimits};
