//! Memoized dynamic-array capability flag.

use once_cell::sync::OnceCell;

use spillfit_host::SpreadsheetHost;

/// Process-lifetime answer to "does the host spill single-cell array
/// formulas itself?".
///
/// Resolved on first use and never re-queried: the capability does not
/// change mid-session. The probe call may fail outright on hosts that
/// predate the query; that counts as `false`. Racing first resolutions are
/// harmless — every initializer computes the same answer, and `OnceCell`
/// publishes exactly one of them.
#[derive(Debug, Default)]
pub struct DynamicArrayProbe {
    flag: OnceCell<bool>,
}

impl DynamicArrayProbe {
    pub const fn new() -> Self {
        Self {
            flag: OnceCell::new(),
        }
    }

    pub fn supports_dynamic_arrays(&self, host: &dyn SpreadsheetHost) -> bool {
        *self
            .flag
            .get_or_init(|| host.probe_dynamic_array_support().unwrap_or(false))
    }

    /// The resolved value, if the probe has run.
    pub fn resolved(&self) -> Option<bool> {
        self.flag.get().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spillfit_host::ScriptedHost;

    #[test]
    fn probe_failure_means_unsupported() {
        let host = ScriptedHost::new().with_probe_error();
        let probe = DynamicArrayProbe::new();
        assert!(!probe.supports_dynamic_arrays(&host));
        assert_eq!(probe.resolved(), Some(false));
    }

    #[test]
    fn host_is_queried_exactly_once() {
        let host = ScriptedHost::new().with_dynamic_arrays(true);
        let probe = DynamicArrayProbe::new();
        for _ in 0..5 {
            assert!(probe.supports_dynamic_arrays(&host));
        }
        assert_eq!(host.probe_call_count(), 1);
    }
}
