//! User-facing message reporting.
//!
//! Core components receive a [`Reporter`] at construction and call
//! `report(kind, text)`; nothing reaches for a global toast queue.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Success,
    Warning,
    Error,
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReportKind::Success => "success",
            ReportKind::Warning => "warning",
            ReportKind::Error => "error",
        };
        f.write_str(s)
    }
}

pub trait Reporter: Send + Sync {
    fn report(&self, kind: ReportKind, text: &str);
}

pub type SharedReporter = Arc<dyn Reporter>;

/// Forwards reports to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, kind: ReportKind, text: &str) {
        match kind {
            ReportKind::Success => info!(kind = %kind, "{text}"),
            ReportKind::Warning => warn!(kind = %kind, "{text}"),
            ReportKind::Error => error!(kind = %kind, "{text}"),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Keeps every report for assertions.
    #[derive(Default)]
    pub struct MemoryReporter {
        pub reports: Mutex<Vec<(ReportKind, String)>>,
    }

    impl MemoryReporter {
        pub fn kinds(&self) -> Vec<ReportKind> {
            self.reports.lock().unwrap().iter().map(|(k, _)| *k).collect()
        }
    }

    impl Reporter for MemoryReporter {
        fn report(&self, kind: ReportKind, text: &str) {
            self.reports.lock().unwrap().push((kind, text.to_string()));
        }
    }
}
