use crate::util;
use serde::Serialize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

const SNIPPET_LINES: usize = 12;

/// One unrecognised idiom, recorded and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub module: String,
    pub message: String,
    pub snippet: String,
    pub line: Option<u32>,
}

/// Record-warning-and-continue contract used by every analysis that can miss a pattern.
pub trait DiagnosticsSink: Sync {
    fn record_warning(&self, module: &str, message: &str, snippet: &str, line: Option<u32>);

    fn warning_count(&self) -> usize;
}

/// Run-wide sink shared by every module worker.
#[derive(Debug, Default)]
pub struct Diagnostics {
    count: AtomicUsize,
    warnings: Mutex<Vec<Warning>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Warnings recorded so far, in recording order.
    pub fn warnings(&self) -> Vec<Warning> {
        match self.warnings.lock() {
            Ok(warnings) => warnings.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl DiagnosticsSink for Diagnostics {
    fn record_warning(&self, module: &str, message: &str, snippet: &str, line: Option<u32>) {
        self.count.fetch_add(1, Ordering::Relaxed);
        let snippet = util::snippet(snippet, SNIPPET_LINES);
        match line {
            Some(line) => tracing::warn!(module, line, "{message}\n{snippet}"),
            None => tracing::warn!(module, "{message}\n{snippet}"),
        }
        let warning = Warning {
            module: module.to_string(),
            message: message.to_string(),
            snippet,
            line,
        };
        match self.warnings.lock() {
            Ok(mut warnings) => warnings.push(warning),
            Err(poisoned) => poisoned.into_inner().push(warning),
        }
    }

    fn warning_count(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }
}

/// A sink bound to the module currently being migrated.
#[derive(Clone, Copy)]
pub struct ModuleScope<'a> {
    pub sink: &'a dyn DiagnosticsSink,
    pub module: &'a str,
}

impl<'a> ModuleScope<'a> {
    pub fn new(sink: &'a dyn DiagnosticsSink, module: &'a str) -> Self {
        Self { sink, module }
    }

    pub fn warn(&self, message: &str, snippet: &str, line: Option<u32>) {
        self.sink.record_warning(self.module, message, snippet, line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_keeps_warnings() {
        let diagnostics = Diagnostics::new();
        let scope = ModuleScope::new(&diagnostics, "blog.views");
        scope.warn("unrecognised request access", "def f(request):\n    g(request)\n", Some(2));
        scope.warn("second", "", None);
        assert_eq!(diagnostics.warning_count(), 2);
        let warnings = diagnostics.warnings();
        assert_eq!(warnings[0].module, "blog.views");
        assert_eq!(warnings[0].line, Some(2));
        assert_eq!(warnings[1].message, "second");
    }

    #[test]
    fn counter_is_safe_across_threads() {
        let diagnostics = Diagnostics::new();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..25 {
                        diagnostics.record_warning("m", "w", "", None);
                    }
                });
            }
        });
        assert_eq!(diagnostics.warning_count(), 100);
        assert_eq!(diagnostics.warnings().len(), 100);
    }
}
