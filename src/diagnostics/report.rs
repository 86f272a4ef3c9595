//! Diagnostic report types.
//!
//! Non-fatal findings are collected here instead of being printed as they
//! happen, so callers (and tests) can inspect them after a parse or build.

use std::fmt;

/// Non-fatal issues collected while parsing tasks and building datasets.
#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    /// All recorded diagnostics, in the order they were raised.
    pub items: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Records a warning and mirrors it to the `tracing` log.
    pub fn warn(
        &mut self,
        code: DiagnosticCode,
        message: impl Into<String>,
        context: DiagnosticContext,
    ) {
        let diagnostic = Diagnostic {
            code,
            message: message.into(),
            context,
        };
        tracing::warn!(
            code = ?diagnostic.code,
            context = %diagnostic.context,
            "{}",
            diagnostic.message
        );
        self.items.push(diagnostic);
    }

    /// Returns the number of warnings recorded.
    pub fn warning_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the number of diagnostics carrying `code`.
    pub fn count_of(&self, code: DiagnosticCode) -> usize {
        self.items.iter().filter(|d| d.code == code).count()
    }

    /// Returns true if nothing was recorded.
    pub fn is_clean(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.items.is_empty() {
            return writeln!(f, "Export completed: no warnings");
        }

        writeln!(
            f,
            "Export completed with {} warning(s):",
            self.warning_count()
        )?;
        writeln!(f)?;

        for item in &self.items {
            writeln!(f, "  {}", item)?;
        }

        Ok(())
    }
}

/// A single warning.
#[derive(Clone, Debug)]
pub struct Diagnostic {
    /// A stable code for the issue type.
    pub code: DiagnosticCode,

    /// A human-readable description.
    pub message: String,

    /// Where the issue occurred.
    pub context: DiagnosticContext,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[WARN ] {:?} in {}: {}",
            self.code, self.context, self.message
        )
    }
}

/// A stable code identifying the kind of warning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    /// A group of parts whose type tags match no annotation data variant.
    UnresolvedAnnotationData,
    /// A normalized coordinate fell outside `[0, 1]` after rotation.
    CoordinateOutOfRange,
    /// A region's pixel box does not overlap the rotated image.
    EmptyCrop,
}

/// Where a diagnostic occurred.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticContext {
    /// One region (or unresolved part group) inside an annotation.
    Region {
        task_id: String,
        annotation_id: String,
        region_id: String,
    },
}

impl fmt::Display for DiagnosticContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticContext::Region {
                task_id,
                annotation_id,
                region_id,
            } => write!(
                f,
                "task {} annotation {} region {}",
                task_id, annotation_id, region_id
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts_by_code() {
        let mut diagnostics = Diagnostics::new();
        assert!(diagnostics.is_clean());

        diagnostics.warn(
            DiagnosticCode::EmptyCrop,
            "crop is empty",
            DiagnosticContext::Region {
                task_id: "1".to_string(),
                annotation_id: "7".to_string(),
                region_id: "r2".to_string(),
            },
        );
        diagnostics.warn(
            DiagnosticCode::CoordinateOutOfRange,
            "x_center = 1.2",
            DiagnosticContext::Region {
                task_id: "1".to_string(),
                annotation_id: "7".to_string(),
                region_id: "r1".to_string(),
            },
        );

        assert_eq!(diagnostics.warning_count(), 2);
        assert_eq!(diagnostics.count_of(DiagnosticCode::EmptyCrop), 1);
        assert_eq!(
            diagnostics.count_of(DiagnosticCode::UnresolvedAnnotationData),
            0
        );
    }

    #[test]
    fn report_display_lists_items() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.warn(
            DiagnosticCode::UnresolvedAnnotationData,
            "no variant matches {labels}",
            DiagnosticContext::Region {
                task_id: "3".to_string(),
                annotation_id: "9".to_string(),
                region_id: "k1".to_string(),
            },
        );

        let rendered = diagnostics.to_string();
        assert!(rendered.contains("1 warning(s)"));
        assert!(rendered.contains("UnresolvedAnnotationData in task 3 annotation 9 region k1"));
    }

    #[test]
    fn clean_report_display() {
        assert_eq!(
            Diagnostics::new().to_string(),
            "Export completed: no warnings\n"
        );
    }
}
