//! Warning collection for the parse and build stages.
//!
//! Two kinds of findings are recoverable and end up here:
//! - part groups that resolve to no annotation data variant
//! - boxes pushed out of frame by rotation (or cropped to nothing)
//!
//! Everything else is an [`ExportError`](crate::ExportError).

mod report;

pub use report::{Diagnostic, DiagnosticCode, DiagnosticContext, Diagnostics};
