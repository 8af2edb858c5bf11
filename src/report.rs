//! Conversion of parse errors into `codespan-reporting` diagnostics for
//! callers that render errors against the source text.

use codespan_reporting::diagnostic::{Diagnostic, Label};

use crate::ParseError;

/// Builds a diagnostic for the given error. The primary label marks the
/// error offset when one is known.
pub fn diagnostic<FileId>(err: &ParseError, file_id: FileId) -> Diagnostic<FileId> {
  let mut diag = Diagnostic::error().with_message(err.message.clone());
  if let Some(pos) = err.pos {
    diag = diag.with_labels(vec![Label::primary(file_id, pos..pos)]);
  }
  diag
}
