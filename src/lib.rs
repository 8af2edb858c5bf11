//! Front-end for a grammar-definition language: a positional scanner over the
//! source text and a recursive-descent parser producing a declaration and
//! expression AST. Table construction, conflict resolution and code
//! generation live downstream and only ever see the AST built here.

use thiserror::Error;

pub mod ast;
pub mod report;
pub mod scan;

mod escape;
mod parse;

pub use ast::GrammarDeclaration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
  /// No valid token could be formed at the current position.
  Lex,
  /// The token stream does not match the grammar of the language.
  Syntax,
}

/// A fatal parse error. The message already carries the formatted position
/// (`"<description> (<fileName> <line>:<column>)"`); `pos` is the byte offset
/// of the offending construct in the source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
  pub kind: ParseErrorKind,
  pub message: String,
  pub pos: Option<usize>,
}

/// Parses one grammar source into a [`GrammarDeclaration`]. The file name is
/// used only in diagnostic messages. Returns either a complete AST or the
/// first error encountered, never a partial tree.
pub fn parse_grammar(
  source: &str,
  file_name: Option<&str>
) -> Result<GrammarDeclaration, ParseError> {
  let mut scanner = scan::Scanner::new(source, file_name)?;
  parse::parse_top(&mut scanner)
}
