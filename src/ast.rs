//! AST for grammar declarations. Every node carries the byte offset of its
//! first token (`start`), used only for diagnostics; nodes are never mutated
//! after construction.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
  pub start: usize,
  pub name: String,
}

/// Root node of a parsed grammar source. At most one `tokens` block and one
/// top-level `precedence` block may exist; `skip` is the rule introduced by
/// the `skip` keyword and is kept out of `rules`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarDeclaration {
  pub start: usize,
  pub rules: Vec<RuleDeclaration>,
  pub tokens: Option<TokenDeclaration>,
  pub external: Vec<ExternalTokenDeclaration>,
  pub precedence: Option<PrecDeclaration>,
  pub skip: Option<RuleDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDeclaration {
  pub start: usize,
  pub id: Identifier,
  /// Optional rename (`= tag`) used by downstream tooling.
  pub tag: Option<Identifier>,
  /// Formal arguments of a parametrized rule, invoked with `<...>` lists.
  pub params: Vec<Identifier>,
  pub expr: Expression,
}

/// A `tokens { ... }` block with its own rule set and at most one
/// token-precedence ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDeclaration {
  pub start: usize,
  pub precedence: Option<TokenPrecDeclaration>,
  pub rules: Vec<RuleDeclaration>,
}

/// Strict left-to-right precedence order among token expressions. Items are
/// restricted to `Literal` and `Named` expressions at parse time; their order
/// is significant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPrecDeclaration {
  pub start: usize,
  pub items: Vec<Expression>,
}

/// Named precedence levels; earlier items bind tighter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecDeclaration {
  pub start: usize,
  pub items: Vec<PrecItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecItem {
  pub id: Identifier,
  pub kind: Option<PrecKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecKind {
  Left,
  Right,
  Cut,
}

/// Tokens supplied by an outside tokenizer. `from` is the module reference
/// exactly as written in the source string literal; it is not resolved or
/// validated here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalTokenDeclaration {
  pub start: usize,
  pub id: Identifier,
  pub from: String,
  pub tokens: Vec<ExternalToken>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalToken {
  pub id: Identifier,
  pub tag: Option<Identifier>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
  /// Matches an exact (escape-decoded) string.
  Literal { start: usize, value: String },
  /// Reference to a rule or namespaced token, optionally parametrized.
  Named {
    start: usize,
    namespace: Option<Identifier>,
    id: Identifier,
    args: Vec<Expression>,
  },
  /// Ordered alternation; order matters to downstream conflict resolution.
  Choice { start: usize, exprs: Vec<Expression> },
  /// `markers` has exactly `exprs.len() + 1` entries: one marker group per
  /// gap between (and around) the elements. Never constructed with a single
  /// element and all-empty markers; that collapses to the element itself.
  Sequence {
    start: usize,
    exprs: Vec<Expression>,
    markers: Vec<Vec<ConflictMarker>>,
  },
  Repeat {
    start: usize,
    expr: Box<Expression>,
    kind: RepeatKind,
  },
  /// Sorted, pairwise disjoint half-open codepoint ranges; `inverted`
  /// negates membership.
  Set {
    start: usize,
    ranges: Vec<(u32, u32)>,
    inverted: bool,
  },
  /// The `_` wildcard.
  Any { start: usize },
}

impl Expression {
  pub fn start(&self) -> usize {
    match self {
      Expression::Literal { start, .. } => *start,
      Expression::Named { start, .. } => *start,
      Expression::Choice { start, .. } => *start,
      Expression::Sequence { start, .. } => *start,
      Expression::Repeat { start, .. } => *start,
      Expression::Set { start, .. } => *start,
      Expression::Any { start } => *start,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatKind {
  /// `*`
  Many,
  /// `?`
  Optional,
  /// `+`
  Many1,
}

/// Inline `~name` (ambiguity) or `!name` (precedence) annotation attached in
/// a gap of a sequence; consumed by a later resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictMarker {
  pub start: usize,
  pub id: Identifier,
  pub kind: MarkerKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
  Ambig,
  Prec,
}
