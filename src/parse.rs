//! Recursive-descent parser over the scanner. Each function consumes the
//! tokens of one construct and returns its AST node; the first error aborts
//! the whole parse.

use crate::ast::*;
use crate::escape::{self, SetItem};
use crate::scan::{Keyword, Scanner, TokenKind};
use crate::ParseError;

pub(crate) fn parse_top(s: &mut Scanner) -> Result<GrammarDeclaration, ParseError> {
  let start = s.token().start;
  let mut rules = vec![];
  let mut tokens = None;
  let mut external = vec![];
  let mut precedence = None;
  let mut skip = None;

  while s.token().kind != TokenKind::Eof {
    match s.token().keyword {
      Some(Keyword::Tokens) => {
        if tokens.is_some() {
          return Err(s.syntax_error(
            "Multiple tokens declarations".to_owned(),
            s.token().start,
          ));
        }
        tokens = Some(parse_tokens(s)?);
      }
      Some(Keyword::External) => external.push(parse_external_tokens(s)?),
      Some(Keyword::Precedence) => {
        if precedence.is_some() {
          return Err(s.syntax_error(
            "Multiple precedence declarations".to_owned(),
            s.token().start,
          ));
        }
        precedence = Some(parse_precedence(s)?);
      }
      // The `skip` keyword token itself becomes the rule's identifier.
      Some(Keyword::Skip) => skip = Some(parse_rule(s)?),
      _ => rules.push(parse_rule(s)?),
    }
  }

  Ok(GrammarDeclaration { start, rules, tokens, external, precedence, skip })
}

fn parse_ident(s: &mut Scanner) -> Result<Identifier, ParseError> {
  if s.token().kind != TokenKind::Ident {
    return Err(s.unexpected());
  }
  let start = s.token().start;
  let name = s.token().value.clone().unwrap_or_default();
  s.advance()?;
  Ok(Identifier { start, name })
}

fn parse_rule(s: &mut Scanner) -> Result<RuleDeclaration, ParseError> {
  let id = parse_ident(s)?;
  let start = id.start;
  let mut params = vec![];
  let mut tag = None;

  if s.eat(TokenKind::Lt)? {
    while !s.eat(TokenKind::Gt)? {
      if !params.is_empty() {
        s.expect(TokenKind::Comma)?;
      }
      params.push(parse_ident(s)?);
    }
  }
  if s.eat(TokenKind::Assign)? {
    tag = Some(parse_ident(s)?);
  }
  s.expect(TokenKind::LBrace)?;
  let expr = parse_expr_choice(s)?;
  s.expect(TokenKind::RBrace)?;
  Ok(RuleDeclaration { start, id, tag, params, expr })
}

fn parse_expr_inner(s: &mut Scanner) -> Result<Expression, ParseError> {
  let start = s.token().start;
  if s.eat(TokenKind::LParen)? {
    let expr = parse_expr_choice(s)?;
    s.expect(TokenKind::RParen)?;
    return Ok(expr);
  }

  match s.token().kind {
    TokenKind::Str => {
      let value = s.token().value.clone().unwrap_or_default();
      s.advance()?;
      if value.is_empty() {
        // "" matches nothing and consumes nothing; an empty sequence keeps
        // that distinct from a literal with an empty value.
        Ok(Expression::Sequence {
          start,
          exprs: vec![],
          markers: vec![vec![], vec![]],
        })
      } else {
        Ok(Expression::Literal { start, value })
      }
    }
    TokenKind::Set => {
      let body = s.token().value.clone().unwrap_or_default();
      let expr = parse_set(s, &body, start)?;
      s.advance()?;
      Ok(expr)
    }
    _ if s.token().keyword == Some(Keyword::Wildcard) => {
      s.advance()?;
      Ok(Expression::Any { start })
    }
    _ => {
      let mut id = parse_ident(s)?;
      let mut namespace = None;
      if s.eat(TokenKind::Dot)? {
        namespace = Some(id);
        id = parse_ident(s)?;
      }
      let mut args = vec![];
      if s.eat(TokenKind::Lt)? {
        while !s.eat(TokenKind::Gt)? {
          if !args.is_empty() {
            s.expect(TokenKind::Comma)?;
          }
          args.push(parse_expr_choice(s)?);
        }
      }
      Ok(Expression::Named { start, namespace, id, args })
    }
  }
}

/// Builds the sorted, disjoint codepoint ranges of a character-set literal.
/// `start` is the set token's position; all range errors point there.
fn parse_set(s: &Scanner, body: &str, start: usize) -> Result<Expression, ParseError> {
  let mut body = body;
  let mut inverted = false;
  if body.starts_with('^') {
    inverted = true;
    body = &body[1..];
  }

  let items = escape::decode_set(body).map_err(|msg| s.lex_error(msg, start))?;
  let mut ranges: Vec<(u32, u32)> = vec![];
  let mut pos = 0;
  while pos < items.len() {
    let from = item_codepoint(items[pos]);
    if pos + 2 < items.len() && items[pos + 1] == SetItem::Dash {
      let to = item_codepoint(items[pos + 2]);
      if to < from {
        return Err(s.syntax_error("Invalid character range".to_owned(), start));
      }
      add_range(s, &mut ranges, from, to + 1, start)?;
      pos += 3;
    } else {
      add_range(s, &mut ranges, from, from + 1, start)?;
      pos += 1;
    }
  }
  ranges.sort_by_key(|r| r.0);
  Ok(Expression::Set { start, ranges, inverted })
}

fn item_codepoint(item: SetItem) -> u32 {
  match item {
    SetItem::Char(c) => c,
    // A dash outside range position is a plain hyphen.
    SetItem::Dash => '-' as u32,
  }
}

fn add_range(
  s: &Scanner,
  ranges: &mut Vec<(u32, u32)>,
  from: u32,
  to: u32,
  pos: usize,
) -> Result<(), ParseError> {
  if !ranges.iter().all(|&(a, b)| b <= from || a >= to) {
    return Err(s.syntax_error("Overlapping character range".to_owned(), pos));
  }
  ranges.push((from, to));
  Ok(())
}

fn parse_expr_suffix(s: &mut Scanner) -> Result<Expression, ParseError> {
  let start = s.token().start;
  let expr = parse_expr_inner(s)?;
  let kind = match s.token().kind {
    TokenKind::Asterisk => RepeatKind::Many,
    TokenKind::QuestionMark => RepeatKind::Optional,
    TokenKind::Plus => RepeatKind::Many1,
    _ => return Ok(expr),
  };
  s.advance()?;
  Ok(Expression::Repeat { start, expr: Box::new(expr), kind })
}

fn end_of_sequence(s: &Scanner) -> bool {
  matches!(
    s.token().kind,
    TokenKind::RBrace
      | TokenKind::RParen
      | TokenKind::Or
      | TokenKind::LBrace
      | TokenKind::Comma
      | TokenKind::Gt
      | TokenKind::Eof
  )
}

fn parse_expr_sequence(s: &mut Scanner) -> Result<Expression, ParseError> {
  let start = s.token().start;
  let mut exprs: Vec<Expression> = vec![];
  let mut markers: Vec<Vec<ConflictMarker>> = vec![vec![]];
  loop {
    // Markers sit in the gap before the next element (or trail the last).
    loop {
      let marker_start = s.token().start;
      let kind = if s.eat(TokenKind::Tilde)? {
        MarkerKind::Ambig
      } else if s.eat(TokenKind::Bang)? {
        MarkerKind::Prec
      } else {
        break;
      };
      let id = parse_ident(s)?;
      if let Some(group) = markers.last_mut() {
        group.push(ConflictMarker { start: marker_start, id, kind });
      }
    }
    if !exprs.is_empty() && end_of_sequence(s) {
      break;
    }
    exprs.push(parse_expr_suffix(s)?);
    markers.push(vec![]);
    if end_of_sequence(s) {
      break;
    }
  }
  if exprs.len() == 1 && markers.iter().all(|group| group.is_empty()) {
    return Ok(exprs.remove(0));
  }
  Ok(Expression::Sequence { start, exprs, markers })
}

fn parse_expr_choice(s: &mut Scanner) -> Result<Expression, ParseError> {
  let start = s.token().start;
  let left = parse_expr_sequence(s)?;
  if !s.eat(TokenKind::Or)? {
    return Ok(left);
  }
  let mut exprs = vec![left];
  loop {
    exprs.push(parse_expr_sequence(s)?);
    if !s.eat(TokenKind::Or)? {
      break;
    }
  }
  Ok(Expression::Choice { start, exprs })
}

fn parse_precedence(s: &mut Scanner) -> Result<PrecDeclaration, ParseError> {
  let start = s.token().start;
  s.advance()?;
  s.expect(TokenKind::LBrace)?;
  let mut items = vec![];
  while !s.eat(TokenKind::RBrace)? {
    if !items.is_empty() {
      s.expect(TokenKind::Comma)?;
    }
    let id = parse_ident(s)?;
    let kind = if s.eat_keyword(Keyword::Left)? {
      Some(PrecKind::Left)
    } else if s.eat_keyword(Keyword::Right)? {
      Some(PrecKind::Right)
    } else if s.eat_keyword(Keyword::Cut)? {
      Some(PrecKind::Cut)
    } else {
      None
    };
    items.push(PrecItem { id, kind });
  }
  Ok(PrecDeclaration { start, items })
}

fn parse_tokens(s: &mut Scanner) -> Result<TokenDeclaration, ParseError> {
  let start = s.token().start;
  s.advance()?;
  s.expect(TokenKind::LBrace)?;
  let mut rules = vec![];
  let mut precedence = None;
  while !s.eat(TokenKind::RBrace)? {
    if s.token().keyword == Some(Keyword::Precedence) {
      if precedence.is_some() {
        return Err(s.syntax_error(
          "Multiple token precedence declarations".to_owned(),
          s.token().start,
        ));
      }
      precedence = Some(parse_token_precedence(s)?);
    } else {
      rules.push(parse_rule(s)?);
    }
  }
  Ok(TokenDeclaration { start, precedence, rules })
}

fn parse_token_precedence(s: &mut Scanner) -> Result<TokenPrecDeclaration, ParseError> {
  let start = s.token().start;
  s.advance()?;
  s.expect(TokenKind::LBrace)?;
  let mut items = vec![];
  while !s.eat(TokenKind::RBrace)? {
    if !items.is_empty() {
      s.expect(TokenKind::Comma)?;
    }
    let expr = parse_expr_inner(s)?;
    match expr {
      Expression::Literal { .. } | Expression::Named { .. } => items.push(expr),
      other => {
        return Err(s.syntax_error(
          "Invalid expression in token precedences".to_owned(),
          other.start(),
        ));
      }
    }
  }
  Ok(TokenPrecDeclaration { start, items })
}

fn parse_external_tokens(s: &mut Scanner) -> Result<ExternalTokenDeclaration, ParseError> {
  let start = s.token().start;
  s.advance()?;
  s.expect_keyword(Keyword::Tokens)?;
  let id = parse_ident(s)?;
  s.expect_keyword(Keyword::From)?;
  if s.token().kind != TokenKind::Str {
    return Err(s.unexpected());
  }
  let from = s.token().value.clone().unwrap_or_default();
  s.advance()?;
  let mut tokens = vec![];
  s.expect(TokenKind::LBrace)?;
  while !s.eat(TokenKind::RBrace)? {
    if !tokens.is_empty() {
      s.expect(TokenKind::Comma)?;
    }
    let id = parse_ident(s)?;
    let tag = if s.eat(TokenKind::Assign)? {
      Some(parse_ident(s)?)
    } else {
      None
    };
    tokens.push(ExternalToken { id, tag });
  }
  Ok(ExternalTokenDeclaration { start, id, from, tokens })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::parse_grammar;
  use pretty_assertions::assert_eq;

  fn rule_expr(source: &str) -> Expression {
    let grammar = parse_grammar(source, None).unwrap();
    grammar.rules.into_iter().next().unwrap().expr
  }

  #[test]
  fn char_set_ranges() {
    let expr = rule_expr("a { [a-z] }");
    assert_eq!(
      expr,
      Expression::Set { start: 4, ranges: vec![(97, 123)], inverted: false }
    );
  }

  #[test]
  fn inverted_set_is_sorted() {
    let expr = rule_expr("a { [^a-z0-9] }");
    assert_eq!(
      expr,
      Expression::Set { start: 4, ranges: vec![(48, 58), (97, 123)], inverted: true }
    );
  }

  #[test]
  fn set_with_single_codepoints() {
    let expr = rule_expr(r"a { [xa-c\]] }");
    assert_eq!(
      expr,
      Expression::Set {
        start: 4,
        ranges: vec![(93, 94), (97, 100), (120, 121)],
        inverted: false,
      }
    );
  }

  #[test]
  fn escaped_hyphen_is_literal() {
    let expr = rule_expr(r"a { [\-x] }");
    assert_eq!(
      expr,
      Expression::Set { start: 4, ranges: vec![(45, 46), (120, 121)], inverted: false }
    );
  }

  #[test]
  fn overlapping_ranges_are_rejected() {
    let err = parse_grammar("a { [a-ma-z] }", None).unwrap_err();
    assert_eq!(err.message, "Overlapping character range (1:4)");
  }

  #[test]
  fn inverted_range_bounds_are_rejected() {
    let err = parse_grammar("a { [z-a] }", None).unwrap_err();
    assert_eq!(err.message, "Invalid character range (1:4)");
  }

  #[test]
  fn suffixes_do_not_stack() {
    // Only one suffix is consumed; a second one is not a valid element.
    let err = parse_grammar("a { b*? }", None).unwrap_err();
    assert_eq!(err.message, "Unexpected token '?' (1:6)");
  }

  #[test]
  fn empty_rule_body_is_rejected() {
    let err = parse_grammar("a { }", None).unwrap_err();
    assert_eq!(err.message, "Unexpected token '}' (1:4)");
  }
}
