//! Positional scanner. Pull-based with a single live token that is
//! overwritten on every `advance`; callers must copy anything they still
//! need out of the token first.

use crate::escape;
use crate::{ParseError, ParseErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  Sof,
  Eof,
  Str,
  Set,
  Ident,

  LParen,
  RParen,
  Bang,
  Tilde,
  Plus,
  Asterisk,
  QuestionMark,
  LBrace,
  RBrace,
  Lt,
  Gt,
  Dot,
  Comma,
  Or,
  Assign,
}

/// Keyword tag, decided once when an identifier token is formed so the
/// parser never compares strings. All keywords are contextual: an identifier
/// carrying a tag is still a valid plain identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
  Tokens,
  External,
  Precedence,
  Skip,
  From,
  Left,
  Right,
  Cut,
  Wildcard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub keyword: Option<Keyword>,
  /// Decoded payload: the unescaped text of a string literal, the raw
  /// (undecoded) body of a character set, or the name of an identifier.
  pub value: Option<String>,
  pub start: usize,
  pub end: usize,
}

#[derive(Debug)]
pub struct Scanner<'a> {
  source: &'a str,
  file_name: Option<String>,
  token: Token,
}

impl<'a> Scanner<'a> {
  /// Creates a scanner and immediately advances to the first token.
  pub fn new(source: &'a str, file_name: Option<&str>) -> Result<Self, ParseError> {
    let mut scanner = Scanner {
      source,
      file_name: file_name.map(str::to_owned),
      token: Token {
        kind: TokenKind::Sof,
        keyword: None,
        value: None,
        start: 0,
        end: 0,
      },
    };
    scanner.advance()?;
    Ok(scanner)
  }

  /// The live token. O(1), no side effect.
  pub fn token(&self) -> &Token {
    &self.token
  }

  /// Skips whitespace and comments, then classifies the next lexeme and
  /// replaces the live token. At end of input the token stays `Eof`.
  pub fn advance(&mut self) -> Result<(), ParseError> {
    let start = self.skip_trivia();
    let c = match self.source[start..].chars().next() {
      Some(c) => c,
      None => {
        self.set(TokenKind::Eof, None, None, start, start);
        return Ok(());
      }
    };
    match c {
      '"' | '\'' => self.scan_string(start, c),
      '[' => self.scan_set(start),
      '(' => Ok(self.punct(TokenKind::LParen, start)),
      ')' => Ok(self.punct(TokenKind::RParen, start)),
      '!' => Ok(self.punct(TokenKind::Bang, start)),
      '~' => Ok(self.punct(TokenKind::Tilde, start)),
      '+' => Ok(self.punct(TokenKind::Plus, start)),
      '*' => Ok(self.punct(TokenKind::Asterisk, start)),
      '?' => Ok(self.punct(TokenKind::QuestionMark, start)),
      '{' => Ok(self.punct(TokenKind::LBrace, start)),
      '}' => Ok(self.punct(TokenKind::RBrace, start)),
      '<' => Ok(self.punct(TokenKind::Lt, start)),
      '>' => Ok(self.punct(TokenKind::Gt, start)),
      '.' => Ok(self.punct(TokenKind::Dot, start)),
      ',' => Ok(self.punct(TokenKind::Comma, start)),
      '|' => Ok(self.punct(TokenKind::Or, start)),
      '=' => Ok(self.punct(TokenKind::Assign, start)),
      _ if is_word_char(c) => Ok(self.scan_ident(start)),
      _ => Err(self.lex_error(format!("Unexpected character {:?}", c), start)),
    }
  }

  /// Advances past whitespace, `//` line comments and non-nesting `/* */`
  /// block comments. An unterminated block comment is left in place so the
  /// `/` fails classification.
  fn skip_trivia(&self) -> usize {
    let mut pos = self.token.end;
    loop {
      let rest = &self.source[pos..];
      match rest.chars().next() {
        Some(c) if c.is_whitespace() => pos += c.len_utf8(),
        Some('/') if rest.starts_with("//") => {
          pos += match rest.find('\n') {
            Some(i) => i + 1,
            None => rest.len(),
          };
        }
        Some('/') if rest.starts_with("/*") => match rest[2..].find("*/") {
          Some(i) => pos += 2 + i + 2,
          None => return pos,
        },
        _ => return pos,
      }
    }
  }

  fn scan_string(&mut self, start: usize, quote: char) -> Result<(), ParseError> {
    let mut iter = self.source[start + 1..].char_indices();
    while let Some((i, c)) = iter.next() {
      if c == '\\' {
        if iter.next().is_none() {
          break;
        }
      } else if c == quote {
        let body = &self.source[start + 1..start + 1 + i];
        let value = escape::decode_string(body)
          .map_err(|msg| self.lex_error(msg, start))?;
        let end = start + 1 + i + quote.len_utf8();
        self.set(TokenKind::Str, None, Some(value), start, end);
        return Ok(());
      }
    }
    Err(self.lex_error("Unterminated string literal".to_owned(), start))
  }

  fn scan_set(&mut self, start: usize) -> Result<(), ParseError> {
    let mut iter = self.source[start + 1..].char_indices();
    while let Some((i, c)) = iter.next() {
      if c == '\\' {
        if iter.next().is_none() {
          break;
        }
      } else if c == ']' {
        // The raw body is kept; range decoding happens in the parser.
        let body = self.source[start + 1..start + 1 + i].to_owned();
        self.set(TokenKind::Set, None, Some(body), start, start + 1 + i + 1);
        return Ok(());
      }
    }
    Err(self.lex_error("Unterminated character set".to_owned(), start))
  }

  fn scan_ident(&mut self, start: usize) {
    let mut end = start;
    for c in self.source[start..].chars() {
      if !is_word_char(c) {
        break;
      }
      end += c.len_utf8();
    }
    let name = &self.source[start..end];
    let keyword = keyword_tag(name);
    self.set(TokenKind::Ident, keyword, Some(name.to_owned()), start, end);
  }

  fn punct(&mut self, kind: TokenKind, start: usize) {
    self.set(kind, None, None, start, start + 1);
  }

  fn set(
    &mut self,
    kind: TokenKind,
    keyword: Option<Keyword>,
    value: Option<String>,
    start: usize,
    end: usize,
  ) {
    self.token = Token { kind, keyword, value, start, end };
  }

  /// Advances and returns true when the live token has the given kind,
  /// otherwise leaves the scanner untouched.
  pub fn eat(&mut self, kind: TokenKind) -> Result<bool, ParseError> {
    if self.token.kind == kind {
      self.advance()?;
      Ok(true)
    } else {
      Ok(false)
    }
  }

  pub fn eat_keyword(&mut self, keyword: Keyword) -> Result<bool, ParseError> {
    if self.token.keyword == Some(keyword) {
      self.advance()?;
      Ok(true)
    } else {
      Ok(false)
    }
  }

  pub fn expect(&mut self, kind: TokenKind) -> Result<(), ParseError> {
    if self.eat(kind)? {
      Ok(())
    } else {
      Err(self.unexpected())
    }
  }

  pub fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), ParseError> {
    if self.eat_keyword(keyword)? {
      Ok(())
    } else {
      Err(self.unexpected())
    }
  }

  /// Syntax error at the live token.
  pub fn unexpected(&self) -> ParseError {
    let text = &self.source[self.token.start..self.token.end];
    self.syntax_error(format!("Unexpected token '{}'", text), self.token.start)
  }

  /// 1-based line and 0-based character column of a byte offset, found by
  /// scanning the preceding newlines.
  fn line_info(&self, pos: usize) -> (usize, usize) {
    let mut line = 1;
    let mut line_start = 0;
    for (i, c) in self.source[..pos].char_indices() {
      if c == '\n' {
        line += 1;
        line_start = i + 1;
      }
    }
    (line, self.source[line_start..pos].chars().count())
  }

  /// Formats a message as `"<msg> (<fileName> <line>:<column>)"`, dropping
  /// whichever parts are absent.
  pub fn message(&self, msg: &str, pos: Option<usize>) -> String {
    let mut loc = self.file_name.clone().unwrap_or_default();
    if let Some(pos) = pos {
      let (line, col) = self.line_info(pos);
      if !loc.is_empty() {
        loc.push(' ');
      }
      loc.push_str(&format!("{}:{}", line, col));
    }
    if loc.is_empty() {
      msg.to_owned()
    } else {
      format!("{} ({})", msg, loc)
    }
  }

  pub(crate) fn lex_error(&self, msg: String, pos: usize) -> ParseError {
    ParseError {
      kind: ParseErrorKind::Lex,
      message: self.message(&msg, Some(pos)),
      pos: Some(pos),
    }
  }

  pub(crate) fn syntax_error(&self, msg: String, pos: usize) -> ParseError {
    ParseError {
      kind: ParseErrorKind::Syntax,
      message: self.message(&msg, Some(pos)),
      pos: Some(pos),
    }
  }
}

fn is_word_char(c: char) -> bool {
  c.is_alphabetic() || c.is_ascii_digit() || c == '_' || c == '$'
}

fn keyword_tag(name: &str) -> Option<Keyword> {
  match name {
    "tokens" => Some(Keyword::Tokens),
    "external" => Some(Keyword::External),
    "precedence" => Some(Keyword::Precedence),
    "skip" => Some(Keyword::Skip),
    "from" => Some(Keyword::From),
    "left" => Some(Keyword::Left),
    "right" => Some(Keyword::Right),
    "cut" => Some(Keyword::Cut),
    "_" => Some(Keyword::Wildcard),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn collect(source: &str) -> Vec<(TokenKind, Option<String>, usize, usize)> {
    let mut scanner = Scanner::new(source, None).unwrap();
    let mut out = vec![];
    loop {
      let token = scanner.token();
      out.push((token.kind, token.value.clone(), token.start, token.end));
      if token.kind == TokenKind::Eof {
        return out;
      }
      scanner.advance().unwrap();
    }
  }

  #[test]
  fn classifies_tokens() {
    let tokens = collect("foo { \"a\" | [x] }");
    assert_eq!(
      tokens,
      vec![
        (TokenKind::Ident, Some("foo".to_owned()), 0, 3),
        (TokenKind::LBrace, None, 4, 5),
        (TokenKind::Str, Some("a".to_owned()), 6, 9),
        (TokenKind::Or, None, 10, 11),
        (TokenKind::Set, Some("x".to_owned()), 12, 15),
        (TokenKind::RBrace, None, 16, 17),
        (TokenKind::Eof, None, 17, 17),
      ]
    );
  }

  #[test]
  fn punctuation_set() {
    let tokens = collect("()!~+*?{}<>.,|=");
    let kinds = tokens.iter().map(|t| t.0).collect::<Vec<_>>();
    assert_eq!(
      kinds,
      vec![
        TokenKind::LParen,
        TokenKind::RParen,
        TokenKind::Bang,
        TokenKind::Tilde,
        TokenKind::Plus,
        TokenKind::Asterisk,
        TokenKind::QuestionMark,
        TokenKind::LBrace,
        TokenKind::RBrace,
        TokenKind::Lt,
        TokenKind::Gt,
        TokenKind::Dot,
        TokenKind::Comma,
        TokenKind::Or,
        TokenKind::Assign,
        TokenKind::Eof,
      ]
    );
  }

  #[test]
  fn skips_comments() {
    let tokens = collect("a // one\n/* two\nlines */ b");
    assert_eq!(
      tokens,
      vec![
        (TokenKind::Ident, Some("a".to_owned()), 0, 1),
        (TokenKind::Ident, Some("b".to_owned()), 25, 26),
        (TokenKind::Eof, None, 26, 26),
      ]
    );
  }

  #[test]
  fn string_escapes_are_decoded() {
    let tokens = collect(r#"'a\nb' "q\"r""#);
    assert_eq!(tokens[0].1, Some("a\nb".to_owned()));
    assert_eq!(tokens[1].1, Some("q\"r".to_owned()));
  }

  #[test]
  fn set_body_stays_raw() {
    let tokens = collect(r"[a-z\]]");
    assert_eq!(tokens[0].1, Some(r"a-z\]".to_owned()));
  }

  #[test]
  fn keywords_are_tagged_once() {
    let scanner = Scanner::new("tokens", None).unwrap();
    assert_eq!(scanner.token().kind, TokenKind::Ident);
    assert_eq!(scanner.token().keyword, Some(Keyword::Tokens));

    let scanner = Scanner::new("tokenize", None).unwrap();
    assert_eq!(scanner.token().keyword, None);
  }

  #[test]
  fn identifier_characters() {
    let tokens = collect("$foo_1 héllo");
    assert_eq!(tokens[0].1, Some("$foo_1".to_owned()));
    assert_eq!(tokens[1].1, Some("héllo".to_owned()));
  }

  #[test]
  fn eof_is_sticky() {
    let mut scanner = Scanner::new("  ", None).unwrap();
    assert_eq!(scanner.token().kind, TokenKind::Eof);
    scanner.advance().unwrap();
    assert_eq!(scanner.token().kind, TokenKind::Eof);
    assert_eq!(scanner.token().start, 2);
  }

  #[test]
  fn unterminated_string() {
    let err = Scanner::new("a { \"xy }", None)
      .and_then(|mut s| {
        s.advance()?;
        s.advance()?;
        s.advance()
      })
      .unwrap_err();
    assert_eq!(err.kind, crate::ParseErrorKind::Lex);
    assert_eq!(err.message, "Unterminated string literal (1:4)");
    assert_eq!(err.pos, Some(4));
  }

  #[test]
  fn unterminated_set() {
    let err = Scanner::new("[ab", None).unwrap_err();
    assert_eq!(err.message, "Unterminated character set (1:0)");
  }

  #[test]
  fn unexpected_character() {
    let err = Scanner::new("#", None).unwrap_err();
    assert_eq!(err.kind, crate::ParseErrorKind::Lex);
    assert_eq!(err.message, "Unexpected character '#' (1:0)");
  }

  #[test]
  fn unterminated_block_comment_is_not_trivia() {
    let err = Scanner::new("/* no end", None).unwrap_err();
    assert_eq!(err.message, "Unexpected character '/' (1:0)");
  }

  #[test]
  fn message_includes_file_name() {
    let scanner = Scanner::new("a\nb", Some("g.gd")).unwrap();
    assert_eq!(scanner.message("oops", Some(2)), "oops (g.gd 2:0)");
    assert_eq!(scanner.message("oops", None), "oops (g.gd)");
  }
}
