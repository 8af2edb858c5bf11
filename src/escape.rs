//! Escape-sequence decoding for string and character-set literals.

use std::str::Chars;

/// One decoded element of a character-set body. An unescaped `-` is kept
/// apart from literal hyphens (`\-`) so the range operator stays unambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetItem {
  Char(u32),
  Dash,
}

/// Decodes the body of a quoted literal (delimiters already stripped).
pub fn decode_string(body: &str) -> Result<String, String> {
  let mut out = String::with_capacity(body.len());
  let mut chars = body.chars();
  while let Some(c) = chars.next() {
    if c == '\\' {
      if let Some(decoded) = decode_escape(&mut chars)? {
        out.push(decoded);
      }
    } else {
      out.push(c);
    }
  }
  Ok(out)
}

/// Decodes a character-set body into codepoints and range operators.
pub fn decode_set(body: &str) -> Result<Vec<SetItem>, String> {
  let mut items = vec![];
  let mut chars = body.chars();
  while let Some(c) = chars.next() {
    match c {
      '-' => items.push(SetItem::Dash),
      '\\' => {
        if let Some(decoded) = decode_escape(&mut chars)? {
          items.push(SetItem::Char(decoded as u32));
        }
      }
      _ => items.push(SetItem::Char(c as u32)),
    }
  }
  Ok(items)
}

/// Reads one escape sequence, the backslash already consumed. Returns `None`
/// for a line continuation (backslash before a newline).
fn decode_escape(chars: &mut Chars) -> Result<Option<char>, String> {
  let c = chars
    .next()
    .ok_or_else(|| "Invalid escape sequence".to_owned())?;
  let decoded = match c {
    'n' => '\n',
    'r' => '\r',
    't' => '\t',
    '0' => '\0',
    'b' => '\u{8}',
    'f' => '\u{c}',
    'v' => '\u{b}',
    '\n' => return Ok(None),
    'x' => hex_escape(chars, 2)?,
    'u' => {
      let mut lookahead = chars.clone();
      if lookahead.next() == Some('{') {
        *chars = lookahead;
        braced_escape(chars)?
      } else {
        hex_escape(chars, 4)?
      }
    }
    // Any other escaped character stands for itself: \" \' \\ \] \- ...
    other => other,
  };
  Ok(Some(decoded))
}

fn hex_escape(chars: &mut Chars, len: usize) -> Result<char, String> {
  let mut value = 0;
  for _ in 0..len {
    let c = chars
      .next()
      .ok_or_else(|| "Invalid escape sequence".to_owned())?;
    value = value * 16 + hex_digit(c)?;
  }
  std::char::from_u32(value).ok_or_else(|| "Invalid escape sequence".to_owned())
}

fn braced_escape(chars: &mut Chars) -> Result<char, String> {
  let mut value: u32 = 0;
  let mut digits = 0;
  loop {
    match chars.next() {
      Some('}') if digits > 0 => break,
      Some(c) => {
        value = value * 16 + hex_digit(c)?;
        digits += 1;
        if value > 0x10ffff {
          return Err("Invalid escape sequence".to_owned());
        }
      }
      None => return Err("Invalid escape sequence".to_owned()),
    }
  }
  std::char::from_u32(value).ok_or_else(|| "Invalid escape sequence".to_owned())
}

fn hex_digit(c: char) -> Result<u32, String> {
  c.to_digit(16)
    .ok_or_else(|| "Invalid escape sequence".to_owned())
}
