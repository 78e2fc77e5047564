//! Minimal JSON reader exercising the parser-driver surface (spec §6):
//! `map_new`/`map_put`, `array_fill`/`array_push`, and the scalar
//! constructors, the same way a real format parser would build `Item`s
//! without ever touching the heap directly.
//!
//! This is intentionally a "good enough to drive the validator" reader, not
//! a general JSON implementation — no surrogate-pair decoding, no number
//! format beyond what `f64`/`i64` parse directly.

use lambda_core::{EvalContext, Item, Type, TypeId, TypeKind, TypeMap};
use lambda_runtime::{array_fill, map_new, map_put};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct JsonError {
    pub message: String,
    pub offset: usize,
}

impl fmt::Display for JsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (at byte {})", self.message, self.offset)
    }
}

impl std::error::Error for JsonError {}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(src: &'a str) -> Self {
        Reader {
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    fn err(&self, message: impl Into<String>) -> JsonError {
        JsonError {
            message: message.into(),
            offset: self.pos,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ') | Some(b'\t') | Some(b'\n') | Some(b'\r')) {
            self.pos += 1;
        }
    }

    fn expect(&mut self, b: u8) -> Result<(), JsonError> {
        if self.peek() == Some(b) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.err(format!("expected '{}'", b as char)))
        }
    }

    fn literal(&mut self, lit: &str) -> Result<(), JsonError> {
        let end = self.pos + lit.len();
        if self.bytes.get(self.pos..end) == Some(lit.as_bytes()) {
            self.pos = end;
            Ok(())
        } else {
            Err(self.err(format!("expected literal '{lit}'")))
        }
    }

    fn parse_string_raw(&mut self) -> Result<String, JsonError> {
        self.expect(b'"')?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.err("unterminated string")),
                Some(b'"') => return Ok(out),
                Some(b'\\') => match self.bump() {
                    Some(b'"') => out.push('"'),
                    Some(b'\\') => out.push('\\'),
                    Some(b'/') => out.push('/'),
                    Some(b'n') => out.push('\n'),
                    Some(b't') => out.push('\t'),
                    Some(b'r') => out.push('\r'),
                    Some(b'b') => out.push('\u{0008}'),
                    Some(b'f') => out.push('\u{000C}'),
                    Some(b'u') => {
                        let start = self.pos;
                        self.pos += 4;
                        let hex = std::str::from_utf8(&self.bytes[start..self.pos])
                            .map_err(|_| self.err("invalid \\u escape"))?;
                        let code = u32::from_str_radix(hex, 16).map_err(|_| self.err("invalid \\u escape"))?;
                        out.push(char::from_u32(code).unwrap_or('\u{FFFD}'));
                    }
                    _ => return Err(self.err("invalid escape sequence")),
                },
                Some(b) => {
                    // Re-collect the rest of this UTF-8 codepoint.
                    let start = self.pos - 1;
                    let width = utf8_width(b);
                    self.pos = start + width;
                    let s = std::str::from_utf8(&self.bytes[start..self.pos])
                        .map_err(|_| self.err("invalid UTF-8 in string"))?;
                    out.push_str(s);
                }
            }
        }
    }
}

/// Parses a JSON document into an `Item` tree (spec §6 "parser-driver
/// surface"), allocating every container through `ctx`.
pub fn parse(ctx: &mut EvalContext, src: &str) -> Result<Item, JsonError> {
    let mut r = Reader::new(src);
    r.skip_ws();
    let value = parse_value(ctx, &mut r)?;
    r.skip_ws();
    if r.pos != r.bytes.len() {
        return Err(r.err("trailing data after JSON value"));
    }
    Ok(value)
}

fn parse_value(ctx: &mut EvalContext, r: &mut Reader) -> Result<Item, JsonError> {
    r.skip_ws();
    match r.peek() {
        Some(b'"') => {
            let s = r.parse_string_raw()?;
            Ok(Item::String(lambda_core::LambdaString::content(s)))
        }
        Some(b'{') => parse_object(ctx, r),
        Some(b'[') => parse_array(ctx, r),
        Some(b't') => {
            r.literal("true")?;
            Ok(Item::Bool(true))
        }
        Some(b'f') => {
            r.literal("false")?;
            Ok(Item::Bool(false))
        }
        Some(b'n') => {
            r.literal("null")?;
            Ok(Item::Null)
        }
        Some(b'-') | Some(b'0'..=b'9') => parse_number(ctx, r),
        _ => Err(r.err("unexpected character")),
    }
}

fn parse_number(ctx: &mut EvalContext, r: &mut Reader) -> Result<Item, JsonError> {
    let start = r.pos;
    if r.peek() == Some(b'-') {
        r.pos += 1;
    }
    let mut is_float = false;
    while matches!(r.peek(), Some(b'0'..=b'9')) {
        r.pos += 1;
    }
    if r.peek() == Some(b'.') {
        is_float = true;
        r.pos += 1;
        while matches!(r.peek(), Some(b'0'..=b'9')) {
            r.pos += 1;
        }
    }
    if matches!(r.peek(), Some(b'e') | Some(b'E')) {
        is_float = true;
        r.pos += 1;
        if matches!(r.peek(), Some(b'+') | Some(b'-')) {
            r.pos += 1;
        }
        while matches!(r.peek(), Some(b'0'..=b'9')) {
            r.pos += 1;
        }
    }
    let text = std::str::from_utf8(&r.bytes[start..r.pos]).unwrap();
    if is_float {
        let v: f64 = text.parse().map_err(|_| r.err("invalid number"))?;
        Ok(Item::Float(ctx.num_stack.push_d(v)))
    } else {
        let v: i64 = text.parse().map_err(|_| r.err("invalid number"))?;
        if (lambda_core::INT56_MIN..=lambda_core::INT56_MAX).contains(&v) {
            Ok(Item::Int(v))
        } else {
            Ok(Item::Int64(ctx.num_stack.push_l(v)))
        }
    }
}

fn parse_array(ctx: &mut EvalContext, r: &mut Reader) -> Result<Item, JsonError> {
    r.expect(b'[')?;
    let mut items = Vec::new();
    r.skip_ws();
    if r.peek() == Some(b']') {
        r.pos += 1;
        return Ok(Item::Array(array_fill(ctx, items)));
    }
    loop {
        items.push(parse_value(ctx, r)?);
        r.skip_ws();
        match r.bump() {
            Some(b',') => continue,
            Some(b']') => break,
            _ => return Err(r.err("expected ',' or ']'")),
        }
    }
    Ok(Item::Array(array_fill(ctx, items)))
}

/// Object fields bind to a fresh anonymous `TypeMap`, one per JSON object,
/// which mirrors how a real parser would register ad hoc structural shapes
/// for untyped input (spec §4.3 "the first write... extends the shape").
fn parse_object(ctx: &mut EvalContext, r: &mut Reader) -> Result<Item, JsonError> {
    r.expect(b'{')?;
    let type_index = ctx.type_list.register(
        Type {
            type_id: TypeId::Map,
            is_literal: false,
            kind: TypeKind::Map(TypeMap::new()),
        },
        None,
    );
    let map = map_new(ctx, type_index);
    r.skip_ws();
    if r.peek() == Some(b'}') {
        r.pos += 1;
        return Ok(Item::Map(map));
    }
    loop {
        r.skip_ws();
        let key = r.parse_string_raw()?;
        r.skip_ws();
        r.expect(b':')?;
        let value = parse_value(ctx, r)?;
        map_put(ctx, map, &key, value);
        r.skip_ws();
        match r.bump() {
            Some(b',') => continue,
            Some(b'}') => break,
            _ => return Err(r.err("expected ',' or '}'")),
        }
    }
    Ok(Item::Map(map))
}

fn utf8_width(first_byte: u8) -> usize {
    if first_byte & 0x80 == 0 {
        1
    } else if first_byte & 0xE0 == 0xC0 {
        2
    } else if first_byte & 0xF0 == 0xE0 {
        3
    } else {
        4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_runtime::{array_get, map_get};

    #[test]
    fn parses_flat_object() {
        let mut ctx = EvalContext::new();
        let item = parse(&mut ctx, r#"{"x": 1, "y": 2}"#).unwrap();
        let Item::Map(h) = item else { panic!("expected map") };
        assert_eq!(map_get(&ctx, h, "x"), Item::Int(1));
        assert_eq!(map_get(&ctx, h, "y"), Item::Int(2));
    }

    #[test]
    fn parses_nested_array_and_string() {
        let mut ctx = EvalContext::new();
        let item = parse(&mut ctx, r#"{"items": [1, 2, "three"]}"#).unwrap();
        let Item::Map(h) = item else { panic!("expected map") };
        let Item::Array(arr) = map_get(&ctx, h, "items") else {
            panic!("expected array")
        };
        assert_eq!(array_get(&ctx, arr, 0), Item::Int(1));
        assert_eq!(
            array_get(&ctx, arr, 2),
            Item::String(lambda_core::LambdaString::content("three"))
        );
    }

    #[test]
    fn rejects_trailing_garbage() {
        let mut ctx = EvalContext::new();
        assert!(parse(&mut ctx, "{} garbage").is_err());
    }

    #[test]
    fn parses_bool_and_null() {
        let mut ctx = EvalContext::new();
        let item = parse(&mut ctx, r#"{"a": true, "b": null}"#).unwrap();
        let Item::Map(h) = item else { panic!("expected map") };
        assert_eq!(map_get(&ctx, h, "a"), Item::Bool(true));
        assert_eq!(map_get(&ctx, h, "b"), Item::Null);
    }
}
