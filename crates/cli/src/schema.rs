//! Minimal schema-declaration reader (spec §6 "parser driver"/validator CLI
//! surface): `type Name = { field: type, ... }`, `A | B` unions, and the
//! `?`/`+`/`*` occurrence-suffix mini-language used by spec.md's own
//! testable properties (§8).
//!
//! This stands in for the real tree-sitter-grammar front end (out of
//! scope, spec §1) — just enough syntax to register `Type`s in an
//! `EvalContext`'s type list and drive the validator end-to-end from the
//! CLI.

use lambda_core::{EvalContext, Occurrence, Type, TypeId, TypeKind, TypeMap, TypeUnary, TypeUnion};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaError {
    pub message: String,
    pub line: usize,
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (line {})", self.message, self.line)
    }
}

impl std::error::Error for SchemaError {}

struct Tokens<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    src: &'a str,
    line: usize,
}

impl<'a> Tokens<'a> {
    fn new(src: &'a str) -> Self {
        Tokens {
            chars: src.char_indices().peekable(),
            src,
            line: 1,
        }
    }

    fn skip_ws_and_comments(&mut self) {
        loop {
            while let Some(&(_, c)) = self.chars.peek() {
                if c == '\n' {
                    self.line += 1;
                }
                if c.is_whitespace() {
                    self.chars.next();
                } else {
                    break;
                }
            }
            if let Some(&(_, '#')) = self.chars.peek() {
                while let Some(&(_, c)) = self.chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.chars.next();
                }
                continue;
            }
            break;
        }
    }

    fn peek_char(&mut self) -> Option<char> {
        self.skip_ws_and_comments();
        self.chars.peek().map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }

    fn expect_char(&mut self, expected: char) -> Result<(), SchemaError> {
        self.skip_ws_and_comments();
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            other => Err(self.err(format!("expected '{expected}', found {other:?}"))),
        }
    }

    fn err(&self, message: impl Into<String>) -> SchemaError {
        SchemaError {
            message: message.into(),
            line: self.line,
        }
    }

    /// An identifier: `[A-Za-z_][A-Za-z0-9_]*`.
    fn ident(&mut self) -> Result<String, SchemaError> {
        self.skip_ws_and_comments();
        let start = match self.chars.peek() {
            Some(&(i, c)) if c.is_alphabetic() || c == '_' => i,
            _ => return Err(self.err("expected identifier")),
        };
        let mut end = start;
        while let Some(&(i, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' {
                end = i + c.len_utf8();
                self.chars.next();
            } else {
                break;
            }
        }
        Ok(self.src[start..end].to_string())
    }

    fn try_occurrence_suffix(&mut self) -> Option<char> {
        match self.chars.peek() {
            Some(&(_, c @ ('?' | '+' | '*'))) => {
                self.chars.next();
                Some(c)
            }
            _ => None,
        }
    }
}

fn primitive_by_name(name: &str) -> Option<TypeId> {
    Some(match name {
        "null" => TypeId::Null,
        "bool" => TypeId::Bool,
        "int" => TypeId::Int,
        "int64" => TypeId::Int64,
        "float" => TypeId::Float,
        "dtime" | "datetime" => TypeId::DateTime,
        "decimal" => TypeId::Decimal,
        "string" => TypeId::String,
        "symbol" => TypeId::Symbol,
        "binary" => TypeId::Binary,
        "array" => TypeId::Array,
        "list" => TypeId::List,
        "any" => TypeId::Any,
        _ => return None,
    })
}

/// Parses every `type Name = ...` declaration in `src`, registering each in
/// `ctx.type_list`. Returns the name of the last declaration (the CLI's
/// implicit root schema) for convenience.
pub fn parse_schema(ctx: &mut EvalContext, src: &str) -> Result<String, SchemaError> {
    let mut toks = Tokens::new(src);
    let mut declared: Vec<String> = Vec::new();
    let mut last_name: Option<String> = None;

    // Pass 1: register a named placeholder wrapper for every declaration so
    // forward and mutually recursive references resolve (spec §4.5 named
    // type references / cycle detection via `visited_nodes`).
    let mut scan = Tokens::new(src);
    loop {
        match scan.peek_char() {
            None => break,
            Some(_) => {
                let kw = scan.ident()?;
                if kw != "type" {
                    return Err(scan.err(format!("expected 'type', found '{kw}'")));
                }
                let name = scan.ident()?;
                scan.expect_char('=')?;
                skip_type_expr(&mut scan)?;
                declared.push(name.clone());
                ctx.type_list.register(
                    Type {
                        type_id: TypeId::Any,
                        is_literal: false,
                        kind: TypeKind::Wrapper(lambda_core::TypeType {
                            name: Some(name),
                            inner: usize::MAX,
                        }),
                    },
                    declared.last().cloned(),
                );
            }
        }
    }

    // Pass 2: parse each body for real and fill the wrapper's `inner`.
    loop {
        if toks.peek_char().is_none() {
            break;
        }
        toks.ident()?; // "type"
        let name = toks.ident()?;
        toks.expect_char('=')?;
        let wrapper_index = ctx
            .type_list
            .find_by_name(&name)
            .ok_or_else(|| toks.err(format!("internal: '{name}' not pre-registered")))?;
        let body_index = parse_type_expr(ctx, &mut toks, &declared)?;
        if let Some(ty) = ctx.type_list.get_mut(wrapper_index) {
            if let TypeKind::Wrapper(w) = &mut ty.kind {
                w.inner = body_index;
            }
        }
        last_name = Some(name);
    }

    last_name.ok_or_else(|| toks.err("schema declared no types"))
}

/// Skips over one type expression without building anything — used in the
/// pre-registration scan pass.
fn skip_type_expr(toks: &mut Tokens) -> Result<(), SchemaError> {
    loop {
        match toks.peek_char() {
            Some('{') => {
                toks.bump();
                let mut depth = 1;
                while depth > 0 {
                    match toks.bump() {
                        Some('{') => depth += 1,
                        Some('}') => depth -= 1,
                        None => return Err(toks.err("unterminated '{'")),
                        _ => {}
                    }
                }
            }
            Some(_) => {
                toks.ident()?;
                toks.try_occurrence_suffix();
            }
            None => return Err(toks.err("expected a type expression")),
        }
        toks.skip_ws_and_comments();
        if toks.peek_char() == Some('|') {
            toks.bump();
            continue;
        }
        break;
    }
    Ok(())
}

fn parse_type_expr(ctx: &mut EvalContext, toks: &mut Tokens, declared: &[String]) -> Result<usize, SchemaError> {
    let mut arms = vec![parse_atom_type(ctx, toks, declared)?];
    while toks.peek_char() == Some('|') {
        toks.bump();
        arms.push(parse_atom_type(ctx, toks, declared)?);
    }
    if arms.len() == 1 {
        Ok(arms[0])
    } else {
        Ok(ctx.type_list.register(
            Type {
                type_id: TypeId::Any,
                is_literal: false,
                kind: TypeKind::Union(TypeUnion { arms }),
            },
            None,
        ))
    }
}

fn parse_atom_type(ctx: &mut EvalContext, toks: &mut Tokens, declared: &[String]) -> Result<usize, SchemaError> {
    let base = if toks.peek_char() == Some('{') {
        parse_map_type(ctx, toks, declared)?
    } else {
        let name = toks.ident()?;
        if let Some(id) = primitive_by_name(&name) {
            ctx.type_list.register(Type::primitive(id), None)
        } else if declared.iter().any(|d| d == &name) {
            ctx.type_list
                .find_by_name(&name)
                .ok_or_else(|| toks.err(format!("unknown type reference '{name}'")))?
        } else {
            return Err(toks.err(format!("unknown type name '{name}'")));
        }
    };
    if let Some(suffix) = toks.try_occurrence_suffix() {
        let op = Occurrence::from_suffix(Some(suffix)).expect("lexer only emits valid suffix chars");
        Ok(ctx.type_list.register(
            Type {
                type_id: TypeId::Any,
                is_literal: false,
                kind: TypeKind::Unary(TypeUnary { op, operand: base }),
            },
            None,
        ))
    } else {
        Ok(base)
    }
}

fn parse_map_type(ctx: &mut EvalContext, toks: &mut Tokens, declared: &[String]) -> Result<usize, SchemaError> {
    toks.expect_char('{')?;
    let mut map = TypeMap::new();
    if toks.peek_char() == Some('}') {
        toks.bump();
        return Ok(ctx.type_list.register(
            Type {
                type_id: TypeId::Map,
                is_literal: false,
                kind: TypeKind::Map(map),
            },
            None,
        ));
    }
    loop {
        let field_name = toks.ident()?;
        toks.expect_char(':')?;
        let field_type = parse_type_expr(ctx, toks, declared)?;
        map.append_field(Some(field_name), field_type, 1);
        toks.skip_ws_and_comments();
        match toks.peek_char() {
            Some(',') => {
                toks.bump();
                continue;
            }
            Some('}') => {
                toks.bump();
                break;
            }
            _ => return Err(toks.err("expected ',' or '}' in map type")),
        }
    }
    Ok(ctx.type_list.register(
        Type {
            type_id: TypeId::Map,
            is_literal: false,
            kind: TypeKind::Map(map),
        },
        None,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_runtime::{validate, Limits};

    #[test]
    fn parses_flat_map_schema() {
        let mut ctx = EvalContext::new();
        let root = parse_schema(&mut ctx, "type Point = { x: int, y: int }").unwrap();
        assert_eq!(root, "Point");
        assert!(ctx.type_list.find_by_name("Point").is_some());
    }

    #[test]
    fn parses_optional_field_suffix() {
        let mut ctx = EvalContext::new();
        parse_schema(&mut ctx, "type T = { x: int, y: int? }").unwrap();
        let idx = ctx.type_list.find_by_name("T").unwrap();
        let result = validate(&ctx, &lambda_core::Item::Null, "T", Limits::default());
        // A null value never satisfies a map-shaped type; this just checks
        // the schema registered without panicking and produced an error.
        assert!(!result.valid);
        let _ = idx;
    }

    #[test]
    fn parses_union_schema() {
        let mut ctx = EvalContext::new();
        let root = parse_schema(&mut ctx, "type T = int | { k: string }").unwrap();
        assert_eq!(root, "T");
    }

    #[test]
    fn rejects_unknown_type_reference() {
        let mut ctx = EvalContext::new();
        assert!(parse_schema(&mut ctx, "type T = { x: nope }").is_err());
    }
}
