//! Structural validator (spec §4.5).
//!
//! Walks an `Item` against a `Type`, producing a flat, ordered list of typed
//! errors with a path — a "linked list" in the source's terms, a `Vec` here,
//! since nothing downstream needs pointer-stable node identity. Global
//! controls (`max_depth`, `timeout_ms`, `max_errors`) abort the walk early;
//! everything else accumulates.

use lambda_core::{EvalContext, HeapObject, Item, Occurrence, TypeId, TypeKind};
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// One segment of the path leading to a validation error (spec §4.5).
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
    ElementTag,
    Attribute(String),
    UnionIndex(usize),
}

impl std::fmt::Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, ".{name}"),
            PathSegment::Index(i) => write!(f, "[{i}]"),
            PathSegment::ElementTag => write!(f, "#tag"),
            PathSegment::Attribute(name) => write!(f, "@{name}"),
            PathSegment::UnionIndex(i) => write!(f, "|{i}"),
        }
    }
}

/// Renders a full path (e.g. `.y`, `.items[2].k`) by joining its segments.
pub fn path_string(path: &[PathSegment]) -> String {
    path.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    TypeMismatch,
    MissingField,
    UnexpectedField,
    NullValue,
    InvalidElement,
    ConstraintViolation,
    ReferenceError,
    OccurrenceError,
    CircularReference,
    ParseError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCode::TypeMismatch => "TYPE_MISMATCH",
            ErrorCode::MissingField => "MISSING_FIELD",
            ErrorCode::UnexpectedField => "UNEXPECTED_FIELD",
            ErrorCode::NullValue => "NULL_VALUE",
            ErrorCode::InvalidElement => "INVALID_ELEMENT",
            ErrorCode::ConstraintViolation => "CONSTRAINT_VIOLATION",
            ErrorCode::ReferenceError => "REFERENCE_ERROR",
            ErrorCode::OccurrenceError => "OCCURRENCE_ERROR",
            ErrorCode::CircularReference => "CIRCULAR_REFERENCE",
            ErrorCode::ParseError => "PARSE_ERROR",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub code: ErrorCode,
    pub message: String,
    pub path: Vec<PathSegment>,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub suggestions: Vec<String>,
}

impl ValidationError {
    fn new(code: ErrorCode, message: impl Into<String>, path: &[PathSegment]) -> Self {
        ValidationError {
            code,
            message: message.into(),
            path: path.to_vec(),
            expected: None,
            actual: None,
            suggestions: Vec::new(),
        }
    }

    fn with_types(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationCounts {
    pub nodes_visited: usize,
    pub max_depth_reached: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    /// Non-failing diagnostics (spec §4.5 supplemental): an `UNEXPECTED_FIELD`
    /// on a map/element is reported here, never in `errors`, and never flips
    /// `valid` to `false`.
    pub warnings: Vec<ValidationError>,
    pub counts: ValidationCounts,
}

impl ValidationResult {
    fn ok() -> Self {
        ValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            counts: ValidationCounts::default(),
        }
    }
}

/// Per-call limits (spec §4.5 "global controls").
#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub max_depth: usize,
    pub timeout_ms: u64,
    pub max_errors: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_depth: 64,
            timeout_ms: 5_000,
            max_errors: 0,
        }
    }
}

/// Short-circuit signal raised internally once a global cap trips; the walk
/// aborts rather than accumulating further errors for this call.
enum Aborted {
    DepthExceeded,
    TimedOut,
    ErrorCapReached,
}

struct Walk<'a> {
    ctx: &'a EvalContext,
    limits: Limits,
    started: Instant,
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationError>,
    visited_nodes: HashSet<String>,
    counts: ValidationCounts,
}

impl<'a> Walk<'a> {
    fn push_error(&mut self, err: ValidationError) -> Result<(), Aborted> {
        self.errors.push(err);
        if self.limits.max_errors > 0 && self.errors.len() >= self.limits.max_errors {
            return Err(Aborted::ErrorCapReached);
        }
        Ok(())
    }

    fn check_budget(&mut self, depth: usize) -> Result<(), Aborted> {
        self.counts.nodes_visited += 1;
        self.counts.max_depth_reached = self.counts.max_depth_reached.max(depth);
        if depth > self.limits.max_depth {
            return Err(Aborted::DepthExceeded);
        }
        if self.limits.timeout_ms > 0 && self.started.elapsed() > Duration::from_millis(self.limits.timeout_ms)
        {
            return Err(Aborted::TimedOut);
        }
        Ok(())
    }
}

/// Validates `item` against the type registered under `type_name` (spec §4.5
/// `validate`).
pub fn validate(ctx: &EvalContext, item: &Item, type_name: &str, limits: Limits) -> ValidationResult {
    let Some(idx) = ctx.type_list.find_by_name(type_name) else {
        let mut result = ValidationResult::ok();
        result.valid = false;
        result.errors.push(ValidationError::new(
            ErrorCode::ReferenceError,
            format!("unknown type name '{type_name}'"),
            &[],
        ));
        return result;
    };
    validate_against_index(ctx, item, idx, limits)
}

/// Validates `item` against a type already resolved to its registry index
/// (spec §4.5 `validate_against_type`).
pub fn validate_against_index(ctx: &EvalContext, item: &Item, type_index: usize, limits: Limits) -> ValidationResult {
    let mut walk = Walk {
        ctx,
        limits,
        started: Instant::now(),
        errors: Vec::new(),
        warnings: Vec::new(),
        visited_nodes: HashSet::new(),
        counts: ValidationCounts::default(),
    };
    let outcome = walk_type(&mut walk, item, type_index, &mut Vec::new(), 0);
    let mut result = ValidationResult {
        valid: walk.errors.is_empty(),
        errors: walk.errors,
        warnings: walk.warnings,
        counts: walk.counts,
    };
    if let Err(aborted) = outcome {
        result.valid = false;
        let (code, msg) = match aborted {
            Aborted::DepthExceeded => (ErrorCode::ConstraintViolation, "max_depth exceeded"),
            Aborted::TimedOut => (ErrorCode::ConstraintViolation, "validation timed out"),
            Aborted::ErrorCapReached => (ErrorCode::ConstraintViolation, "max_errors reached"),
        };
        result.errors.push(ValidationError::new(code, msg, &[]));
    }
    result
}

fn type_id_name(id: TypeId) -> &'static str {
    match id {
        TypeId::Null => "NULL",
        TypeId::Error => "ERROR",
        TypeId::Bool => "BOOL",
        TypeId::Int => "INT",
        TypeId::Int64 => "INT64",
        TypeId::Float => "FLOAT",
        TypeId::DateTime => "DTIME",
        TypeId::Decimal => "DECIMAL",
        TypeId::String => "STRING",
        TypeId::Symbol => "SYMBOL",
        TypeId::Binary => "BINARY",
        TypeId::Range => "RANGE",
        TypeId::Array => "ARRAY",
        TypeId::ArrayInt => "ARRAY_INT",
        TypeId::ArrayInt64 => "ARRAY_INT64",
        TypeId::ArrayFloat => "ARRAY_FLOAT",
        TypeId::List => "LIST",
        TypeId::Map => "MAP",
        TypeId::Element => "ELEMENT",
        TypeId::Func => "FUNC",
        TypeId::Type => "TYPE",
        TypeId::Any => "ANY",
    }
}

/// `type.type_id ∈ [INT..NUMBER]` from spec §4.5 — the numeric coercion
/// ladder's domain, accepted wherever any one numeric kind is declared.
fn is_numeric(id: TypeId) -> bool {
    matches!(id, TypeId::Int | TypeId::Int64 | TypeId::Float | TypeId::Decimal)
}

fn walk_type(
    walk: &mut Walk,
    item: &Item,
    type_index: usize,
    path: &mut Vec<PathSegment>,
    depth: usize,
) -> Result<(), Aborted> {
    walk.check_budget(depth)?;
    let Some(ty) = walk.ctx.type_list.get(type_index) else {
        return walk.push_error(ValidationError::new(
            ErrorCode::ReferenceError,
            "dangling type reference",
            path,
        ));
    };

    match &ty.kind {
        TypeKind::Primitive(expected) => walk_primitive(walk, item, *expected, path),
        TypeKind::Wrapper(w) => walk_wrapper(walk, item, w.inner, w.name.clone(), path, depth),
        TypeKind::Array(a) => walk_array(walk, item, a.nested, path, depth),
        TypeKind::Map(m) => walk_map(walk, item, m, path, depth),
        TypeKind::Elmt(e) => walk_elmt(walk, item, e, path, depth),
        TypeKind::Union(u) => walk_union(walk, item, &u.arms, path, depth),
        TypeKind::Unary(u) => walk_occurrence_single(walk, item, u.op, u.operand, path, depth),
    }
}

fn walk_primitive(walk: &mut Walk, item: &Item, expected: TypeId, path: &[PathSegment]) -> Result<(), Aborted> {
    let actual = item.type_id();
    if actual == expected {
        return Ok(());
    }
    if expected == TypeId::Any {
        return Ok(());
    }
    if is_numeric(expected) && is_numeric(actual) {
        return Ok(());
    }
    walk.push_error(
        ValidationError::new(ErrorCode::TypeMismatch, "value does not match expected primitive type", path)
            .with_types(type_id_name(expected), type_id_name(actual)),
    )
}

/// A `TypeType` wrapper: if its inner is an occurrence-bearing `TypeUnary`,
/// validate against the operand directly instead of one more level of
/// indirection (spec §4.5 "Type wrapper").
fn walk_wrapper(
    walk: &mut Walk,
    item: &Item,
    inner_index: usize,
    name: Option<String>,
    path: &mut Vec<PathSegment>,
    depth: usize,
) -> Result<(), Aborted> {
    if let Some(name) = &name {
        if !walk.visited_nodes.insert(name.clone()) {
            return walk.push_error(ValidationError::new(
                ErrorCode::CircularReference,
                format!("circular reference to type '{name}'"),
                path,
            ));
        }
    }
    let inner_is_unary = matches!(
        walk.ctx.type_list.get(inner_index).map(|t| &t.kind),
        Some(TypeKind::Unary(_))
    );
    let result = if inner_is_unary {
        walk_type(walk, item, inner_index, path, depth)
    } else {
        walk_type(walk, item, inner_index, path, depth + 1)
    };
    if let Some(name) = &name {
        walk.visited_nodes.remove(name);
    }
    result
}

fn walk_occurrence_single(
    walk: &mut Walk,
    item: &Item,
    op: Occurrence,
    operand: usize,
    path: &mut Vec<PathSegment>,
    depth: usize,
) -> Result<(), Aborted> {
    if item.is_null() {
        if op.allows_zero() {
            return Ok(());
        }
        return walk.push_error(ValidationError::new(
            ErrorCode::NullValue,
            "value is null but the occurrence requires at least one",
            path,
        ));
    }
    walk_type(walk, item, operand, path, depth + 1)
}

fn item_as_vec(ctx: &EvalContext, item: &Item) -> Option<Vec<Item>> {
    match item {
        Item::Array(h) | Item::List(h) => match ctx.heap.get(*h) {
            Some(HeapObject::Array(d)) => Some(d.items.clone()),
            Some(HeapObject::List(d)) => Some(d.items.clone()),
            _ => None,
        },
        Item::ArrayInt(h) => match ctx.heap.get(*h) {
            Some(HeapObject::ArrayInt(d)) => Some(d.items.iter().map(|v| Item::Int(*v)).collect()),
            _ => None,
        },
        _ => None,
    }
}

fn walk_array(
    walk: &mut Walk,
    item: &Item,
    nested: Option<usize>,
    path: &mut Vec<PathSegment>,
    depth: usize,
) -> Result<(), Aborted> {
    let Some(items) = item_as_vec(walk.ctx, item) else {
        return walk.push_error(
            ValidationError::new(ErrorCode::TypeMismatch, "value is not an array or list", path)
                .with_types("ARRAY", type_id_name(item.type_id())),
        );
    };
    let Some(nested_index) = nested else {
        return Ok(());
    };
    for (i, elem) in items.iter().enumerate() {
        path.push(PathSegment::Index(i));
        let outcome = walk_type(walk, elem, nested_index, path, depth + 1);
        path.pop();
        outcome?;
    }
    Ok(())
}

fn as_map_fields<'a>(ctx: &'a EvalContext, item: &Item) -> Option<&'a lambda_core::MapData> {
    match item {
        Item::Map(h) => match ctx.heap.get(*h) {
            Some(HeapObject::Map(d)) => Some(d),
            _ => None,
        },
        Item::Element(h) => match ctx.heap.get(*h) {
            Some(HeapObject::Element(d)) => Some(&d.map),
            _ => None,
        },
        _ => None,
    }
}

fn walk_map(
    walk: &mut Walk,
    item: &Item,
    ty: &lambda_core::TypeMap,
    path: &mut Vec<PathSegment>,
    depth: usize,
) -> Result<(), Aborted> {
    let Some(data) = as_map_fields(walk.ctx, item) else {
        return walk.push_error(
            ValidationError::new(ErrorCode::TypeMismatch, "value is not a map", path)
                .with_types("MAP", type_id_name(item.type_id())),
        );
    };
    walk_shape(walk, data, ty, path, depth)
}

fn walk_shape(
    walk: &mut Walk,
    data: &lambda_core::MapData,
    ty: &lambda_core::TypeMap,
    path: &mut Vec<PathSegment>,
    depth: usize,
) -> Result<(), Aborted> {
    for (slot, entry) in ty.shape.iter().enumerate() {
        let Some(name) = &entry.name else {
            // Nested embedded map (mixin): walk its shape under the same path.
            if let Some(Item::Map(nested)) = data.get(slot) {
                if let Some(HeapObject::Map(nested_data)) = walk.ctx.heap.get(*nested) {
                    if let Some(nested_ty) = walk.ctx.type_list.get(entry.type_ref) {
                        if let TypeKind::Map(nested_map) = &nested_ty.kind {
                            walk_shape(walk, nested_data, nested_map, path, depth)?;
                            continue;
                        }
                    }
                    // No declared nested type: walk the raw shape bound to the nested map itself.
                    if let Some(nested_ty) = walk.ctx.type_list.get(nested_data.type_index) {
                        if let TypeKind::Map(nested_map) = &nested_ty.kind {
                            walk_shape(walk, nested_data, nested_map, path, depth)?;
                        }
                    }
                }
            }
            continue;
        };
        let is_optional = matches!(
            walk.ctx.type_list.get(entry.type_ref).map(|t| &t.kind),
            Some(TypeKind::Unary(u)) if u.op.allows_zero()
        );
        path.push(PathSegment::Field(name.clone()));
        match data.get(slot) {
            None => {
                if !is_optional {
                    walk.push_error(ValidationError::new(
                        ErrorCode::MissingField,
                        format!("required field '{name}' is missing"),
                        path,
                    ))?;
                }
            }
            Some(value) if value.is_null() => {
                if !is_optional {
                    walk.push_error(ValidationError::new(
                        ErrorCode::NullValue,
                        format!("field '{name}' is null but is not optional"),
                        path,
                    ))?;
                }
            }
            Some(value) => {
                walk_type(walk, value, entry.type_ref, path, depth + 1)?;
            }
        }
        path.pop();
    }
    walk_unexpected_fields(walk, data, ty, path);
    Ok(())
}

/// Supplemental (spec §4.5 note): fields present on the value but absent
/// from the shape are reported as non-failing warnings, never errors.
fn walk_unexpected_fields(
    walk: &mut Walk,
    data: &lambda_core::MapData,
    ty: &lambda_core::TypeMap,
    path: &[PathSegment],
) {
    if data.fields.len() <= ty.shape.len() {
        return;
    }
    for slot in ty.shape.len()..data.fields.len() {
        if data.fields[slot].is_some() {
            let mut field_path = path.to_vec();
            field_path.push(PathSegment::Field(format!("<slot {slot}>")));
            walk.warnings.push(ValidationError::new(
                ErrorCode::UnexpectedField,
                "value has a field with no matching shape entry",
                &field_path,
            ));
        }
    }
}

fn walk_elmt(
    walk: &mut Walk,
    item: &Item,
    ty: &lambda_core::TypeElmt,
    path: &mut Vec<PathSegment>,
    depth: usize,
) -> Result<(), Aborted> {
    let Item::Element(h) = item else {
        return walk.push_error(
            ValidationError::new(ErrorCode::TypeMismatch, "value is not an element", path)
                .with_types("ELEMENT", type_id_name(item.type_id())),
        );
    };
    let Some(HeapObject::Element(data)) = walk.ctx.heap.get(*h) else {
        return walk.push_error(ValidationError::new(ErrorCode::ReferenceError, "dangling element handle", path));
    };

    if let Some(expected_tag) = &ty.name {
        if expected_tag.as_str() != data.tag.as_ref() {
            path.push(PathSegment::ElementTag);
            walk.push_error(
                ValidationError::new(ErrorCode::TypeMismatch, "element tag does not match", path)
                    .with_types(expected_tag.clone(), data.tag.to_string()),
            )?;
            path.pop();
        }
    }

    walk_shape(walk, &data.map, &ty.map, path, depth)?;

    if let Some(expected_len) = ty.content_length {
        if expected_len > 0 && data.children.len() != expected_len {
            walk.push_error(ValidationError::new(
                ErrorCode::ConstraintViolation,
                format!("element expects {expected_len} children, found {}", data.children.len()),
                path,
            ))?;
        }
    }
    Ok(())
}

/// Tries each arm in declaration order; on all-fail, picks the arm with the
/// fewest errors as the closest match (spec §4.5 "Union").
fn walk_union(
    walk: &mut Walk,
    item: &Item,
    arms: &[usize],
    path: &mut Vec<PathSegment>,
    depth: usize,
) -> Result<(), Aborted> {
    let mut attempts: Vec<(usize, Vec<ValidationError>)> = Vec::with_capacity(arms.len());
    for (i, &arm_index) in arms.iter().enumerate() {
        let mut sub = Walk {
            ctx: walk.ctx,
            limits: walk.limits,
            started: walk.started,
            errors: Vec::new(),
            warnings: Vec::new(),
            visited_nodes: walk.visited_nodes.clone(),
            counts: ValidationCounts::default(),
        };
        let mut sub_path = vec![PathSegment::UnionIndex(i)];
        let outcome = walk_type(&mut sub, item, arm_index, &mut sub_path, depth + 1);
        walk.counts.nodes_visited += sub.counts.nodes_visited;
        walk.counts.max_depth_reached = walk.counts.max_depth_reached.max(sub.counts.max_depth_reached);
        if let Err(aborted) = outcome {
            return Err(aborted);
        }
        if sub.errors.is_empty() {
            walk.warnings.extend(sub.warnings);
            return Ok(());
        }
        attempts.push((i, sub.errors));
    }

    let (closest_index, closest_errors) = attempts
        .into_iter()
        .min_by_key(|(_, errors)| errors.len())
        .expect("union must have at least one arm");
    let error_count = closest_errors.len();
    for mut err in closest_errors {
        let mut full_path = path.clone();
        full_path.append(&mut err.path);
        err.path = full_path;
        walk.push_error(err)?;
    }
    walk.push_error(ValidationError::new(
        ErrorCode::TypeMismatch,
        format!("no union arm matched; closest is arm {closest_index} with {error_count} error(s)"),
        path,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::{array_fill, map_new, map_put};
    use lambda_core::{Type, TypeArray, TypeMap, TypeUnion};

    fn register_primitive(ctx: &mut EvalContext, id: TypeId) -> usize {
        ctx.type_list.register(Type::primitive(id), None)
    }

    fn register_optional(ctx: &mut EvalContext, operand: usize) -> usize {
        ctx.type_list.register(
            Type {
                type_id: TypeId::Any,
                is_literal: false,
                kind: TypeKind::Unary(lambda_core::TypeUnary {
                    op: Occurrence::Optional,
                    operand,
                }),
            },
            None,
        )
    }

    fn register_simple_map(ctx: &mut EvalContext, fields: &[(&str, usize)]) -> usize {
        let mut map = TypeMap::new();
        for (name, type_ref) in fields {
            map.append_field(Some((*name).to_string()), *type_ref, 1);
        }
        ctx.type_list.register(
            Type {
                type_id: TypeId::Map,
                is_literal: false,
                kind: TypeKind::Map(map),
            },
            None,
        )
    }

    #[test]
    fn json_like_map_validates() {
        let mut ctx = EvalContext::new();
        let int_ty = register_primitive(&mut ctx, TypeId::Int);
        let map_ty = register_simple_map(&mut ctx, &[("x", int_ty), ("y", int_ty)]);

        let map = map_new(&mut ctx, map_ty);
        map_put(&mut ctx, map, "x", Item::Int(1));
        map_put(&mut ctx, map, "y", Item::Int(2));

        let result = validate_against_index(&ctx, &Item::Map(map), map_ty, Limits::default());
        assert!(result.valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn missing_required_field_reports_missing_field_at_dotted_path() {
        let mut ctx = EvalContext::new();
        let int_ty = register_primitive(&mut ctx, TypeId::Int);
        let map_ty = register_simple_map(&mut ctx, &[("x", int_ty), ("y", int_ty)]);

        let map = map_new(&mut ctx, map_ty);
        map_put(&mut ctx, map, "x", Item::Int(1));

        let result = validate_against_index(&ctx, &Item::Map(map), map_ty, Limits::default());
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].code, ErrorCode::MissingField);
        assert_eq!(path_string(&result.errors[0].path), ".y");
    }

    #[test]
    fn optional_field_left_null_passes() {
        let mut ctx = EvalContext::new();
        let int_ty = register_primitive(&mut ctx, TypeId::Int);
        let opt_ty = register_optional(&mut ctx, int_ty);
        let map_ty = register_simple_map(&mut ctx, &[("x", int_ty), ("y", opt_ty)]);

        let map = map_new(&mut ctx, map_ty);
        map_put(&mut ctx, map, "x", Item::Int(1));
        map_put(&mut ctx, map, "y", Item::Null);

        let result = validate_against_index(&ctx, &Item::Map(map), map_ty, Limits::default());
        assert!(result.valid, "{:?}", result.errors);
    }

    #[test]
    fn union_closest_match_reports_the_nearer_arm() {
        let mut ctx = EvalContext::new();
        let int_ty = register_primitive(&mut ctx, TypeId::Int);
        let string_ty = register_primitive(&mut ctx, TypeId::String);
        let map_ty = register_simple_map(&mut ctx, &[("k", string_ty)]);
        let union_ty = ctx.type_list.register(
            Type {
                type_id: TypeId::Any,
                is_literal: false,
                kind: TypeKind::Union(TypeUnion {
                    arms: vec![int_ty, map_ty],
                }),
            },
            None,
        );

        let map = map_new(&mut ctx, map_ty);
        map_put(&mut ctx, map, "k", Item::Int(5));

        let result = validate_against_index(&ctx, &Item::Map(map), union_ty, Limits::default());
        assert!(!result.valid);
        let summary = result
            .errors
            .iter()
            .find(|e| e.message.contains("closest is arm 1"))
            .expect("summary error naming arm 1");
        assert_eq!(summary.code, ErrorCode::TypeMismatch);
        let per_arm_errors = result.errors.len() - 1;
        assert_eq!(per_arm_errors, 1);
    }

    #[test]
    fn array_of_ints_validates_each_element() {
        let mut ctx = EvalContext::new();
        let int_ty = register_primitive(&mut ctx, TypeId::Int);
        let array_ty = ctx.type_list.register(
            Type {
                type_id: TypeId::Array,
                is_literal: false,
                kind: TypeKind::Array(TypeArray {
                    nested: Some(int_ty),
                    length: None,
                }),
            },
            None,
        );
        let arr = array_fill(&mut ctx, vec![Item::Int(1), Item::Int(2), Item::Int(3)]);
        let result = validate_against_index(&ctx, &Item::Array(arr), array_ty, Limits::default());
        assert!(result.valid);
    }

    #[test]
    fn array_element_mismatch_reports_index_path() {
        let mut ctx = EvalContext::new();
        let int_ty = register_primitive(&mut ctx, TypeId::Int);
        let array_ty = ctx.type_list.register(
            Type {
                type_id: TypeId::Array,
                is_literal: false,
                kind: TypeKind::Array(TypeArray {
                    nested: Some(int_ty),
                    length: None,
                }),
            },
            None,
        );
        let arr = array_fill(&mut ctx, vec![Item::Int(1), Item::Bool(true)]);
        let result = validate_against_index(&ctx, &Item::Array(arr), array_ty, Limits::default());
        assert!(!result.valid);
        assert_eq!(path_string(&result.errors[0].path), "[1]");
    }

    #[test]
    fn max_depth_zero_aborts_immediately_on_nested_map() {
        let mut ctx = EvalContext::new();
        let int_ty = register_primitive(&mut ctx, TypeId::Int);
        let map_ty = register_simple_map(&mut ctx, &[("x", int_ty)]);
        let map = map_new(&mut ctx, map_ty);
        map_put(&mut ctx, map, "x", Item::Int(1));

        let limits = Limits {
            max_depth: 0,
            ..Limits::default()
        };
        let result = validate_against_index(&ctx, &Item::Map(map), map_ty, limits);
        assert!(!result.valid);
        assert!(result.errors.iter().any(|e| e.code == ErrorCode::ConstraintViolation));
    }

    #[test]
    fn unexpected_field_is_a_warning_not_an_error() {
        let mut ctx = EvalContext::new();
        let int_ty = register_primitive(&mut ctx, TypeId::Int);
        let map_ty = register_simple_map(&mut ctx, &[("x", int_ty)]);
        let map = map_new(&mut ctx, map_ty);
        map_put(&mut ctx, map, "x", Item::Int(1));
        // Write straight into a field slot the shape never declared.
        if let Some(HeapObject::Map(data)) = ctx.heap.get_mut(map) {
            data.set(5, Item::Int(99));
        }

        let result = validate_against_index(&ctx, &Item::Map(map), map_ty, Limits::default());
        assert!(result.valid);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].code, ErrorCode::UnexpectedField);
    }
}
