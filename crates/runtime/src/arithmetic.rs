//! Arithmetic, coercion, and casts (spec §4.4.3).
//!
//! There is no compile-time type checker in front of this runtime —
//! operand kinds are resolved at the call per spec §4.4.3 — so every
//! function here takes `&Item` operands directly and returns the
//! propagating `Item::Error` sentinel on any unsupported combination
//! instead of panicking, matching spec §7's propagation policy.

use lambda_core::{
    DecimalCtx, EvalContext, HeapObject, Item, LambdaDecimal, LambdaString, TypedFloatArray,
    TypedInt64Array, TypedIntArray, INT56_MAX, INT56_MIN,
};
use std::rc::Rc;

fn alloc(ctx: &mut EvalContext, obj: HeapObject) -> lambda_core::HeapHandle {
    ctx.heap.alloc(obj, lambda_core::Ownership::Heap)
}

// ---------------------------------------------------------------------
// Numeric resolution (spec §4.1 coercion ladder)
// ---------------------------------------------------------------------

#[derive(Debug, Clone)]
enum NumVal {
    Int(i64),
    Int64(i64),
    Float(f64),
    Decimal(LambdaDecimal),
}

fn rank(n: &NumVal) -> u8 {
    match n {
        NumVal::Int(_) => 0,
        NumVal::Int64(_) => 1,
        NumVal::Float(_) => 2,
        NumVal::Decimal(_) => 3,
    }
}

fn resolve_num(ctx: &EvalContext, item: &Item) -> Option<NumVal> {
    match item {
        Item::Int(v) => Some(NumVal::Int(*v)),
        Item::Int64(h) => ctx.num_stack.get_i64(*h).map(NumVal::Int64),
        Item::Float(h) => ctx.num_stack.get_f64(*h).map(NumVal::Float),
        Item::Decimal(d) => Some(NumVal::Decimal(d.clone())),
        _ => None,
    }
}

fn as_i64(n: &NumVal) -> Option<i64> {
    match n {
        NumVal::Int(v) | NumVal::Int64(v) => Some(*v),
        _ => None,
    }
}

fn as_f64(n: &NumVal) -> f64 {
    match n {
        NumVal::Int(v) | NumVal::Int64(v) => *v as f64,
        NumVal::Float(v) => *v,
        NumVal::Decimal(d) => d.to_f64().unwrap_or(f64::NAN),
    }
}

fn as_decimal(ctx: &EvalContext, n: &NumVal) -> Option<LambdaDecimal> {
    match n {
        NumVal::Decimal(d) => Some(d.clone()),
        NumVal::Float(v) => LambdaDecimal::from_f64(&ctx.decimal_ctx, *v),
        NumVal::Int(v) | NumVal::Int64(v) => LambdaDecimal::parse(&v.to_string()),
    }
}

/// Boxes `v` as `Item::Int` when it fits the 56-bit range, `Item::Int64`
/// otherwise (used where no second operand's rank forces a wider type —
/// casts and unary ops).
fn box_int_auto(ctx: &mut EvalContext, v: i64) -> Item {
    if (INT56_MIN..=INT56_MAX).contains(&v) {
        Item::Int(v)
    } else {
        Item::Int64(ctx.num_stack.push_l(v))
    }
}

/// Boxes a binary-op integer result at the rank the two operands demanded:
/// rank 0 (both `Int`) stays `Int` and must still fit `INT56`, rank 1 (one
/// side `Int64`) always becomes `Int64` per spec's "INT/INT64 mixing
/// yields INT64" rule, never silently narrowed back down.
fn box_int_result(ctx: &mut EvalContext, max_rank: u8, v: i64) -> Item {
    if max_rank == 0 {
        if (INT56_MIN..=INT56_MAX).contains(&v) {
            Item::Int(v)
        } else {
            Item::Error
        }
    } else {
        Item::Int64(ctx.num_stack.push_l(v))
    }
}

fn box_float(ctx: &mut EvalContext, v: f64) -> Item {
    Item::Float(ctx.num_stack.push_d(v))
}

enum ParsedNum {
    Int(i64),
    Float(f64),
}

/// Unary `+`/`-` on strings/symbols: parse as int first, then double
/// (spec §4.4.3).
fn parse_number_str(s: &str) -> Option<ParsedNum> {
    let t = s.trim();
    if let Ok(v) = t.parse::<i64>() {
        return Some(ParsedNum::Int(v));
    }
    if let Ok(v) = t.parse::<f64>() {
        return Some(ParsedNum::Float(v));
    }
    None
}

// ---------------------------------------------------------------------
// Scalar binary ops
// ---------------------------------------------------------------------

/// Shared shape for `+`, `-`, `*`: resolve both operands, promote to the
/// higher rank, dispatch to the matching checked op.
fn scalar_op(
    ctx: &mut EvalContext,
    a: &Item,
    b: &Item,
    int_op: impl Fn(i64, i64) -> Option<i64>,
    float_op: impl Fn(f64, f64) -> f64,
    decimal_op: impl Fn(&LambdaDecimal, &LambdaDecimal, &DecimalCtx) -> Option<LambdaDecimal>,
) -> Item {
    let (Some(na), Some(nb)) = (resolve_num(ctx, a), resolve_num(ctx, b)) else {
        return Item::Error;
    };
    let max_rank = rank(&na).max(rank(&nb));
    match max_rank {
        0 | 1 => {
            let (Some(x), Some(y)) = (as_i64(&na), as_i64(&nb)) else {
                return Item::Error;
            };
            match int_op(x, y) {
                Some(v) => box_int_result(ctx, max_rank, v),
                None => Item::Error,
            }
        }
        2 => {
            let v = float_op(as_f64(&na), as_f64(&nb));
            if v.is_finite() {
                box_float(ctx, v)
            } else {
                Item::Error
            }
        }
        _ => {
            let (Some(da), Some(db)) = (as_decimal(ctx, &na), as_decimal(ctx, &nb)) else {
                return Item::Error;
            };
            match decimal_op(&da, &db, &ctx.decimal_ctx) {
                Some(d) => Item::Decimal(d),
                None => Item::Error,
            }
        }
    }
}

// ---------------------------------------------------------------------
// Vectorised typed-array ops (spec §4.4.3 "Vectorised array ops")
// ---------------------------------------------------------------------

enum TypedArr {
    Int(Vec<i64>),
    Int64(Vec<i64>),
    Float(Vec<f64>),
}

fn typed_arr(ctx: &EvalContext, item: &Item) -> Option<TypedArr> {
    match item {
        Item::ArrayInt(h) => match ctx.heap.get(*h) {
            Some(HeapObject::ArrayInt(d)) => Some(TypedArr::Int(d.items.clone())),
            _ => None,
        },
        Item::ArrayInt64(h) => match ctx.heap.get(*h) {
            Some(HeapObject::ArrayInt64(d)) => Some(TypedArr::Int64(d.items.clone())),
            _ => None,
        },
        Item::ArrayFloat(h) => match ctx.heap.get(*h) {
            Some(HeapObject::ArrayFloat(d)) => Some(TypedArr::Float(d.items.clone())),
            _ => None,
        },
        _ => None,
    }
}

/// `Some(result)` if both operands are typed arrays (vectorised path
/// taken, possibly `Item::Error` on a length/kind mismatch); `None` if
/// neither/only one operand is a typed array, meaning the caller should
/// fall through to the scalar path.
fn vector_op(
    ctx: &mut EvalContext,
    a: &Item,
    b: &Item,
    allow_float: bool,
    int_promotes_to_float: bool,
    int_op: impl Fn(i64, i64) -> Option<i64>,
    float_op: impl Fn(f64, f64) -> Option<f64>,
) -> Option<Item> {
    let ta = typed_arr(ctx, a)?;
    let tb = typed_arr(ctx, b)?;
    use TypedArr::*;
    let result = match (ta, tb) {
        (Int(xs), Int(ys)) => {
            if xs.len() != ys.len() {
                Item::Error
            } else if int_promotes_to_float {
                vector_elementwise_float(ctx, &as_f64_vec(&xs), &as_f64_vec(&ys), &float_op)
            } else {
                vector_elementwise_int(ctx, &xs, &ys, &int_op)
            }
        }
        (Int64(xs), Int64(ys)) => {
            if xs.len() != ys.len() {
                Item::Error
            } else if int_promotes_to_float {
                vector_elementwise_float(ctx, &as_f64_vec(&xs), &as_f64_vec(&ys), &float_op)
            } else {
                vector_elementwise_int64(ctx, &xs, &ys, &int_op)
            }
        }
        (Float(xs), Float(ys)) => {
            if !allow_float {
                Item::Error
            } else if xs.len() != ys.len() {
                Item::Error
            } else {
                vector_elementwise_float(ctx, &xs, &ys, &float_op)
            }
        }
        _ => Item::Error,
    };
    Some(result)
}

fn vector_elementwise_int(
    ctx: &mut EvalContext,
    xs: &[i64],
    ys: &[i64],
    op: impl Fn(i64, i64) -> Option<i64>,
) -> Item {
    let mut out = Vec::with_capacity(xs.len());
    for (x, y) in xs.iter().zip(ys.iter()) {
        match op(*x, *y) {
            Some(v) => out.push(v),
            None => return Item::Error,
        }
    }
    Item::ArrayInt(alloc(ctx, HeapObject::ArrayInt(TypedIntArray { items: out })))
}

fn vector_elementwise_int64(
    ctx: &mut EvalContext,
    xs: &[i64],
    ys: &[i64],
    op: impl Fn(i64, i64) -> Option<i64>,
) -> Item {
    let mut out = Vec::with_capacity(xs.len());
    for (x, y) in xs.iter().zip(ys.iter()) {
        match op(*x, *y) {
            Some(v) => out.push(v),
            None => return Item::Error,
        }
    }
    Item::ArrayInt64(alloc(ctx, HeapObject::ArrayInt64(TypedInt64Array { items: out })))
}

fn vector_elementwise_float(
    ctx: &mut EvalContext,
    xs: &[f64],
    ys: &[f64],
    op: impl Fn(f64, f64) -> Option<f64>,
) -> Item {
    let mut out = Vec::with_capacity(xs.len());
    for (x, y) in xs.iter().zip(ys.iter()) {
        match op(*x, *y) {
            Some(v) if v.is_finite() => out.push(v),
            _ => return Item::Error,
        }
    }
    Item::ArrayFloat(alloc(ctx, HeapObject::ArrayFloat(TypedFloatArray { items: out })))
}

fn as_f64_vec(xs: &[i64]) -> Vec<f64> {
    xs.iter().map(|v| *v as f64).collect()
}

// ---------------------------------------------------------------------
// Public arithmetic surface
// ---------------------------------------------------------------------

pub fn fn_add(ctx: &mut EvalContext, a: &Item, b: &Item) -> Item {
    if let Some(v) = vector_op(ctx, a, b, true, false, i64::checked_add, |x, y| Some(x + y)) {
        return v;
    }
    scalar_op(ctx, a, b, i64::checked_add, |x, y| x + y, |da, db, c| da.add(db, c))
}

pub fn fn_sub(ctx: &mut EvalContext, a: &Item, b: &Item) -> Item {
    if let Some(v) = vector_op(ctx, a, b, true, false, i64::checked_sub, |x, y| Some(x - y)) {
        return v;
    }
    scalar_op(ctx, a, b, i64::checked_sub, |x, y| x - y, |da, db, c| da.sub(db, c))
}

pub fn fn_mul(ctx: &mut EvalContext, a: &Item, b: &Item) -> Item {
    if let Some(v) = vector_op(ctx, a, b, true, false, i64::checked_mul, |x, y| Some(x * y)) {
        return v;
    }
    scalar_op(ctx, a, b, i64::checked_mul, |x, y| x * y, |da, db, c| da.mul(db, c))
}

/// Division of integers always promotes to double (spec §4.4.3); only a
/// `DECIMAL`-ranked operand keeps the result decimal.
pub fn fn_div(ctx: &mut EvalContext, a: &Item, b: &Item) -> Item {
    if let Some(v) = vector_op(
        ctx,
        a,
        b,
        true,
        true,
        |x, y| if y == 0 { None } else { Some(x / y) },
        |x, y| if y == 0.0 { None } else { Some(x / y) },
    ) {
        return v;
    }
    let (Some(na), Some(nb)) = (resolve_num(ctx, a), resolve_num(ctx, b)) else {
        return Item::Error;
    };
    if rank(&na).max(rank(&nb)) == 3 {
        let (Some(da), Some(db)) = (as_decimal(ctx, &na), as_decimal(ctx, &nb)) else {
            return Item::Error;
        };
        return match da.div(&db, &ctx.decimal_ctx) {
            Some(d) => Item::Decimal(d),
            None => Item::Error,
        };
    }
    let x = as_f64(&na);
    let y = as_f64(&nb);
    if y == 0.0 {
        return Item::Error;
    }
    let v = x / y;
    if v.is_finite() {
        box_float(ctx, v)
    } else {
        Item::Error
    }
}

/// Integer-only division, zero divisor rejected (spec §4.4.3 `idiv`).
pub fn fn_idiv(ctx: &mut EvalContext, a: &Item, b: &Item) -> Item {
    if let Some(v) = vector_op(
        ctx,
        a,
        b,
        false,
        false,
        |x, y| if y == 0 { None } else { x.checked_div(y) },
        |_, _| None,
    ) {
        return v;
    }
    let (Some(na), Some(nb)) = (resolve_num(ctx, a), resolve_num(ctx, b)) else {
        return Item::Error;
    };
    if matches!(na, NumVal::Float(_) | NumVal::Decimal(_)) || matches!(nb, NumVal::Float(_) | NumVal::Decimal(_)) {
        return Item::Error;
    }
    let (Some(x), Some(y)) = (as_i64(&na), as_i64(&nb)) else {
        return Item::Error;
    };
    if y == 0 {
        return Item::Error;
    }
    match x.checked_div(y) {
        Some(v) => box_int_result(ctx, rank(&na).max(rank(&nb)), v),
        None => Item::Error,
    }
}

/// `%` accepts only integer and decimal combinations; float `%` is an
/// error (spec §4.4.3).
pub fn fn_mod(ctx: &mut EvalContext, a: &Item, b: &Item) -> Item {
    if let Some(v) = vector_op(
        ctx,
        a,
        b,
        false,
        false,
        |x, y| if y == 0 { None } else { x.checked_rem(y) },
        |_, _| None,
    ) {
        return v;
    }
    let (Some(na), Some(nb)) = (resolve_num(ctx, a), resolve_num(ctx, b)) else {
        return Item::Error;
    };
    if matches!(na, NumVal::Float(_)) || matches!(nb, NumVal::Float(_)) {
        return Item::Error;
    }
    let max_rank = rank(&na).max(rank(&nb));
    if max_rank == 3 {
        let (Some(da), Some(db)) = (as_decimal(ctx, &na), as_decimal(ctx, &nb)) else {
            return Item::Error;
        };
        if db.inner().is_zero() {
            return Item::Error;
        }
        return Item::Decimal(LambdaDecimal::new(da.inner() % db.inner()));
    }
    let (Some(x), Some(y)) = (as_i64(&na), as_i64(&nb)) else {
        return Item::Error;
    };
    if y == 0 {
        return Item::Error;
    }
    match x.checked_rem(y) {
        Some(v) => box_int_result(ctx, max_rank, v),
        None => Item::Error,
    }
}

/// `pow` converts both operands to `double`, evaluates with `powf`, and —
/// if either side was decimal — reparses the formatted double back into a
/// decimal (spec §4.4.3: "exactness is not promised, but the type is
/// preserved").
pub fn fn_pow(ctx: &mut EvalContext, a: &Item, b: &Item) -> Item {
    if let Some(v) = vector_op(
        ctx,
        a,
        b,
        true,
        true,
        |_, _| None,
        |x, y| {
            let v = x.powf(y);
            if v.is_finite() {
                Some(v)
            } else {
                None
            }
        },
    ) {
        return v;
    }
    let (Some(na), Some(nb)) = (resolve_num(ctx, a), resolve_num(ctx, b)) else {
        return Item::Error;
    };
    let result = as_f64(&na).powf(as_f64(&nb));
    if !result.is_finite() {
        return Item::Error;
    }
    if matches!(na, NumVal::Decimal(_)) || matches!(nb, NumVal::Decimal(_)) {
        match LambdaDecimal::from_f64(&ctx.decimal_ctx, result) {
            Some(d) => Item::Decimal(d),
            None => Item::Error,
        }
    } else {
        box_float(ctx, result)
    }
}

pub fn fn_neg(ctx: &mut EvalContext, item: &Item) -> Item {
    if let Some(n) = resolve_num(ctx, item) {
        return match n {
            NumVal::Int(v) => match v.checked_neg() {
                Some(r) if (INT56_MIN..=INT56_MAX).contains(&r) => Item::Int(r),
                _ => Item::Error,
            },
            NumVal::Int64(v) => match v.checked_neg() {
                Some(r) => Item::Int64(ctx.num_stack.push_l(r)),
                None => Item::Error,
            },
            NumVal::Float(v) => box_float(ctx, -v),
            NumVal::Decimal(d) => Item::Decimal(LambdaDecimal::new(-d.inner())),
        };
    }
    match item {
        Item::String(s) | Item::Symbol(s) => match parse_number_str(s.as_str()) {
            Some(ParsedNum::Int(v)) => match v.checked_neg() {
                Some(r) => box_int_auto(ctx, r),
                None => Item::Error,
            },
            Some(ParsedNum::Float(v)) => box_float(ctx, -v),
            None => Item::Error,
        },
        _ => Item::Error,
    }
}

pub fn fn_pos(ctx: &mut EvalContext, item: &Item) -> Item {
    if resolve_num(ctx, item).is_some() {
        return item.clone();
    }
    match item {
        Item::String(s) | Item::Symbol(s) => match parse_number_str(s.as_str()) {
            Some(ParsedNum::Int(v)) => box_int_auto(ctx, v),
            Some(ParsedNum::Float(v)) => box_float(ctx, v),
            None => Item::Error,
        },
        _ => Item::Error,
    }
}

// ---------------------------------------------------------------------
// Casts (spec §4.4.3)
// ---------------------------------------------------------------------

fn int_from_float(ctx: &mut EvalContext, v: f64) -> Item {
    if v.is_finite() && v.fract() == 0.0 && (i64::MIN as f64..=i64::MAX as f64).contains(&v) {
        box_int_auto(ctx, v as i64)
    } else {
        // Can't be expressed without losing precision; keep the wider
        // type rather than silently truncating (spec §4.4.3).
        box_float(ctx, v)
    }
}

pub fn fn_int(ctx: &mut EvalContext, item: &Item) -> Item {
    match item {
        Item::Int(_) => item.clone(),
        Item::Int64(h) => {
            let v = ctx.num_stack.get_i64(*h).unwrap_or(0);
            box_int_auto(ctx, v)
        }
        Item::Float(h) => {
            let v = ctx.num_stack.get_f64(*h).unwrap_or(f64::NAN);
            int_from_float(ctx, v)
        }
        Item::Decimal(d) => match d.to_f64() {
            Some(v) => int_from_float(ctx, v),
            None => Item::Error,
        },
        Item::Bool(b) => Item::Int(i64::from(*b)),
        Item::String(s) | Item::Symbol(s) => match parse_number_str(s.as_str()) {
            Some(ParsedNum::Int(v)) => box_int_auto(ctx, v),
            Some(ParsedNum::Float(v)) => int_from_float(ctx, v),
            None => Item::Error,
        },
        _ => Item::Error,
    }
}

pub fn fn_int64(ctx: &mut EvalContext, item: &Item) -> Item {
    let v = match item {
        Item::Int(v) => *v,
        Item::Int64(h) => ctx.num_stack.get_i64(*h).unwrap_or(0),
        Item::Float(h) => {
            let f = ctx.num_stack.get_f64(*h).unwrap_or(f64::NAN);
            if f.is_finite() && f.fract() == 0.0 && (i64::MIN as f64..=i64::MAX as f64).contains(&f) {
                f as i64
            } else {
                return box_float(ctx, f);
            }
        }
        Item::Decimal(d) => match d.to_f64() {
            Some(f) if f.is_finite() && f.fract() == 0.0 => f as i64,
            _ => return item.clone(),
        },
        Item::Bool(b) => i64::from(*b),
        Item::String(s) | Item::Symbol(s) => match parse_number_str(s.as_str()) {
            Some(ParsedNum::Int(v)) => v,
            Some(ParsedNum::Float(f)) if f.fract() == 0.0 => f as i64,
            _ => return Item::Error,
        },
        _ => return Item::Error,
    };
    Item::Int64(ctx.num_stack.push_l(v))
}

pub fn fn_float(ctx: &mut EvalContext, item: &Item) -> Item {
    let v = match item {
        Item::Int(v) => *v as f64,
        Item::Int64(h) => ctx.num_stack.get_i64(*h).unwrap_or(0) as f64,
        Item::Float(_) => return item.clone(),
        Item::Decimal(d) => match d.to_f64() {
            Some(v) => v,
            None => return Item::Error,
        },
        Item::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Item::String(s) | Item::Symbol(s) => match s.as_str().trim().parse::<f64>() {
            Ok(v) => v,
            Err(_) => return Item::Error,
        },
        _ => return Item::Error,
    };
    box_float(ctx, v)
}

pub fn fn_decimal(ctx: &mut EvalContext, item: &Item) -> Item {
    match item {
        Item::Decimal(_) => item.clone(),
        Item::Int(v) => LambdaDecimal::parse(&v.to_string()).map(Item::Decimal).unwrap_or(Item::Error),
        Item::Int64(h) => match ctx.num_stack.get_i64(*h) {
            Some(v) => LambdaDecimal::parse(&v.to_string()).map(Item::Decimal).unwrap_or(Item::Error),
            None => Item::Error,
        },
        Item::Float(h) => match ctx.num_stack.get_f64(*h) {
            Some(v) => LambdaDecimal::from_f64(&ctx.decimal_ctx, v)
                .map(Item::Decimal)
                .unwrap_or(Item::Error),
            None => Item::Error,
        },
        Item::String(s) | Item::Symbol(s) => LambdaDecimal::parse(s.as_str().trim())
            .map(Item::Decimal)
            .unwrap_or(Item::Error),
        Item::Bool(b) => LambdaDecimal::parse(if *b { "1" } else { "0" })
            .map(Item::Decimal)
            .unwrap_or(Item::Error),
        _ => Item::Error,
    }
}

pub fn fn_symbol(ctx: &mut EvalContext, item: &Item) -> Item {
    match item {
        Item::Symbol(_) => item.clone(),
        Item::String(s) => Item::Symbol(LambdaString::pooled(ctx.names.intern(s.as_str()))),
        _ => Item::Error,
    }
}

pub fn fn_binary(_ctx: &mut EvalContext, item: &Item) -> Item {
    match item {
        Item::Binary(_) => item.clone(),
        Item::String(s) | Item::Symbol(s) => Item::Binary(Rc::from(s.as_str().as_bytes())),
        _ => Item::Error,
    }
}

// ---------------------------------------------------------------------
// Aggregates (spec §4.4.3): scalar input returns itself; empty aggregates
// are `ERROR` for avg/min/max, `0` for sum.
// ---------------------------------------------------------------------

fn collect_items(ctx: &mut EvalContext, item: &Item) -> Option<Vec<Item>> {
    match item {
        Item::Array(h) => match ctx.heap.get(*h) {
            Some(HeapObject::Array(d)) => Some(d.items.clone()),
            _ => None,
        },
        Item::List(h) => match ctx.heap.get(*h) {
            Some(HeapObject::List(d)) => Some(d.items.clone()),
            _ => None,
        },
        Item::ArrayInt(h) => match ctx.heap.get(*h) {
            Some(HeapObject::ArrayInt(d)) => Some(d.items.clone()),
            _ => None,
        }
        .map(|items| items.into_iter().map(Item::Int).collect()),
        Item::ArrayInt64(h) => {
            let items = match ctx.heap.get(*h) {
                Some(HeapObject::ArrayInt64(d)) => d.items.clone(),
                _ => return None,
            };
            Some(items.into_iter().map(|v| Item::Int64(ctx.num_stack.push_l(v))).collect())
        }
        Item::ArrayFloat(h) => {
            let items = match ctx.heap.get(*h) {
                Some(HeapObject::ArrayFloat(d)) => d.items.clone(),
                _ => return None,
            };
            Some(items.into_iter().map(|v| Item::Float(ctx.num_stack.push_d(v))).collect())
        }
        _ => None,
    }
}

pub fn fn_sum(ctx: &mut EvalContext, item: &Item) -> Item {
    if resolve_num(ctx, item).is_some() {
        return item.clone();
    }
    let Some(items) = collect_items(ctx, item) else {
        return Item::Error;
    };
    if items.is_empty() {
        return Item::Int(0);
    }
    let mut acc = Item::Int(0);
    for it in &items {
        acc = fn_add(ctx, &acc, it);
        if acc.is_error() {
            return Item::Error;
        }
    }
    acc
}

pub fn fn_avg(ctx: &mut EvalContext, item: &Item) -> Item {
    if resolve_num(ctx, item).is_some() {
        return item.clone();
    }
    let Some(items) = collect_items(ctx, item) else {
        return Item::Error;
    };
    if items.is_empty() {
        return Item::Error;
    }
    let count = items.len() as i64;
    let mut acc = Item::Int(0);
    for it in &items {
        acc = fn_add(ctx, &acc, it);
        if acc.is_error() {
            return Item::Error;
        }
    }
    fn_div(ctx, &acc, &Item::Int(count))
}

fn aggregate_extreme(ctx: &mut EvalContext, item: &Item, want_min: bool) -> Item {
    if resolve_num(ctx, item).is_some() {
        return item.clone();
    }
    let Some(items) = collect_items(ctx, item) else {
        return Item::Error;
    };
    if items.is_empty() {
        return Item::Error;
    }
    let mut best = items[0].clone();
    for it in &items[1..] {
        let (Some(nb), Some(nbest)) = (resolve_num(ctx, it), resolve_num(ctx, &best)) else {
            return Item::Error;
        };
        let take = if want_min {
            as_f64(&nb) < as_f64(&nbest)
        } else {
            as_f64(&nb) > as_f64(&nbest)
        };
        if take {
            best = it.clone();
        }
    }
    best
}

pub fn fn_min1(ctx: &mut EvalContext, item: &Item) -> Item {
    aggregate_extreme(ctx, item, true)
}

pub fn fn_max1(ctx: &mut EvalContext, item: &Item) -> Item {
    aggregate_extreme(ctx, item, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::containers::{array_fill, array_int_fill};

    #[test]
    fn int_overflow_at_int56_max_is_error() {
        let mut ctx = EvalContext::new();
        let a = Item::Int(INT56_MAX);
        let b = Item::Int(1);
        assert_eq!(fn_add(&mut ctx, &a, &b), Item::Error);
    }

    #[test]
    fn int_plus_int_stays_inline() {
        let mut ctx = EvalContext::new();
        assert_eq!(fn_add(&mut ctx, &Item::Int(2), &Item::Int(3)), Item::Int(5));
    }

    #[test]
    fn int_int64_mix_yields_int64() {
        let mut ctx = EvalContext::new();
        let big = Item::Int64(ctx.num_stack.push_l(10));
        let result = fn_add(&mut ctx, &Item::Int(1), &big);
        assert!(matches!(result, Item::Int64(_)));
    }

    #[test]
    fn integer_division_promotes_to_double() {
        let mut ctx = EvalContext::new();
        let result = fn_div(&mut ctx, &Item::Int(7), &Item::Int(2));
        match result {
            Item::Float(h) => assert_eq!(ctx.num_stack.get_f64(h), Some(3.5)),
            other => panic!("expected Float, got {other:?}"),
        }
    }

    #[test]
    fn div_by_zero_is_error_for_every_numeric_kind() {
        let mut ctx = EvalContext::new();
        assert_eq!(fn_div(&mut ctx, &Item::Int(1), &Item::Int(0)), Item::Error);
        assert_eq!(fn_idiv(&mut ctx, &Item::Int(1), &Item::Int(0)), Item::Error);
        assert_eq!(fn_mod(&mut ctx, &Item::Int(1), &Item::Int(0)), Item::Error);
    }

    #[test]
    fn idiv_is_integer_only() {
        let mut ctx = EvalContext::new();
        assert_eq!(fn_idiv(&mut ctx, &Item::Int(7), &Item::Int(2)), Item::Int(3));
        let f = Item::Float(ctx.num_stack.push_d(2.0));
        assert_eq!(fn_idiv(&mut ctx, &Item::Int(7), &f), Item::Error);
    }

    #[test]
    fn float_modulo_is_an_error() {
        let mut ctx = EvalContext::new();
        let f1 = Item::Float(ctx.num_stack.push_d(5.0));
        let f2 = Item::Float(ctx.num_stack.push_d(2.0));
        assert_eq!(fn_mod(&mut ctx, &f1, &f2), Item::Error);
    }

    #[test]
    fn vector_op_on_unequal_length_is_error() {
        let mut ctx = EvalContext::new();
        let a = array_int_fill(&mut ctx, vec![1, 2, 3]);
        let b = array_int_fill(&mut ctx, vec![1, 2]);
        let result = fn_add(&mut ctx, &Item::ArrayInt(a), &Item::ArrayInt(b));
        assert_eq!(result, Item::Error);
    }

    #[test]
    fn vector_add_applies_elementwise() {
        let mut ctx = EvalContext::new();
        let a = array_int_fill(&mut ctx, vec![1, 2, 3]);
        let b = array_int_fill(&mut ctx, vec![10, 20, 30]);
        let result = fn_add(&mut ctx, &Item::ArrayInt(a), &Item::ArrayInt(b));
        match result {
            Item::ArrayInt(rh) => {
                assert_eq!(crate::containers::array_int_get(&ctx, rh, 0), Some(11));
                assert_eq!(crate::containers::array_int_get(&ctx, rh, 2), Some(33));
            }
            other => panic!("expected ArrayInt, got {other:?}"),
        }
    }

    #[test]
    fn vector_division_of_int_arrays_yields_float_array() {
        let mut ctx = EvalContext::new();
        let a = array_int_fill(&mut ctx, vec![7, 9]);
        let b = array_int_fill(&mut ctx, vec![2, 2]);
        let result = fn_div(&mut ctx, &Item::ArrayInt(a), &Item::ArrayInt(b));
        assert!(matches!(result, Item::ArrayFloat(_)));
    }

    #[test]
    fn pow_scalar_raises_to_the_power() {
        let mut ctx = EvalContext::new();
        let result = fn_pow(&mut ctx, &Item::Int(2), &Item::Int(10));
        match result {
            Item::Float(h) => assert_eq!(ctx.num_stack.get_f64(h), Some(1024.0)),
            other => panic!("expected Float, got {other:?}"),
        }
    }

    #[test]
    fn pow_vector_raises_elementwise() {
        let mut ctx = EvalContext::new();
        let base = array_int_fill(&mut ctx, vec![2, 3]);
        let exp = array_int_fill(&mut ctx, vec![3, 2]);
        let result = fn_pow(&mut ctx, &Item::ArrayInt(base), &Item::ArrayInt(exp));
        match result {
            Item::ArrayFloat(h) => {
                assert_eq!(crate::containers::array_float_get(&ctx, h, 0), Some(8.0));
                assert_eq!(crate::containers::array_float_get(&ctx, h, 1), Some(9.0));
            }
            other => panic!("expected ArrayFloat, got {other:?}"),
        }
    }

    #[test]
    fn aggregate_sum_over_list() {
        let mut ctx = EvalContext::new();
        let arr = array_fill(&mut ctx, vec![Item::Int(1), Item::Int(2), Item::Int(3)]);
        let sum = fn_sum(&mut ctx, &Item::Array(arr));
        assert_eq!(sum, Item::Int(6));
    }

    #[test]
    fn aggregate_sum_empty_is_zero_avg_is_error() {
        let mut ctx = EvalContext::new();
        let arr = array_fill(&mut ctx, vec![]);
        assert_eq!(fn_sum(&mut ctx, &Item::Array(arr)), Item::Int(0));
        assert_eq!(fn_avg(&mut ctx, &Item::Array(arr)), Item::Error);
        assert_eq!(fn_min1(&mut ctx, &Item::Array(arr)), Item::Error);
    }

    #[test]
    fn aggregate_scalar_input_returns_itself() {
        let mut ctx = EvalContext::new();
        assert_eq!(fn_sum(&mut ctx, &Item::Int(9)), Item::Int(9));
        assert_eq!(fn_max1(&mut ctx, &Item::Int(9)), Item::Int(9));
    }

    #[test]
    fn unary_minus_parses_strings_then_errors_on_garbage() {
        let mut ctx = EvalContext::new();
        let s = Item::String(LambdaString::content("42"));
        assert_eq!(fn_neg(&mut ctx, &s), Item::Int(-42));
        let garbage = Item::String(LambdaString::content("nope"));
        assert_eq!(fn_neg(&mut ctx, &garbage), Item::Error);
    }

    #[test]
    fn cast_decimal_float_round_trip_within_precision() {
        let mut ctx = EvalContext::new();
        let d = fn_decimal(&mut ctx, &Item::Float(ctx.num_stack.push_d(2.5)));
        let back = fn_float(&mut ctx, &d);
        match back {
            Item::Float(hh) => assert_eq!(ctx.num_stack.get_f64(hh), Some(2.5)),
            other => panic!("expected Float, got {other:?}"),
        }
    }
}
