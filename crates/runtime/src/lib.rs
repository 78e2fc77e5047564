//! Lambda Runtime: containers, arithmetic, and the structural validator
//! built on top of `lambda-core`'s tagged value and arena/heap/frame
//! primitives.
//!
//! - `containers`: list/array/range/map/element builder and accessor API
//!   (spec §4.4.1, §4.4.2).
//! - `arithmetic`: coercion-ladder arithmetic, vectorised array ops,
//!   aggregates, casts (spec §4.4.3).
//! - `validator`: structural validation against a registered `Type` (spec
//!   §4.5).
//! - `format`: document format recognition for the CLI's `auto` mode.

pub mod arithmetic;
pub mod containers;
pub mod format;
pub mod validator;

pub use arithmetic::{
    fn_add, fn_avg, fn_binary, fn_decimal, fn_div, fn_float, fn_idiv, fn_int, fn_int64, fn_max1,
    fn_min1, fn_mod, fn_mul, fn_neg, fn_pos, fn_pow, fn_sub, fn_sum, fn_symbol,
};
pub use containers::{
    array_end, array_fill, array_float_fill, array_float_get, array_float_new, array_get,
    array_int64_fill, array_int64_get, array_int64_new, array_int_fill, array_int_get,
    array_int_new, array_int_set, array_new, array_push, array_push_spread, array_spreadable,
    elmt_get, elmt_keys, elmt_new, elmt_push_child, elmt_put, elmt_tag, item_at, item_attr,
    item_keys, list_end, list_fill, list_get, list_new, list_push, map_get, map_keys, map_new,
    map_put, range_new,
};
pub use format::Format;
pub use validator::{
    path_string, validate, validate_against_index, ErrorCode, Limits, PathSegment,
    ValidationCounts, ValidationError, ValidationResult,
};
