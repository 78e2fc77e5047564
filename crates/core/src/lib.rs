//! Lambda Core: tagged value representation, arena/heap/frames, and type
//! descriptors for the value runtime.
//!
//! This crate provides the three leaf components the rest of the runtime
//! builds on:
//!
//! - `item`: the tagged `Item` value and its `TypeId`/handle types.
//! - `heap` / `arena` / `frame`: allocation and frame-scoped reclamation.
//! - `types`: structural type descriptors and shapes.
//! - `strings` / `decimal`: pooled/content strings, arbitrary-precision decimals.
//! - `context`: `EvalContext`, the owning struct everything runs against.
//! - `error`: the runtime's error type.

pub mod arena;
pub mod context;
pub mod decimal;
pub mod error;
pub mod frame;
pub mod heap;
pub mod item;
pub mod strings;
pub mod types;

pub use arena::{NumArena, NumSlot};
pub use context::EvalContext;
pub use decimal::{DecimalCtx, LambdaDecimal};
pub use error::LambdaError;
pub use frame::{FrameMarker, Frames};
pub use heap::{
    ArrayData, ElementData, FuncData, Heap, HeapObject, ListData, MapData, Ownership, RangeData,
    TypedFloatArray, TypedInt64Array, TypedIntArray,
};
pub use item::{HeapHandle, Item, NumHandle, Occurrence, TypeId, INT56_MAX, INT56_MIN};
pub use strings::{LambdaString, NamePool};
pub use types::{Type, TypeArray, TypeElmt, TypeKind, TypeList, TypeMap, TypeType, TypeUnary, TypeUnion};
