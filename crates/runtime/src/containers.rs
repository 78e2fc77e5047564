//! Container builder API — lists, arrays, ranges, maps, elements (spec
//! §4.4.1, §4.4.2, §6 "parser-driver surface").
//!
//! One simplification runs through this whole module: because `Item`
//! already carries its own discriminant (no raw byte packing, see
//! `lambda_core::heap::MapData`), accessors never need the source's
//! "box onto the numeric stack to give every lookup a stable `Item`"
//! step — the stored `Item` already *is* stable. Every operation still
//! allocates through `ctx.heap`/`ctx.num_stack` exactly where the source
//! would, so frame-scoped reclamation (spec §4.2) applies identically.

use lambda_core::{
    ArrayData, ElementData, EvalContext, HeapHandle, HeapObject, Item, ListData, MapData,
    Ownership, RangeData, TypeList, TypeMap, TypedFloatArray, TypedInt64Array, TypedIntArray,
};

fn alloc(ctx: &mut EvalContext, obj: HeapObject) -> HeapHandle {
    ctx.heap.alloc(obj, Ownership::Heap)
}

/// Bumps `ref_cnt` when a container becomes reachable from another
/// heap-managed container (spec §3). Scalars and inline items are no-ops.
fn incref_if_container(ctx: &mut EvalContext, item: &Item) {
    let handle = match item {
        Item::Array(h)
        | Item::ArrayInt(h)
        | Item::ArrayInt64(h)
        | Item::ArrayFloat(h)
        | Item::List(h)
        | Item::Range(h)
        | Item::Map(h)
        | Item::Element(h)
        | Item::Func(h)
        | Item::Type(h) => Some(*h),
        _ => None,
    };
    if let Some(h) = handle {
        ctx.heap.incref(h);
    }
}

// ---------------------------------------------------------------------
// Lists
// ---------------------------------------------------------------------

pub fn list_new(ctx: &mut EvalContext) -> HeapHandle {
    alloc(ctx, HeapObject::List(ListData { items: Vec::new() }))
}

/// Pushes `item` into `list`, splicing its elements in if `item` is itself a
/// spreadable array (spec §4.4.1 "spread semantics") — lists have no
/// separate spread-push op, so the detection lives in `list_push` itself.
pub fn list_push(ctx: &mut EvalContext, list: HeapHandle, item: Item) {
    let spliced = if let Item::Array(inner) = item {
        match ctx.heap.get(inner) {
            Some(HeapObject::Array(data)) if data.spreadable => Some(data.items.clone()),
            _ => None,
        }
    } else {
        None
    };
    if spliced.is_none() {
        incref_if_container(ctx, &item);
    }
    if let Some(HeapObject::List(data)) = ctx.heap.get_mut(list) {
        match spliced {
            Some(items) => data.items.extend(items),
            None => data.items.push(item),
        }
    }
}

/// Builds a list in one call from already-constructed items (spec
/// `list_fill`).
pub fn list_fill(ctx: &mut EvalContext, values: Vec<Item>) -> HeapHandle {
    for v in &values {
        incref_if_container(ctx, v);
    }
    alloc(ctx, HeapObject::List(ListData { items: values }))
}

/// Applies the flattening rule (spec §3): empty collapses to `Null`, a
/// single element collapses to itself, otherwise the list stands as-is.
pub fn list_end(ctx: &mut EvalContext, list: HeapHandle) -> Item {
    let items = match ctx.heap.get(list) {
        Some(HeapObject::List(data)) => data.items.clone(),
        _ => return Item::Error,
    };
    match items.len() {
        0 => Item::Null,
        1 => items.into_iter().next().unwrap(),
        _ => Item::List(list),
    }
}

pub fn list_get(ctx: &EvalContext, list: HeapHandle, index: i64) -> Item {
    match ctx.heap.get(list) {
        Some(HeapObject::List(data)) => index_or_null(&data.items, index),
        _ => Item::Null,
    }
}

// ---------------------------------------------------------------------
// Arrays
// ---------------------------------------------------------------------

pub fn array_new(ctx: &mut EvalContext) -> HeapHandle {
    alloc(
        ctx,
        HeapObject::Array(ArrayData {
            items: Vec::new(),
            spreadable: false,
        }),
    )
}

pub fn array_push(ctx: &mut EvalContext, arr: HeapHandle, item: Item) {
    incref_if_container(ctx, &item);
    if let Some(HeapObject::Array(data)) = ctx.heap.get_mut(arr) {
        data.items.push(item);
    }
}

pub fn array_fill(ctx: &mut EvalContext, values: Vec<Item>) -> HeapHandle {
    for v in &values {
        incref_if_container(ctx, v);
    }
    alloc(
        ctx,
        HeapObject::Array(ArrayData {
            items: values,
            spreadable: false,
        }),
    )
}

pub fn array_spreadable(ctx: &mut EvalContext, arr: HeapHandle) {
    if let Some(HeapObject::Array(data)) = ctx.heap.get_mut(arr) {
        data.spreadable = true;
    }
}

/// Pushes `item` into `arr`, splicing its elements in if `item` is itself a
/// spreadable array (spec §4.4.1 "spread semantics").
pub fn array_push_spread(ctx: &mut EvalContext, arr: HeapHandle, item: Item) {
    let spliced = if let Item::Array(inner) = item {
        match ctx.heap.get(inner) {
            Some(HeapObject::Array(data)) if data.spreadable => Some(data.items.clone()),
            _ => None,
        }
    } else {
        None
    };
    if spliced.is_none() {
        incref_if_container(ctx, &item);
    }
    if let Some(HeapObject::Array(data)) = ctx.heap.get_mut(arr) {
        match spliced {
            Some(items) => data.items.extend(items),
            None => data.items.push(item),
        }
    }
}

pub fn array_end(_ctx: &mut EvalContext, arr: HeapHandle) -> Item {
    Item::Array(arr)
}

pub fn array_get(ctx: &EvalContext, arr: HeapHandle, index: i64) -> Item {
    match ctx.heap.get(arr) {
        Some(HeapObject::Array(data)) => index_or_null(&data.items, index),
        _ => Item::Null,
    }
}

fn index_or_null(items: &[Item], index: i64) -> Item {
    if index < 0 {
        return Item::Null;
    }
    items.get(index as usize).cloned().unwrap_or(Item::Null)
}

// ---------------------------------------------------------------------
// Typed arrays
// ---------------------------------------------------------------------

pub fn array_int_new(ctx: &mut EvalContext, len: usize) -> HeapHandle {
    alloc(
        ctx,
        HeapObject::ArrayInt(TypedIntArray { items: vec![0; len] }),
    )
}

pub fn array_int_fill(ctx: &mut EvalContext, values: Vec<i64>) -> HeapHandle {
    alloc(ctx, HeapObject::ArrayInt(TypedIntArray { items: values }))
}

pub fn array_int_get(ctx: &EvalContext, arr: HeapHandle, index: i64) -> Option<i64> {
    match ctx.heap.get(arr) {
        Some(HeapObject::ArrayInt(data)) if index >= 0 => data.items.get(index as usize).copied(),
        _ => None,
    }
}

pub fn array_int_set(ctx: &mut EvalContext, arr: HeapHandle, index: usize, value: i64) {
    if let Some(HeapObject::ArrayInt(data)) = ctx.heap.get_mut(arr) {
        if index < data.items.len() {
            data.items[index] = value;
        }
    }
}

pub fn array_int64_new(ctx: &mut EvalContext, len: usize) -> HeapHandle {
    alloc(
        ctx,
        HeapObject::ArrayInt64(TypedInt64Array { items: vec![0; len] }),
    )
}

pub fn array_int64_fill(ctx: &mut EvalContext, values: Vec<i64>) -> HeapHandle {
    alloc(ctx, HeapObject::ArrayInt64(TypedInt64Array { items: values }))
}

pub fn array_int64_get(ctx: &EvalContext, arr: HeapHandle, index: i64) -> Option<i64> {
    match ctx.heap.get(arr) {
        Some(HeapObject::ArrayInt64(data)) if index >= 0 => {
            data.items.get(index as usize).copied()
        }
        _ => None,
    }
}

pub fn array_float_new(ctx: &mut EvalContext, len: usize) -> HeapHandle {
    alloc(
        ctx,
        HeapObject::ArrayFloat(TypedFloatArray { items: vec![0.0; len] }),
    )
}

pub fn array_float_fill(ctx: &mut EvalContext, values: Vec<f64>) -> HeapHandle {
    alloc(ctx, HeapObject::ArrayFloat(TypedFloatArray { items: values }))
}

pub fn array_float_get(ctx: &EvalContext, arr: HeapHandle, index: i64) -> Option<f64> {
    match ctx.heap.get(arr) {
        Some(HeapObject::ArrayFloat(data)) if index >= 0 => {
            data.items.get(index as usize).copied()
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------
// Ranges
// ---------------------------------------------------------------------

pub fn range_new(ctx: &mut EvalContext, start: i64, end: i64) -> HeapHandle {
    alloc(ctx, HeapObject::Range(RangeData { start, end }))
}

/// `item_at` for a `Range` (spec §4.4.1): `start + i` when in bounds, `Null`
/// otherwise.
pub fn item_at(ctx: &EvalContext, range: HeapHandle, i: i64) -> Item {
    match ctx.heap.get(range) {
        Some(HeapObject::Range(r)) => {
            let v = r.start + i;
            if v >= r.start.min(r.end) && v <= r.start.max(r.end) {
                Item::Int(v)
            } else {
                Item::Null
            }
        }
        _ => Item::Null,
    }
}

// ---------------------------------------------------------------------
// Maps
// ---------------------------------------------------------------------

/// Binds a new map to an existing `TypeMap` at `type_index` in the
/// context's type list (spec §4.4.2 `map(type_index)`).
pub fn map_new(ctx: &mut EvalContext, type_index: usize) -> HeapHandle {
    alloc(ctx, HeapObject::Map(MapData::new(type_index)))
}

/// Appends (or overwrites) a field by name, extending the bound
/// `TypeMap`'s shape on first write (spec §4.3 `map_put`).
pub fn map_put(ctx: &mut EvalContext, map: HeapHandle, key: &str, value: Item) {
    let type_index = match ctx.heap.get(map) {
        Some(HeapObject::Map(data)) => data.type_index,
        _ => return,
    };
    incref_if_container(ctx, &value);
    let slot = shape_slot_for(&mut ctx.type_list, type_index, key);
    if let Some(HeapObject::Map(data)) = ctx.heap.get_mut(map) {
        data.set(slot, value);
    }
}

/// Finds the shape slot for `key`, appending a new field descriptor if this
/// is the first write (spec §4.3: "the first write... extends the shape").
fn shape_slot_for(type_list: &mut TypeList, type_index: usize, key: &str) -> usize {
    let ty = type_list.get_mut(type_index).expect("unbound type_index");
    let map = match &mut ty.kind {
        lambda_core::TypeKind::Map(m) => m,
        lambda_core::TypeKind::Elmt(e) => &mut e.map,
        _ => panic!("map_put on non-map type"),
    };
    if let Some(existing) = map.find(key) {
        return existing.byte_offset;
    }
    map.append_field(Some(key.to_string()), 0, 1)
}

fn map_type(ty: &lambda_core::Type) -> Option<&TypeMap> {
    match &ty.kind {
        lambda_core::TypeKind::Map(m) => Some(m),
        lambda_core::TypeKind::Elmt(e) => Some(&e.map),
        _ => None,
    }
}

/// Walks the bound `TypeMap`'s shape linearly by name, recursing into
/// nested embedded maps (`ShapeEntry.name == None`) before trying the next
/// sibling (spec §4.4.2 mixin composition).
pub fn map_get(ctx: &EvalContext, map: HeapHandle, key: &str) -> Item {
    let Some(HeapObject::Map(data)) = ctx.heap.get(map) else {
        return Item::Null;
    };
    map_get_in(ctx, data, key)
}

fn map_get_in(ctx: &EvalContext, data: &MapData, key: &str) -> Item {
    let Some(ty) = ctx.type_list.get(data.type_index) else {
        return Item::Null;
    };
    let Some(tm) = map_type(ty) else {
        return Item::Null;
    };
    for (slot, entry) in tm.shape.iter().enumerate() {
        match &entry.name {
            Some(name) if name == key => {
                return data.get(slot).cloned().unwrap_or(Item::Null);
            }
            Some(_) => continue,
            None => {
                if let Some(Item::Map(nested)) = data.get(slot) {
                    if let Some(HeapObject::Map(nested_data)) = ctx.heap.get(*nested) {
                        let found = map_get_in(ctx, nested_data, key);
                        if !found.is_null() {
                            return found;
                        }
                    }
                }
            }
        }
    }
    Item::Null
}

/// Field names in shape order (spec §4.4.2 `item_keys`).
pub fn map_keys(ctx: &EvalContext, map: HeapHandle) -> Vec<String> {
    let Some(HeapObject::Map(data)) = ctx.heap.get(map) else {
        return Vec::new();
    };
    let Some(ty) = ctx.type_list.get(data.type_index) else {
        return Vec::new();
    };
    let Some(tm) = map_type(ty) else {
        return Vec::new();
    };
    tm.shape.iter().filter_map(|e| e.name.clone()).collect()
}

// ---------------------------------------------------------------------
// Elements
// ---------------------------------------------------------------------

pub fn elmt_new(ctx: &mut EvalContext, type_index: usize, tag: &str) -> HeapHandle {
    alloc(
        ctx,
        HeapObject::Element(ElementData {
            map: MapData::new(type_index),
            tag: tag.into(),
            children: Vec::new(),
        }),
    )
}

pub fn elmt_put(ctx: &mut EvalContext, elmt: HeapHandle, key: &str, value: Item) {
    let type_index = match ctx.heap.get(elmt) {
        Some(HeapObject::Element(data)) => data.map.type_index,
        _ => return,
    };
    let slot = shape_slot_for(&mut ctx.type_list, type_index, key);
    if let Some(HeapObject::Element(data)) = ctx.heap.get_mut(elmt) {
        data.map.set(slot, value);
    }
}

pub fn elmt_get(ctx: &EvalContext, elmt: HeapHandle, key: &str) -> Item {
    let Some(HeapObject::Element(data)) = ctx.heap.get(elmt) else {
        return Item::Null;
    };
    map_get_in(ctx, &data.map, key)
}

pub fn elmt_push_child(ctx: &mut EvalContext, elmt: HeapHandle, child: Item) {
    if let Some(HeapObject::Element(data)) = ctx.heap.get_mut(elmt) {
        data.children.push(child);
    }
}

pub fn elmt_tag(ctx: &EvalContext, elmt: HeapHandle) -> Option<String> {
    match ctx.heap.get(elmt) {
        Some(HeapObject::Element(data)) => Some(data.tag.to_string()),
        _ => None,
    }
}

pub fn elmt_keys(ctx: &EvalContext, elmt: HeapHandle) -> Vec<String> {
    let Some(HeapObject::Element(data)) = ctx.heap.get(elmt) else {
        return Vec::new();
    };
    let Some(ty) = ctx.type_list.get(data.map.type_index) else {
        return Vec::new();
    };
    let Some(tm) = map_type(ty) else {
        return Vec::new();
    };
    tm.shape.iter().filter_map(|e| e.name.clone()).collect()
}

// ---------------------------------------------------------------------
// Polymorphic accessors (spec §4.4.2 `item_attr`/`item_keys`)
// ---------------------------------------------------------------------

pub fn item_attr(ctx: &EvalContext, item: &Item, key: &str) -> Item {
    match item {
        Item::Map(h) => map_get(ctx, *h, key),
        Item::Element(h) => elmt_get(ctx, *h, key),
        _ => Item::Null,
    }
}

pub fn item_keys(ctx: &EvalContext, item: &Item) -> Vec<String> {
    match item {
        Item::Map(h) => map_keys(ctx, *h),
        Item::Element(h) => elmt_keys(ctx, *h),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_core::{Type, TypeId};

    fn new_map_type(ctx: &mut EvalContext) -> usize {
        ctx.type_list.register(
            Type {
                type_id: TypeId::Map,
                is_literal: false,
                kind: lambda_core::TypeKind::Map(TypeMap::new()),
            },
            None,
        )
    }

    #[test]
    fn list_end_flattens_single_element() {
        let mut ctx = EvalContext::new();
        let list = list_new(&mut ctx);
        list_push(&mut ctx, list, Item::Int(7));
        assert_eq!(list_end(&mut ctx, list), Item::Int(7));
    }

    #[test]
    fn list_end_collapses_empty_to_null() {
        let mut ctx = EvalContext::new();
        let list = list_new(&mut ctx);
        assert_eq!(list_end(&mut ctx, list), Item::Null);
    }

    #[test]
    fn list_end_keeps_multi_element_list() {
        let mut ctx = EvalContext::new();
        let list = list_new(&mut ctx);
        list_push(&mut ctx, list, Item::Int(1));
        list_push(&mut ctx, list, Item::Int(2));
        assert_eq!(list_end(&mut ctx, list), Item::List(list));
    }

    #[test]
    fn spreadable_array_splices_into_list_builder() {
        let mut ctx = EvalContext::new();
        let inner = array_fill(&mut ctx, vec![Item::Int(1), Item::Int(2), Item::Int(3)]);
        array_spreadable(&mut ctx, inner);
        let outer = array_new(&mut ctx);
        array_push_spread(&mut ctx, outer, Item::Array(inner));
        assert_eq!(array_get(&ctx, outer, 0), Item::Int(1));
        assert_eq!(array_get(&ctx, outer, 1), Item::Int(2));
        assert_eq!(array_get(&ctx, outer, 2), Item::Int(3));
    }

    #[test]
    fn spreadable_array_splices_into_list_push() {
        let mut ctx = EvalContext::new();
        let inner = array_fill(&mut ctx, vec![Item::Int(2), Item::Int(3)]);
        array_spreadable(&mut ctx, inner);
        let list = list_new(&mut ctx);
        list_push(&mut ctx, list, Item::Int(1));
        list_push(&mut ctx, list, Item::Array(inner));
        list_push(&mut ctx, list, Item::Int(4));
        assert_eq!(list_get(&ctx, list, 0), Item::Int(1));
        assert_eq!(list_get(&ctx, list, 1), Item::Int(2));
        assert_eq!(list_get(&ctx, list, 2), Item::Int(3));
        assert_eq!(list_get(&ctx, list, 3), Item::Int(4));
        assert_eq!(list_end(&mut ctx, list), Item::List(list));
    }

    #[test]
    fn non_spreadable_array_nests_in_list() {
        let mut ctx = EvalContext::new();
        let inner = array_fill(&mut ctx, vec![Item::Int(2), Item::Int(3)]);
        let list = list_new(&mut ctx);
        list_push(&mut ctx, list, Item::Int(1));
        list_push(&mut ctx, list, Item::Array(inner));
        assert_eq!(list_get(&ctx, list, 0), Item::Int(1));
        assert_eq!(list_get(&ctx, list, 1), Item::Array(inner));
    }

    #[test]
    fn array_get_out_of_bounds_is_null_not_error() {
        let mut ctx = EvalContext::new();
        let arr = array_fill(&mut ctx, vec![Item::Int(1)]);
        assert_eq!(array_get(&ctx, arr, 5), Item::Null);
        assert_eq!(array_get(&ctx, arr, -1), Item::Null);
    }

    #[test]
    fn range_item_at_bounds() {
        let mut ctx = EvalContext::new();
        let r = range_new(&mut ctx, 10, 13);
        assert_eq!(item_at(&ctx, r, 0), Item::Int(10));
        assert_eq!(item_at(&ctx, r, 3), Item::Int(13));
        assert_eq!(item_at(&ctx, r, 4), Item::Null);
    }

    #[test]
    fn map_put_then_get_round_trips() {
        let mut ctx = EvalContext::new();
        let ty = new_map_type(&mut ctx);
        let map = map_new(&mut ctx, ty);
        map_put(&mut ctx, map, "x", Item::Int(1));
        map_put(&mut ctx, map, "y", Item::Int(2));
        assert_eq!(map_get(&ctx, map, "x"), Item::Int(1));
        assert_eq!(map_get(&ctx, map, "y"), Item::Int(2));
        assert_eq!(map_get(&ctx, map, "z"), Item::Null);
        assert_eq!(map_keys(&ctx, map), vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn nested_embedded_map_mixin_lookup() {
        let mut ctx = EvalContext::new();
        let inner_ty = new_map_type(&mut ctx);
        let inner = map_new(&mut ctx, inner_ty);
        map_put(&mut ctx, inner, "shared", Item::Int(99));

        let outer_ty = new_map_type(&mut ctx);
        let outer = map_new(&mut ctx, outer_ty);
        // Register the nested-map shape slot directly (name == None).
        let slot = {
            let ty = ctx.type_list.get_mut(outer_ty).unwrap();
            let map = match &mut ty.kind {
                lambda_core::TypeKind::Map(m) => m,
                _ => unreachable!(),
            };
            map.append_field(None, 0, 1)
        };
        if let Some(HeapObject::Map(data)) = ctx.heap.get_mut(outer) {
            data.set(slot, Item::Map(inner));
        }
        assert_eq!(map_get(&ctx, outer, "shared"), Item::Int(99));
        assert_eq!(map_get(&ctx, outer, "missing"), Item::Null);
    }

    #[test]
    fn element_tag_and_children() {
        let mut ctx = EvalContext::new();
        let ty = new_map_type(&mut ctx);
        let elmt = elmt_new(&mut ctx, ty, "p");
        elmt_put(&mut ctx, elmt, "class", Item::Null);
        elmt_push_child(&mut ctx, elmt, Item::Int(1));
        assert_eq!(elmt_tag(&ctx, elmt).as_deref(), Some("p"));
        assert_eq!(elmt_keys(&ctx, elmt), vec!["class".to_string()]);
    }
}
