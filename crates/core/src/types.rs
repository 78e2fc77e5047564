//! Type descriptors and shapes (spec §3, §4.3).
//!
//! `Type` is the base descriptor every other descriptor wraps; `ShapeEntry`
//! is the ordered field list that drives Map/Element layout. Plain structs,
//! no derive-heavy builder macros, colocated tests — consistent with the
//! rest of this crate.

use crate::item::{Occurrence, TypeId};

/// A field descriptor inside a `TypeMap`/`TypeElmt` shape. `name == None`
/// marks a **nested embedded map** (spec §3/§4.4.2 mixin composition):
/// lookups that miss on the outer shape recurse into it before trying the
/// next sibling entry.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeEntry {
    pub name: Option<String>,
    pub type_ref: usize,
    pub byte_offset: usize,
}

/// Structural type for a Map: the ordered shape plus the packed byte size
/// it implies.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeMap {
    pub shape: Vec<ShapeEntry>,
    pub byte_size: usize,
}

impl TypeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a field, extending the shape monotonically (spec §4.3:
    /// "append a field descriptor at `prev.byte_offset + sizeof(prev.type)`").
    /// `field_byte_width` is the caller-supplied packed width for `type_ref`
    /// (component 3 doesn't itself know field sizes — that's the container
    /// builder's job per §4.4.2).
    pub fn append_field(&mut self, name: Option<String>, type_ref: usize, field_byte_width: usize) -> usize {
        let byte_offset = self.byte_size;
        self.shape.push(ShapeEntry {
            name,
            type_ref,
            byte_offset,
        });
        self.byte_size += field_byte_width;
        byte_offset
    }

    pub fn find(&self, name: &str) -> Option<&ShapeEntry> {
        self.shape.iter().find(|e| e.name.as_deref() == Some(name))
    }

    pub fn len(&self) -> usize {
        self.shape.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shape.is_empty()
    }
}

/// `TypeElmt` is a `TypeMap` with a tag name and expected content length
/// (spec §3).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeElmt {
    pub map: TypeMap,
    pub name: Option<String>,
    pub content_length: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeArray {
    pub nested: Option<usize>,
    pub length: Option<usize>,
}

/// Occurrence wrapper (`?`, `+`, `*`) attached to an operand type (spec §3,
/// Glossary).
#[derive(Debug, Clone, PartialEq)]
pub struct TypeUnary {
    pub op: Occurrence,
    pub operand: usize,
}

/// Named reference / forwarding wrapper used by the validator's cycle
/// detection (spec §4.5 `visited_nodes` keyed by type name).
#[derive(Debug, Clone, PartialEq)]
pub struct TypeType {
    pub name: Option<String>,
    pub inner: usize,
}

/// A union of alternative types, tried in declaration order (spec §4.5).
#[derive(Debug, Clone, PartialEq)]
pub struct TypeUnion {
    pub arms: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Primitive(TypeId),
    Map(TypeMap),
    Elmt(TypeElmt),
    Array(TypeArray),
    Unary(TypeUnary),
    Wrapper(TypeType),
    Union(TypeUnion),
}

/// The base descriptor (spec §3: `Type{type_id, is_literal}`), carrying its
/// specialised payload alongside.
#[derive(Debug, Clone, PartialEq)]
pub struct Type {
    pub type_id: TypeId,
    pub is_literal: bool,
    pub kind: TypeKind,
}

impl Type {
    pub fn primitive(type_id: TypeId) -> Self {
        Type {
            type_id,
            is_literal: false,
            kind: TypeKind::Primitive(type_id),
        }
    }
}

/// Context-owned registry of `Type`s, indexed by `type_index` (spec §2:
/// "registers `Type`s in the context's type list").
#[derive(Debug, Default)]
pub struct TypeList {
    types: Vec<Type>,
    names: Vec<Option<String>>,
}

impl TypeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, ty: Type, name: Option<String>) -> usize {
        self.types.push(ty);
        self.names.push(name);
        self.types.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&Type> {
        self.types.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Type> {
        self.types.get_mut(index)
    }

    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.names.get(index).and_then(|n| n.as_deref())
    }

    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.names
            .iter()
            .position(|n| n.as_deref() == Some(name))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_field_increases_byte_size_monotonically() {
        let mut map = TypeMap::new();
        let off1 = map.append_field(Some("x".into()), 0, 8);
        let off2 = map.append_field(Some("y".into()), 0, 8);
        assert_eq!(off1, 0);
        assert_eq!(off2, 8);
        assert_eq!(map.byte_size, 16);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn find_matches_by_name_only() {
        let mut map = TypeMap::new();
        map.append_field(None, 0, 8);
        map.append_field(Some("k".into()), 0, 8);
        assert!(map.find("missing").is_none());
        assert_eq!(map.find("k").unwrap().byte_offset, 8);
    }

    #[test]
    fn type_list_round_trips_by_name() {
        let mut list = TypeList::new();
        let idx = list.register(Type::primitive(TypeId::Int), Some("Point".into()));
        assert_eq!(list.find_by_name("Point"), Some(idx));
        assert_eq!(list.name_of(idx), Some("Point"));
        assert!(list.find_by_name("Nope").is_none());
    }
}
