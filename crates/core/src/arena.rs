//! Numeric stack — `push_l`/`push_d`/`push_k` (spec §4.2).
//!
//! Boxed `int64`/`float`/`datetime` values need an address-stable slot so an
//! `Item` can reference them without inlining 64 bits into the tag itself.
//! This is append-only, frame-truncated storage backed by a plain
//! `Vec<NumSlot>` (see `DESIGN.md` for why not a bump arena) — truncation on
//! frame close is just `Vec::truncate`, and slot indices stay valid as long
//! as nothing after them has been truncated away, matching the "`push_*`
//! return values remain valid only within the enclosing frame" invariant
//! exactly.

use crate::item::NumHandle;
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumSlot {
    Int64(i64),
    Float(f64),
    DateTime(SystemTime),
}

#[derive(Debug, Default)]
pub struct NumArena {
    slots: Vec<NumSlot>,
}

impl NumArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn push_l(&mut self, v: i64) -> NumHandle {
        self.slots.push(NumSlot::Int64(v));
        NumHandle((self.slots.len() - 1) as u32)
    }

    pub fn push_d(&mut self, v: f64) -> NumHandle {
        self.slots.push(NumSlot::Float(v));
        NumHandle((self.slots.len() - 1) as u32)
    }

    pub fn push_k(&mut self, v: SystemTime) -> NumHandle {
        self.slots.push(NumSlot::DateTime(v));
        NumHandle((self.slots.len() - 1) as u32)
    }

    pub fn get(&self, h: NumHandle) -> Option<NumSlot> {
        self.slots.get(h.0 as usize).copied()
    }

    pub fn get_i64(&self, h: NumHandle) -> Option<i64> {
        match self.get(h)? {
            NumSlot::Int64(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_f64(&self, h: NumHandle) -> Option<f64> {
        match self.get(h)? {
            NumSlot::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_datetime(&self, h: NumHandle) -> Option<SystemTime> {
        match self.get(h)? {
            NumSlot::DateTime(v) => Some(v),
            _ => None,
        }
    }

    /// Truncates to `mark` slots, invalidating every handle past it. Used by
    /// `frame_end` (spec §4.2: "slots are invalidated by `frame_end`").
    pub fn truncate(&mut self, mark: usize) {
        self.slots.truncate(mark);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_l_round_trips() {
        let mut arena = NumArena::new();
        let h = arena.push_l(42);
        assert_eq!(arena.get_i64(h), Some(42));
    }

    #[test]
    fn truncate_invalidates_later_slots() {
        let mut arena = NumArena::new();
        let mark = arena.len();
        arena.push_l(1);
        arena.push_d(2.5);
        assert_eq!(arena.len(), mark + 2);
        arena.truncate(mark);
        assert_eq!(arena.len(), mark);
    }

    #[test]
    fn wrong_kind_accessor_returns_none() {
        let mut arena = NumArena::new();
        let h = arena.push_l(1);
        assert_eq!(arena.get_f64(h), None);
    }
}
