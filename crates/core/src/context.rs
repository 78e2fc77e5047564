//! `EvalContext` — the owning struct every operation runs against (spec §5).
//!
//! One context per thread, exclusive, never shared without an external
//! mutex the caller supplies. It owns the heap, the numeric stack, the
//! frame stack, the type list, the name pool, and the decimal context —
//! every piece of shared state spec §5 calls out by name.

use crate::arena::NumArena;
use crate::decimal::DecimalCtx;
use crate::error::LambdaError;
use crate::frame::{FrameMarker, Frames};
use crate::heap::Heap;
use crate::strings::NamePool;
use crate::types::TypeList;

/// Defensive bound on the reclaim loop beyond the entries present when a
/// frame opened (spec §9: "a sentinel loop bound equal to the entry count
/// at entry + 100 must abort and log an error"). Never expected to trigger
/// in a correctly operating runtime — catches an implementation bug (e.g.
/// an entry that keeps re-adding itself) rather than adversarial input,
/// which `max_depth`/`max_errors` on the validator side already guard.
const FRAME_END_ITERATION_SLACK: usize = 100;

pub struct EvalContext {
    pub heap: Heap,
    pub num_stack: NumArena,
    pub frames: Frames,
    pub type_list: TypeList,
    pub names: NamePool,
    pub decimal_ctx: DecimalCtx,
    pub last_error: Option<String>,
}

impl Default for EvalContext {
    fn default() -> Self {
        EvalContext {
            heap: Heap::new(),
            num_stack: NumArena::new(),
            frames: Frames::new(),
            type_list: TypeList::new(),
            names: NamePool::new(),
            decimal_ctx: DecimalCtx::default(),
            last_error: None,
        }
    }
}

impl EvalContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_last_error(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        tracing::debug!(error = %msg, "value runtime error");
        self.last_error = Some(msg);
    }

    pub fn frame_start(&mut self) {
        self.frames.start(self.heap.len(), self.num_stack.len());
    }

    /// Closes the innermost frame, reclaiming every heap entry and numeric
    /// slot allocated since it opened.
    pub fn frame_end(&mut self) -> Result<(), LambdaError> {
        let FrameMarker { heap_mark, num_mark } = self.frames.end()?;

        let original_length = self.heap.len().saturating_sub(heap_mark);
        let budget = original_length + FRAME_END_ITERATION_SLACK;
        let mut iterations = 0usize;
        loop {
            if iterations > budget {
                tracing::error!(
                    heap_mark,
                    original_length,
                    iterations,
                    "frame_end iteration budget exceeded"
                );
                return Err(LambdaError::FrameCorruption);
            }
            let before = self.heap.len();
            self.heap.reclaim_from(heap_mark);
            iterations += 1;
            // A single pass is sufficient for Vec-backed storage (no
            // self-growing entries); the loop and budget exist to preserve
            // the defensive contract spec §9 calls for even though our
            // representation can't actually re-enter.
            if self.heap.len() == before {
                break;
            }
        }

        self.num_stack.truncate(num_mark);
        Ok(())
    }
}
