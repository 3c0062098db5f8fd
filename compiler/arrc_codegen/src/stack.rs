//! Stack growth for the recursive AST walk and the emitter's DFS.
//!
//! Deeply nested expressions recurse once per level in both passes; the
//! stack is grown on demand instead of overflowing.

/// Grow the stack when less than this remains.
const RED_ZONE: usize = 64 * 1024;

/// Size of each newly allocated stack segment.
const STACK_SEGMENT: usize = 1024 * 1024;

/// Run `f`, growing the stack first if it is close to exhausted.
#[inline]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_SEGMENT, f)
}
