//! Stack safety for deep recursion.
//!
//! Parsing, resolution and evaluation are all recursive over the AST, and
//! evaluation additionally recurses once per script-level function call. Each
//! recursive entry point wraps itself in [`ensure_sufficient_stack`], which
//! grows the native stack on demand so that the interpreter's own call-depth
//! limit is what ends runaway recursion.

/// Remaining stack below which we grow (128KB).
const RED_ZONE: usize = 128 * 1024;

/// Size of each newly allocated stack segment (2MB).
const STACK_PER_RECURSION: usize = 2 * 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
