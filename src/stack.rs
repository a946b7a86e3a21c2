//! Native stack growth for the recursive parser and evaluator.
//!
//! Nesting is bounded by [`crate::MAX_EXPR_DEPTH`] and
//! [`crate::Config::max_eval_depth`]; within those bounds a deep expression
//! must not exhaust a small thread stack, so the recursive entry points run
//! through [`ensure_sufficient_stack`].

/// Run `f`, first moving to a fresh stack segment if less than the red zone
/// remains.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    const RED_ZONE: usize = 100 * 1024;
    const STACK_PER_RECURSION: usize = 1024 * 1024;

    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deep_recursion_grows_the_stack() {
        fn depth(n: u64) -> u64 {
            ensure_sufficient_stack(|| if n == 0 { 0 } else { depth(n - 1) + 1 })
        }
        assert_eq!(depth(100_000), 100_000);
    }
}
