use proc_macro::TokenStream;

mod map;

/// Combines several memoized cells into one lazily computed `Memo`.
///
/// `map!(|a, &b| a + b.len())` clones the `a` and `b` handles into a new cell. When that cell is
/// forced, it forces `a` (passing a clone of its value) and `b` (passing a reference), then
/// evaluates the body. The inputs must share one error type; the first error is returned.
///
/// The combined cell is always a single-threaded `memogrid::Memo`. Inputs may be
/// `memogrid::sync::Memo` handles, but the result is then still neither `Send` nor `Sync`.
#[proc_macro]
pub fn map(input: TokenStream) -> TokenStream {
    map::map(input)
}
