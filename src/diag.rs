//! Opt-in diagnostic output.
//!
//! Matches the teacher's own practice: there is no logging crate in this
//! tree. Diagnostics are plain `eprintln!` calls gated by a caller-supplied
//! boolean (`trace` in the loader, `verbose` in the resolver). This macro
//! just removes the `if flag { eprintln!(...) }` boilerplate at call sites.

/// Print a diagnostic line to stderr if `$flag` is `true`.
///
/// ```
/// # use modgraph::diagnostic;
/// let verbose = false;
/// diagnostic!(verbose, "resolving {} @ {}", "example.com/foo", "v1.0.0");
/// ```
#[macro_export]
macro_rules! diagnostic {
    ($flag:expr, $($arg:tt)*) => {
        if $flag {
            eprintln!($($arg)*);
        }
    };
}
