//! The Resolver's middleware chain (spec §4.5 step 6): an ordered list of
//! wrappers around the single-module `resolve_one` step, composed as
//! `m1(m2(...mn(resolve)))`. Built-in caching already lives directly on
//! [`super::Resolver`] (it needs to key on the *resolved* version, computed
//! before the chain runs); this module covers the cross-cutting concerns
//! that genuinely wrap the base step itself, such as tracing.

use std::sync::Arc;

use crate::diagnostic;
use crate::error::Result;
use crate::ir::Module;

/// One step of a resolution request, as seen by a [`Middleware`].
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    /// Import path being resolved.
    pub import_path: String,
    /// Version already settled by [`super::Resolver::resolve_version`].
    pub version: String,
}

/// A single link in the resolver's middleware chain.
pub trait Middleware: Send + Sync {
    /// Handle `req`, calling `next` to continue down the chain (or
    /// short-circuiting without calling it, e.g. for a mock).
    fn call(&self, req: &ResolveRequest, next: &dyn Fn(&ResolveRequest) -> Result<Arc<Module>>) -> Result<Arc<Module>>;
}

/// Logs entry/exit of the base resolution step through the `diagnostic!`
/// macro, gated on a caller-supplied flag (spec §4.5 step 6: "tracing").
pub struct TracingMiddleware {
    verbose: bool,
}

impl TracingMiddleware {
    /// Construct a tracing middleware, active when `verbose` is `true`.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Middleware for TracingMiddleware {
    fn call(&self, req: &ResolveRequest, next: &dyn Fn(&ResolveRequest) -> Result<Arc<Module>>) -> Result<Arc<Module>> {
        diagnostic!(self.verbose, "resolving {}@{}", req.import_path, req.version);
        let result = next(req);
        match &result {
            Ok(module) => diagnostic!(self.verbose, "resolved {} ({} packages)", module.import_path, module.packages.len()),
            Err(e) => diagnostic!(self.verbose, "failed to resolve {}@{}: {e}", req.import_path, req.version),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    struct MockMiddleware;

    impl Middleware for MockMiddleware {
        fn call(&self, _req: &ResolveRequest, _next: &dyn Fn(&ResolveRequest) -> Result<Arc<Module>>) -> Result<Arc<Module>> {
            Err(Error::ModuleNotFound {
                path: "mocked".into(),
                version: "".into(),
            })
        }
    }

    #[test]
    fn mock_middleware_short_circuits_without_calling_next() {
        let mw = MockMiddleware;
        let req = ResolveRequest { import_path: "example.com/foo".into(), version: "v1.0.0".into() };
        let err = mw.call(&req, &|_| panic!("next should not be called")).unwrap_err();
        assert!(matches!(err, Error::ModuleNotFound { .. }));
    }
}
