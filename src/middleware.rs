//! Named middleware registry.
//!
//! Middleware are pre-registered callables run before a route's action —
//! authentication checks and other cross-cutting concerns. They receive no
//! dispatch arguments: a middleware captures its collaborators (session,
//! response writer) at registration time and acts on them directly. One that
//! wants to short-circuit the request terminates the response itself; the
//! dispatcher never inspects what a middleware did, only whether it failed.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{BoxError, Error};

type MiddlewareFn = Arc<dyn Fn() -> Result<(), BoxError> + Send + Sync + 'static>;

#[derive(Default)]
pub(crate) struct MiddlewareRegistry {
    entries: HashMap<String, MiddlewareFn>,
}

impl MiddlewareRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers `f` under `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty or already registered — both are bootstrap
    /// configuration errors, never silently overridden.
    pub(crate) fn register(
        &mut self,
        name: &str,
        f: impl Fn() -> Result<(), BoxError> + Send + Sync + 'static,
    ) {
        if name.is_empty() {
            panic!("middleware name must not be empty");
        }
        if self.entries.contains_key(name) {
            panic!("middleware `{name}` is already registered");
        }
        self.entries.insert(name.to_owned(), Arc::new(f));
    }

    /// Runs the middleware registered under `name`.
    ///
    /// The empty name is a no-op. A non-empty unknown name is a dispatch
    /// error; so is a middleware that returns `Err`.
    pub(crate) fn invoke(&self, name: &str) -> Result<(), Error> {
        if name.is_empty() {
            return Ok(());
        }
        let middleware = self
            .entries
            .get(name)
            .ok_or_else(|| Error::UnknownMiddleware(name.to_owned()))?;
        middleware().map_err(|source| Error::Middleware {
            name: name.to_owned(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn invokes_registered_middleware() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let mut registry = MiddlewareRegistry::new();
        registry.register("auth", move || {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        registry.invoke("auth").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_name_is_a_no_op() {
        let registry = MiddlewareRegistry::new();
        assert!(registry.invoke("").is_ok());
    }

    #[test]
    fn unknown_name_is_a_dispatch_error() {
        let registry = MiddlewareRegistry::new();
        let err = registry.invoke("auth").unwrap_err();
        assert!(matches!(err, Error::UnknownMiddleware(n) if n == "auth"));
    }

    #[test]
    fn middleware_failure_propagates_with_its_name() {
        let mut registry = MiddlewareRegistry::new();
        registry.register("auth", || Err("no session".into()));
        let err = registry.invoke("auth").unwrap_err();
        assert!(matches!(err, Error::Middleware { name, .. } if name == "auth"));
    }

    #[test]
    #[should_panic(expected = "already registered")]
    fn duplicate_registration_panics() {
        let mut registry = MiddlewareRegistry::new();
        registry.register("auth", || Ok(()));
        registry.register("auth", || Ok(()));
    }

    #[test]
    #[should_panic(expected = "must not be empty")]
    fn empty_name_registration_panics() {
        let mut registry = MiddlewareRegistry::new();
        registry.register("", || Ok(()));
    }
}
