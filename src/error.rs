//! Unified dispatch error type.
//!
//! Configuration mistakes (a malformed route template, a duplicate middleware
//! name, a rate limit of zero) are caught while the [`Router`](crate::Router)
//! is being built and panic immediately — bootstrap aborts, nothing is ever
//! served. Everything in this module is a *per-request* failure: fatal to the
//! one dispatch that raised it, propagated synchronously to the caller of
//! [`Router::dispatch`](crate::Router::dispatch), and left to the surrounding
//! application to present as a 500-class response.
//!
//! Rate-limit refusals and unmatched routes are **not** errors — they are
//! ordinary [`Outcome`](crate::Outcome) values.

use crate::method::Method;

/// Boxed error type produced by middleware and action callables.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A per-request dispatch failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The raw request asserts a different method than the matched route
    /// expects. Guards against method-override confusion on body-carrying
    /// methods.
    #[error("request asserts method `{asserted}` but the route expects {expected}")]
    MethodMismatch {
        expected: Method,
        asserted: String,
    },

    /// The request body could not be turned into parameters.
    #[error("unusable request body: {0}")]
    BadBody(String),

    /// The extracted input keys do not exactly equal the route's declared
    /// parameter names. Both directions are reported.
    #[error("parameter set mismatch: missing {missing:?}, unexpected {unexpected:?}")]
    ParamMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// A route references a middleware name that was never registered.
    #[error("middleware `{0}` is not registered")]
    UnknownMiddleware(String),

    /// A middleware ran and failed.
    #[error("middleware `{name}` failed")]
    Middleware {
        name: String,
        #[source]
        source: BoxError,
    },

    /// A bound action parameter has no value in the snapshot and no default.
    #[error("missing required parameter `{parameter}` for {target}::{method} (no request value, no default)")]
    MissingParameter {
        parameter: String,
        target: String,
        method: String,
    },

    /// The action itself failed.
    #[error("action failed")]
    Action {
        #[source]
        source: BoxError,
    },
}
