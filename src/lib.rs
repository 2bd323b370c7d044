//! # flicker
//!
//! A small routing and request-dispatch core. Nothing more. Nothing less.
//!
//! ## The contract
//!
//! The host HTTP runtime owns the transport: it parses the wire, hands
//! flicker one [`RawRequest`] per invocation, and flushes whatever the
//! [`Responder`] collected. flicker owns the request lifecycle in between —
//! route matching, parameter checking, rate admission, middleware, input
//! extraction and sanitization, and argument binding. It emits exactly two
//! statuses of its own: 404 when nothing matched and 429 when the rate gate
//! refused. Everything else belongs to your actions.
//!
//! What the host already owns — flicker intentionally ignores:
//!
//! - **Transport and TLS** — sockets, parsing, flushing
//! - **Timeouts** — the host's runaway-request mechanism
//! - **Error presentation** — dispatch errors propagate to your bootstrap,
//!   which decides what a 500 looks like
//!
//! ## Quick start
//!
//! ```rust
//! use flicker::{Action, Buffered, Method, Outcome, RawRequest, RouteOptions, Router};
//!
//! let app = Router::new()
//!     .middleware("auth", || Ok(()))
//!     .at(Method::Get, "/users/{id}", Action::inline(|args| {
//!         // args[0] is the captured, sanitized `id`
//!         Ok(())
//!     }))
//!     .at_with(
//!         Method::Get,
//!         "/reports/{year:[0-9]{4}}",
//!         Action::inline(|_| Ok(())),
//!         RouteOptions::new().middleware("auth").rate(30),
//!     );
//!
//! let req = RawRequest::new("GET", "/users/42");
//! let mut out = Buffered::new();
//! let outcome = app.dispatch(&req, "203.0.113.9", &mut out).unwrap();
//! assert_eq!(outcome, Outcome::Handled);
//! ```

mod action;
mod error;
mod extract;
mod method;
mod middleware;
mod pattern;
mod response;
mod route;
mod router;

pub mod rate;

pub use action::{Action, Arg, Bind, ParamSpec};
pub use error::{BoxError, Error};
pub use extract::{RawRequest, Snapshot, Value, desanitize, sanitize};
pub use method::Method;
pub use pattern::{PathPattern, PatternError};
pub use rate::{CounterStore, MemoryCounters, Window};
pub use response::{Buffered, Responder};
pub use router::{Outcome, RouteOptions, Router};
