//! Route registration and the request dispatcher.
//!
//! A [`Router`] owns its route table, middleware registry, and rate-counter
//! store — one explicitly constructed instance per application, passed to
//! whatever invokes [`Router::dispatch`]. Registration happens once during
//! bootstrap (each call returns `self`, so registrations chain); the table
//! is read-only afterwards.
//!
//! Dispatch walks one request through the full lifecycle: route search →
//! parameter check → rate gate → middleware → extraction → binding →
//! action. Routes match strictly in declaration order. List-style routes
//! match by method alone; pattern-style routes match by path alone — the
//! first pattern whose template fits wins even when a later one also
//! carries the request's method, and the method-assertion check in
//! extraction catches the mismatch for body-carrying methods.

use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

use http::StatusCode;
use tracing::{debug, warn};

use crate::action::{self, Action};
use crate::error::{BoxError, Error};
use crate::extract::{self, RawRequest, Snapshot, Value, sanitize};
use crate::method::Method;
use crate::middleware::MiddlewareRegistry;
use crate::pattern::PathPattern;
use crate::rate::{self, CounterStore, MemoryCounters};
use crate::response::Responder;
use crate::route::{PathSpec, Route};

/// Rate limits are expressed in requests per minute.
const WINDOW_SECS: u64 = 60;

/// How one dispatch ended. Everything else is an [`Error`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// The action ran. Response content is the action's business.
    Handled,
    /// No route matched; a 404 was emitted.
    NotFound,
    /// The rate gate refused; a 429 with a `retry-after` header was emitted.
    RateLimited,
}

/// Per-route options for [`Router::on_with`] / [`Router::at_with`].
#[derive(Default)]
pub struct RouteOptions {
    middleware: Option<String>,
    rate: Option<u32>,
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the named middleware before the action.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty — a route with no middleware simply omits
    /// this call.
    pub fn middleware(mut self, name: &str) -> Self {
        if name.is_empty() {
            panic!("middleware name must not be empty");
        }
        self.middleware = Some(name.to_owned());
        self
    }

    /// Admit at most `per_minute` requests per client per minute.
    ///
    /// # Panics
    ///
    /// Panics if `per_minute` is 0.
    pub fn rate(mut self, per_minute: u32) -> Self {
        if per_minute == 0 {
            panic!("rate limit must be at least 1 request per minute");
        }
        self.rate = Some(per_minute);
        self
    }
}

/// The application router and dispatcher.
pub struct Router {
    routes: Vec<Route>,
    middleware: MiddlewareRegistry,
    counters: Box<dyn CounterStore>,
}

impl Router {
    /// A router counting rate windows in process memory.
    pub fn new() -> Self {
        Self::with_counters(MemoryCounters::new())
    }

    /// A router counting rate windows in the host's own store (e.g. a
    /// session layer shared across worker processes).
    pub fn with_counters(store: impl CounterStore + 'static) -> Self {
        Self {
            routes: Vec::new(),
            middleware: MiddlewareRegistry::new(),
            counters: Box::new(store),
        }
    }

    /// Registers a named middleware. Returns `self` for chaining.
    ///
    /// # Panics
    ///
    /// Panics if `name` is empty or already registered.
    pub fn middleware(
        mut self,
        name: &str,
        f: impl Fn() -> Result<(), BoxError> + Send + Sync + 'static,
    ) -> Self {
        self.middleware.register(name, f);
        self
    }

    /// Registers a list-style route: matched by method, its input validated
    /// against `names` (exact set equality, both directions).
    pub fn on(self, method: Method, names: &[&str], action: Action) -> Self {
        self.on_with(method, names, action, RouteOptions::new())
    }

    /// List-style route with options.
    ///
    /// # Panics
    ///
    /// Panics on duplicate parameter names, or when `options` carries a rate
    /// limit — rate gating keys off a path identity, which list-style routes
    /// do not have.
    pub fn on_with(
        mut self,
        method: Method,
        names: &[&str],
        action: Action,
        options: RouteOptions,
    ) -> Self {
        let mut seen = BTreeSet::new();
        for name in names {
            if !seen.insert(*name) {
                panic!("duplicate parameter `{name}` in route declaration");
            }
        }
        if options.rate.is_some() {
            panic!("rate limits apply to pattern-style routes only");
        }
        self.routes.push(Route {
            method,
            spec: PathSpec::Names(names.iter().map(|n| (*n).to_owned()).collect()),
            action,
            middleware: options.middleware,
            rate: None,
        });
        self
    }

    /// Registers a pattern-style route for a path template.
    ///
    /// Placeholders use `{name}` or `{name:regex}` syntax:
    ///
    /// ```rust
    /// use flicker::{Action, Method, Router};
    ///
    /// Router::new()
    ///     .at(Method::Get, "/users/{id}", Action::inline(|_| Ok(())))
    ///     .at(Method::Get, "/posts/{slug:[a-z-]+}", Action::inline(|_| Ok(())));
    /// ```
    pub fn at(self, method: Method, template: &str, action: Action) -> Self {
        self.at_with(method, template, action, RouteOptions::new())
    }

    /// Pattern-style route with options.
    ///
    /// # Panics
    ///
    /// Panics if `template` is empty or does not compile.
    pub fn at_with(
        mut self,
        method: Method,
        template: &str,
        action: Action,
        options: RouteOptions,
    ) -> Self {
        if template.is_empty() {
            panic!("route template must not be empty");
        }
        let pattern = PathPattern::compile(template)
            .unwrap_or_else(|e| panic!("invalid route `{template}`: {e}"));
        self.routes.push(Route {
            method,
            spec: PathSpec::Pattern(pattern),
            action,
            middleware: options.middleware,
            rate: options.rate,
        });
        self
    }

    /// Dispatches one inbound request.
    ///
    /// `client` identifies the caller for rate keying (typically its IP).
    /// The three ordinary dispositions come back as [`Outcome`]; every
    /// fatal per-request failure is an [`Error`] for the caller to convert
    /// into a 500-class response.
    pub fn dispatch(
        &self,
        raw: &RawRequest,
        client: &str,
        responder: &mut dyn Responder,
    ) -> Result<Outcome, Error> {
        let Ok(method) = raw.method().parse::<Method>() else {
            debug!(method = raw.method(), "undispatchable method");
            responder.set_status(StatusCode::NOT_FOUND);
            return Ok(Outcome::NotFound);
        };

        // RouteSearch: declaration order, first match wins. List-style
        // needs the method; pattern-style matches on path shape alone.
        let mut matched: Option<(&Route, Vec<(String, String)>)> = None;
        for route in &self.routes {
            match &route.spec {
                PathSpec::Names(_) => {
                    if method == route.method {
                        matched = Some((route, Vec::new()));
                        break;
                    }
                }
                PathSpec::Pattern(pattern) => {
                    if let Some(captures) = pattern.captures(raw.path()) {
                        matched = Some((route, captures));
                        break;
                    }
                }
            }
        }

        let Some((route, captures)) = matched else {
            debug!(method = raw.method(), path = raw.path(), "no route matched");
            responder.set_status(StatusCode::NOT_FOUND);
            return Ok(Outcome::NotFound);
        };
        debug!(route = %route.identity(), "route matched");

        // ParamCheck: extract the method-appropriate input. List-style
        // routes require exact key-set equality; for pattern-style routes
        // the placeholder set is satisfied by the path match itself.
        let mut values = extract::extract(route.method, raw)?;
        if let PathSpec::Names(names) = &route.spec {
            let missing: Vec<String> = names
                .iter()
                .filter(|n| !values.contains_key(*n))
                .cloned()
                .collect();
            let unexpected: Vec<String> = values
                .keys()
                .filter(|k| !names.contains(*k))
                .cloned()
                .collect();
            if !missing.is_empty() || !unexpected.is_empty() {
                return Err(Error::ParamMismatch { missing, unexpected });
            }
        }

        // RateCheck: admission is a decision, not an error. Refusal emits
        // 429 before middleware or the action can run.
        if let Some(limit) = route.rate {
            let key = format!("{client}:{}", route.identity());
            let now = unix_now();
            if !rate::admit(self.counters.as_ref(), &key, limit, WINDOW_SECS, now) {
                let retry = rate::retry_after(self.counters.as_ref(), &key, WINDOW_SECS, now);
                warn!(client, route = %route.identity(), retry_after = retry, "rate limit exceeded");
                responder.set_status(StatusCode::TOO_MANY_REQUESTS);
                responder.header("retry-after", &retry.to_string());
                return Ok(Outcome::RateLimited);
            }
        }

        // MiddlewareRun: an unknown name or a failing middleware is fatal
        // to this request and propagates uncaught.
        if let Some(name) = &route.middleware {
            self.middleware.invoke(name)?;
        }

        // Bind & invoke. Path captures join the extracted input, winning on
        // key collision, sanitized like every other string.
        for (name, value) in captures {
            values.insert(name, Value::Str(sanitize(&value)));
        }
        let snapshot = Snapshot::from_values(values);
        action::invoke(&route.action, route.spec.param_names(), &snapshot)?;

        // HEAD: headers stand, the body must not go out.
        if method == Method::Head {
            responder.truncate_body();
        }
        Ok(Outcome::Handled)
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "rate limits apply to pattern-style routes only")]
    fn rate_on_list_route_panics() {
        Router::new().on_with(
            Method::Post,
            &["name"],
            Action::inline(|_| Ok(())),
            RouteOptions::new().rate(5),
        );
    }

    #[test]
    #[should_panic(expected = "duplicate parameter")]
    fn duplicate_list_parameter_panics() {
        Router::new().on(Method::Post, &["name", "name"], Action::inline(|_| Ok(())));
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn malformed_template_panics() {
        Router::new().at(Method::Get, "/users/{id", Action::inline(|_| Ok(())));
    }

    #[test]
    #[should_panic(expected = "must not be empty")]
    fn empty_template_panics() {
        Router::new().at(Method::Get, "", Action::inline(|_| Ok(())));
    }

    #[test]
    #[should_panic(expected = "rate limit must be at least 1")]
    fn zero_rate_panics() {
        RouteOptions::new().rate(0);
    }
}
