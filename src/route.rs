//! Route records and the ordered route table.
//!
//! Routes are appended during bootstrap and never mutated afterwards; the
//! dispatcher scans them in declaration order. Two path specifications
//! coexist: *list-style* (a set of required parameter names, checked against
//! extracted input) and *pattern-style* (a compiled template matched against
//! the raw path).

use crate::action::Action;
use crate::method::Method;
use crate::pattern::PathPattern;

/// How a route is matched against an inbound request.
pub(crate) enum PathSpec {
    /// List-style: matched by method alone; these names must exactly equal
    /// the extracted input keys.
    Names(Vec<String>),
    /// Pattern-style: matched against the raw path.
    Pattern(PathPattern),
}

impl PathSpec {
    /// Declared parameter names, in declaration order.
    pub(crate) fn param_names(&self) -> &[String] {
        match self {
            Self::Names(names) => names,
            Self::Pattern(pattern) => pattern.names(),
        }
    }
}

/// One registered endpoint. Immutable after insertion.
pub(crate) struct Route {
    pub(crate) method: Method,
    pub(crate) spec: PathSpec,
    pub(crate) action: Action,
    pub(crate) middleware: Option<String>,
    /// Requests per minute; pattern-style routes only.
    pub(crate) rate: Option<u32>,
}

impl Route {
    /// Stable identity for logging and rate-counter keys.
    pub(crate) fn identity(&self) -> String {
        match &self.spec {
            PathSpec::Pattern(pattern) => format!("{} {}", self.method, pattern.template()),
            PathSpec::Names(names) => format!("{} [{}]", self.method, names.join(",")),
        }
    }
}
