//! Actions and reflection-free parameter binding.
//!
//! An [`Action`] is a tagged sum: an inline callable invoked positionally,
//! or a bound target (a named type + method, the framework's stand-in for a
//! controller) whose formal parameters are described explicitly at
//! registration time. Binding at dispatch time is a direct lookup over the
//! descriptor list — no runtime introspection anywhere.

use std::sync::Arc;

use crate::error::{BoxError, Error};
use crate::extract::{Snapshot, Value};

type InlineFn = Arc<dyn Fn(&[Value]) -> Result<(), BoxError> + Send + Sync + 'static>;
type BoundFn = Arc<dyn Fn(Vec<Arg>) -> Result<(), BoxError> + Send + Sync + 'static>;

/// One bound argument handed to a [`Action::Bound`] call.
#[derive(Clone, Debug)]
pub enum Arg {
    /// The whole parameter snapshot, for a formal parameter that asked for it.
    Snapshot(Snapshot),
    /// A single parameter value.
    Value(Value),
}

impl Arg {
    pub fn as_snapshot(&self) -> Option<&Snapshot> {
        match self {
            Self::Snapshot(s) => Some(s),
            Self::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(v) => Some(v),
            Self::Snapshot(_) => None,
        }
    }
}

/// Where a formal parameter's argument comes from.
#[derive(Clone, Debug)]
pub enum Bind {
    /// Inject the full [`Snapshot`].
    Snapshot,
    /// Look the parameter's name up in the snapshot; missing is fatal.
    Named,
    /// Look the name up; fall back to this value when absent.
    Default(Value),
}

/// One formal parameter of a bound target, described at registration time.
#[derive(Clone, Debug)]
pub struct ParamSpec {
    pub(crate) name: String,
    pub(crate) bind: Bind,
}

impl ParamSpec {
    /// A parameter that receives the whole snapshot.
    pub fn snapshot(name: impl Into<String>) -> Self {
        Self { name: name.into(), bind: Bind::Snapshot }
    }

    /// A required parameter bound by name.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), bind: Bind::Named }
    }

    /// A parameter bound by name, with a default when the request omits it.
    pub fn default_to(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self { name: name.into(), bind: Bind::Default(value.into()) }
    }
}

/// A route's action.
#[derive(Clone)]
pub enum Action {
    /// An inline callable, invoked with the route's parameter values in the
    /// route's declared name order.
    Inline(InlineFn),
    /// A named target method with an explicit parameter-descriptor list.
    Bound {
        target: String,
        method: String,
        params: Vec<ParamSpec>,
        call: BoundFn,
    },
}

impl Action {
    pub fn inline(
        f: impl Fn(&[Value]) -> Result<(), BoxError> + Send + Sync + 'static,
    ) -> Self {
        Self::Inline(Arc::new(f))
    }

    /// A bound action. `target` and `method` name the callee in dispatch
    /// errors; `params` describes its formal parameters in declaration order.
    pub fn bound(
        target: impl Into<String>,
        method: impl Into<String>,
        params: Vec<ParamSpec>,
        call: impl Fn(Vec<Arg>) -> Result<(), BoxError> + Send + Sync + 'static,
    ) -> Self {
        Self::Bound {
            target: target.into(),
            method: method.into(),
            params,
            call: Arc::new(call),
        }
    }
}

/// Resolves `action` into a call against `snapshot`.
///
/// `order` is the owning route's declared parameter-name order, used for
/// positional inline invocation.
pub(crate) fn invoke(action: &Action, order: &[String], snapshot: &Snapshot) -> Result<(), Error> {
    match action {
        Action::Inline(f) => {
            let args: Vec<Value> = order
                .iter()
                .filter_map(|name| snapshot.get(name).cloned())
                .collect();
            f(&args).map_err(|source| Error::Action { source })
        }
        Action::Bound { target, method, params, call } => {
            let mut args = Vec::with_capacity(params.len());
            for param in params {
                let arg = match &param.bind {
                    Bind::Snapshot => Arg::Snapshot(snapshot.clone()),
                    Bind::Named => match snapshot.get(&param.name) {
                        Some(value) => Arg::Value(value.clone()),
                        None => {
                            return Err(Error::MissingParameter {
                                parameter: param.name.clone(),
                                target: target.clone(),
                                method: method.clone(),
                            });
                        }
                    },
                    Bind::Default(default) => Arg::Value(
                        snapshot.get(&param.name).cloned().unwrap_or_else(|| default.clone()),
                    ),
                };
                args.push(arg);
            }
            call(args).map_err(|source| Error::Action { source })
        }
    }
}
