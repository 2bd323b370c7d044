//! Full-pipeline dispatch tests through the public API.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use http::StatusCode;
use flicker::{
    Action, Buffered, Error, Method, Outcome, ParamSpec, RawRequest, Responder, RouteOptions,
    Router, Value, desanitize,
};

const CLIENT: &str = "203.0.113.9";

fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
    let c = Arc::new(AtomicUsize::new(0));
    (Arc::clone(&c), c)
}

#[test]
fn pattern_route_invokes_action_with_captures() {
    let (calls, seen) = counter();
    let app = Router::new().at(
        Method::Get,
        "/users/{id}/posts/{slug:[a-z-]+}",
        Action::inline(move |args| {
            assert_eq!(args[0], Value::Str("42".to_owned()));
            assert_eq!(args[1], Value::Str("hello-world".to_owned()));
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
    );

    let mut out = Buffered::new();
    let req = RawRequest::new("GET", "/users/42/posts/hello-world");
    assert_eq!(app.dispatch(&req, CLIENT, &mut out).unwrap(), Outcome::Handled);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Uppercase violates the slug pattern: no match, no invocation.
    let req = RawRequest::new("GET", "/users/42/posts/Hello");
    assert_eq!(app.dispatch(&req, CLIENT, &mut out).unwrap(), Outcome::NotFound);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn unmatched_request_emits_404() {
    let app = Router::new().at(Method::Get, "/users/{id}", Action::inline(|_| Ok(())));
    let mut out = Buffered::new();
    let req = RawRequest::new("GET", "/posts/1");
    assert_eq!(app.dispatch(&req, CLIENT, &mut out).unwrap(), Outcome::NotFound);
    assert_eq!(out.status(), StatusCode::NOT_FOUND);
}

#[test]
fn list_route_requires_exact_parameter_set() {
    let (calls, seen) = counter();
    let app = Router::new().on(
        Method::Get,
        &["name", "age"],
        Action::inline(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
    );
    let mut out = Buffered::new();

    // Missing `age`.
    let req = RawRequest::new("GET", "/").with_query("name=Al");
    let err = app.dispatch(&req, CLIENT, &mut out).unwrap_err();
    match err {
        Error::ParamMismatch { missing, unexpected } => {
            assert_eq!(missing, vec!["age".to_owned()]);
            assert!(unexpected.is_empty());
        }
        other => panic!("unexpected error: {other}"),
    }

    // Extra `extra`.
    let req = RawRequest::new("GET", "/").with_query("name=Al&age=9&extra=x");
    let err = app.dispatch(&req, CLIENT, &mut out).unwrap_err();
    match err {
        Error::ParamMismatch { missing, unexpected } => {
            assert!(missing.is_empty());
            assert_eq!(unexpected, vec!["extra".to_owned()]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // Exact set: the action runs, with values in declared order.
    let req = RawRequest::new("GET", "/").with_query("age=9&name=Al");
    assert_eq!(app.dispatch(&req, CLIENT, &mut out).unwrap(), Outcome::Handled);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn get_query_integers_are_coerced() {
    let app = Router::new().on(
        Method::Get,
        &["page", "name"],
        Action::inline(|args| {
            assert_eq!(args[0], Value::Int(5));
            assert_eq!(args[1], Value::Str("abc".to_owned()));
            Ok(())
        }),
    );
    let mut out = Buffered::new();
    let req = RawRequest::new("GET", "/").with_query("page=5&name=abc");
    assert_eq!(app.dispatch(&req, CLIENT, &mut out).unwrap(), Outcome::Handled);
}

#[test]
fn query_values_reach_the_action_sanitized() {
    let app = Router::new().on(
        Method::Get,
        &["q"],
        Action::inline(|args| {
            let Value::Str(s) = &args[0] else {
                panic!("expected a string");
            };
            assert!(!s.contains('<'));
            assert_eq!(desanitize(s), "<script>alert(1)</script>");
            Ok(())
        }),
    );
    let mut out = Buffered::new();
    let req = RawRequest::new("GET", "/").with_query("q=%3Cscript%3Ealert(1)%3C%2Fscript%3E");
    assert_eq!(app.dispatch(&req, CLIENT, &mut out).unwrap(), Outcome::Handled);
}

#[test]
fn rate_limited_route_admits_then_refuses() {
    let (calls, seen) = counter();
    let app = Router::new().at_with(
        Method::Get,
        "/limited/{id}",
        Action::inline(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
        RouteOptions::new().rate(1),
    );
    let mut out = Buffered::new();
    let req = RawRequest::new("GET", "/limited/1");

    assert_eq!(app.dispatch(&req, CLIENT, &mut out).unwrap(), Outcome::Handled);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let mut out = Buffered::new();
    assert_eq!(
        app.dispatch(&req, CLIENT, &mut out).unwrap(),
        Outcome::RateLimited
    );
    assert_eq!(out.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(out.header_value("retry-after").is_some());
    // The refused request produced no new side effect.
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // A different client has its own budget.
    let mut out = Buffered::new();
    assert_eq!(
        app.dispatch(&req, "198.51.100.7", &mut out).unwrap(),
        Outcome::Handled
    );
}

#[test]
fn middleware_runs_before_the_action() {
    let order = Arc::new(std::sync::Mutex::new(Vec::new()));
    let from_mw = Arc::clone(&order);
    let from_action = Arc::clone(&order);
    let app = Router::new()
        .middleware("auth", move || {
            from_mw.lock().unwrap().push("middleware");
            Ok(())
        })
        .at_with(
            Method::Get,
            "/private",
            Action::inline(move |_| {
                from_action.lock().unwrap().push("action");
                Ok(())
            }),
            RouteOptions::new().middleware("auth"),
        );
    let mut out = Buffered::new();
    let req = RawRequest::new("GET", "/private");
    assert_eq!(app.dispatch(&req, CLIENT, &mut out).unwrap(), Outcome::Handled);
    assert_eq!(*order.lock().unwrap(), vec!["middleware", "action"]);
}

#[test]
fn unregistered_middleware_is_fatal_and_blocks_the_action() {
    let (calls, seen) = counter();
    let app = Router::new().at_with(
        Method::Get,
        "/private",
        Action::inline(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
        RouteOptions::new().middleware("auth"),
    );
    let mut out = Buffered::new();
    let req = RawRequest::new("GET", "/private");
    let err = app.dispatch(&req, CLIENT, &mut out).unwrap_err();
    assert!(matches!(err, Error::UnknownMiddleware(n) if n == "auth"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn failing_middleware_propagates() {
    let app = Router::new()
        .middleware("auth", || Err("no session".into()))
        .at_with(
            Method::Get,
            "/private",
            Action::inline(|_| Ok(())),
            RouteOptions::new().middleware("auth"),
        );
    let mut out = Buffered::new();
    let req = RawRequest::new("GET", "/private");
    let err = app.dispatch(&req, CLIENT, &mut out).unwrap_err();
    assert!(matches!(err, Error::Middleware { name, .. } if name == "auth"));
}

#[test]
fn route_without_middleware_runs_bare() {
    let (calls, seen) = counter();
    let app = Router::new().at(
        Method::Get,
        "/public",
        Action::inline(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
    );
    let mut out = Buffered::new();
    let req = RawRequest::new("GET", "/public");
    assert_eq!(app.dispatch(&req, CLIENT, &mut out).unwrap(), Outcome::Handled);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn bound_action_binds_snapshot_named_and_default() {
    let app = Router::new().at(
        Method::Get,
        "/users/{id}",
        Action::bound(
            "UserController",
            "show",
            vec![
                ParamSpec::snapshot("request"),
                ParamSpec::named("id"),
                ParamSpec::default_to("page", 1),
            ],
            |args| {
                let snapshot = args[0].as_snapshot().unwrap();
                assert!(snapshot.contains("id"));
                assert_eq!(args[1].as_value(), Some(&Value::Str("7".to_owned())));
                assert_eq!(args[2].as_value(), Some(&Value::Int(1)));
                Ok(())
            },
        ),
    );
    let mut out = Buffered::new();
    let req = RawRequest::new("GET", "/users/7");
    assert_eq!(app.dispatch(&req, CLIENT, &mut out).unwrap(), Outcome::Handled);
}

#[test]
fn bound_action_missing_parameter_names_the_target() {
    let app = Router::new().on(
        Method::Post,
        &["name"],
        Action::bound(
            "UserController",
            "create",
            vec![ParamSpec::named("name"), ParamSpec::named("email")],
            |_| Ok(()),
        ),
    );
    let mut out = Buffered::new();
    let req = RawRequest::new("POST", "/users").with_body(b"name=al".to_vec());
    let err = app.dispatch(&req, CLIENT, &mut out).unwrap_err();
    match err {
        Error::MissingParameter { parameter, target, method } => {
            assert_eq!(parameter, "email");
            assert_eq!(target, "UserController");
            assert_eq!(method, "create");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn head_dispatch_truncates_the_body() {
    let app = Router::new().on(
        Method::Head,
        &[],
        Action::inline(|_| Ok(())),
    );
    let mut out = Buffered::new();
    out.write(b"buffered by the host before dispatch");
    let req = RawRequest::new("HEAD", "/");
    assert_eq!(app.dispatch(&req, CLIENT, &mut out).unwrap(), Outcome::Handled);
    assert!(out.body().is_empty());
}

#[test]
fn first_matching_pattern_wins_in_declaration_order() {
    let (first_calls, first) = counter();
    let (second_calls, second) = counter();
    let app = Router::new()
        .at(
            Method::Get,
            "/users/{id}",
            Action::inline(move |_| {
                first.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        )
        .at(
            Method::Get,
            "/users/{name:[a-z]+}",
            Action::inline(move |_| {
                second.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        );
    let mut out = Buffered::new();
    let req = RawRequest::new("GET", "/users/alice");
    assert_eq!(app.dispatch(&req, CLIENT, &mut out).unwrap(), Outcome::Handled);
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn method_override_on_body_methods_is_refused() {
    let app = Router::new().at(
        Method::Delete,
        "/users/{id}",
        Action::inline(|_| Ok(())),
    );
    let mut out = Buffered::new();
    // The route matches on path shape; the asserted method gives it away.
    let req = RawRequest::new("POST", "/users/7").with_body(b"{}".to_vec());
    let err = app.dispatch(&req, CLIENT, &mut out).unwrap_err();
    assert!(matches!(err, Error::MethodMismatch { .. }));
}

#[test]
fn rate_gate_policy_is_reachable_by_hosts() {
    // A host consulting the gate directly, outside any dispatch — e.g. to
    // surface quota headers on admitted responses.
    let store = flicker::MemoryCounters::new();
    assert!(flicker::rate::admit(&store, "c:r", 2, 60, 1000));
    assert_eq!(flicker::rate::remaining(&store, "c:r", 2, 60, 1001), 1);
    assert!(flicker::rate::admit(&store, "c:r", 2, 60, 1002));
    assert!(!flicker::rate::admit(&store, "c:r", 2, 60, 1003));
    assert_eq!(flicker::rate::retry_after(&store, "c:r", 60, 1010), 50);
    assert_eq!(flicker::rate::remaining(&store, "c:r", 2, 60, 1060), 2);
}

#[test]
fn json_put_parameters_reach_the_action() {
    let app = Router::new().at(
        Method::Put,
        "/users/{id}",
        Action::bound(
            "UserController",
            "update",
            vec![ParamSpec::named("id"), ParamSpec::named("name")],
            |args| {
                assert_eq!(args[0].as_value(), Some(&Value::Str("7".to_owned())));
                assert_eq!(args[1].as_value(), Some(&Value::Str("al".to_owned())));
                Ok(())
            },
        ),
    );
    let mut out = Buffered::new();
    let req = RawRequest::new("PUT", "/users/7")
        .with_content_type("application/json")
        .with_body(br#"{"name":"al"}"#.to_vec());
    assert_eq!(app.dispatch(&req, CLIENT, &mut out).unwrap(), Outcome::Handled);
}
