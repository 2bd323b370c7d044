//! Minimal flicker example — a router embedded in a toy host loop.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! The "host runtime" here is just a list of canned requests; a real host
//! would parse the wire, call `dispatch` once per message, and flush the
//! responder.

use flicker::{
    Action, Buffered, Method, Outcome, ParamSpec, RawRequest, RouteOptions, Router, Value,
};

fn main() {
    tracing_subscriber::fmt::init();

    let app = Router::new()
        .middleware("auth", || {
            // Real app: check the session, emit a redirect and bail on failure.
            Ok(())
        })
        .at(Method::Get, "/users/{id}", Action::inline(|args| {
            println!("get_user id={}", args[0]);
            Ok(())
        }))
        .at_with(
            Method::Get,
            "/reports/{year:[0-9]{4}}",
            Action::bound(
                "ReportController",
                "yearly",
                vec![ParamSpec::named("year"), ParamSpec::default_to("format", "html")],
                |args| {
                    println!(
                        "yearly_report year={} format={}",
                        args[0].as_value().unwrap(),
                        args[1].as_value().unwrap(),
                    );
                    Ok(())
                },
            ),
            RouteOptions::new().middleware("auth").rate(2),
        )
        .on(Method::Post, &["name", "age"], Action::inline(|args| {
            let (Value::Str(name), Value::Str(age)) = (&args[0], &args[1]) else {
                return Err("form fields are strings".into());
            };
            println!("create_user name={name} age={age}");
            Ok(())
        }));

    let requests = [
        RawRequest::new("GET", "/users/42"),
        RawRequest::new("GET", "/reports/2026"),
        RawRequest::new("GET", "/reports/2026"),
        RawRequest::new("GET", "/reports/2026"), // third within the minute: 429
        RawRequest::new("POST", "/users").with_body(b"name=alice&age=30".to_vec()),
        RawRequest::new("GET", "/nowhere"),
    ];

    for req in &requests {
        let mut out = Buffered::new();
        match app.dispatch(req, "127.0.0.1", &mut out) {
            Ok(Outcome::Handled) => {}
            Ok(Outcome::NotFound) => println!("{} {} -> 404", req.method(), req.path()),
            Ok(Outcome::RateLimited) => println!(
                "{} {} -> 429 retry-after={}",
                req.method(),
                req.path(),
                out.header_value("retry-after").unwrap_or("?"),
            ),
            Err(e) => println!("{} {} -> dispatch error: {e}", req.method(), req.path()),
        }
    }
}
