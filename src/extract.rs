//! Request input extraction and the sanitized parameter snapshot.
//!
//! [`RawRequest`] is the host runtime's view of one inbound message: method
//! string, path, query string, content type, body bytes. Extraction turns it
//! into a flat name → [`Value`] map whose source depends on the route's
//! method:
//!
//! - **GET** — the query string. A value that looks like an integer becomes
//!   [`Value::Int`]; this coercion applies to GET only.
//! - **POST** — a JSON body when the content type says so (a parse failure
//!   is a hard error), otherwise the form-encoded body.
//! - **PUT / DELETE / HEAD / OPTIONS** — always a JSON body, after checking
//!   that the raw request actually asserts the route's method.
//!
//! Every extracted string is HTML-entity-encoded before it enters the
//! [`Snapshot`]; coerced integers pass through unchanged. Application code
//! never sees an unsanitized value.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::Error;
use crate::method::Method;

// ── Sanitization ─────────────────────────────────────────────────────────────

/// HTML-entity-encodes `input` (`&`, `<`, `>`, quotes).
///
/// Applied to every extracted string value. [`desanitize`] reverses it
/// losslessly.
pub fn sanitize(input: &str) -> String {
    html_escape::encode_safe(input).into_owned()
}

/// Decodes HTML entities produced by [`sanitize`].
pub fn desanitize(input: &str) -> String {
    html_escape::decode_html_entities(input).into_owned()
}

// ── RawRequest ───────────────────────────────────────────────────────────────

/// One inbound HTTP message as supplied by the host runtime.
///
/// ```rust
/// use flicker::RawRequest;
///
/// let get = RawRequest::new("GET", "/users").with_query("page=2&name=al");
/// let put = RawRequest::new("PUT", "/users/7")
///     .with_content_type("application/json")
///     .with_body(br#"{"name":"al"}"#.to_vec());
/// ```
pub struct RawRequest {
    method: String,
    path: String,
    query: String,
    content_type: Option<String>,
    body: Vec<u8>,
}

impl RawRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query: String::new(),
            content_type: None,
            body: Vec::new(),
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

// ── Value ────────────────────────────────────────────────────────────────────

/// One extracted parameter value.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Value {
    /// A sanitized string.
    Str(String),
    /// An integer coerced from a GET query value or a JSON number.
    Int(i64),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Str(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

// ── Snapshot ─────────────────────────────────────────────────────────────────

/// The immutable, sanitized parameter mapping handed to application code.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Snapshot {
    values: BTreeMap<String, Value>,
}

impl Snapshot {
    pub(crate) fn from_values(values: BTreeMap<String, Value>) -> Self {
        Self { values }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn str_value(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn int_value(&self, name: &str) -> Option<i64> {
        self.values.get(name).and_then(Value::as_int)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ── Extraction ───────────────────────────────────────────────────────────────

/// Extracts the method-appropriate input from `raw` for a route declared
/// with `route_method`.
pub(crate) fn extract(
    route_method: Method,
    raw: &RawRequest,
) -> Result<BTreeMap<String, Value>, Error> {
    match route_method {
        Method::Get => Ok(parse_query(raw.query())),
        Method::Post => {
            if is_json(raw.content_type()) {
                parse_json_body(raw.body())
            } else {
                Ok(parse_form(raw.body()))
            }
        }
        _ => {
            // Method-override defense: the message must assert the method
            // the route was registered under.
            if raw.method() != route_method.as_str() {
                return Err(Error::MethodMismatch {
                    expected: route_method,
                    asserted: raw.method().to_owned(),
                });
            }
            parse_json_body(raw.body())
        }
    }
}

fn is_json(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| {
        ct.split(';')
            .next()
            .unwrap_or("")
            .trim()
            .eq_ignore_ascii_case("application/json")
    })
}

/// Query-string parsing with the GET-only integer coercion.
fn parse_query(query: &str) -> BTreeMap<String, Value> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), coerce(&v)))
        .collect()
}

/// Form-encoded body parsing. No coercion — every value stays a string.
fn parse_form(body: &[u8]) -> BTreeMap<String, Value> {
    url::form_urlencoded::parse(body)
        .map(|(k, v)| (k.into_owned(), Value::Str(sanitize(&v))))
        .collect()
}

fn coerce(v: &str) -> Value {
    if looks_like_int(v) {
        if let Ok(n) = v.parse::<i64>() {
            return Value::Int(n);
        }
    }
    Value::Str(sanitize(v))
}

fn looks_like_int(v: &str) -> bool {
    let digits = v.strip_prefix('-').unwrap_or(v);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// JSON body parsing. The snapshot is flat, so only an object of scalars is
/// accepted; anything nested is a hard error.
fn parse_json_body(body: &[u8]) -> Result<BTreeMap<String, Value>, Error> {
    let text = std::str::from_utf8(body)
        .map_err(|_| Error::BadBody("body is not valid UTF-8".to_owned()))?;
    if text.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    let json: serde_json::Value =
        serde_json::from_str(text).map_err(|e| Error::BadBody(e.to_string()))?;
    let object = json
        .as_object()
        .ok_or_else(|| Error::BadBody("expected a JSON object".to_owned()))?;

    let mut values = BTreeMap::new();
    for (key, value) in object {
        values.insert(key.clone(), json_scalar(key, value)?);
    }
    Ok(values)
}

fn json_scalar(key: &str, value: &serde_json::Value) -> Result<Value, Error> {
    match value {
        serde_json::Value::String(s) => Ok(Value::Str(sanitize(s))),
        serde_json::Value::Number(n) => Ok(match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::Str(n.to_string()),
        }),
        serde_json::Value::Bool(b) => Ok(Value::Str(b.to_string())),
        _ => Err(Error::BadBody(format!("parameter `{key}` is not a scalar"))),
    }
}
