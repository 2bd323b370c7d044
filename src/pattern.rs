//! Path-template compilation and matching.
//!
//! A template like `/users/{id}/posts/{slug:[a-z-]+}` compiles once, at
//! registration time, into an anchored regular expression. Each placeholder
//! becomes a named capture group — `[^/]+` by default, or the custom class
//! after the `:`. Matching a concrete path yields the captured substrings
//! zipped to the placeholder names in declaration order.
//!
//! A template with no placeholders matches only its literal path (literal
//! portions are regex-escaped, so `/users.csv` does not match `/usersXcsv`).

use regex::Regex;

/// A template that failed to compile.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("unclosed `{{` in template")]
    UnclosedBrace,
    #[error("placeholder has no name")]
    EmptyName,
    #[error("invalid placeholder name `{0}`")]
    BadName(String),
    #[error("duplicate placeholder `{0}`")]
    DuplicateName(String),
    #[error("placeholder regex did not compile: {0}")]
    Regex(#[from] regex::Error),
}

/// A compiled path template.
#[derive(Debug)]
pub struct PathPattern {
    template: String,
    regex: Regex,
    names: Vec<String>,
}

impl PathPattern {
    /// Compiles a template. Placeholders are `{name}` or `{name:regex}`.
    ///
    /// Braces inside a custom regex (quantifiers like `[a-z]{2,4}`) are
    /// tolerated — the scanner tracks brace depth, so only the outermost `}`
    /// closes the placeholder.
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let mut pattern = String::with_capacity(template.len() + 8);
        pattern.push('^');
        let mut names: Vec<String> = Vec::new();
        let mut literal = String::new();

        let mut chars = template.chars();
        while let Some(c) = chars.next() {
            if c != '{' {
                literal.push(c);
                continue;
            }

            pattern.push_str(&regex::escape(&literal));
            literal.clear();

            let mut inner = String::new();
            let mut depth = 1usize;
            for c in chars.by_ref() {
                match c {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            break;
                        }
                    }
                    _ => {}
                }
                inner.push(c);
            }
            if depth != 0 {
                return Err(PatternError::UnclosedBrace);
            }

            let (name, custom) = match inner.split_once(':') {
                Some((n, c)) => (n, Some(c)),
                None => (inner.as_str(), None),
            };
            if name.is_empty() {
                return Err(PatternError::EmptyName);
            }
            if !is_valid_name(name) {
                return Err(PatternError::BadName(name.to_owned()));
            }
            if names.iter().any(|n| n == name) {
                return Err(PatternError::DuplicateName(name.to_owned()));
            }

            // Named groups keep capture retrieval stable even when a custom
            // regex contains groups of its own.
            pattern.push_str("(?P<");
            pattern.push_str(name);
            pattern.push('>');
            pattern.push_str(custom.unwrap_or("[^/]+"));
            pattern.push(')');
            names.push(name.to_owned());
        }
        pattern.push_str(&regex::escape(&literal));
        pattern.push('$');

        Ok(Self {
            template: template.to_owned(),
            regex: Regex::new(&pattern)?,
            names,
        })
    }

    /// The original template text.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Placeholder names in declaration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Matches `path` against the compiled template.
    ///
    /// Returns the placeholder values in declaration order, or `None` when
    /// the path does not match.
    pub fn captures(&self, path: &str) -> Option<Vec<(String, String)>> {
        let caps = self.regex.captures(path)?;
        Some(
            self.names
                .iter()
                .map(|name| {
                    let value = caps
                        .name(name)
                        .map(|m| m.as_str().to_owned())
                        .unwrap_or_default();
                    (name.clone(), value)
                })
                .collect(),
        )
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
