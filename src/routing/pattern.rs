//! Route template compilation and matching.
//!
//! A template such as `/tasks/:id/complete` compiles into an ordered list of
//! literal and parameter segments. Matching works on the raw request target:
//! everything from the first `?` on is captured as the query string.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        match raw.strip_prefix(':') {
            Some(name) if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphabetic()) => {
                Self::Param(name.to_string())
            }
            _ => Self::Literal(raw.to_string()),
        }
    }
}

/// Result of a successful match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteMatch {
    /// Parameter name -> value taken from the path
    pub params: HashMap<String, String>,
    /// Trailing query string including its leading `?`
    pub query: Option<String>,
}

/// Compiled route template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    template: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Compile `template`. Segments written as `:name` (ASCII letters only)
    /// become parameters; anything else is matched literally.
    pub fn compile(template: &str) -> Self {
        let segments = split_path(template).map(Segment::parse).collect();
        Self {
            template: template.to_string(),
            segments,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    #[allow(dead_code)]
    pub fn test(&self, target: &str) -> bool {
        self.match_target(target).is_some()
    }

    /// Match a request target (path plus optional query string)
    pub fn match_target(&self, target: &str) -> Option<RouteMatch> {
        let (path, query) = match target.find('?') {
            Some(index) => (&target[..index], Some(&target[index..])),
            None => (target, None),
        };
        if !path.starts_with('/') {
            return None;
        }

        let mut parts = split_path(path);
        let mut params = HashMap::new();
        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(literal) if literal == part => {}
                Segment::Param(name) if is_param_value(part) => {
                    params.insert(name.clone(), part.to_string());
                }
                _ => return None,
            }
        }
        if parts.next().is_some() {
            return None;
        }

        Some(RouteMatch {
            params,
            query: query.map(ToString::to_string),
        })
    }
}

fn split_path(path: &str) -> std::str::Split<'_, char> {
    path.strip_prefix('/').unwrap_or(path).split('/')
}

/// Parameter values are limited to lowercase ids: `[a-z0-9_-]+`
fn is_param_value(value: &str) -> bool {
    !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_template() {
        let pattern = RoutePattern::compile("/tasks");
        assert!(pattern.test("/tasks"));
        assert!(!pattern.test("/tasks/"));
        assert!(!pattern.test("/tasks/populate"));
        assert!(!pattern.test("/task"));
        assert!(!pattern.test("tasks"));
    }

    #[test]
    fn test_query_capture() {
        let pattern = RoutePattern::compile("/tasks");

        let matched = pattern.match_target("/tasks?search=milk&page=2").unwrap();
        assert!(matched.params.is_empty());
        assert_eq!(matched.query.as_deref(), Some("?search=milk&page=2"));

        let matched = pattern.match_target("/tasks").unwrap();
        assert_eq!(matched.query, None);

        let matched = pattern.match_target("/tasks?").unwrap();
        assert_eq!(matched.query.as_deref(), Some("?"));
    }

    #[test]
    fn test_param_extraction() {
        let pattern = RoutePattern::compile("/tasks/:id/complete");
        let id = "0b7c4a52-5f43-4e8a-9b1d-2f0d7e1c9a10";

        let matched = pattern
            .match_target(&format!("/tasks/{id}/complete?x=1"))
            .unwrap();
        assert_eq!(matched.params.get("id").map(String::as_str), Some(id));
        assert_eq!(matched.query.as_deref(), Some("?x=1"));

        assert!(!pattern.test(&format!("/tasks/{id}")));
        assert!(!pattern.test("/tasks//complete"));
    }

    #[test]
    fn test_param_value_charset() {
        let pattern = RoutePattern::compile("/tasks/:id");
        assert!(pattern.test("/tasks/abc_123-x"));
        assert!(!pattern.test("/tasks/ABC"));
        assert!(!pattern.test("/tasks/a.b"));
        assert!(!pattern.test("/tasks/a%20b"));
    }

    #[test]
    fn test_invalid_param_names_are_literal() {
        let pattern = RoutePattern::compile("/files/:/:v1");
        assert!(pattern.test("/files/:/:v1"));
        assert!(!pattern.test("/files/a/b"));
        assert_eq!(pattern.template(), "/files/:/:v1");
    }
}
