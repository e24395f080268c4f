//! Route pattern compilation and path matching
//!
//! Pattern syntax: `/literal/:param/*wildcard`. A wildcard may also be written
//! `:name*`. Both pattern and path are split on `/` after trimming leading and
//! trailing slashes, so `/admin`, `/admin/` and `admin` are the same pattern.

use crate::error::PatternError;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// One compiled segment of a route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the path segment exactly (case-sensitive)
    Literal(String),
    /// Matches any non-empty path segment
    Param(String),
    /// Matches the rest of the path, zero or more segments
    Wildcard(String),
}

/// Values captured from a matched path, keyed by capture name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(HashMap<String, String>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn insert(&mut self, name: &str, value: String) {
        self.0.insert(name.to_string(), value);
    }
}

/// A compiled route pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    source: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Compile a pattern string
    ///
    /// Fails on an empty pattern, a wildcard anywhere but last, an empty inner segment,
    /// a capture without a name, or a capture name used twice. `/` is valid and
    /// matches only the root path.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        if pattern.trim().is_empty() {
            return Err(PatternError::Empty);
        }

        let raw = split_segments(pattern);
        let mut segments = Vec::with_capacity(raw.len());
        let mut seen: Vec<&str> = Vec::new();

        for (index, part) in raw.iter().enumerate() {
            let segment = parse_segment(pattern, index, part)?;
            if let Segment::Param(name) | Segment::Wildcard(name) = &segment {
                if seen.contains(&name.as_str()) {
                    return Err(PatternError::DuplicateCapture {
                        pattern: pattern.to_string(),
                        name: name.clone(),
                    });
                }
                seen.push(capture_name(part));
            }
            if let Segment::Wildcard(name) = &segment {
                if index + 1 != raw.len() {
                    return Err(PatternError::WildcardNotLast {
                        pattern: pattern.to_string(),
                        name: name.clone(),
                    });
                }
            }
            segments.push(segment);
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// Match a request path, returning the captured parameters on success
    pub fn matches(&self, path: &str) -> Option<Params> {
        let parts = split_segments(path);
        let mut params = Params::new();

        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(literal) => {
                    if *parts.get(index)? != literal.as_str() {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = parts.get(index).filter(|v| !v.is_empty())?;
                    params.insert(name, (*value).to_string());
                }
                Segment::Wildcard(name) => {
                    let rest = parts.get(index..).map(|s| s.join("/")).unwrap_or_default();
                    params.insert(name, rest);
                    return Some(params);
                }
            }
        }

        (parts.len() == self.segments.len()).then_some(params)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn has_wildcard(&self) -> bool {
        matches!(self.segments.last(), Some(Segment::Wildcard(_)))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

impl FromStr for RoutePattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn split_segments(path: &str) -> Vec<&str> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        Vec::new()
    } else {
        trimmed.split('/').collect()
    }
}

fn capture_name(part: &str) -> &str {
    part.trim_start_matches([':', '*']).trim_end_matches('*')
}

fn parse_segment(pattern: &str, index: usize, part: &str) -> Result<Segment, PatternError> {
    let unnamed = || PatternError::UnnamedCapture {
        pattern: pattern.to_string(),
        index,
    };

    if part.is_empty() {
        return Err(PatternError::EmptySegment {
            pattern: pattern.to_string(),
            index,
        });
    }

    let segment = if let Some(name) = part.strip_prefix('*') {
        Segment::Wildcard(name.to_string())
    } else if let Some(name) = part.strip_prefix(':') {
        match name.strip_suffix('*') {
            Some(name) => Segment::Wildcard(name.to_string()),
            None => Segment::Param(name.to_string()),
        }
    } else {
        return Ok(Segment::Literal(part.to_string()));
    };

    let nameless = match &segment {
        Segment::Param(name) | Segment::Wildcard(name) => name.is_empty(),
        Segment::Literal(_) => false,
    };
    if nameless {
        Err(unnamed())
    } else {
        Ok(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(p: &str) -> RoutePattern {
        RoutePattern::compile(p).unwrap()
    }

    #[test]
    fn test_compile_segments() {
        let pattern = compile("/api/articles/:id/*rest");
        assert_eq!(
            pattern.segments(),
            &[
                Segment::Literal("api".to_string()),
                Segment::Literal("articles".to_string()),
                Segment::Param("id".to_string()),
                Segment::Wildcard("rest".to_string()),
            ]
        );
        assert!(pattern.has_wildcard());
    }

    #[test]
    fn test_colon_star_is_wildcard() {
        let pattern = compile("/admin/:filename*");
        assert_eq!(
            pattern.segments().last(),
            Some(&Segment::Wildcard("filename".to_string()))
        );
    }

    #[test]
    fn test_compile_errors() {
        assert_eq!(RoutePattern::compile(""), Err(PatternError::Empty));
        assert_eq!(RoutePattern::compile("  "), Err(PatternError::Empty));
        assert!(matches!(
            RoutePattern::compile("/a/*rest/b"),
            Err(PatternError::WildcardNotLast { .. })
        ));
        assert!(matches!(
            RoutePattern::compile("/a/:/b"),
            Err(PatternError::UnnamedCapture { index: 1, .. })
        ));
        assert!(matches!(
            RoutePattern::compile("/a/*"),
            Err(PatternError::UnnamedCapture { .. })
        ));
        assert!(matches!(
            RoutePattern::compile("/a//b"),
            Err(PatternError::EmptySegment { index: 1, .. })
        ));
        assert!(matches!(
            RoutePattern::compile("/:id/x/:id"),
            Err(PatternError::DuplicateCapture { .. })
        ));
    }

    #[test]
    fn test_root_pattern() {
        let root = compile("/");
        assert!(root.matches("/").is_some());
        assert!(root.matches("").is_some());
        assert!(root.matches("/articles").is_none());
    }

    #[test]
    fn test_param_capture() {
        let pattern = compile("/articles/:id");
        let params = pattern.matches("/articles/42").unwrap();
        assert_eq!(params.get("id"), Some("42"));
        assert_eq!(params.len(), 1);
        assert!(pattern.matches("/articles/42/edit").is_none());
        assert!(pattern.matches("/articles").is_none());
    }

    #[test]
    fn test_param_rejects_empty_segment() {
        let pattern = compile("/a/:id/b");
        assert!(pattern.matches("/a//b").is_none());
    }

    #[test]
    fn test_literal_is_case_sensitive() {
        let pattern = compile("/Admin");
        assert!(pattern.matches("/Admin").is_some());
        assert!(pattern.matches("/admin").is_none());
    }

    #[test]
    fn test_wildcard_capture() {
        let pattern = compile("/admin/*filename");
        assert_eq!(
            pattern.matches("/admin/").unwrap().get("filename"),
            Some("")
        );
        assert_eq!(pattern.matches("/admin").unwrap().get("filename"), Some(""));
        assert_eq!(
            pattern.matches("/admin/css/app.css").unwrap().get("filename"),
            Some("css/app.css")
        );
        assert!(pattern.matches("/other/app.css").is_none());
    }

    #[test]
    fn test_segment_count_must_match_without_wildcard() {
        let patterns = ["/", "/a", "/a/:b", "/a/:b/c", "/:x/:y/:z/:w"];
        let paths = ["/", "/a", "/a/1", "/a/1/c", "/a/1/c/d", "/a/1/c/d/e"];
        for pattern in patterns {
            let compiled = compile(pattern);
            for path in paths {
                let path_len = split_segments(path).len();
                if path_len != compiled.segments().len() {
                    assert!(
                        compiled.matches(path).is_none(),
                        "{pattern} should not match {path}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_trailing_slash_normalized() {
        let pattern = compile("/api/articles/");
        assert!(pattern.matches("/api/articles").is_some());
        assert!(pattern.matches("/api/articles/").is_some());
    }
}
