//! Supported HTTP methods as a closed enumeration

use std::fmt;

/// A request method the router can dispatch on
///
/// Extension and rarely used methods (`TRACE`, `CONNECT`, custom tokens) have no variant;
/// they only reach routes that accept every method, and per-method maps send them to
/// their default branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub const ALL: [Self; 7] = [
        Self::Get,
        Self::Head,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Delete,
        Self::Options,
    ];

    /// Map a wire method onto the closed set, `None` if unsupported
    pub fn from_http(method: &hyper::Method) -> Option<Self> {
        match *method {
            hyper::Method::GET => Some(Self::Get),
            hyper::Method::HEAD => Some(Self::Head),
            hyper::Method::POST => Some(Self::Post),
            hyper::Method::PUT => Some(Self::Put),
            hyper::Method::PATCH => Some(Self::Patch),
            hyper::Method::DELETE => Some(Self::Delete),
            hyper::Method::OPTIONS => Some(Self::Options),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        }
    }

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of methods; the empty set accepts every method
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MethodSet(u8);

impl MethodSet {
    pub const ANY: Self = Self(0);

    pub fn of(methods: &[Method]) -> Self {
        methods.iter().fold(Self::ANY, |set, m| set.with(*m))
    }

    #[must_use]
    pub const fn with(self, method: Method) -> Self {
        Self(self.0 | method.bit())
    }

    pub const fn is_any(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Method> {
        Method::ALL
            .into_iter()
            .filter(move |m| self.0 & m.bit() != 0)
    }

    /// Value for an `Allow` header
    pub fn allow_header(self) -> String {
        if self.is_any() {
            return Method::ALL.map(Method::as_str).join(", ");
        }
        self.iter().map(Method::as_str).collect::<Vec<_>>().join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http() {
        assert_eq!(Method::from_http(&hyper::Method::GET), Some(Method::Get));
        assert_eq!(Method::from_http(&hyper::Method::PATCH), Some(Method::Patch));
        assert_eq!(Method::from_http(&hyper::Method::TRACE), None);
        let custom = hyper::Method::from_bytes(b"PURGE").unwrap();
        assert_eq!(Method::from_http(&custom), None);
    }

    #[test]
    fn test_empty_set_is_any() {
        assert!(MethodSet::ANY.is_any());
        assert_eq!(MethodSet::ANY.iter().count(), 0);
        assert_eq!(
            MethodSet::ANY.allow_header(),
            "GET, HEAD, POST, PUT, PATCH, DELETE, OPTIONS"
        );
    }

    #[test]
    fn test_set_membership() {
        let set = MethodSet::of(&[Method::Post, Method::Get]);
        assert!(!set.is_any());
        assert_eq!(set.iter().collect::<Vec<_>>(), [Method::Get, Method::Post]);
        assert_eq!(set.allow_header(), "GET, POST");
    }
}
