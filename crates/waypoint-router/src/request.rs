//! HTTP request type.

use std::collections::HashMap;

use crate::headers::Headers;

/// HTTP request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// HEAD method
    Head,
    /// OPTIONS method
    Options,
    /// GET method
    Get,
    /// POST method
    Post,
    /// PUT method
    Put,
    /// PATCH method
    Patch,
    /// DELETE method
    Delete,
}

impl Method {
    /// Every routable method, in table order.
    pub const ALL: [Method; 7] = [
        Self::Head,
        Self::Options,
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Delete,
    ];

    /// The methods the `CRUD` macro expands to.
    pub const CRUD: [Method; 5] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Delete,
    ];

    /// Parses a method from a string.
    ///
    /// Matching is exact: request methods are case-sensitive.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "HEAD" => Some(Self::Head),
            "OPTIONS" => Some(Self::Options),
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "PATCH" => Some(Self::Patch),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }

    /// Returns the method as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Position of this method in a per-method table.
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Path parameters extracted from the URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    params: HashMap<String, String>,
}

impl PathParams {
    /// Creates new empty path params.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.insert(key.into(), value.into());
    }

    /// Gets a parameter value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Parses a parameter as a specific type.
    pub fn parse<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Copies every parameter of `other` over this set.
    pub fn extend(&mut self, other: PathParams) {
        self.params.extend(other.params);
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns true if there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Returns an iterator over the parameters.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// An already-parsed HTTP request.
///
/// The method is kept as received so that unsupported verbs can be answered
/// with `405` instead of failing to parse.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method, as received.
    pub method: String,
    /// Request path, without the query string.
    pub path: String,
    /// Raw query string, without the leading `?`.
    pub query: Option<String>,
    /// Request headers.
    pub headers: Headers,
    /// Request body.
    pub body: Vec<u8>,
}

impl Request {
    /// Creates a new request. A `?query` suffix on `target` is split off.
    pub fn new(method: impl Into<String>, target: impl AsRef<str>) -> Self {
        let target = target.as_ref();
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), Some(query.to_string())),
            None => (target.to_string(), None),
        };
        Self {
            method: method.into(),
            path,
            query,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// Creates a GET request.
    pub fn get(target: impl AsRef<str>) -> Self {
        Self::new("GET", target)
    }

    /// Creates a POST request.
    pub fn post(target: impl AsRef<str>) -> Self {
        Self::new("POST", target)
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(key, value);
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Gets a header value.
    pub fn get_header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    /// Returns the raw query string.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Returns the body as a string.
    pub fn body_string(&self) -> Option<String> {
        String::from_utf8(self.body.clone()).ok()
    }

    /// Splits the path into trie lookup segments.
    ///
    /// The leading `/` is dropped and a single trailing `/` is ignored unless
    /// the path is the root, which yields one empty segment.
    pub(crate) fn segments(&self) -> Vec<&str> {
        path_segments(&self.path)
    }
}

pub(crate) fn path_segments(path: &str) -> Vec<&str> {
    let path = if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    };
    path.strip_prefix('/').unwrap_or(path).split('/').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parsing() {
        assert_eq!(Method::from_str("GET"), Some(Method::Get));
        assert_eq!(Method::from_str("OPTIONS"), Some(Method::Options));
        assert_eq!(Method::from_str("TRACE"), None);
        assert_eq!(Method::from_str("get"), None);
    }

    #[test]
    fn test_method_table_order() {
        for (i, method) in Method::ALL.iter().enumerate() {
            assert_eq!(method.index(), i);
        }
    }

    #[test]
    fn test_path_params() {
        let mut params = PathParams::new();
        params.insert("id", "123");
        params.insert("name", "test");

        assert_eq!(params.get("id"), Some("123"));
        assert_eq!(params.parse::<i64>("id"), Some(123));
        assert_eq!(params.get("missing"), None);
    }

    #[test]
    fn test_request_builder() {
        let req = Request::get("/users?page=1").header("Content-Type", "application/json");

        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/users");
        assert_eq!(req.query(), Some("page=1"));
        assert_eq!(req.get_header("content-type"), Some("application/json"));
    }

    #[test]
    fn test_segments() {
        assert_eq!(Request::get("/").segments(), vec![""]);
        assert_eq!(Request::get("/users/42").segments(), vec!["users", "42"]);
        assert_eq!(Request::get("/users/42/").segments(), vec!["users", "42"]);
        assert_eq!(Request::get("/a//b").segments(), vec!["a", "", "b"]);
    }
}
