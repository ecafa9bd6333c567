//! Route pattern compilation.
//!
//! A pattern is `"METHOD /path"`, where `METHOD` is one of the seven verbs,
//! `ALL` (every verb) or `CRUD` (`GET`, `POST`, `PUT`, `PATCH`, `DELETE`).
//! The bare pattern `*` means every verb and every path.
//!
//! Path syntax:
//!
//! ```ignore
//!  Syntax    Matches
//!  literal   exactly that segment
//!  :name     one segment, captured as `name`
//!  *         one segment
//!  **        one or more trailing segments (final segment only)
//!  .*        nothing, or one more segment (final segment only)
//!  .**       nothing, or any number of segments (final segment only)
//! ```

use std::collections::BTreeMap;

use crate::error::{Result, RouterError};
use crate::request::Method;
use crate::tree::{SUPER_GLOB, WILDCARD};

/// The pattern matching every method and path.
pub const ANY: &str = "*";

const CURRENT_GLOB: &str = ".*";
const CURRENT_SUPER_GLOB: &str = ".**";

/// A named parameter and the request segment it captures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: String,
    pub index: usize,
}

/// One compiled trie registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitUrl {
    /// Concrete method this registration applies to.
    pub method: Method,
    /// The pattern as written, including the method token.
    pub pattern: String,
    /// The path part of the pattern as written.
    pub pathname: String,
    /// Canonical trie key.
    pub segments: Vec<String>,
    /// Named parameters by segment index.
    pub params: BTreeMap<usize, ParamSpec>,
}

impl SplitUrl {
    /// The key identifying the trie slot this registration lands in.
    ///
    /// A trailing empty segment addresses the node reached before it, so it
    /// is dropped for comparison.
    pub fn leaf_key(&self) -> &[String] {
        leaf_key(&self.segments)
    }
}

/// Drops a trailing empty segment, which addresses the preceding node.
pub(crate) fn leaf_key(segments: &[String]) -> &[String] {
    match segments.split_last() {
        Some((last, init)) if last.is_empty() && !init.is_empty() => init,
        _ => segments,
    }
}

/// Compiles one pattern into its trie registrations: one per method, and two
/// per method for `.*`/`.**` suffixes.
pub fn split_url(pattern: &str) -> Result<Vec<SplitUrl>> {
    let pattern = pattern.trim();
    if pattern == ANY {
        return split_url(&format!("ALL /{CURRENT_SUPER_GLOB}"));
    }

    let (token, pathname) = pattern
        .split_once(' ')
        .ok_or_else(|| RouterError::MissingMethod(pattern.to_string()))?;
    let methods = parse_methods(token.trim())?;
    let pathname = pathname.trim();

    let parts: Vec<&str> = pathname
        .strip_prefix('/')
        .unwrap_or(pathname)
        .split('/')
        .collect();
    check_globs(pattern, &parts)?;

    let (last, init) = parts
        .split_last()
        .ok_or_else(|| RouterError::MissingMethod(pattern.to_string()))?;
    let tails: &[&str] = match *last {
        CURRENT_SUPER_GLOB => &["", SUPER_GLOB],
        CURRENT_GLOB => &["", WILDCARD],
        _ => &[],
    };
    let body = if tails.is_empty() { &parts[..] } else { init };

    // Only the final segment of a key may be empty; the trie stores empty
    // segments before it as `*`, so they are keyed that way here too.
    let final_index = if tails.is_empty() { body.len() - 1 } else { body.len() };
    let mut segments = Vec::with_capacity(parts.len());
    let mut params = BTreeMap::new();
    for (index, part) in body.iter().enumerate() {
        if part.is_empty() && index != final_index {
            segments.push(WILDCARD.to_string());
            continue;
        }
        match part.strip_prefix(':') {
            Some("") => return Err(RouterError::UnnamedParam(pattern.to_string())),
            Some(name) => {
                params.insert(
                    index,
                    ParamSpec {
                        name: name.to_string(),
                        index,
                    },
                );
                segments.push(WILDCARD.to_string());
            }
            None => segments.push((*part).to_string()),
        }
    }

    let keys: Vec<Vec<String>> = if tails.is_empty() {
        vec![segments]
    } else {
        tails
            .iter()
            .map(|tail| {
                let mut key = segments.clone();
                key.push((*tail).to_string());
                key
            })
            .collect()
    };

    let mut out = Vec::with_capacity(methods.len() * keys.len());
    for &method in methods {
        for key in &keys {
            out.push(SplitUrl {
                method,
                pattern: pattern.to_string(),
                pathname: pathname.to_string(),
                segments: key.clone(),
                params: params.clone(),
            });
        }
    }
    Ok(out)
}

/// Compiles several patterns. Fails on the first invalid one, before any of
/// them is registered.
pub fn split_urls<I, P>(patterns: I) -> Result<Vec<SplitUrl>>
where
    I: IntoIterator<Item = P>,
    P: AsRef<str>,
{
    let mut out = Vec::new();
    for pattern in patterns {
        out.extend(split_url(pattern.as_ref())?);
    }
    Ok(out)
}

/// Rewrites `pattern` so that its path is mounted under `base`.
pub fn with_base(pattern: &str, base: &str) -> Result<String> {
    let pattern = pattern.trim();
    let base = base.trim().trim_end_matches('/');
    let base = match base {
        "" => String::new(),
        b if b.starts_with('/') => b.to_string(),
        b => format!("/{b}"),
    };

    if pattern == ANY {
        return Ok(format!("ALL {base}/{CURRENT_SUPER_GLOB}"));
    }
    let (token, pathname) = pattern
        .split_once(' ')
        .ok_or_else(|| RouterError::MissingMethod(pattern.to_string()))?;
    let pathname = pathname.trim();
    let sep = if pathname.starts_with('/') { "" } else { "/" };
    Ok(format!("{} {base}{sep}{pathname}", token.trim()))
}

/// Expands a method token.
pub fn parse_methods(token: &str) -> Result<&'static [Method]> {
    static SINGLE: [[Method; 1]; 7] = [
        [Method::Head],
        [Method::Options],
        [Method::Get],
        [Method::Post],
        [Method::Put],
        [Method::Patch],
        [Method::Delete],
    ];

    match token {
        "ALL" => Ok(&Method::ALL),
        "CRUD" => Ok(&Method::CRUD),
        _ => Method::from_str(token)
            .map(|m| &SINGLE[m.index()][..])
            .ok_or_else(|| RouterError::UnknownMethod(token.to_string())),
    }
}

/// Rejects globs anywhere but the final segment.
fn check_globs(pattern: &str, parts: &[&str]) -> Result<()> {
    let init = parts.split_last().map_or(&[][..], |(_, init)| init);
    match init
        .iter()
        .find(|p| matches!(**p, SUPER_GLOB | CURRENT_GLOB | CURRENT_SUPER_GLOB))
    {
        Some(glob) => Err(RouterError::MisplacedGlob {
            pattern: pattern.to_string(),
            glob: (*glob).to_string(),
        }),
        None => Ok(()),
    }
}

/// Re-validates glob placement on canonical segments.
pub(crate) fn check_canonical(pattern: &str, segments: &[String]) -> Result<()> {
    let parts: Vec<&str> = segments.iter().map(String::as_str).collect();
    check_globs(pattern, &parts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(urls: &[SplitUrl]) -> Vec<Vec<&str>> {
        urls.iter()
            .map(|u| u.segments.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn test_literal_pattern() {
        let urls = split_url("GET /users/list").unwrap();
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].method, Method::Get);
        assert_eq!(urls[0].pattern, "GET /users/list");
        assert_eq!(urls[0].pathname, "/users/list");
        assert_eq!(keys(&urls), vec![vec!["users", "list"]]);
        assert!(urls[0].params.is_empty());
    }

    #[test]
    fn test_named_params() {
        let urls = split_url("GET /posts/:post_id/comments/:id").unwrap();
        assert_eq!(keys(&urls), vec![vec!["posts", "*", "comments", "*"]]);
        let names: Vec<(usize, &str)> = urls[0]
            .params
            .values()
            .map(|p| (p.index, p.name.as_str()))
            .collect();
        assert_eq!(names, vec![(1, "post_id"), (3, "id")]);
    }

    #[test]
    fn test_empty_middle_segment_is_wildcard() {
        assert_eq!(keys(&split_url("GET /a//b").unwrap()), vec![vec!["a", "*", "b"]]);
        assert_eq!(keys(&split_url("GET /a/").unwrap()), vec![vec!["a", ""]]);
        assert_eq!(
            keys(&split_url("GET //.**").unwrap()),
            vec![vec!["*", ""], vec!["*", "**"]]
        );
    }

    #[test]
    fn test_root_pattern() {
        let urls = split_url("GET /").unwrap();
        assert_eq!(keys(&urls), vec![vec![""]]);
    }

    #[test]
    fn test_current_super_glob_expands_twice() {
        let urls = split_url("GET /docs/.**").unwrap();
        assert_eq!(keys(&urls), vec![vec!["docs", ""], vec!["docs", "**"]]);
    }

    #[test]
    fn test_current_glob_expands_twice() {
        let urls = split_url("GET /users/:id/.*").unwrap();
        assert_eq!(
            keys(&urls),
            vec![vec!["users", "*", ""], vec!["users", "*", "*"]]
        );
        assert_eq!(urls[0].params, urls[1].params);
    }

    #[test]
    fn test_method_macros() {
        assert_eq!(split_url("ALL /x").unwrap().len(), 7);
        let crud: Vec<Method> = split_url("CRUD /x")
            .unwrap()
            .into_iter()
            .map(|u| u.method)
            .collect();
        assert_eq!(crud, Method::CRUD.to_vec());
    }

    #[test]
    fn test_any_pattern() {
        let urls = split_url("*").unwrap();
        assert_eq!(urls.len(), 14);
        assert!(urls.iter().all(|u| u.pathname == "/.**"));
    }

    #[test]
    fn test_misplaced_globs() {
        for pattern in ["GET /a/**/b", "GET /a/.**/b", "GET /.*/b"] {
            assert!(matches!(
                split_url(pattern),
                Err(RouterError::MisplacedGlob { .. })
            ));
        }
        assert!(split_url("GET /a/*/b").is_ok());
    }

    #[test]
    fn test_bad_method() {
        assert!(matches!(
            split_url("FETCH /x"),
            Err(RouterError::UnknownMethod(m)) if m == "FETCH"
        ));
        assert!(matches!(
            split_url("/x"),
            Err(RouterError::MissingMethod(_))
        ));
    }

    #[test]
    fn test_unnamed_param() {
        assert!(matches!(
            split_url("GET /users/:"),
            Err(RouterError::UnnamedParam(_))
        ));
    }

    #[test]
    fn test_leaf_key() {
        let urls = split_url("GET /docs/.*").unwrap();
        let plain = split_url("GET /docs").unwrap();
        assert_eq!(urls[0].leaf_key(), plain[0].leaf_key());
        assert_ne!(urls[1].leaf_key(), plain[0].leaf_key());
        assert_eq!(split_url("GET /").unwrap()[0].leaf_key(), &[String::new()]);
    }

    #[test]
    fn test_with_base() {
        assert_eq!(with_base("GET /users", "/api").unwrap(), "GET /api/users");
        assert_eq!(with_base("GET /users", "api/").unwrap(), "GET /api/users");
        assert_eq!(with_base("POST /", "/api").unwrap(), "POST /api/");
        assert_eq!(with_base("*", "/api").unwrap(), "ALL /api/.**");
        assert_eq!(with_base("GET /x", "").unwrap(), "GET /x");
    }
}
