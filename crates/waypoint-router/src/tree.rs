//! Segment-keyed prefix tree.
//!
//! Keys are sequences of path segments. Besides literal text, two sentinel
//! keys are understood:
//!
//! - `*` matches exactly one segment (named parameters compile to it)
//! - `**` matches one or more trailing segments
//!
//! An empty final segment addresses the value of the node reached by the
//! preceding segments, so `["docs", ""]` and `["docs"]` name the same slot.
//!
//! Lookups never backtrack: a literal child always wins over the `*` child
//! when descending, even if the literal branch later fails to match.

use std::collections::HashMap;

/// Key of the single-segment wildcard child.
pub const WILDCARD: &str = "*";
/// Key of the multi-segment wildcard child.
pub const SUPER_GLOB: &str = "**";

#[derive(Debug)]
struct Node<V> {
    value: Option<V>,
    children: HashMap<String, Node<V>>,
}

impl<V> Default for Node<V> {
    fn default() -> Self {
        Self {
            value: None,
            children: HashMap::new(),
        }
    }
}

impl<V> Node<V> {
    /// Descends one non-terminal segment.
    fn step(&self, segment: &str) -> Option<&Self> {
        self.children
            .get(segment)
            .or_else(|| self.children.get(WILDCARD))
    }

    /// Resolves the final segment: literal child, then `*` child. An empty
    /// segment means this node's own value.
    fn terminal(&self, segment: &str) -> Option<&V> {
        if segment.is_empty() {
            return self.value.as_ref();
        }
        self.child_value(segment)
            .or_else(|| self.child_value(WILDCARD))
    }

    fn child_value(&self, key: &str) -> Option<&V> {
        self.children.get(key).and_then(|c| c.value.as_ref())
    }
}

/// A prefix tree storing one value per terminal segment sequence.
#[derive(Debug)]
pub struct Tree<V> {
    root: Option<Node<V>>,
    len: usize,
}

impl<V> Default for Tree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Tree<V> {
    /// Creates an empty tree. The root node is created on first insert.
    pub fn new() -> Self {
        Self { root: None, len: 0 }
    }

    /// Stores `value` under `segments`, returning the value it replaced.
    ///
    /// Empty intermediate segments are stored as `*`.
    pub fn set<S: AsRef<str>>(&mut self, segments: &[S], value: V) -> Option<V> {
        let mut node = self.root.get_or_insert_with(Node::default);
        let Some((last, init)) = segments.split_last() else {
            return Self::replace(&mut self.len, node, value);
        };

        for segment in init {
            let key = match segment.as_ref() {
                "" => WILDCARD,
                key => key,
            };
            node = node.children.entry(key.to_string()).or_default();
        }

        let last = last.as_ref();
        if !last.is_empty() {
            node = node.children.entry(last.to_string()).or_default();
        }
        Self::replace(&mut self.len, node, value)
    }

    fn replace(len: &mut usize, node: &mut Node<V>, value: V) -> Option<V> {
        let old = node.value.replace(value);
        if old.is_none() {
            *len += 1;
        }
        old
    }

    /// Returns the best single match for `segments`.
    pub fn get<S: AsRef<str>>(&self, segments: &[S]) -> Option<&V> {
        let (last, init) = segments.split_last()?;
        let mut node = self.root.as_ref()?;
        for segment in init {
            node = node.step(segment.as_ref())?;
        }
        node.terminal(last.as_ref())
    }

    /// Returns whether `segments` resolves to a value, following the same
    /// wildcard fallbacks as [`Tree::get`].
    pub fn has<S: AsRef<str>>(&self, segments: &[S]) -> bool {
        self.get(segments).is_some()
    }

    /// Returns every value matching `segments`, most specific first.
    ///
    /// The exact or `*` match (if any) comes first, followed by the `**`
    /// matches met during descent, deepest first. A `**` child never matches
    /// the bare root path.
    pub fn get_all<S: AsRef<str>>(&self, segments: &[S]) -> Vec<&V> {
        let mut best = None;
        let mut globs = Vec::new();

        if let Some(mut node) = self.root.as_ref() {
            for (i, segment) in segments.iter().enumerate() {
                let segment = segment.as_ref();
                let is_last = i + 1 == segments.len();

                if !(is_last && segment.is_empty()) {
                    if let Some(value) = node.child_value(SUPER_GLOB) {
                        globs.push(value);
                    }
                }

                if is_last {
                    best = node.terminal(segment);
                    break;
                }
                match node.step(segment) {
                    Some(next) => node = next,
                    None => break,
                }
            }
        }

        best.into_iter().chain(globs.into_iter().rev()).collect()
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no value is stored.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(routes: &[&[&str]]) -> Tree<String> {
        let mut tree = Tree::new();
        for segments in routes {
            tree.set(segments, segments.join("/"));
        }
        tree
    }

    #[test]
    fn test_literal_match() {
        let tree = tree(&[&["users"], &["users", "list"]]);
        assert_eq!(tree.get(&["users"]).map(String::as_str), Some("users"));
        assert_eq!(
            tree.get(&["users", "list"]).map(String::as_str),
            Some("users/list")
        );
        assert!(tree.get(&["posts"]).is_none());
        assert!(tree.get::<&str>(&[]).is_none());
    }

    #[test]
    fn test_literal_beats_wildcard() {
        let tree = tree(&[&["users", "*"], &["users", "123"]]);
        assert_eq!(
            tree.get(&["users", "123"]).map(String::as_str),
            Some("users/123")
        );
        assert_eq!(
            tree.get(&["users", "456"]).map(String::as_str),
            Some("users/*")
        );
    }

    #[test]
    fn test_wildcard_descent() {
        let tree = tree(&[&["users", "*", "posts"]]);
        assert!(tree.has(&["users", "9", "posts"]));
        assert!(!tree.has(&["users", "9", "comments"]));
    }

    #[test]
    fn test_descent_does_not_backtrack() {
        let tree = tree(&[&["users", "1234", "posts"], &["users", "*", "comments"]]);
        assert!(tree.has(&["users", "99", "comments"]));
        assert!(!tree.has(&["users", "1234", "comments"]));
    }

    #[test]
    fn test_empty_terminal_addresses_node_value() {
        let tree = tree(&[&["docs", ""]]);
        assert_eq!(tree.get(&["docs"]).map(String::as_str), Some("docs/"));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_root_path() {
        let tree = tree(&[&[""]]);
        assert!(tree.has(&[""]));
        assert!(!tree.has(&["x"]));
    }

    #[test]
    fn test_empty_intermediate_segment_is_wildcard() {
        let tree = tree(&[&["a", "", "b"]]);
        assert!(tree.has(&["a", "anything", "b"]));
    }

    #[test]
    fn test_set_replaces() {
        let mut tree = Tree::new();
        assert_eq!(tree.set(&["x"], 1), None);
        assert_eq!(tree.set(&["x"], 2), Some(1));
        assert_eq!(tree.get(&["x"]), Some(&2));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_get_all_orders_most_specific_first() {
        let tree = tree(&[
            &["**"],
            &["api", "**"],
            &["api", "v1", "**"],
            &["api", "v1", "users"],
        ]);

        let all: Vec<&str> = tree
            .get_all(&["api", "v1", "users"])
            .into_iter()
            .map(String::as_str)
            .collect();
        assert_eq!(all, vec!["api/v1/users", "api/v1/**", "api/**", "**"]);

        let all: Vec<&str> = tree
            .get_all(&["api", "v2", "users"])
            .into_iter()
            .map(String::as_str)
            .collect();
        assert_eq!(all, vec!["api/**", "**"]);
    }

    #[test]
    fn test_super_glob_needs_a_segment() {
        let tree = tree(&[&["docs", "**"], &["**"]]);
        let all: Vec<&str> = tree
            .get_all(&["docs"])
            .into_iter()
            .map(String::as_str)
            .collect();
        assert_eq!(all, vec!["**"]);
        assert!(tree.get_all(&[""]).is_empty());
        assert_eq!(tree.get_all(&["docs", "a", "b"]).len(), 2);
    }
}
