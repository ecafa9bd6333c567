//! Ordered, multi-valued header map.

/// HTTP headers.
///
/// Names compare case-insensitively; insertion order is kept, and a name may
/// carry several values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value, keeping any existing values for the name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Sets a header, replacing every existing value for the name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.remove(&name);
        self.entries.push((name, value.into()));
    }

    /// Returns the first value for a name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns every value for a name, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns whether the name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Removes every value for a name.
    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    }

    /// Overlays `other` onto `self`.
    ///
    /// Names present in `other` replace all of their values here; the values
    /// from `other` keep their order.
    pub fn merge(&mut self, other: &Headers) {
        for (name, _) in &other.entries {
            self.remove(name);
        }
        self.entries.extend(other.entries.iter().cloned());
    }

    /// Returns an iterator over `(name, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of `(name, value)` pairs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no headers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_lookup() {
        let mut headers = Headers::new();
        headers.append("Content-Type", "text/plain");
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert!(headers.contains("CONTENT-TYPE"));
    }

    #[test]
    fn test_multi_valued() {
        let mut headers = Headers::new();
        headers.append("Set-Cookie", "a=1");
        headers.append("Set-Cookie", "b=2");
        let values: Vec<_> = headers.get_all("set-cookie").collect();
        assert_eq!(values, vec!["a=1", "b=2"]);

        headers.set("set-cookie", "c=3");
        let values: Vec<_> = headers.get_all("Set-Cookie").collect();
        assert_eq!(values, vec!["c=3"]);
    }

    #[test]
    fn test_merge_overrides_conflicting_names() {
        let mut base: Headers = [("X-Frame", "deny"), ("X-Keep", "yes")].into_iter().collect();
        let overlay: Headers = [("x-frame", "sameorigin"), ("Vary", "Origin")]
            .into_iter()
            .collect();
        base.merge(&overlay);

        assert_eq!(base.get("X-Frame"), Some("sameorigin"));
        assert_eq!(base.get("X-Keep"), Some("yes"));
        assert_eq!(base.get("vary"), Some("Origin"));
        assert_eq!(base.len(), 3);
    }
}
