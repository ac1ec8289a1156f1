use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Branch-qualified folder location, as an ordered list of folder names.
///
/// Segments are trimmed and empty segments are dropped, so `" A // B "` and `"A/B"`
/// name the same location. A path without segments is the storage root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct LogicalPath {
    segments: Vec<String>,
}

impl LogicalPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a slash-delimited path.
    pub fn parse(raw: &str) -> Self {
        Self::from_segments(raw.split('/'))
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let segments = segments
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns a new path with `segment` appended (ignored when blank).
    pub fn join(&self, segment: &str) -> Self {
        let mut next = self.clone();
        let segment = segment.trim();
        if !segment.is_empty() {
            next.segments.push(segment.to_string());
        }
        next
    }

    /// The first `len` segments of this path.
    pub fn prefix(&self, len: usize) -> Self {
        Self {
            segments: self.segments.iter().take(len).cloned().collect(),
        }
    }
}

impl fmt::Display for LogicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl FromStr for LogicalPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<Vec<String>> for LogicalPath {
    fn from(segments: Vec<String>) -> Self {
        Self::from_segments(segments)
    }
}

impl From<LogicalPath> for Vec<String> {
    fn from(path: LogicalPath) -> Self {
        path.segments
    }
}

/// Reference to a folder owned by the storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FolderHandle {
    pub id: String,
    pub name: String,
}

impl FolderHandle {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_drops_empty_segments() {
        let path = LogicalPath::parse("  Check Stock Project // Branch A /  ");
        assert_eq!(path.segments(), ["Check Stock Project", "Branch A"]);
        assert_eq!(path.to_string(), "Check Stock Project/Branch A");
    }

    #[test]
    fn test_blank_path_is_root() {
        assert!(LogicalPath::parse("").is_root());
        assert!(LogicalPath::parse(" / / ").is_root());
        assert_eq!(LogicalPath::parse("/"), LogicalPath::root());
    }

    #[test]
    fn test_join_and_prefix() {
        let path = LogicalPath::parse("A").join(" B ").join("  ");
        assert_eq!(path.len(), 2);
        assert_eq!(path.prefix(1), LogicalPath::parse("A"));
        assert_eq!(path.prefix(5), path);
    }

    #[test]
    fn test_serde_roundtrip_normalizes() {
        let path: LogicalPath = serde_json::from_str(r#"[" A ", "", "B"]"#).unwrap();
        assert_eq!(path, LogicalPath::parse("A/B"));
        assert_eq!(serde_json::to_string(&path).unwrap(), r#"["A","B"]"#);
    }
}
