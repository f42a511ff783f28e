//! Path type.

use std::fmt;

/// Path is the chain of map keys leading from a document's root to a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    elements: Vec<String>,
}

impl Path {
    /// Creates a new empty path, addressing the document root.
    pub fn new() -> Self {
        Path {
            elements: Vec::new(),
        }
    }

    /// Creates a path from field names.
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        fields.into_iter().map(Into::into).collect()
    }

    /// Returns the number of elements in the path.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns true if the path addresses the root.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns an iterator over the field names.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(String::as_str)
    }

    /// Returns the last field name.
    pub fn last(&self) -> Option<&str> {
        self.elements.last().map(String::as_str)
    }

    /// Creates a new path with the given field appended.
    pub fn with(&self, field: impl Into<String>) -> Self {
        let mut new_path = self.clone();
        new_path.elements.push(field.into());
        new_path
    }
}

impl<S: Into<String>> FromIterator<S> for Path {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Path {
            elements: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.elements.is_empty() {
            return write!(f, ".");
        }
        for element in &self.elements {
            write!(f, ".{}", element)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_with() {
        let root = Path::new();
        assert!(root.is_empty());

        let path = root.with("spec").with("replicas");
        assert_eq!(path.len(), 2);
        assert_eq!(path.last(), Some("replicas"));
        assert!(root.is_empty());
    }

    #[test]
    fn test_path_display() {
        let path = Path::from_fields(["metadata", "name"]);
        assert_eq!(format!("{}", path), ".metadata.name");
        assert_eq!(format!("{}", Path::new()), ".");
    }

    #[test]
    fn test_path_ordering() {
        let a = Path::from_fields(["a"]);
        let ab = Path::from_fields(["a", "b"]);
        let b = Path::from_fields(["b"]);
        assert!(a < ab);
        assert!(ab < b);
    }
}
