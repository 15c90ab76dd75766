//! Core types shared across the filesystem tree.

use regex::Regex;

/// Kind of an entry as seen through the tree.
///
/// Symlinks report the kind of the entry they point at, so a
/// [`FileSymlink`](crate::FileSymlink) is a `File` and a
/// [`DirectorySymlink`](crate::DirectorySymlink) is a `Directory`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntryKind {
    /// Regular file or file symlink.
    File,
    /// Directory or directory symlink.
    Directory,
}

/// Case policy for comparing entry names.
///
/// Fixed when a [`FileSystem`](crate::FileSystem) is constructed; only a
/// full shadow clone may pick a different policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CaseSensitivity {
    /// `Foo.ts` and `foo.ts` are different entries.
    #[default]
    Sensitive,
    /// `Foo.ts` and `foo.ts` name the same entry.
    Insensitive,
}

impl CaseSensitivity {
    /// Build a policy from a `useCaseSensitiveFileNames`-style flag.
    #[inline]
    pub const fn from_flag(use_case_sensitive_file_names: bool) -> Self {
        if use_case_sensitive_file_names {
            Self::Sensitive
        } else {
            Self::Insensitive
        }
    }

    /// Returns `true` for [`CaseSensitivity::Sensitive`].
    #[inline]
    pub const fn is_sensitive(self) -> bool {
        matches!(self, Self::Sensitive)
    }

    /// Compare two names under this policy.
    pub fn names_equal(self, a: &str, b: &str) -> bool {
        match self {
            Self::Sensitive => a == b,
            Self::Insensitive => {
                if a.is_ascii() && b.is_ascii() {
                    a.eq_ignore_ascii_case(b)
                } else {
                    a.to_lowercase() == b.to_lowercase()
                }
            }
        }
    }
}

/// Immediate children of a real directory, as reported by a
/// [`BackingResolver`](crate::BackingResolver).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Listing {
    /// Names of regular files.
    pub files: Vec<String>,
    /// Names of directories.
    pub directories: Vec<String>,
}

impl Listing {
    /// Returns `true` if the listing has no children.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.directories.is_empty()
    }
}

/// Filter for [`AnyDirectory::get_entries`](crate::AnyDirectory::get_entries).
///
/// The default query returns every immediate child.
///
/// # Example
///
/// ```rust
/// use anyfs_vtree::{EntryKind, EntryQuery};
/// use regex::Regex;
///
/// let query = EntryQuery::new()
///     .pattern(Regex::new(r"\.ts$").unwrap())
///     .kind(EntryKind::File)
///     .recursive(true);
/// assert!(query.is_recursive());
/// ```
#[derive(Debug, Clone, Default)]
pub struct EntryQuery {
    pattern: Option<Regex>,
    kind: Option<EntryKind>,
    recursive: bool,
}

impl EntryQuery {
    /// A query matching every immediate child.
    pub fn new() -> Self {
        Self::default()
    }

    /// Only yield entries whose name matches `pattern`.
    pub fn pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Only yield entries of `kind`.
    pub fn kind(mut self, kind: EntryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Descend into subdirectories, depth-first, parents before children.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Returns `true` if the query descends into subdirectories.
    #[inline]
    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    pub(crate) fn matches(&self, name: &str, kind: EntryKind) -> bool {
        self.kind.is_none_or(|wanted| wanted == kind)
            && self
                .pattern
                .as_ref()
                .is_none_or(|pattern| pattern.is_match(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_sensitive_names() {
        let case = CaseSensitivity::Sensitive;
        assert!(case.names_equal("Foo.ts", "Foo.ts"));
        assert!(!case.names_equal("Foo.ts", "foo.ts"));
    }

    #[test]
    fn case_insensitive_names() {
        let case = CaseSensitivity::Insensitive;
        assert!(case.names_equal("Foo.ts", "foo.TS"));
        assert!(case.names_equal("Ärger", "ärger"));
        assert!(!case.names_equal("foo.ts", "foo.js"));
    }

    #[test]
    fn case_from_flag() {
        assert_eq!(CaseSensitivity::from_flag(true), CaseSensitivity::Sensitive);
        assert_eq!(
            CaseSensitivity::from_flag(false),
            CaseSensitivity::Insensitive
        );
        assert!(CaseSensitivity::default().is_sensitive());
    }

    #[test]
    fn empty_query_matches_everything() {
        let query = EntryQuery::new();
        assert!(query.matches("a.ts", EntryKind::File));
        assert!(query.matches("src", EntryKind::Directory));
        assert!(!query.is_recursive());
    }

    #[test]
    fn query_filters_by_kind_and_pattern() {
        let query = EntryQuery::new()
            .kind(EntryKind::File)
            .pattern(Regex::new(r"\.ts$").unwrap());
        assert!(query.matches("a.ts", EntryKind::File));
        assert!(!query.matches("a.js", EntryKind::File));
        assert!(!query.matches("dir.ts", EntryKind::Directory));
    }

    #[test]
    fn listing_is_empty() {
        assert!(Listing::default().is_empty());
        let listing = Listing {
            files: vec!["a".into()],
            directories: vec![],
        };
        assert!(!listing.is_empty());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn case_sensitivity_serializes_snake_case() {
        let json = serde_json::to_string(&CaseSensitivity::Insensitive).unwrap();
        assert_eq!(json, "\"insensitive\"");
    }
}
