//! # Extension Traits
//!
//! Convenience methods layered on top of the tree.
//!
//! ## Overview
//!
//! [`TreeExt`] adds path predicates and content shortcuts to anything that
//! can look up entries by path. It has a single required method, so
//! [`FileSystem`], [`Directory`] and [`AnyDirectory`] all get the rest for
//! free.
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`is_file`](TreeExt::is_file) | Path holds a file or file symlink |
//! | [`is_dir`](TreeExt::is_dir) | Path holds a directory or directory symlink |
//! | [`is_symlink`](TreeExt::is_symlink) | Path holds a symlink of either kind |
//! | [`read_content`](TreeExt::read_content) | Content of the file at path, following symlinks |
//!
//! ## JSON Support (Feature-Gated)
//!
//! With the `serde` feature enabled, [`JsonContent`] reads and writes file
//! content as JSON:
//!
//! ```toml
//! [dependencies]
//! anyfs-vtree = { version = "0.1", features = ["serde"] }
//! ```

use std::rc::Rc;

use crate::{AnyDirectory, Directory, Entry, EntryKind, FileSystem};

/// Extension methods for anything that resolves paths to entries.
///
/// # Example
///
/// ```rust
/// use anyfs_vtree::{CaseSensitivity, FileSystem, TreeExt};
///
/// let fs = FileSystem::new(CaseSensitivity::Sensitive);
/// fs.add_file("/src/a.ts", "let a = 1;")?;
///
/// assert!(fs.is_dir("/src"));
/// assert!(fs.is_file("/src/a.ts"));
/// assert_eq!(fs.read_content("/src/a.ts").as_deref(), Some("let a = 1;"));
/// # Ok::<(), anyfs_vtree::FsError>(())
/// ```
pub trait TreeExt {
    /// Entry at `path`, as the implementor's own lookup finds it.
    fn entry_at(&self, path: &str, follow_symlinks: bool) -> Option<Entry>;

    /// Returns `true` if `path` holds a file or a file symlink.
    ///
    /// A broken symlink still counts, since the link itself is there.
    fn is_file(&self, path: &str) -> bool {
        self.entry_at(path, false)
            .is_some_and(|entry| entry.kind() == EntryKind::File)
    }

    /// Returns `true` if `path` holds a directory or a directory symlink.
    fn is_dir(&self, path: &str) -> bool {
        self.entry_at(path, false)
            .is_some_and(|entry| entry.kind() == EntryKind::Directory)
    }

    /// Returns `true` if `path` holds a symlink of either kind.
    fn is_symlink(&self, path: &str) -> bool {
        self.entry_at(path, false).is_some_and(|entry| entry.is_symlink())
    }

    /// Content of the file at `path`, following symlinks.
    ///
    /// `None` if there is no file, the link is broken, or the file has no
    /// content.
    fn read_content(&self, path: &str) -> Option<Rc<str>> {
        self.entry_at(path, true)?.as_file()?.get_content()
    }
}

impl TreeExt for FileSystem {
    fn entry_at(&self, path: &str, follow_symlinks: bool) -> Option<Entry> {
        self.get_entry(path, follow_symlinks)
    }
}

impl TreeExt for AnyDirectory {
    fn entry_at(&self, path: &str, follow_symlinks: bool) -> Option<Entry> {
        self.get_entry(path, follow_symlinks)
    }
}

impl TreeExt for Directory {
    fn entry_at(&self, path: &str, follow_symlinks: bool) -> Option<Entry> {
        self.get_entry(path, follow_symlinks)
    }
}

// =============================================================================
// JSON Support (Feature-Gated)
// =============================================================================

#[cfg(feature = "serde")]
mod json {
    use serde::{Serialize, de::DeserializeOwned};

    use crate::{AnyFile, FsError};

    /// JSON views of file content.
    ///
    /// Available when the `serde` feature is enabled.
    pub trait JsonContent {
        /// Deserialize the file content as JSON.
        ///
        /// Returns `Ok(None)` if the file has no content.
        ///
        /// # Errors
        ///
        /// - `FsError::Deserialization` if the content is not valid JSON
        ///   for `T`
        ///
        /// # Example
        ///
        /// ```rust
        /// use anyfs_vtree::{CaseSensitivity, FileSystem, JsonContent};
        ///
        /// let fs = FileSystem::new(CaseSensitivity::Sensitive);
        /// let file = fs.add_file("/tsconfig.json", r#"{"strict": true}"#)?.unwrap();
        /// let value: Option<serde_json::Value> = file.read_json()?;
        /// assert_eq!(value.unwrap()["strict"], true);
        /// # Ok::<(), anyfs_vtree::FsError>(())
        /// ```
        fn read_json<T: DeserializeOwned>(&self) -> Result<Option<T>, FsError>;

        /// Serialize `value` and store it as the file content.
        ///
        /// Uses pretty-printing with 2-space indentation.
        ///
        /// # Errors
        ///
        /// - `FsError::Serialization` if `value` cannot be serialized
        /// - `FsError::ReadOnly` if the file is frozen
        fn write_json<T: Serialize>(&self, value: &T) -> Result<(), FsError>;
    }

    impl JsonContent for AnyFile {
        fn read_json<T: DeserializeOwned>(&self) -> Result<Option<T>, FsError> {
            let Some(content) = self.get_content() else {
                return Ok(None);
            };
            serde_json::from_str(&content)
                .map(Some)
                .map_err(|e| FsError::Deserialization(e.to_string()))
        }

        fn write_json<T: Serialize>(&self, value: &T) -> Result<(), FsError> {
            let json = serde_json::to_string_pretty(value)
                .map_err(|e| FsError::Serialization(e.to_string()))?;
            self.set_content(json)
        }
    }
}

#[cfg(feature = "serde")]
pub use json::JsonContent;
