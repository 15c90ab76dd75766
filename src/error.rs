//! Error types for the virtual filesystem tree.
//!
//! Lookups that miss, hit the wrong kind of entry, or pass through a broken
//! symlink are not errors: they surface as `None` or `false`. The variants
//! here cover the conditions that must stop an operation.

use std::path::PathBuf;

/// Filesystem error type with contextual variants.
///
/// Uses `#[non_exhaustive]` for forward compatibility.
///
/// # Examples
///
/// ```rust
/// use anyfs_vtree::FsError;
///
/// let err = FsError::ReadOnly {
///     path: "/lib/a.ts".to_string(),
///     operation: "set_content",
/// };
/// assert_eq!(err.to_string(), "set_content: read-only entry: /lib/a.ts");
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    /// A mutation was attempted on a frozen entry or filesystem.
    ///
    /// Raised before any state changes.
    #[error("{operation}: read-only entry: {path}")]
    ReadOnly {
        /// Virtual path of the frozen entry.
        path: String,
        /// The operation that was refused.
        operation: &'static str,
    },

    /// A backing-store root is not a directory.
    #[error("not a directory: {}", path.display())]
    NotADirectory {
        /// The real path that is not a directory.
        path: PathBuf,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// I/O error against the real backing store, with context.
    #[error("{operation} failed for {}: {source}", path.display())]
    Io {
        /// The operation that failed.
        operation: &'static str,
        /// The real path involved in the operation.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    /// Returns `true` if this error is a read-only violation.
    #[inline]
    pub fn is_read_only(&self) -> bool {
        matches!(self, FsError::ReadOnly { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_only_display() {
        let err = FsError::ReadOnly {
            path: "/src".into(),
            operation: "add_file",
        };
        assert_eq!(err.to_string(), "add_file: read-only entry: /src");
        assert!(err.is_read_only());
    }

    #[test]
    fn not_a_directory_display() {
        let err = FsError::NotADirectory {
            path: PathBuf::from("/tmp/file.txt"),
        };
        assert_eq!(err.to_string(), "not a directory: /tmp/file.txt");
        assert!(!err.is_read_only());
    }

    #[test]
    fn io_error_keeps_source() {
        use std::error::Error as _;

        let err = FsError::Io {
            operation: "open backing root",
            path: PathBuf::from("/missing"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().starts_with("open backing root failed for /missing"));
        assert!(err.source().is_some());
    }

    #[test]
    fn serialization_display() {
        let err = FsError::Deserialization("expected value".into());
        assert_eq!(err.to_string(), "deserialization error: expected value");
    }
}
