//! # Backing Resolver
//!
//! Strategy trait for populating the tree lazily from a real backing store.
//!
//! ## Responsibility
//! - List the immediate children of a real directory
//! - Fetch the content of a real file
//!
//! Both operations are consulted at most once per directory and once per
//! file, on first access. The tree never writes back.
//!
//! ## Usage
//!
//! ```rust
//! use anyfs_vtree::{BackingResolver, CaseSensitivity, FileSystem, FileSystemOptions, Listing};
//! use std::rc::Rc;
//!
//! struct Fixture;
//!
//! impl BackingResolver for Fixture {
//!     fn list_children(&self, path: &str) -> Listing {
//!         match path {
//!             "/" => Listing { files: vec!["a.ts".into()], directories: vec![] },
//!             _ => Listing::default(),
//!         }
//!     }
//!
//!     fn read_content(&self, path: &str) -> Option<String> {
//!         (path == "/a.ts").then(|| "let a = 1;".to_string())
//!     }
//! }
//!
//! let fs = FileSystem::with_options(FileSystemOptions {
//!     resolver: Some(Rc::new(Fixture)),
//!     ..FileSystemOptions::default()
//! });
//! let file = fs.get_file("/a.ts", false).unwrap();
//! assert_eq!(file.get_content().as_deref(), Some("let a = 1;"));
//! ```

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{FsError, Listing, vpath};

// ============================================================================
// Trait Definition
// ============================================================================

/// Source of lazily loaded directory listings and file contents.
///
/// Paths passed in are absolute virtual paths of the directory or file
/// being populated. Implementations decide how they map onto the real
/// store.
///
/// # Failure Handling
///
/// Neither method can fail: an unreadable directory reports an empty
/// [`Listing`] and an unreadable file reports `None`. Implementations are
/// expected to log what they swallow.
///
/// # Implementors
///
/// - [`DiskResolver`]: read-through onto a real directory via `std::fs`
pub trait BackingResolver {
    /// Names of the immediate files and directories under `path`.
    fn list_children(&self, path: &str) -> Listing;

    /// Content of the file at `path`, or `None` if it cannot be read.
    fn read_content(&self, path: &str) -> Option<String>;
}

// ============================================================================
// Disk Resolver
// ============================================================================

/// Read-through resolver onto a real directory.
///
/// The real directory `root` appears in the tree at the virtual path
/// `mount` (`/` unless changed with [`mounted_at`](Self::mounted_at)).
/// Virtual paths outside the mount resolve to nothing.
///
/// Entries are classified by following real symlinks; anything that is
/// neither a regular file nor a directory is skipped, as are names that are
/// not valid UTF-8.
#[derive(Debug, Clone)]
pub struct DiskResolver {
    root: PathBuf,
    mount: String,
}

impl DiskResolver {
    /// Create a resolver rooted at the real directory `root`.
    ///
    /// # Errors
    ///
    /// - [`FsError::Io`] if `root` cannot be inspected
    /// - [`FsError::NotADirectory`] if `root` is not a directory
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, FsError> {
        let root = root.into();
        let metadata = std::fs::metadata(&root).map_err(|source| FsError::Io {
            operation: "open backing root",
            path: root.clone(),
            source,
        })?;
        if !metadata.is_dir() {
            return Err(FsError::NotADirectory { path: root });
        }
        Ok(Self {
            root,
            mount: "/".to_string(),
        })
    }

    /// Expose the real root at the virtual path `mount` instead of `/`.
    pub fn mounted_at(mut self, mount: &str) -> Self {
        self.mount = vpath::resolve("/", mount);
        self
    }

    /// The real directory backing the mount.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The virtual path the real root appears at.
    pub fn mount(&self) -> &str {
        &self.mount
    }

    /// Map a virtual path onto the real store.
    fn real_path(&self, path: &str) -> Option<PathBuf> {
        let path = vpath::resolve("/", path);
        let rel = vpath::relative(&self.mount, &path, crate::CaseSensitivity::Sensitive);
        if rel.split('/').next() == Some("..") {
            return None;
        }
        let mut real = self.root.clone();
        for segment in rel.split('/').filter(|segment| !segment.is_empty()) {
            real.push(segment);
        }
        Some(real)
    }
}

impl BackingResolver for DiskResolver {
    fn list_children(&self, path: &str) -> Listing {
        let mut listing = Listing::default();
        let Some(real) = self.real_path(path) else {
            debug!(path, mount = %self.mount, "path outside backing mount");
            return listing;
        };

        let entries = match std::fs::read_dir(&real) {
            Ok(entries) => entries,
            Err(error) => {
                warn!(path = %real.display(), %error, "failed to list backing directory");
                return listing;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    warn!(path = %real.display(), %error, "failed to read backing directory entry");
                    continue;
                }
            };
            let Ok(name) = entry.file_name().into_string() else {
                debug!(path = %entry.path().display(), "skipping non-UTF-8 name");
                continue;
            };
            match std::fs::metadata(entry.path()) {
                Ok(metadata) if metadata.is_dir() => listing.directories.push(name),
                Ok(metadata) if metadata.is_file() => listing.files.push(name),
                Ok(_) => debug!(path = %entry.path().display(), "skipping special file"),
                Err(error) => {
                    warn!(path = %entry.path().display(), %error, "failed to stat backing entry")
                }
            }
        }

        debug!(
            path,
            files = listing.files.len(),
            directories = listing.directories.len(),
            "listed backing directory"
        );
        listing
    }

    fn read_content(&self, path: &str) -> Option<String> {
        let real = self.real_path(path)?;
        match std::fs::read_to_string(&real) {
            Ok(content) => Some(content),
            Err(error) => {
                warn!(path = %real.display(), %error, "failed to read backing file");
                None
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    struct EmptyResolver;

    impl BackingResolver for EmptyResolver {
        fn list_children(&self, _path: &str) -> Listing {
            Listing::default()
        }

        fn read_content(&self, _path: &str) -> Option<String> {
            None
        }
    }

    #[test]
    fn backing_resolver_can_be_shared() {
        let resolver: Rc<dyn BackingResolver> = Rc::new(EmptyResolver);
        assert!(resolver.list_children("/").is_empty());
        assert_eq!(resolver.read_content("/a"), None);
    }

    #[test]
    fn disk_resolver_rejects_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let result = DiskResolver::new(dir.path().join("missing"));
        assert!(matches!(result, Err(FsError::Io { .. })));
    }

    #[test]
    fn disk_resolver_rejects_file_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        let result = DiskResolver::new(&file);
        assert!(matches!(result, Err(FsError::NotADirectory { .. })));
    }

    #[test]
    fn disk_resolver_lists_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.ts"), "let a = 1;").unwrap();
        std::fs::write(dir.path().join("sub").join("b.ts"), "let b = 2;").unwrap();

        let resolver = DiskResolver::new(dir.path()).unwrap();
        let listing = resolver.list_children("/");
        assert_eq!(listing.files, vec!["a.ts".to_string()]);
        assert_eq!(listing.directories, vec!["sub".to_string()]);

        let nested = resolver.list_children("/sub");
        assert_eq!(nested.files, vec!["b.ts".to_string()]);
        assert_eq!(
            resolver.read_content("/sub/b.ts").as_deref(),
            Some("let b = 2;")
        );
    }

    #[test]
    fn disk_resolver_maps_mount_point() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("lib.d.ts"), "declare const x: number;").unwrap();

        let resolver = DiskResolver::new(dir.path()).unwrap().mounted_at(".lib");
        assert_eq!(resolver.mount(), "/.lib");
        assert_eq!(
            resolver.read_content("/.lib/lib.d.ts").as_deref(),
            Some("declare const x: number;")
        );
        assert_eq!(resolver.read_content("/lib.d.ts"), None);
        assert!(resolver.list_children("/elsewhere").is_empty());
    }

    #[test]
    fn disk_resolver_missing_file_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = DiskResolver::new(dir.path()).unwrap();
        assert_eq!(resolver.read_content("/nope.ts"), None);
        assert!(resolver.list_children("/nope").is_empty());
    }
}
