//! # anyfs-vtree
//!
//! Lazy, copy-on-write **in-memory filesystem tree** for the AnyFS virtual
//! filesystem standard.
//!
//! The tree is populated on demand from a backing store, mutated freely in
//! memory, cloned in constant time, frozen into immutable snapshots, and
//! linked internally by live symlinks that survive cycles.
//!
//! ---
//!
//! ## Quick Start
//!
//! ```rust
//! use anyfs_vtree::{CaseSensitivity, EntryKind, EntryQuery, FileSystem};
//!
//! let fs = FileSystem::new(CaseSensitivity::Sensitive);
//! fs.add_file("/proj/src/a.ts", "export const a = 1;")?;
//! fs.add_symlink_to("/proj/lib", EntryKind::Directory, "/proj/src")?;
//!
//! // The symlink presents the target's children under its own path
//! let via_link = fs.get_file("/proj/lib/a.ts", false).unwrap();
//! assert_eq!(via_link.get_content().as_deref(), Some("export const a = 1;"));
//!
//! // And stays in step with the target
//! fs.add_file("/proj/src/b.ts", "export const b = 2;")?;
//! let listed = fs.get_entries("/proj/lib", &EntryQuery::new());
//! assert_eq!(listed.len(), 2);
//! # Ok::<(), anyfs_vtree::FsError>(())
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`FileSystem`] | Owns a tree; path-based access, cwd, cloning, freezing |
//! | [`Entry`] | Any node: file, directory, or either kind of symlink |
//! | [`AnyFile`] | A file or a file symlink |
//! | [`AnyDirectory`] | A directory or a directory symlink; all container operations |
//! | [`BackingResolver`] | Lazily supplies listings and content |
//! | [`DiskResolver`] | Read-through resolver onto a real directory |
//! | [`FsError`] | Error type for refused mutations and backing-store setup |
//!
//! ---
//!
//! ## Copy-on-Write Clones
//!
//! [`FileSystem::shadow`] returns an independent tree in constant time.
//! Nodes of the clone are built from the original the first time they are
//! reached. Mutations on either side stay on that side.
//!
//! [`FileSystem::backing_view`] combines both ideas: one frozen, memoized
//! view per real directory, shadowed by every consumer that needs to write.
//!
//! ---
//!
//! ## Freezing
//!
//! [`FileSystem::make_read_only`] and [`Entry::make_read_only`] freeze a
//! subtree, including nodes that are only materialized later. Every
//! mutation checks the affected node first and fails with
//! [`FsError::ReadOnly`] before changing anything.
//!
//! ---
//!
//! ## Error Handling
//!
//! Lookups report misses as `None` and removals as `false`; those are not
//! errors. `FsError` is reserved for refused operations:
//!
//! ```rust
//! use anyfs_vtree::{CaseSensitivity, FileSystem, FsError};
//!
//! let fs = FileSystem::new(CaseSensitivity::Sensitive);
//! fs.make_read_only();
//! let err = fs.add_file("/a.ts", "x").unwrap_err();
//! assert!(matches!(err, FsError::ReadOnly { operation: "add_file", .. }));
//! ```
//!
//! ---
//!
//! ## Thread Safety
//!
//! Handles are reference counted with `Rc` and use interior mutability, so
//! none of the tree types are `Send` or `Sync`. Confine each tree to one
//! thread.
//!
//! ---
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events: `debug` for population, symlink
//! resolution and teardown, `trace` for change notifications, `warn` for
//! backing-store failures. Install a subscriber to see them.
//!
//! ---
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | Serde for [`EntryKind`], [`CaseSensitivity`], [`Listing`]; adds `JsonContent` |

// Private modules
mod entry;
mod error;
mod events;
mod ext;
mod filesystem;
mod resolver;
mod types;

// Public modules
pub mod vpath;

// Public re-exports - error types
pub use error::FsError;

// Public re-exports - core types
pub use types::{CaseSensitivity, EntryKind, EntryQuery, Listing};

// Public re-exports - tree
pub use entry::{AnyDirectory, AnyFile, Directory, DirectorySymlink, Entry, File, FileSymlink};
pub use events::{ChildEvent, ListenerId};
pub use filesystem::{FileSystem, FileSystemOptions};

// Public re-exports - backing store
pub use resolver::{BackingResolver, DiskResolver};

// Public re-exports - extensions
pub use ext::TreeExt;

// Conditional re-exports
#[cfg(feature = "serde")]
pub use ext::JsonContent;
