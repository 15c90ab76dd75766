//! # Entries
//!
//! Nodes of the virtual filesystem tree.
//!
//! ## Ownership
//!
//! Every node is owned by the child list of its parent container. Children
//! refer back to their parent, and to the owning filesystem, through weak
//! handles only. Symlink targets are stored as paths and resolved on
//! demand, so the ownership graph stays a tree even when symlink chains
//! form cycles.
//!
//! ## Node Types
//!
//! | Type | Kind | Purpose |
//! |------|------|---------|
//! | [`File`] | file | Text content, lazily loaded |
//! | [`Directory`] | directory | Child list, lazily populated |
//! | [`FileSymlink`] | file | Redirects reads and writes to a file |
//! | [`DirectorySymlink`] | directory | Live view onto a directory |
//!
//! [`AnyFile`] and [`AnyDirectory`] group the real node with its symlink
//! counterpart, which is what path lookups return.

mod container;
mod directory;
mod file;
mod symlink;

use std::cell::{Cell, OnceCell};
use std::rc::{Rc, Weak};

pub use container::AnyDirectory;
pub use directory::Directory;
pub use file::{AnyFile, File};
pub use symlink::{DirectorySymlink, FileSymlink};

pub(crate) use container::{Creation, create_at, lookup};
pub(crate) use directory::Contents;

use crate::filesystem::FsState;
use crate::{CaseSensitivity, EntryKind, FsError, vpath};
use directory::DirectoryInner;
use file::Content;
use symlink::{DirectorySymlinkInner, resolve_chain};

/// Identity of a node, stable for as long as the node is alive.
pub(crate) type NodeId = usize;

// ============================================================================
// Shared State
// ============================================================================

/// State every node carries regardless of its type.
pub(crate) struct EntryBase {
    name: String,
    parent: Option<ParentRef>,
    fs: Weak<FsState>,
    case: CaseSensitivity,
    path: OnceCell<String>,
    read_only: Cell<bool>,
}

impl EntryBase {
    /// Base for the root directory of a filesystem.
    pub(crate) fn root(fs: Weak<FsState>, case: CaseSensitivity) -> Self {
        Self {
            name: String::new(),
            parent: None,
            fs,
            case,
            path: OnceCell::new(),
            read_only: Cell::new(false),
        }
    }

    /// Base for a new child of the node owning `self`.
    pub(crate) fn child(&self, name: &str, parent: ParentRef) -> Self {
        Self {
            name: name.to_string(),
            parent: Some(parent),
            fs: self.fs.clone(),
            case: self.case,
            path: OnceCell::new(),
            read_only: Cell::new(false),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Absolute path, computed on first use and cached.
    pub(crate) fn path(&self) -> &str {
        self.path.get_or_init(|| match &self.parent {
            None => "/".to_string(),
            Some(parent) => match parent.upgrade() {
                Some(parent) => vpath::combine(parent.path(), &self.name),
                None => vpath::combine("/", &self.name),
            },
        })
    }

    pub(crate) fn case(&self) -> CaseSensitivity {
        self.case
    }

    pub(crate) fn fs(&self) -> Option<Rc<FsState>> {
        self.fs.upgrade()
    }

    pub(crate) fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub(crate) fn parent(&self) -> Option<AnyDirectory> {
        self.parent.as_ref().and_then(ParentRef::upgrade)
    }

    pub(crate) fn is_read_only(&self) -> bool {
        self.read_only.get()
    }

    /// Set the read-only flag. Returns `false` if it was already set.
    pub(crate) fn freeze(&self) -> bool {
        !self.read_only.replace(true)
    }

    /// Fail with [`FsError::ReadOnly`] if this node is frozen.
    pub(crate) fn guard(&self, operation: &'static str) -> Result<(), FsError> {
        if self.is_read_only() {
            return Err(FsError::ReadOnly {
                path: self.path().to_string(),
                operation,
            });
        }
        Ok(())
    }
}

/// Non-owning reference from a node to its container.
#[derive(Clone)]
pub(crate) enum ParentRef {
    Directory(Weak<DirectoryInner>),
    Symlink(Weak<DirectorySymlinkInner>),
}

impl ParentRef {
    pub(crate) fn upgrade(&self) -> Option<AnyDirectory> {
        match self {
            ParentRef::Directory(weak) => weak
                .upgrade()
                .map(|inner| AnyDirectory::Directory(Directory { inner })),
            ParentRef::Symlink(weak) => weak
                .upgrade()
                .map(|inner| AnyDirectory::Symlink(DirectorySymlink { inner })),
        }
    }
}

// ============================================================================
// Entry
// ============================================================================

/// Any node in the tree.
///
/// Entries are cheap reference-counted handles. Two handles compare equal
/// only if they refer to the same node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// A regular file.
    File(File),
    /// A real directory.
    Directory(Directory),
    /// A symlink to a file.
    FileSymlink(FileSymlink),
    /// A symlink to a directory.
    DirectorySymlink(DirectorySymlink),
}

impl Entry {
    pub(crate) fn base(&self) -> &EntryBase {
        match self {
            Entry::File(file) => &file.inner.base,
            Entry::Directory(dir) => &dir.inner.base,
            Entry::FileSymlink(link) => &link.inner.base,
            Entry::DirectorySymlink(link) => &link.inner.base,
        }
    }

    pub(crate) fn id(&self) -> NodeId {
        match self {
            Entry::File(file) => Rc::as_ptr(&file.inner) as *const () as NodeId,
            Entry::Directory(dir) => dir.id(),
            Entry::FileSymlink(link) => Rc::as_ptr(&link.inner) as *const () as NodeId,
            Entry::DirectorySymlink(link) => Rc::as_ptr(&link.inner) as *const () as NodeId,
        }
    }

    /// Name of this entry within its parent (`""` for the root).
    pub fn name(&self) -> &str {
        self.base().name()
    }

    /// Absolute virtual path, cached after the first call.
    pub fn path(&self) -> &str {
        self.base().path()
    }

    /// Kind as seen through the tree; symlinks report their target kind.
    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::File(_) | Entry::FileSymlink(_) => EntryKind::File,
            Entry::Directory(_) | Entry::DirectorySymlink(_) => EntryKind::Directory,
        }
    }

    /// Returns `true` for either kind of symlink.
    pub fn is_symlink(&self) -> bool {
        matches!(self, Entry::FileSymlink(_) | Entry::DirectorySymlink(_))
    }

    /// The container holding this entry, or `None` for the root.
    pub fn parent(&self) -> Option<AnyDirectory> {
        self.base().parent()
    }

    /// Returns `true` once this entry has been frozen.
    pub fn is_read_only(&self) -> bool {
        self.base().is_read_only()
    }

    /// Freeze this entry and everything already materialized beneath it.
    ///
    /// Irreversible and idempotent. Children materialized later start
    /// frozen.
    pub fn make_read_only(&self) {
        match self {
            Entry::File(file) => file.make_read_only(),
            Entry::Directory(dir) => dir.make_read_only(),
            Entry::FileSymlink(link) => link.make_read_only(),
            Entry::DirectorySymlink(link) => link.make_read_only(),
        }
    }

    /// Returns `true` while the parent still holds this exact node.
    ///
    /// Becomes `false` as soon as the entry is removed. The root always
    /// exists. For an entry seen through a directory symlink, the link is
    /// resolved again first, so the answer also turns `false` once the
    /// target has left the tree.
    pub fn exists(&self) -> bool {
        let base = self.base();
        if base.is_root() {
            return true;
        }
        match base.parent() {
            Some(parent @ AnyDirectory::Symlink(_)) => {
                parent.own_entries().iter().any(|entry| entry == self)
            }
            Some(parent) => parent.cached_entries().iter().any(|entry| entry == self),
            None => false,
        }
    }

    /// Path of this entry relative to `other`, compared under the
    /// filesystem's case policy.
    ///
    /// Pass another entry's [`path`](Self::path) to relate two entries.
    pub fn relative_to(&self, other: &str) -> String {
        vpath::relative(other, self.path(), self.base().case())
    }

    /// View this entry as a file, if it is one (directly or via symlink).
    pub fn as_file(&self) -> Option<AnyFile> {
        match self {
            Entry::File(file) => Some(AnyFile::File(file.clone())),
            Entry::FileSymlink(link) => Some(AnyFile::Symlink(link.clone())),
            _ => None,
        }
    }

    /// View this entry as a directory, if it is one (directly or via symlink).
    pub fn as_directory(&self) -> Option<AnyDirectory> {
        match self {
            Entry::Directory(dir) => Some(AnyDirectory::Directory(dir.clone())),
            Entry::DirectorySymlink(link) => Some(AnyDirectory::Symlink(link.clone())),
            _ => None,
        }
    }

    /// Copy-on-write clone of this entry under `parent`.
    ///
    /// Nothing is materialized: files and directories remember `self` as
    /// their shadow and load from it on first access, symlinks copy their
    /// target path.
    pub(crate) fn shadow_into(&self, parent: &Directory) -> Entry {
        let base = parent.child_base(self.name());
        match self {
            Entry::File(file) => Entry::File(File::from_parts(base, Content::Shadow(file.clone()))),
            Entry::Directory(dir) => {
                Entry::Directory(Directory::from_parts(base, Contents::Shadow(dir.clone())))
            }
            Entry::FileSymlink(link) => {
                Entry::FileSymlink(FileSymlink::from_parts(base, link.target()))
            }
            Entry::DirectorySymlink(link) => {
                Entry::DirectorySymlink(DirectorySymlink::from_parts(base, link.target()))
            }
        }
    }
}

impl From<File> for Entry {
    fn from(file: File) -> Self {
        Entry::File(file)
    }
}

impl From<Directory> for Entry {
    fn from(dir: Directory) -> Self {
        Entry::Directory(dir)
    }
}

impl From<FileSymlink> for Entry {
    fn from(link: FileSymlink) -> Self {
        Entry::FileSymlink(link)
    }
}

impl From<DirectorySymlink> for Entry {
    fn from(link: DirectorySymlink) -> Self {
        Entry::DirectorySymlink(link)
    }
}
