//! File nodes and lazily loaded content.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use super::{Entry, EntryBase, FileSymlink};
use crate::resolver::BackingResolver;
use crate::FsError;

/// Where a file's content comes from.
pub(crate) enum Content {
    Resolver(Rc<dyn BackingResolver>),
    Shadow(File),
    Loaded(Option<Rc<str>>),
}

pub(crate) struct FileInner {
    pub(crate) base: EntryBase,
    content: RefCell<Content>,
}

/// A regular file holding optional text content.
///
/// Content backed by a resolver or by a shadowed file is fetched on the
/// first [`get_content`](Self::get_content) call and kept from then on.
#[derive(Clone)]
pub struct File {
    pub(crate) inner: Rc<FileInner>,
}

impl File {
    pub(crate) fn from_parts(base: EntryBase, content: Content) -> Self {
        Self {
            inner: Rc::new(FileInner {
                base,
                content: RefCell::new(content),
            }),
        }
    }

    /// Name within the parent directory.
    pub fn name(&self) -> &str {
        self.inner.base.name()
    }

    /// Absolute virtual path.
    pub fn path(&self) -> &str {
        self.inner.base.path()
    }

    /// Returns `true` once this file has been frozen.
    pub fn is_read_only(&self) -> bool {
        self.inner.base.is_read_only()
    }

    /// Freeze this file. Irreversible.
    pub fn make_read_only(&self) {
        self.inner.base.freeze();
    }

    /// Returns `true` while the parent still holds this file.
    pub fn exists(&self) -> bool {
        Entry::File(self.clone()).exists()
    }

    /// Returns `true` once content no longer depends on a resolver or shadow.
    pub fn is_content_loaded(&self) -> bool {
        matches!(&*self.inner.content.borrow(), Content::Loaded(_))
    }

    /// Current content, loading it on first access.
    ///
    /// `None` means the file has no content, or that the backing store
    /// could not produce any.
    pub fn get_content(&self) -> Option<Rc<str>> {
        let pending = {
            let mut content = self.inner.content.borrow_mut();
            if let Content::Loaded(value) = &*content {
                return value.clone();
            }
            std::mem::replace(&mut *content, Content::Loaded(None))
        };

        let value = match pending {
            Content::Resolver(resolver) => resolver.read_content(self.path()).map(Rc::from),
            Content::Shadow(original) => original.get_content(),
            Content::Loaded(value) => value,
        };
        debug!(path = self.path(), loaded = value.is_some(), "loaded file content");
        *self.inner.content.borrow_mut() = Content::Loaded(value.clone());
        value
    }

    /// Replace the content, dropping any pending resolver or shadow.
    ///
    /// # Errors
    ///
    /// [`FsError::ReadOnly`] if the file is frozen.
    pub fn set_content(&self, content: impl Into<Rc<str>>) -> Result<(), FsError> {
        self.inner.base.guard("set_content")?;
        *self.inner.content.borrow_mut() = Content::Loaded(Some(content.into()));
        Ok(())
    }

    /// Clear the content to "absent".
    ///
    /// # Errors
    ///
    /// [`FsError::ReadOnly`] if the file is frozen.
    pub fn clear_content(&self) -> Result<(), FsError> {
        self.inner.base.guard("clear_content")?;
        *self.inner.content.borrow_mut() = Content::Loaded(None);
        Ok(())
    }
}

impl PartialEq for File {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for File {}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("path", &self.path())
            .field("read_only", &self.is_read_only())
            .finish()
    }
}

// ============================================================================
// AnyFile
// ============================================================================

/// A file reached through the tree: either the file itself or a symlink
/// to one.
///
/// Content operations on the symlink variant are forwarded to the file it
/// resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyFile {
    /// A real file.
    File(File),
    /// A symlink to a file.
    Symlink(FileSymlink),
}

impl AnyFile {
    /// Name within the parent.
    pub fn name(&self) -> &str {
        match self {
            AnyFile::File(file) => file.name(),
            AnyFile::Symlink(link) => link.name(),
        }
    }

    /// Absolute virtual path.
    pub fn path(&self) -> &str {
        match self {
            AnyFile::File(file) => file.path(),
            AnyFile::Symlink(link) => link.path(),
        }
    }

    /// Returns `true` for the symlink variant.
    pub fn is_symlink(&self) -> bool {
        matches!(self, AnyFile::Symlink(_))
    }

    /// Returns `true` once this node has been frozen.
    pub fn is_read_only(&self) -> bool {
        match self {
            AnyFile::File(file) => file.is_read_only(),
            AnyFile::Symlink(link) => link.is_read_only(),
        }
    }

    /// The real file behind this handle, or `None` for a broken symlink.
    pub fn real_file(&self) -> Option<File> {
        match self {
            AnyFile::File(file) => Some(file.clone()),
            AnyFile::Symlink(link) => link.real_file(),
        }
    }

    /// See [`File::get_content`].
    pub fn get_content(&self) -> Option<Rc<str>> {
        match self {
            AnyFile::File(file) => file.get_content(),
            AnyFile::Symlink(link) => link.get_content(),
        }
    }

    /// See [`File::set_content`].
    pub fn set_content(&self, content: impl Into<Rc<str>>) -> Result<(), FsError> {
        match self {
            AnyFile::File(file) => file.set_content(content),
            AnyFile::Symlink(link) => link.set_content(content),
        }
    }

    /// See [`File::clear_content`].
    pub fn clear_content(&self) -> Result<(), FsError> {
        match self {
            AnyFile::File(file) => file.clear_content(),
            AnyFile::Symlink(link) => link.clear_content(),
        }
    }

    /// Convert into the generic [`Entry`] handle.
    pub fn into_entry(self) -> Entry {
        match self {
            AnyFile::File(file) => Entry::File(file),
            AnyFile::Symlink(link) => Entry::FileSymlink(link),
        }
    }
}

impl From<File> for AnyFile {
    fn from(file: File) -> Self {
        AnyFile::File(file)
    }
}

impl From<FileSymlink> for AnyFile {
    fn from(link: FileSymlink) -> Self {
        AnyFile::Symlink(link)
    }
}
