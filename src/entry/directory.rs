//! Real directories and their lazily populated child lists.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, warn};

use super::container::Creation;
use super::file::Content;
use super::{
    AnyDirectory, AnyFile, DirectorySymlink, Entry, EntryBase, File, FileSymlink, NodeId,
    ParentRef,
};
use crate::events::{ChildEvent, ListenerId, Listeners};
use crate::resolver::BackingResolver;
use crate::{EntryKind, EntryQuery, FsError};

/// Where a directory's children come from.
///
/// Every state but `Populated` is consumed on first access.
pub(crate) enum Contents {
    /// Ask the backing resolver for a listing.
    Resolver(Rc<dyn BackingResolver>),
    /// Clone the children of a directory in another tree.
    Shadow(Directory),
    /// Population is running.
    Populating,
    Populated(Vec<Entry>),
}

pub(crate) struct DirectoryInner {
    pub(crate) base: EntryBase,
    contents: RefCell<Contents>,
    pub(crate) events: Listeners,
}

/// A real directory node.
///
/// The child list is materialized on first access, either from a backing
/// resolver or from the directory this one shadows. Mutations emit
/// [`ChildEvent`]s to registered listeners.
#[derive(Clone)]
pub struct Directory {
    pub(crate) inner: Rc<DirectoryInner>,
}

impl Directory {
    pub(crate) fn from_parts(base: EntryBase, contents: Contents) -> Self {
        Self {
            inner: Rc::new(DirectoryInner {
                base,
                contents: RefCell::new(contents),
                events: Listeners::default(),
            }),
        }
    }

    pub(crate) fn id(&self) -> NodeId {
        Rc::as_ptr(&self.inner) as *const () as NodeId
    }

    /// Name within the parent (`""` for the root).
    pub fn name(&self) -> &str {
        self.inner.base.name()
    }

    /// Absolute virtual path.
    pub fn path(&self) -> &str {
        self.inner.base.path()
    }

    /// The container holding this directory, or `None` for the root.
    pub fn parent(&self) -> Option<AnyDirectory> {
        self.inner.base.parent()
    }

    /// Returns `true` once this directory has been frozen.
    pub fn is_read_only(&self) -> bool {
        self.inner.base.is_read_only()
    }

    /// Returns `true` while the parent still holds this directory.
    pub fn exists(&self) -> bool {
        Entry::Directory(self.clone()).exists()
    }

    /// Returns `true` once the child list has been materialized.
    pub fn is_populated(&self) -> bool {
        matches!(&*self.inner.contents.borrow(), Contents::Populated(_))
    }

    /// Freeze this directory and every child materialized so far.
    ///
    /// Children that are populated later are frozen as they appear.
    pub fn make_read_only(&self) {
        if !self.inner.base.freeze() {
            return;
        }
        for child in self.cached_entries() {
            child.make_read_only();
        }
    }

    /// Number of listeners registered on this directory.
    pub fn listener_count(&self) -> usize {
        self.inner.events.len()
    }

    /// Subscribe to child additions or removals.
    pub fn add_listener(
        &self,
        event: ChildEvent,
        handler: impl Fn(&Entry) + 'static,
    ) -> ListenerId {
        self.inner.events.add(event, Rc::new(handler))
    }

    /// Unsubscribe; returns `false` if `id` was not registered here.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.events.remove(id)
    }

    /// This directory as a generic container.
    pub fn to_container(&self) -> AnyDirectory {
        AnyDirectory::Directory(self.clone())
    }

    /// See [`AnyDirectory::get_entries`].
    pub fn get_entries(&self, query: &EntryQuery) -> Vec<Entry> {
        self.to_container().get_entries(query)
    }

    /// See [`AnyDirectory::get_entry`].
    pub fn get_entry(&self, path: &str, follow_symlinks: bool) -> Option<Entry> {
        self.to_container().get_entry(path, follow_symlinks)
    }

    /// See [`AnyDirectory::get_file`].
    pub fn get_file(&self, path: &str, follow_symlinks: bool) -> Option<AnyFile> {
        self.to_container().get_file(path, follow_symlinks)
    }

    /// See [`AnyDirectory::get_directory`].
    pub fn get_directory(&self, path: &str, follow_symlinks: bool) -> Option<AnyDirectory> {
        self.to_container().get_directory(path, follow_symlinks)
    }

    /// See [`AnyDirectory::add_directory`].
    pub fn add_directory(&self, path: &str) -> Result<Option<AnyDirectory>, FsError> {
        self.to_container().add_directory(path)
    }

    /// See [`AnyDirectory::add_file`].
    pub fn add_file(
        &self,
        path: &str,
        content: impl Into<Rc<str>>,
    ) -> Result<Option<AnyFile>, FsError> {
        self.to_container().add_file(path, content)
    }

    /// See [`AnyDirectory::add_symlink`].
    pub fn add_symlink(&self, path: &str, target: &Entry) -> Result<Option<Entry>, FsError> {
        self.to_container().add_symlink(path, target)
    }

    /// See [`AnyDirectory::remove_directory`].
    pub fn remove_directory(&self, path: &str) -> Result<bool, FsError> {
        self.to_container().remove_directory(path)
    }

    /// See [`AnyDirectory::remove_file`].
    pub fn remove_file(&self, path: &str) -> Result<bool, FsError> {
        self.to_container().remove_file(path)
    }

    // ------------------------------------------------------------------------
    // Child list
    // ------------------------------------------------------------------------

    /// Immediate children, populating on first call.
    pub(crate) fn own_entries(&self) -> Vec<Entry> {
        self.populate();
        self.cached_entries()
    }

    /// Immediate child named `name` under the case policy.
    pub(crate) fn own_entry(&self, name: &str) -> Option<Entry> {
        let case = self.inner.base.case();
        self.own_entries()
            .into_iter()
            .find(|entry| case.names_equal(entry.name(), name))
    }

    /// Children materialized so far, without triggering population.
    pub(crate) fn cached_entries(&self) -> Vec<Entry> {
        match &*self.inner.contents.borrow() {
            Contents::Populated(entries) => entries.clone(),
            _ => Vec::new(),
        }
    }

    fn populate(&self) {
        let source = {
            let mut contents = self.inner.contents.borrow_mut();
            match *contents {
                Contents::Populated(_) => return,
                Contents::Populating => {
                    warn!(path = self.path(), "directory listed while it is being populated");
                    return;
                }
                Contents::Resolver(_) | Contents::Shadow(_) => {}
            }
            std::mem::replace(&mut *contents, Contents::Populating)
        };

        let entries: Vec<Entry> = match source {
            Contents::Resolver(resolver) => self.children_from_resolver(&resolver),
            Contents::Shadow(original) => self.children_from_shadow(&original),
            Contents::Populating | Contents::Populated(_) => Vec::new(),
        };

        if self.is_read_only() {
            for entry in &entries {
                entry.make_read_only();
            }
        }
        debug!(path = self.path(), children = entries.len(), "populated directory");
        *self.inner.contents.borrow_mut() = Contents::Populated(entries);
    }

    fn children_from_shadow(&self, original: &Directory) -> Vec<Entry> {
        let case = self.inner.base.case();
        let mut entries: Vec<Entry> = Vec::new();
        for entry in original.own_entries() {
            if entries.iter().any(|kept| case.names_equal(kept.name(), entry.name())) {
                debug!(path = self.path(), name = entry.name(), "skipping duplicate shadowed name");
                continue;
            }
            entries.push(entry.shadow_into(self));
        }
        entries
    }

    fn children_from_resolver(&self, resolver: &Rc<dyn BackingResolver>) -> Vec<Entry> {
        let listing = resolver.list_children(self.path());
        let case = self.inner.base.case();
        let files = listing.files.iter().map(|name| (name, EntryKind::File));
        let directories = listing.directories.iter().map(|name| (name, EntryKind::Directory));

        let mut entries: Vec<Entry> = Vec::new();
        for (name, kind) in files.chain(directories) {
            if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
                debug!(path = self.path(), name, "skipping invalid backing name");
                continue;
            }
            if entries.iter().any(|entry| case.names_equal(entry.name(), name)) {
                debug!(path = self.path(), name, "skipping duplicate backing name");
                continue;
            }
            let base = self.child_base(name);
            entries.push(match kind {
                EntryKind::File => {
                    Entry::File(File::from_parts(base, Content::Resolver(Rc::clone(resolver))))
                }
                EntryKind::Directory => Entry::Directory(Directory::from_parts(
                    base,
                    Contents::Resolver(Rc::clone(resolver)),
                )),
            });
        }
        entries
    }

    pub(crate) fn child_base(&self, name: &str) -> EntryBase {
        self.inner
            .base
            .child(name, ParentRef::Directory(Rc::downgrade(&self.inner)))
    }

    /// Build, but do not attach, a child for `creation`.
    pub(crate) fn new_child(&self, name: &str, creation: &Creation) -> Entry {
        let base = self.child_base(name);
        match creation {
            Creation::Directory => {
                Entry::Directory(Directory::from_parts(base, Contents::Populated(Vec::new())))
            }
            Creation::Mount(resolver) => {
                let contents = Contents::Resolver(Rc::clone(resolver));
                Entry::Directory(Directory::from_parts(base, contents))
            }
            Creation::File(content) => {
                Entry::File(File::from_parts(base, Content::Loaded(content.clone())))
            }
            Creation::Symlink { kind: EntryKind::File, target } => {
                Entry::FileSymlink(FileSymlink::from_parts(base, target.clone()))
            }
            Creation::Symlink { kind: EntryKind::Directory, target } => {
                Entry::DirectorySymlink(DirectorySymlink::from_parts(base, target.clone()))
            }
        }
    }

    /// Append `entry` and notify `Added` listeners.
    ///
    /// Returns `false`, without notifying, while the directory is still
    /// being populated.
    pub(crate) fn insert_child(&self, entry: Entry) -> bool {
        self.populate();
        let inserted = match &mut *self.inner.contents.borrow_mut() {
            Contents::Populated(entries) => {
                entries.push(entry.clone());
                true
            }
            _ => false,
        };
        if inserted {
            self.inner.events.emit(ChildEvent::Added, &entry);
        } else {
            warn!(path = entry.path(), "entry added while its directory is being populated");
        }
        inserted
    }

    /// Detach `entry` and notify `Removed` listeners.
    pub(crate) fn detach_child(&self, entry: &Entry) -> bool {
        let removed = {
            let mut contents = self.inner.contents.borrow_mut();
            match &mut *contents {
                Contents::Populated(entries) => {
                    match entries.iter().position(|child| child == entry) {
                        Some(index) => {
                            entries.remove(index);
                            true
                        }
                        None => false,
                    }
                }
                _ => false,
            }
        };
        if removed {
            debug!(path = entry.path(), "detached entry");
            self.inner.events.emit(ChildEvent::Removed, entry);
        }
        removed
    }
}

impl PartialEq for Directory {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Directory {}

impl fmt::Debug for Directory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directory")
            .field("path", &self.path())
            .field("read_only", &self.is_read_only())
            .finish()
    }
}
