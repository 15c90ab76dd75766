//! # Symlinks
//!
//! Both symlink kinds store their target as a path string and resolve it
//! against the owning filesystem on access. Nothing is cached for a file
//! symlink. A directory symlink keeps a mirror of the target's children
//! while the target stays attached.
//!
//! ## Resolution
//!
//! - Relative targets resolve against the directory holding the link
//! - Chains are followed until a real node is reached
//! - A node seen twice in one chain breaks the link
//! - A directory symlink consulted again while it is resolving is broken
//!
//! ## Mirroring
//!
//! Once resolved, a directory symlink subscribes to the target's `Added`
//! and `Removed` events and to the `Removed` event of the target's parent.
//! Children are presented through wrapper symlinks whose parent is the
//! link itself, so paths read as if the link were a real directory.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::debug;

use super::directory::DirectoryInner;
use super::{AnyDirectory, AnyFile, Directory, Entry, EntryBase, File, NodeId, ParentRef};
use crate::events::{ChildEvent, ListenerId, Listeners};
use crate::{EntryKind, EntryQuery, FsError, vpath};

/// Follow `entry` through symlinks until a real node is reached.
///
/// Returns `None` if the chain dangles, revisits a node, or reaches
/// anything of a different kind than `entry`.
pub(crate) fn resolve_chain(entry: Entry) -> Option<Entry> {
    let kind = entry.kind();
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut current = entry;
    loop {
        if current.kind() != kind {
            debug!(path = current.path(), expected = ?kind, "symlink target has the wrong kind");
            return None;
        }
        let (base, target) = match &current {
            Entry::FileSymlink(link) => (&link.inner.base, link.target()),
            Entry::DirectorySymlink(link) => (&link.inner.base, link.target()),
            Entry::File(_) | Entry::Directory(_) => break,
        };
        if !visited.insert(current.id()) {
            debug!(path = current.path(), "symlink cycle detected");
            return None;
        }
        current = follow(base, &target)?;
    }
    Some(current)
}

fn follow(base: &EntryBase, target: &str) -> Option<Entry> {
    let fs = base.fs()?;
    let absolute = vpath::resolve(&vpath::dirname(base.path()), target);
    let found = fs.lookup_absolute(&absolute);
    if found.is_none() {
        debug!(path = base.path(), target = %absolute, "symlink target missing");
    }
    found
}

// ============================================================================
// File symlink
// ============================================================================

pub(crate) struct FileSymlinkInner {
    pub(crate) base: EntryBase,
    target: RefCell<String>,
}

/// Symlink to a file.
///
/// Reads and writes are forwarded to the file the target resolves to at
/// the time of the call. A broken link reads as absent and ignores writes.
#[derive(Clone)]
pub struct FileSymlink {
    pub(crate) inner: Rc<FileSymlinkInner>,
}

impl FileSymlink {
    pub(crate) fn from_parts(base: EntryBase, target: String) -> Self {
        Self {
            inner: Rc::new(FileSymlinkInner {
                base,
                target: RefCell::new(target),
            }),
        }
    }

    /// Name within the parent.
    pub fn name(&self) -> &str {
        self.inner.base.name()
    }

    /// Absolute virtual path of the link itself.
    pub fn path(&self) -> &str {
        self.inner.base.path()
    }

    /// Returns `true` once the link has been frozen.
    pub fn is_read_only(&self) -> bool {
        self.inner.base.is_read_only()
    }

    /// Freeze the link. The target file is not affected.
    pub fn make_read_only(&self) {
        self.inner.base.freeze();
    }

    /// Target path as stored.
    pub fn target(&self) -> String {
        self.inner.target.borrow().clone()
    }

    /// Point the link somewhere else.
    ///
    /// # Errors
    ///
    /// [`FsError::ReadOnly`] if the link is frozen.
    pub fn set_target(&self, target: impl Into<String>) -> Result<(), FsError> {
        self.inner.base.guard("set_target")?;
        *self.inner.target.borrow_mut() = target.into();
        Ok(())
    }

    /// The file this link currently resolves to.
    pub fn real_file(&self) -> Option<File> {
        match resolve_chain(Entry::FileSymlink(self.clone()))? {
            Entry::File(file) => Some(file),
            _ => None,
        }
    }

    /// Returns `true` if the target is missing, not a file, or cyclic.
    pub fn is_broken(&self) -> bool {
        self.real_file().is_none()
    }

    /// Content of the target file, or `None` if the link is broken.
    pub fn get_content(&self) -> Option<Rc<str>> {
        self.real_file()?.get_content()
    }

    /// Write through to the target file. Does nothing if the link is broken.
    ///
    /// # Errors
    ///
    /// [`FsError::ReadOnly`] if the link or its target is frozen.
    pub fn set_content(&self, content: impl Into<Rc<str>>) -> Result<(), FsError> {
        self.inner.base.guard("set_content")?;
        match self.real_file() {
            Some(file) => file.set_content(content),
            None => Ok(()),
        }
    }

    /// Clear the target file's content. Does nothing if the link is broken.
    ///
    /// # Errors
    ///
    /// [`FsError::ReadOnly`] if the link or its target is frozen.
    pub fn clear_content(&self) -> Result<(), FsError> {
        self.inner.base.guard("clear_content")?;
        match self.real_file() {
            Some(file) => file.clear_content(),
            None => Ok(()),
        }
    }
}

impl PartialEq for FileSymlink {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for FileSymlink {}

impl fmt::Debug for FileSymlink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSymlink")
            .field("path", &self.path())
            .field("target", &*self.inner.target.borrow())
            .finish()
    }
}

// ============================================================================
// Directory symlink
// ============================================================================

enum LinkState {
    Unresolved,
    Resolved(Mirror),
}

struct Mirror {
    target: Weak<DirectoryInner>,
    subscriptions: Vec<Subscription>,
    entries: Vec<Mirrored>,
}

/// Wrapper presented for one child of the target.
struct Mirrored {
    source: NodeId,
    wrapper: Entry,
}

struct Subscription {
    source: Weak<DirectoryInner>,
    id: ListenerId,
}

impl Subscription {
    fn cancel(self) {
        if let Some(source) = self.source.upgrade() {
            source.events.remove(self.id);
        }
    }
}

pub(crate) struct DirectorySymlinkInner {
    pub(crate) base: EntryBase,
    target: RefCell<String>,
    state: RefCell<LinkState>,
    resolving: Cell<bool>,
    events: Listeners,
    this: Weak<DirectorySymlinkInner>,
}

impl Drop for DirectorySymlinkInner {
    fn drop(&mut self) {
        let state = std::mem::replace(self.state.get_mut(), LinkState::Unresolved);
        if let LinkState::Resolved(mirror) = state {
            for subscription in mirror.subscriptions {
                subscription.cancel();
            }
        }
    }
}

/// Symlink to a directory, presenting a live view of the target.
///
/// Children of the target appear beneath the link as wrapper symlinks,
/// created once per child and kept in step with later additions and
/// removals. Mutations through the link are applied to the target.
#[derive(Clone)]
pub struct DirectorySymlink {
    pub(crate) inner: Rc<DirectorySymlinkInner>,
}

impl DirectorySymlink {
    pub(crate) fn from_parts(base: EntryBase, target: String) -> Self {
        Self {
            inner: Rc::new_cyclic(|this| DirectorySymlinkInner {
                base,
                target: RefCell::new(target),
                state: RefCell::new(LinkState::Unresolved),
                resolving: Cell::new(false),
                events: Listeners::default(),
                this: this.clone(),
            }),
        }
    }

    /// Name within the parent.
    pub fn name(&self) -> &str {
        self.inner.base.name()
    }

    /// Absolute virtual path of the link itself.
    pub fn path(&self) -> &str {
        self.inner.base.path()
    }

    /// Returns `true` once the link has been frozen.
    pub fn is_read_only(&self) -> bool {
        self.inner.base.is_read_only()
    }

    /// Freeze the link and the wrappers it currently presents.
    ///
    /// The target directory is not affected.
    pub fn make_read_only(&self) {
        if !self.inner.base.freeze() {
            return;
        }
        for wrapper in self.cached_entries() {
            wrapper.make_read_only();
        }
    }

    /// Target path as stored.
    pub fn target(&self) -> String {
        self.inner.target.borrow().clone()
    }

    /// Point the link somewhere else, discarding the current mirror.
    ///
    /// # Errors
    ///
    /// [`FsError::ReadOnly`] if the link is frozen.
    pub fn set_target(&self, target: impl Into<String>) -> Result<(), FsError> {
        self.inner.base.guard("set_target")?;
        *self.inner.target.borrow_mut() = target.into();
        self.teardown();
        Ok(())
    }

    /// Returns `true` if the target is missing, not a directory, or cyclic.
    pub fn is_broken(&self) -> bool {
        self.real_directory().is_none()
    }

    /// Returns `true` while a mirror of the target is attached.
    pub fn is_resolved(&self) -> bool {
        matches!(&*self.inner.state.borrow(), LinkState::Resolved(_))
    }

    /// The directory this link currently resolves to.
    ///
    /// Walks the target path on every call. When it lands on a different
    /// directory than the one mirrored, the mirror is rebuilt silently; when
    /// it lands nowhere, the mirror is dropped.
    pub fn real_directory(&self) -> Option<Directory> {
        if self.inner.resolving.replace(true) {
            debug!(path = self.path(), "directory symlink reached while resolving itself");
            return None;
        }
        let resolved = resolve_chain(Entry::DirectorySymlink(self.clone()));
        self.inner.resolving.set(false);

        let Some(Entry::Directory(target)) = resolved else {
            self.teardown();
            return None;
        };
        if self.mirrored_target().as_ref() != Some(&target) {
            self.teardown();
            self.attach(&target);
        }
        Some(target)
    }

    /// Number of listeners registered on this link.
    pub fn listener_count(&self) -> usize {
        self.inner.events.len()
    }

    /// Subscribe to additions or removals seen through the link.
    ///
    /// Handlers receive the wrapper entries, not the target's children.
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

    /// This link as a generic container.
    pub fn to_container(&self) -> AnyDirectory {
        AnyDirectory::Symlink(self.clone())
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
    // Mirror
    // ------------------------------------------------------------------------

    /// Wrappers for the target's children, resolving first.
    pub(crate) fn own_entries(&self) -> Vec<Entry> {
        if self.real_directory().is_none() {
            return Vec::new();
        }
        self.cached_entries()
    }

    /// Wrappers currently mirrored, without resolving.
    pub(crate) fn cached_entries(&self) -> Vec<Entry> {
        match &*self.inner.state.borrow() {
            LinkState::Resolved(mirror) => mirror
                .entries
                .iter()
                .map(|mirrored| mirrored.wrapper.clone())
                .collect(),
            LinkState::Unresolved => Vec::new(),
        }
    }

    fn mirrored_target(&self) -> Option<Directory> {
        match &*self.inner.state.borrow() {
            LinkState::Resolved(mirror) => mirror.target.upgrade().map(|inner| Directory { inner }),
            LinkState::Unresolved => None,
        }
    }

    fn attach(&self, target: &Directory) {
        let mut subscriptions = Vec::with_capacity(3);

        let this = self.inner.this.clone();
        let id = target.inner.events.add(
            ChildEvent::Added,
            Rc::new(move |child: &Entry| {
                if let Some(inner) = this.upgrade() {
                    DirectorySymlink { inner }.mirror_added(child);
                }
            }),
        );
        subscriptions.push(Subscription {
            source: Rc::downgrade(&target.inner),
            id,
        });

        let this = self.inner.this.clone();
        let id = target.inner.events.add(
            ChildEvent::Removed,
            Rc::new(move |child: &Entry| {
                if let Some(inner) = this.upgrade() {
                    DirectorySymlink { inner }.mirror_removed(child);
                }
            }),
        );
        subscriptions.push(Subscription {
            source: Rc::downgrade(&target.inner),
            id,
        });

        if let Some(AnyDirectory::Directory(parent)) = target.parent() {
            let this = self.inner.this.clone();
            let target_id = target.id();
            let id = parent.inner.events.add(
                ChildEvent::Removed,
                Rc::new(move |removed: &Entry| {
                    if removed.id() != target_id {
                        return;
                    }
                    if let Some(inner) = this.upgrade() {
                        let link = DirectorySymlink { inner };
                        debug!(path = link.path(), "directory symlink target detached");
                        link.teardown();
                    }
                }),
            );
            subscriptions.push(Subscription {
                source: Rc::downgrade(&parent.inner),
                id,
            });
        }

        let entries: Vec<Mirrored> = target
            .own_entries()
            .iter()
            .map(|child| Mirrored {
                source: child.id(),
                wrapper: self.wrap(child),
            })
            .collect();

        debug!(
            path = self.path(),
            target = target.path(),
            children = entries.len(),
            "directory symlink resolved"
        );
        *self.inner.state.borrow_mut() = LinkState::Resolved(Mirror {
            target: Rc::downgrade(&target.inner),
            subscriptions,
            entries,
        });
    }

    fn teardown(&self) {
        let previous = self.inner.state.replace(LinkState::Unresolved);
        if let LinkState::Resolved(mirror) = previous {
            debug!(path = self.path(), "directory symlink mirror released");
            for subscription in mirror.subscriptions {
                subscription.cancel();
            }
        }
    }

    /// Wrapper symlink standing in for `child` beneath this link.
    fn wrap(&self, child: &Entry) -> Entry {
        let base = self
            .inner
            .base
            .child(child.name(), ParentRef::Symlink(self.inner.this.clone()));
        let target = child.path().to_string();
        let wrapper = match child.kind() {
            EntryKind::File => Entry::FileSymlink(FileSymlink::from_parts(base, target)),
            EntryKind::Directory => {
                Entry::DirectorySymlink(DirectorySymlink::from_parts(base, target))
            }
        };
        if self.is_read_only() {
            wrapper.make_read_only();
        }
        wrapper
    }

    fn mirror_added(&self, child: &Entry) {
        let wrapper = {
            let mut state = self.inner.state.borrow_mut();
            let LinkState::Resolved(mirror) = &mut *state else {
                return;
            };
            if mirror.entries.iter().any(|mirrored| mirrored.source == child.id()) {
                return;
            }
            let wrapper = self.wrap(child);
            mirror.entries.push(Mirrored {
                source: child.id(),
                wrapper: wrapper.clone(),
            });
            wrapper
        };
        self.inner.events.emit(ChildEvent::Added, &wrapper);
    }

    fn mirror_removed(&self, child: &Entry) {
        let wrapper = {
            let mut state = self.inner.state.borrow_mut();
            let LinkState::Resolved(mirror) = &mut *state else {
                return;
            };
            let Some(index) = mirror
                .entries
                .iter()
                .position(|mirrored| mirrored.source == child.id())
            else {
                return;
            };
            mirror.entries.remove(index).wrapper
        };
        self.inner.events.emit(ChildEvent::Removed, &wrapper);
    }
}

impl PartialEq for DirectorySymlink {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for DirectorySymlink {}

impl fmt::Debug for DirectorySymlink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectorySymlink")
            .field("path", &self.path())
            .field("target", &*self.inner.target.borrow())
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CaseSensitivity, FileSystem};

    fn project() -> FileSystem {
        let fs = FileSystem::new(CaseSensitivity::Sensitive);
        fs.add_file("/proj/src/a.ts", "let a = 1;").unwrap();
        fs.add_file("/proj/src/b.ts", "let b = 2;").unwrap();
        fs
    }

    fn link(fs: &FileSystem, path: &str, target: &str) -> DirectorySymlink {
        match fs.add_symlink_to(path, EntryKind::Directory, target).unwrap() {
            Some(Entry::DirectorySymlink(link)) => link,
            other => panic!("expected directory symlink, got {other:?}"),
        }
    }

    #[test]
    fn file_symlink_reads_and_writes_through() {
        let fs = project();
        let file = fs.get_entry("/proj/src/a.ts", false).unwrap();
        let created = fs.add_symlink("/proj/alias.ts", &file).unwrap();
        let Some(Entry::FileSymlink(alias)) = created else {
            panic!("expected file symlink");
        };
        assert_eq!(alias.get_content().as_deref(), Some("let a = 1;"));
        alias.set_content("let a = 3;").unwrap();
        let real = fs.get_file("/proj/src/a.ts", false).unwrap();
        assert_eq!(real.get_content().as_deref(), Some("let a = 3;"));
    }

    #[test]
    fn relative_target_resolves_from_link_parent() {
        let fs = project();
        let entry = fs
            .add_symlink_to("/proj/lib/alias.ts", EntryKind::File, "../src/b.ts")
            .unwrap()
            .unwrap();
        let Entry::FileSymlink(alias) = entry else {
            panic!("expected file symlink");
        };
        assert_eq!(alias.real_file().unwrap().path(), "/proj/src/b.ts");
    }

    #[test]
    fn broken_file_symlink_reads_absent_and_ignores_writes() {
        let fs = project();
        let Some(Entry::FileSymlink(alias)) = fs
            .add_symlink_to("/proj/missing.ts", EntryKind::File, "/nowhere.ts")
            .unwrap()
        else {
            panic!("expected file symlink");
        };
        assert!(alias.is_broken());
        assert_eq!(alias.get_content(), None);
        alias.set_content("x").unwrap();
        alias.clear_content().unwrap();
        assert!(fs.get_entry("/nowhere.ts", false).is_none());
    }

    #[test]
    fn file_symlink_to_directory_is_broken() {
        let fs = project();
        let Some(Entry::FileSymlink(alias)) = fs
            .add_symlink_to("/proj/odd.ts", EntryKind::File, "/proj/src")
            .unwrap()
        else {
            panic!("expected file symlink");
        };
        assert!(alias.is_broken());
    }

    #[test]
    fn frozen_link_rejects_retarget() {
        let fs = project();
        let lib = link(&fs, "/proj/lib", "/proj/src");
        lib.make_read_only();
        assert!(lib.set_target("/proj").unwrap_err().is_read_only());
        assert_eq!(lib.target(), "/proj/src");
    }

    #[test]
    fn directory_symlink_mirrors_children() {
        let fs = project();
        let lib = link(&fs, "/proj/lib", "/proj/src");
        let entries = lib.get_entries(&EntryQuery::new());
        let paths: Vec<&str> = entries.iter().map(Entry::path).collect();
        assert_eq!(paths, vec!["/proj/lib/a.ts", "/proj/lib/b.ts"]);
        assert!(entries.iter().all(Entry::is_symlink));
        assert!(lib.is_resolved());
    }

    #[test]
    fn wrappers_are_memoized() {
        let fs = project();
        let lib = link(&fs, "/proj/lib", "/proj/src");
        let first = lib.get_entry("a.ts", false).unwrap();
        let second = lib.get_entry("a.ts", false).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn mirror_follows_target_mutations() {
        let fs = project();
        let lib = link(&fs, "/proj/lib", "/proj/src");
        assert_eq!(lib.get_entries(&EntryQuery::new()).len(), 2);

        let added = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&added);
        lib.add_listener(ChildEvent::Added, move |entry| {
            log.borrow_mut().push(entry.path().to_string())
        });

        fs.add_file("/proj/src/c.ts", "let c = 3;").unwrap();
        assert!(lib.get_entry("c.ts", false).is_some());
        assert_eq!(*added.borrow(), vec!["/proj/lib/c.ts"]);

        fs.remove_file("/proj/src/a.ts").unwrap();
        assert!(lib.get_entry("a.ts", false).is_none());
    }

    #[test]
    fn retarget_discards_mirror() {
        let fs = project();
        fs.add_file("/other/z.ts", "z").unwrap();
        let lib = link(&fs, "/proj/lib", "/proj/src");
        assert!(lib.get_entry("a.ts", false).is_some());

        lib.set_target("/other").unwrap();
        assert!(!lib.is_resolved());
        assert!(lib.get_entry("a.ts", false).is_none());
        assert!(lib.get_entry("z.ts", false).is_some());
    }

    #[test]
    fn self_referencing_directory_symlink_is_broken() {
        let fs = project();
        let this = link(&fs, "/proj/self", "/proj/self");
        assert!(this.is_broken());
        assert!(this.get_entries(&EntryQuery::new()).is_empty());
    }

    #[test]
    fn dropping_link_unsubscribes_from_target() {
        let fs = project();
        let src = fs.get_directory("/proj/src", false).unwrap().real_directory().unwrap();
        let lib = link(&fs, "/proj/lib", "/proj/src");
        lib.get_entries(&EntryQuery::new());
        assert_eq!(src.listener_count(), 2);

        fs.remove_directory("/proj/lib").unwrap();
        drop(lib);
        assert_eq!(src.listener_count(), 0);
    }

    #[test]
    fn link_to_the_wrong_kind_is_not_followed() {
        let fs = project();
        let odd = link(&fs, "/proj/odd", "/proj/src/a.ts");
        assert!(odd.is_broken());
        assert!(fs.get_entry("/proj/odd", false).is_some());
        assert!(fs.get_entry("/proj/odd", true).is_none());
        assert!(fs.get_file("/proj/odd", true).is_none());

        fs.add_symlink_to("/proj/src.ts", EntryKind::File, "/proj/src")
            .unwrap();
        assert!(fs.get_entry("/proj/src.ts", true).is_none());
        assert!(fs.get_directory("/proj/src.ts", true).is_none());
    }

    #[test]
    fn file_link_through_directory_link_is_broken() {
        let fs = project();
        link(&fs, "/proj/odd", "/proj/src/a.ts");
        let created = fs
            .add_symlink_to("/proj/alias.ts", EntryKind::File, "/proj/odd")
            .unwrap();
        let Some(Entry::FileSymlink(alias)) = created else {
            panic!("expected file symlink");
        };
        assert!(alias.is_broken());
        assert_eq!(alias.get_content(), None);
        assert!(fs.get_entry("/proj/alias.ts", true).is_none());
    }

    #[test]
    fn wrappers_stop_existing_once_target_ancestor_is_removed() {
        let fs = FileSystem::new(CaseSensitivity::Sensitive);
        fs.add_file("/proj/src/lib/a.ts", "x").unwrap();
        let lib = link(&fs, "/lib", "/proj/src/lib");
        let wrapper = lib.get_entry("a.ts", false).unwrap();
        assert!(wrapper.exists());

        assert!(fs.remove_directory("/proj").unwrap());
        assert!(!wrapper.exists());
        assert!(lib.is_broken());
    }
}
