//! Directory-like containers and the path walks shared by every container
//! operation.
//!
//! Container operations take paths relative to the container. Absolute
//! paths, empty paths and paths that climb out through `..` are invalid
//! and behave like a miss.

use std::collections::HashSet;
use std::rc::Rc;

use tracing::debug;

use super::{AnyFile, Directory, DirectorySymlink, Entry, EntryBase, NodeId, resolve_chain};
use crate::events::{ChildEvent, ListenerId};
use crate::resolver::BackingResolver;
use crate::{EntryKind, EntryQuery, FsError, vpath};

/// A directory reached through the tree: either the directory itself or a
/// symlink to one.
///
/// Every container operation works on both variants. On the symlink
/// variant, reads go through the mirrored wrappers and writes are applied
/// to the real target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyDirectory {
    /// A real directory.
    Directory(Directory),
    /// A symlink to a directory.
    Symlink(DirectorySymlink),
}

impl AnyDirectory {
    pub(crate) fn base(&self) -> &EntryBase {
        match self {
            AnyDirectory::Directory(dir) => &dir.inner.base,
            AnyDirectory::Symlink(link) => &link.inner.base,
        }
    }

    /// Name within the parent (`""` for the root).
    pub fn name(&self) -> &str {
        self.base().name()
    }

    /// Absolute virtual path.
    pub fn path(&self) -> &str {
        self.base().path()
    }

    /// Returns `true` for the symlink variant.
    pub fn is_symlink(&self) -> bool {
        matches!(self, AnyDirectory::Symlink(_))
    }

    /// Returns `true` once this node has been frozen.
    pub fn is_read_only(&self) -> bool {
        self.base().is_read_only()
    }

    /// Freeze this container. See [`Entry::make_read_only`].
    pub fn make_read_only(&self) {
        match self {
            AnyDirectory::Directory(dir) => dir.make_read_only(),
            AnyDirectory::Symlink(link) => link.make_read_only(),
        }
    }

    /// The real directory behind this handle, or `None` for a broken
    /// symlink.
    pub fn real_directory(&self) -> Option<Directory> {
        match self {
            AnyDirectory::Directory(dir) => Some(dir.clone()),
            AnyDirectory::Symlink(link) => link.real_directory(),
        }
    }

    /// Convert into the generic [`Entry`] handle.
    pub fn into_entry(self) -> Entry {
        match self {
            AnyDirectory::Directory(dir) => Entry::Directory(dir),
            AnyDirectory::Symlink(link) => Entry::DirectorySymlink(link),
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Children matching `query`.
    ///
    /// Recursive queries walk depth-first and list a directory before its
    /// children. They descend through directory symlinks as well, but never
    /// enter the same real directory twice, so symlink loops terminate.
    ///
    /// ```rust
    /// use anyfs_vtree::{CaseSensitivity, EntryKind, EntryQuery, FileSystem};
    ///
    /// let fs = FileSystem::new(CaseSensitivity::Sensitive);
    /// fs.add_file("/src/a.ts", "").unwrap();
    /// fs.add_file("/src/nested/b.ts", "").unwrap();
    ///
    /// let query = EntryQuery::new().kind(EntryKind::File).recursive(true);
    /// let files = fs.get_directory("/src", false).unwrap().get_entries(&query);
    /// let paths: Vec<&str> = files.iter().map(|entry| entry.path()).collect();
    /// assert_eq!(paths, ["/src/a.ts", "/src/nested/b.ts"]);
    /// ```
    pub fn get_entries(&self, query: &EntryQuery) -> Vec<Entry> {
        let mut visited: HashSet<NodeId> = HashSet::new();
        if let Some(real) = self.real_directory() {
            visited.insert(real.id());
        }
        let mut results = Vec::new();
        collect_entries(self, query, &mut visited, &mut results);
        results
    }

    /// Entry at the relative `path`.
    ///
    /// With `follow_symlinks`, a symlink found at `path` is resolved to the
    /// real entry; a broken one yields `None`.
    pub fn get_entry(&self, path: &str, follow_symlinks: bool) -> Option<Entry> {
        lookup(self, path, follow_symlinks)
    }

    /// File at the relative `path`, or `None` if it is something else.
    pub fn get_file(&self, path: &str, follow_symlinks: bool) -> Option<AnyFile> {
        self.get_entry(path, follow_symlinks)?.as_file()
    }

    /// Directory at the relative `path`, or `None` if it is something else.
    pub fn get_directory(&self, path: &str, follow_symlinks: bool) -> Option<AnyDirectory> {
        self.get_entry(path, follow_symlinks)?.as_directory()
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// Create a directory at `path`, along with any missing parents.
    ///
    /// Returns the existing directory if there already is one, and `None`
    /// if `path` is invalid or a file is in the way.
    ///
    /// # Errors
    ///
    /// [`FsError::ReadOnly`] if a container that would change is frozen.
    pub fn add_directory(&self, path: &str) -> Result<Option<AnyDirectory>, FsError> {
        let created = create_at(self, path, &Creation::Directory)?;
        Ok(created.and_then(|entry| entry.as_directory()))
    }

    /// Create a file at `path` holding `content`, along with any missing
    /// parent directories.
    ///
    /// An existing file at `path` is returned as is; its content is not
    /// replaced.
    ///
    /// # Errors
    ///
    /// [`FsError::ReadOnly`] if a container that would change is frozen.
    pub fn add_file(
        &self,
        path: &str,
        content: impl Into<Rc<str>>,
    ) -> Result<Option<AnyFile>, FsError> {
        let creation = Creation::File(Some(content.into()));
        Ok(create_at(self, path, &creation)?.and_then(|entry| entry.as_file()))
    }

    /// Create a file at `path` with no content.
    ///
    /// # Errors
    ///
    /// [`FsError::ReadOnly`] if a container that would change is frozen.
    pub fn add_empty_file(&self, path: &str) -> Result<Option<AnyFile>, FsError> {
        Ok(create_at(self, path, &Creation::File(None))?.and_then(|entry| entry.as_file()))
    }

    /// Create a symlink at `path` pointing at `target`.
    ///
    /// The link stores `target`'s absolute path and takes its kind.
    ///
    /// # Errors
    ///
    /// [`FsError::ReadOnly`] if a container that would change is frozen.
    pub fn add_symlink(&self, path: &str, target: &Entry) -> Result<Option<Entry>, FsError> {
        self.add_symlink_to(path, target.kind(), target.path())
    }

    /// Create a symlink of `kind` at `path` storing the raw `target` path.
    ///
    /// Relative targets resolve against the directory holding the link.
    /// The target does not need to exist yet.
    ///
    /// # Errors
    ///
    /// [`FsError::ReadOnly`] if a container that would change is frozen.
    pub fn add_symlink_to(
        &self,
        path: &str,
        kind: EntryKind,
        target: &str,
    ) -> Result<Option<Entry>, FsError> {
        let creation = Creation::Symlink {
            kind,
            target: target.to_string(),
        };
        create_at(self, path, &creation)
    }

    /// Remove the directory (or directory symlink) at `path`.
    ///
    /// Returns `false` if nothing of that kind is there.
    ///
    /// # Errors
    ///
    /// [`FsError::ReadOnly`] if the owning container is frozen.
    pub fn remove_directory(&self, path: &str) -> Result<bool, FsError> {
        remove_at(self, path, EntryKind::Directory)
    }

    /// Remove the file (or file symlink) at `path`.
    ///
    /// # Errors
    ///
    /// [`FsError::ReadOnly`] if the owning container is frozen.
    pub fn remove_file(&self, path: &str) -> Result<bool, FsError> {
        remove_at(self, path, EntryKind::File)
    }

    /// Subscribe to child additions or removals.
    pub fn add_listener(
        &self,
        event: ChildEvent,
        handler: impl Fn(&Entry) + 'static,
    ) -> ListenerId {
        match self {
            AnyDirectory::Directory(dir) => dir.add_listener(event, handler),
            AnyDirectory::Symlink(link) => link.add_listener(event, handler),
        }
    }

    /// Unsubscribe; returns `false` if `id` was not registered here.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        match self {
            AnyDirectory::Directory(dir) => dir.remove_listener(id),
            AnyDirectory::Symlink(link) => link.remove_listener(id),
        }
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    pub(crate) fn guard(&self, operation: &'static str) -> Result<(), FsError> {
        self.base().guard(operation)
    }

    pub(crate) fn own_entries(&self) -> Vec<Entry> {
        match self {
            AnyDirectory::Directory(dir) => dir.own_entries(),
            AnyDirectory::Symlink(link) => link.own_entries(),
        }
    }

    pub(crate) fn own_entry(&self, name: &str) -> Option<Entry> {
        let case = self.base().case();
        self.own_entries()
            .into_iter()
            .find(|entry| case.names_equal(entry.name(), name))
    }

    pub(crate) fn cached_entries(&self) -> Vec<Entry> {
        match self {
            AnyDirectory::Directory(dir) => dir.cached_entries(),
            AnyDirectory::Symlink(link) => link.cached_entries(),
        }
    }
}

impl From<Directory> for AnyDirectory {
    fn from(dir: Directory) -> Self {
        AnyDirectory::Directory(dir)
    }
}

impl From<DirectorySymlink> for AnyDirectory {
    fn from(link: DirectorySymlink) -> Self {
        AnyDirectory::Symlink(link)
    }
}

// ============================================================================
// Path walks
// ============================================================================

/// What `create_at` should leave at the end of the path.
pub(crate) enum Creation {
    Directory,
    File(Option<Rc<str>>),
    Symlink { kind: EntryKind, target: String },
    /// A directory populated lazily from a resolver.
    Mount(Rc<dyn BackingResolver>),
}

impl Creation {
    fn operation(&self) -> &'static str {
        match self {
            Creation::Directory | Creation::Mount(_) => "add_directory",
            Creation::File(_) => "add_file",
            Creation::Symlink { .. } => "add_symlink",
        }
    }

    /// Whether an entry already at the path satisfies the request.
    fn accepts(&self, existing: &Entry) -> bool {
        match self {
            Creation::Directory | Creation::Mount(_) => existing.kind() == EntryKind::Directory,
            Creation::File(_) => existing.kind() == EntryKind::File,
            Creation::Symlink { kind, .. } => existing.is_symlink() && existing.kind() == *kind,
        }
    }
}

/// Walk `path` from `start`, creating missing directories on the way and
/// the requested entry at the end.
///
/// Crossing a directory symlink hands the rest of the walk to the real
/// target; the result is then looked up again from `start` so the caller
/// sees it through the link.
pub(crate) fn create_at(
    start: &AnyDirectory,
    path: &str,
    creation: &Creation,
) -> Result<Option<Entry>, FsError> {
    let operation = creation.operation();
    start.guard(operation)?;
    let Some(segments) = vpath::relative_segments(path) else {
        debug!(path, operation, "rejected invalid path");
        return Ok(None);
    };

    let mut current = start.clone();
    for (index, segment) in segments.iter().enumerate() {
        let dir = match &current {
            AnyDirectory::Directory(dir) => dir.clone(),
            AnyDirectory::Symlink(link) => {
                link.inner.base.guard(operation)?;
                let Some(real) = link.real_directory() else {
                    return Ok(None);
                };
                let rest = segments[index..].join("/");
                if create_at(&AnyDirectory::Directory(real), &rest, creation)?.is_none() {
                    return Ok(None);
                }
                return Ok(lookup(start, path, false));
            }
        };

        let last = index + 1 == segments.len();
        let next = match dir.own_entry(segment) {
            Some(existing) if last => return Ok(creation.accepts(&existing).then_some(existing)),
            Some(existing) => existing,
            None => {
                dir.inner.base.guard(operation)?;
                let child = if last {
                    dir.new_child(segment, creation)
                } else {
                    dir.new_child(segment, &Creation::Directory)
                };
                if !dir.insert_child(child.clone()) {
                    return Ok(None);
                }
                if last {
                    return Ok(Some(child));
                }
                child
            }
        };
        match next.as_directory() {
            Some(next) => current = next,
            None => return Ok(None),
        }
    }
    Ok(None)
}

/// Detach the entry of `kind` at `path` below `start`.
///
/// A miss is `Ok(false)` even inside a frozen subtree. The read-only check
/// runs only once there is an entry to remove, against the container that
/// would change.
fn remove_at(start: &AnyDirectory, path: &str, kind: EntryKind) -> Result<bool, FsError> {
    let operation = match kind {
        EntryKind::File => "remove_file",
        EntryKind::Directory => "remove_directory",
    };
    let Some(segments) = vpath::relative_segments(path) else {
        return Ok(false);
    };
    let Some((name, parents)) = segments.split_last() else {
        return Ok(false);
    };

    let mut current = start.clone();
    for segment in parents {
        match current.own_entry(segment).and_then(|entry| entry.as_directory()) {
            Some(next) => current = next,
            None => return Ok(false),
        }
    }

    match current {
        AnyDirectory::Directory(dir) => {
            let Some(entry) = dir.own_entry(name) else {
                return Ok(false);
            };
            if entry.kind() != kind {
                return Ok(false);
            }
            dir.inner.base.guard(operation)?;
            Ok(dir.detach_child(&entry))
        }
        AnyDirectory::Symlink(link) => {
            let Some(real) = link.real_directory() else {
                return Ok(false);
            };
            if real.own_entry(name).is_none_or(|entry| entry.kind() != kind) {
                return Ok(false);
            }
            link.inner.base.guard(operation)?;
            remove_at(&AnyDirectory::Directory(real), name, kind)
        }
    }
}

/// Find the entry at `path` below `start`.
pub(crate) fn lookup(start: &AnyDirectory, path: &str, follow_symlinks: bool) -> Option<Entry> {
    let segments = vpath::relative_segments(path)?;
    let (name, parents) = segments.split_last()?;
    let mut current = start.clone();
    for segment in parents {
        current = current.own_entry(segment)?.as_directory()?;
    }
    let entry = current.own_entry(name)?;
    if follow_symlinks {
        resolve_chain(entry)
    } else {
        Some(entry)
    }
}

fn collect_entries(
    dir: &AnyDirectory,
    query: &EntryQuery,
    visited: &mut HashSet<NodeId>,
    results: &mut Vec<Entry>,
) {
    for entry in dir.own_entries() {
        if query.matches(entry.name(), entry.kind()) {
            results.push(entry.clone());
        }
        if !query.is_recursive() {
            continue;
        }
        let Some(child) = entry.as_directory() else {
            continue;
        };
        let Some(real) = child.real_directory() else {
            continue;
        };
        if visited.insert(real.id()) {
            collect_entries(&child, query, visited, results);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CaseSensitivity, FileSystem};
    use regex::Regex;

    fn project() -> FileSystem {
        let fs = FileSystem::new(CaseSensitivity::Sensitive);
        fs.add_file("/proj/src/a.ts", "let a = 1;").unwrap();
        fs.add_file("/proj/src/nested/b.ts", "let b = 2;").unwrap();
        fs.add_file("/proj/readme.md", "# proj").unwrap();
        fs
    }

    fn paths(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(Entry::path).collect()
    }

    #[test]
    fn add_directory_creates_parents() {
        let fs = FileSystem::new(CaseSensitivity::Sensitive);
        let dir = fs.add_directory("/a/b/c").unwrap().unwrap();
        assert_eq!(dir.path(), "/a/b/c");
        assert!(fs.get_directory("/a/b", false).is_some());
    }

    #[test]
    fn add_existing_returns_it_unchanged() {
        let fs = project();
        let first = fs.get_file("/proj/src/a.ts", false).unwrap();
        let again = fs.add_file("/proj/src/a.ts", "other").unwrap().unwrap();
        assert_eq!(first, again);
        assert_eq!(again.get_content().as_deref(), Some("let a = 1;"));

        let dir = fs.get_directory("/proj/src", false).unwrap();
        assert_eq!(fs.add_directory("/proj/src").unwrap(), Some(dir));
    }

    #[test]
    fn kind_conflicts_yield_none() {
        let fs = project();
        assert!(fs.add_directory("/proj/readme.md").unwrap().is_none());
        assert!(fs.add_file("/proj/src", "x").unwrap().is_none());
        assert!(fs.add_file("/proj/readme.md/inner.ts", "x").unwrap().is_none());
    }

    #[test]
    fn invalid_relative_paths_are_misses() {
        let fs = project();
        let proj = fs.get_directory("/proj", false).unwrap();
        assert!(proj.get_entry("/proj/readme.md", false).is_none());
        assert!(proj.get_entry("../proj", false).is_none());
        assert!(proj.get_entry("", false).is_none());
        assert!(proj.add_file("../escape.ts", "x").unwrap().is_none());
        assert!(!proj.remove_file("../proj/readme.md").unwrap());
    }

    #[test]
    fn wrong_kind_lookups_are_misses() {
        let fs = project();
        assert!(fs.get_file("/proj/src", false).is_none());
        assert!(fs.get_directory("/proj/readme.md", false).is_none());
        assert!(fs.get_entry("/proj/readme.md/x", false).is_none());
    }

    #[test]
    fn remove_requires_matching_kind() {
        let fs = project();
        assert!(!fs.remove_directory("/proj/readme.md").unwrap());
        assert!(!fs.remove_file("/proj/src").unwrap());
        assert!(!fs.remove_file("/proj/missing.ts").unwrap());
        assert!(fs.remove_directory("/proj/src").unwrap());
        assert!(fs.get_entry("/proj/src/a.ts", false).is_none());
    }

    #[test]
    fn get_entries_filters_and_recurses() {
        let fs = project();
        let proj = fs.get_directory("/proj", false).unwrap();

        let shallow = proj.get_entries(&EntryQuery::new());
        assert_eq!(paths(&shallow), vec!["/proj/src", "/proj/readme.md"]);

        let ts = EntryQuery::new()
            .pattern(Regex::new(r"\.ts$").unwrap())
            .recursive(true);
        let found = proj.get_entries(&ts);
        assert_eq!(paths(&found), vec!["/proj/src/a.ts", "/proj/src/nested/b.ts"]);

        let dirs = EntryQuery::new().kind(EntryKind::Directory).recursive(true);
        let found = proj.get_entries(&dirs);
        assert_eq!(paths(&found), vec!["/proj/src", "/proj/src/nested"]);
    }

    #[test]
    fn recursion_terminates_on_symlink_loop() {
        let fs = project();
        fs.add_symlink_to("/proj/src/nested/up", EntryKind::Directory, "/proj")
            .unwrap()
            .unwrap();
        let entries = fs
            .get_directory("/proj", false)
            .unwrap()
            .get_entries(&EntryQuery::new().recursive(true));
        assert!(entries.iter().any(|entry| entry.path() == "/proj/src/nested/up"));
        assert!(!entries.iter().any(|entry| entry.path().starts_with("/proj/src/nested/up/")));
    }

    #[test]
    fn create_through_directory_symlink_lands_in_target() {
        let fs = project();
        fs.add_symlink_to("/proj/lib", EntryKind::Directory, "/proj/src")
            .unwrap()
            .unwrap();
        let created = fs.add_file("/proj/lib/deep/c.ts", "let c = 3;").unwrap().unwrap();

        assert_eq!(created.path(), "/proj/lib/deep/c.ts");
        assert!(created.is_symlink());
        let real = fs.get_file("/proj/src/deep/c.ts", false).unwrap();
        assert_eq!(real.get_content().as_deref(), Some("let c = 3;"));
    }

    #[test]
    fn remove_through_directory_symlink() {
        let fs = project();
        fs.add_symlink_to("/proj/lib", EntryKind::Directory, "/proj/src")
            .unwrap()
            .unwrap();
        assert!(fs.remove_file("/proj/lib/a.ts").unwrap());
        assert!(fs.get_entry("/proj/src/a.ts", false).is_none());
        assert!(fs.get_entry("/proj/lib/a.ts", false).is_none());
    }

    #[test]
    fn follow_symlinks_returns_real_entry() {
        let fs = project();
        fs.add_symlink_to("/proj/lib", EntryKind::Directory, "src")
            .unwrap()
            .unwrap();
        let wrapper = fs.get_entry("/proj/lib/a.ts", false).unwrap();
        assert!(wrapper.is_symlink());
        let real = fs.get_entry("/proj/lib/a.ts", true).unwrap();
        assert_eq!(real.path(), "/proj/src/a.ts");
        assert!(!real.is_symlink());
    }

    #[test]
    fn frozen_container_rejects_creation_before_walking() {
        let fs = project();
        let proj = fs.get_directory("/proj", false).unwrap();
        proj.make_read_only();
        let err = proj.add_file("fresh/x.ts", "x").unwrap_err();
        assert!(err.is_read_only());
        assert!(fs.get_entry("/proj/fresh", false).is_none());
    }

    #[test]
    fn frozen_inner_directory_rejects_creation() {
        let fs = project();
        fs.get_directory("/proj/src", false).unwrap().make_read_only();
        let err = fs.add_file("/proj/src/c.ts", "x").unwrap_err();
        assert!(matches!(err, FsError::ReadOnly { ref path, .. } if path == "/proj/src"));
        assert!(fs.add_file("/proj/other.ts", "x").unwrap().is_some());
    }

    #[test]
    fn removing_a_missing_path_from_a_frozen_tree_is_a_miss() {
        let fs = project();
        let proj = fs.get_directory("/proj", false).unwrap();
        proj.make_read_only();
        assert!(!proj.remove_file("missing.ts").unwrap());
        assert!(!fs.remove_file("/proj/src/missing.ts").unwrap());
        assert!(proj.remove_file("readme.md").unwrap_err().is_read_only());

        fs.make_read_only();
        assert!(!fs.remove_directory("/nowhere").unwrap());
        assert!(fs.remove_directory("/proj/src").unwrap_err().is_read_only());
    }

    #[test]
    fn removing_through_a_frozen_link_checks_the_entry_first() {
        let fs = project();
        fs.add_symlink_to("/proj/lib", EntryKind::Directory, "src")
            .unwrap();
        let lib = fs.get_directory("/proj/lib", false).unwrap();
        lib.make_read_only();
        assert!(!lib.remove_file("missing.ts").unwrap());
        assert!(lib.remove_file("a.ts").unwrap_err().is_read_only());
        assert!(fs.get_entry("/proj/src/a.ts", false).is_some());
    }
}
