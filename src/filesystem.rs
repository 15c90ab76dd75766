//! # Filesystem
//!
//! [`FileSystem`] owns a tree and exposes it through absolute or
//! cwd-relative paths.
//!
//! ## Lifecycle
//!
//! | Step | Method |
//! |------|--------|
//! | Create empty | [`FileSystem::new`] |
//! | Create backed by a resolver | [`FileSystem::with_options`] |
//! | Share a frozen disk view | [`FileSystem::backing_view`] |
//! | Copy-on-write clone | [`FileSystem::shadow`] |
//! | Freeze | [`FileSystem::make_read_only`] |
//!
//! The root directory is created on first use. A shadow clone starts out as
//! a single unpopulated root that copies nodes from the original only as
//! they are reached.

use std::cell::{Cell, OnceCell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::entry::{Contents, Creation, EntryBase, create_at, lookup};
use crate::resolver::{BackingResolver, DiskResolver};
use crate::{
    AnyDirectory, AnyFile, CaseSensitivity, Directory, Entry, EntryKind, EntryQuery, FsError,
    vpath,
};

thread_local! {
    static BACKING_VIEWS: RefCell<HashMap<(PathBuf, String, CaseSensitivity), FileSystem>> =
        RefCell::new(HashMap::new());
}

/// Options for [`FileSystem::with_options`].
///
/// ```rust
/// use anyfs_vtree::{CaseSensitivity, FileSystem, FileSystemOptions};
///
/// let fs = FileSystem::with_options(FileSystemOptions {
///     case: CaseSensitivity::Insensitive,
///     cwd: Some("/proj".into()),
///     ..FileSystemOptions::default()
/// });
/// assert_eq!(fs.cwd(), "/proj");
/// assert!(fs.get_directory("/PROJ", false).is_some());
/// ```
#[derive(Clone, Default)]
pub struct FileSystemOptions {
    /// Case policy for every name comparison in the tree.
    pub case: CaseSensitivity,
    /// Initial working directory, created if missing. Defaults to `/`.
    pub cwd: Option<String>,
    /// Source the root directory is populated from on first access.
    pub resolver: Option<Rc<dyn BackingResolver>>,
}

impl fmt::Debug for FileSystemOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSystemOptions")
            .field("case", &self.case)
            .field("cwd", &self.cwd)
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

pub(crate) struct FsState {
    case: CaseSensitivity,
    cwd: RefCell<String>,
    read_only: Cell<bool>,
    root: OnceCell<Directory>,
    seed: RefCell<Option<Contents>>,
    this: Weak<FsState>,
}

impl FsState {
    fn root(&self) -> Directory {
        self.root
            .get_or_init(|| {
                let contents = self
                    .seed
                    .borrow_mut()
                    .take()
                    .unwrap_or(Contents::Populated(Vec::new()));
                let base = EntryBase::root(self.this.clone(), self.case);
                let root = Directory::from_parts(base, contents);
                if self.read_only.get() {
                    root.make_read_only();
                }
                root
            })
            .clone()
    }

    /// Entry at a normalized absolute path, without following the final
    /// symlink.
    pub(crate) fn lookup_absolute(&self, path: &str) -> Option<Entry> {
        let root = self.root();
        let normalized = vpath::resolve("/", path);
        let relative = normalized.trim_start_matches('/');
        if relative.is_empty() {
            return Some(Entry::Directory(root));
        }
        lookup(&AnyDirectory::Directory(root), relative, false)
    }
}

/// An in-memory filesystem tree.
///
/// `FileSystem` is a cheap handle: cloning it shares the same tree. Use
/// [`shadow`](Self::shadow) for an independent copy-on-write clone.
///
/// # Example
///
/// ```rust
/// use anyfs_vtree::{CaseSensitivity, FileSystem};
///
/// let fs = FileSystem::new(CaseSensitivity::Sensitive);
/// fs.add_file("/proj/src/a.ts", "let a = 1;")?;
///
/// let copy = fs.shadow();
/// copy.add_file("/proj/src/b.ts", "let b = 2;")?;
///
/// assert!(fs.get_file("/proj/src/b.ts", false).is_none());
/// assert!(copy.get_file("/proj/src/a.ts", false).is_some());
/// # Ok::<(), anyfs_vtree::FsError>(())
/// ```
#[derive(Clone)]
pub struct FileSystem {
    state: Rc<FsState>,
}

impl FileSystem {
    /// An empty filesystem with its cwd at `/`.
    pub fn new(case: CaseSensitivity) -> Self {
        Self::with_options(FileSystemOptions {
            case,
            ..FileSystemOptions::default()
        })
    }

    /// A filesystem configured by `options`.
    ///
    /// With a resolver, the root is populated from it on first access. A
    /// `cwd` is normalized against `/` and created if missing.
    pub fn with_options(options: FileSystemOptions) -> Self {
        let seed = options.resolver.map(Contents::Resolver);
        let fs = Self::from_seed(options.case, "/".to_string(), seed);
        if let Some(cwd) = options.cwd {
            let cwd = vpath::resolve("/", &cwd);
            match fs.add_directory(&cwd) {
                Ok(Some(_)) => *fs.state.cwd.borrow_mut() = cwd,
                Ok(None) => warn!(cwd = %cwd, "working directory is blocked by a file"),
                Err(error) => warn!(cwd = %cwd, %error, "failed to create working directory"),
            }
        }
        fs
    }

    fn from_seed(case: CaseSensitivity, cwd: String, seed: Option<Contents>) -> Self {
        Self {
            state: Rc::new_cyclic(|this| FsState {
                case,
                cwd: RefCell::new(cwd),
                read_only: Cell::new(false),
                root: OnceCell::new(),
                seed: RefCell::new(seed),
                this: this.clone(),
            }),
        }
    }

    /// A frozen view onto the real directory behind `resolver`.
    ///
    /// Views are memoized per thread by real root, mount point and case
    /// policy, so repeated calls return the same instance. Shadow the view
    /// to get a mutable copy.
    ///
    /// ```rust
    /// use anyfs_vtree::{CaseSensitivity, DiskResolver, FileSystem};
    ///
    /// let dir = tempfile::tempdir()?;
    /// std::fs::write(dir.path().join("lib.d.ts"), "declare const x: number;")?;
    ///
    /// let resolver = DiskResolver::new(dir.path())?.mounted_at("/.lib");
    /// let view = FileSystem::backing_view(&resolver, CaseSensitivity::Sensitive);
    /// assert!(view.is_read_only());
    /// let again = FileSystem::backing_view(&resolver, CaseSensitivity::Sensitive);
    /// assert!(FileSystem::ptr_eq(&view, &again));
    ///
    /// let work = view.shadow();
    /// work.add_file("/main.ts", "x;")?;
    /// assert!(work.get_file("/.lib/lib.d.ts", false).is_some());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn backing_view(resolver: &DiskResolver, case: CaseSensitivity) -> Self {
        let key = (resolver.root().to_path_buf(), resolver.mount().to_string(), case);
        if let Some(existing) = BACKING_VIEWS.with(|views| views.borrow().get(&key).cloned()) {
            return existing;
        }

        let fs = Self::mounted(resolver, case);
        fs.make_read_only();
        debug!(root = %resolver.root().display(), mount = resolver.mount(), "created backing view");
        BACKING_VIEWS.with(|views| views.borrow_mut().insert(key, fs.clone()));
        fs
    }

    fn mounted(resolver: &DiskResolver, case: CaseSensitivity) -> Self {
        let backing: Rc<dyn BackingResolver> = Rc::new(resolver.clone());
        let mount = resolver.mount().trim_start_matches('/');
        if mount.is_empty() {
            return Self::with_options(FileSystemOptions {
                case,
                resolver: Some(backing),
                ..FileSystemOptions::default()
            });
        }

        let fs = Self::new(case);
        if let Err(error) = create_at(&fs.root().into(), mount, &Creation::Mount(backing)) {
            warn!(mount = resolver.mount(), %error, "failed to mount backing directory");
        }
        fs
    }

    /// Returns `true` if `a` and `b` share the same tree.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.state, &b.state)
    }

    /// Case policy fixed at construction.
    pub fn case_sensitivity(&self) -> CaseSensitivity {
        self.state.case
    }

    // ------------------------------------------------------------------------
    // Working directory
    // ------------------------------------------------------------------------

    /// Current working directory.
    pub fn cwd(&self) -> String {
        self.state.cwd.borrow().clone()
    }

    /// Resolve `path` against the cwd into a normalized absolute path.
    pub fn resolve_path(&self, path: &str) -> String {
        vpath::resolve(&self.cwd(), path)
    }

    /// Move the cwd to the directory at `path`.
    ///
    /// Returns `false`, leaving the cwd alone, if no directory is there.
    ///
    /// # Errors
    ///
    /// [`FsError::ReadOnly`] if the filesystem is frozen.
    pub fn change_directory(&self, path: &str) -> Result<bool, FsError> {
        self.guard("change_directory")?;
        let resolved = self.resolve_path(path);
        if self.get_directory(&resolved, true).is_none() {
            return Ok(false);
        }
        *self.state.cwd.borrow_mut() = resolved;
        Ok(true)
    }

    // ------------------------------------------------------------------------
    // Tree access
    // ------------------------------------------------------------------------

    /// The root directory.
    pub fn root(&self) -> Directory {
        self.state.root()
    }

    /// Entry at `path`. See [`AnyDirectory::get_entry`].
    pub fn get_entry(&self, path: &str, follow_symlinks: bool) -> Option<Entry> {
        let relative = self.root_relative(path);
        if relative.is_empty() {
            return Some(Entry::Directory(self.root()));
        }
        lookup(&self.root().into(), &relative, follow_symlinks)
    }

    /// File at `path`, or `None` if it is missing or something else.
    pub fn get_file(&self, path: &str, follow_symlinks: bool) -> Option<AnyFile> {
        self.get_entry(path, follow_symlinks)?.as_file()
    }

    /// Directory at `path`, or `None` if it is missing or something else.
    pub fn get_directory(&self, path: &str, follow_symlinks: bool) -> Option<AnyDirectory> {
        self.get_entry(path, follow_symlinks)?.as_directory()
    }

    /// Children of the directory at `path` matching `query`.
    ///
    /// Empty if `path` is not a directory.
    pub fn get_entries(&self, path: &str, query: &EntryQuery) -> Vec<Entry> {
        self.get_directory(path, false)
            .map(|dir| dir.get_entries(query))
            .unwrap_or_default()
    }

    /// Returns `true` if anything, including a broken symlink, is at `path`.
    pub fn exists(&self, path: &str) -> bool {
        self.get_entry(path, false).is_some()
    }

    // ------------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------------

    /// See [`AnyDirectory::add_directory`].
    ///
    /// # Errors
    ///
    /// [`FsError::ReadOnly`] if the filesystem or an affected directory is
    /// frozen.
    pub fn add_directory(&self, path: &str) -> Result<Option<AnyDirectory>, FsError> {
        self.guard("add_directory")?;
        let root: AnyDirectory = self.root().into();
        let relative = self.root_relative(path);
        if relative.is_empty() {
            root.guard("add_directory")?;
            return Ok(Some(root));
        }
        root.add_directory(&relative)
    }

    /// See [`AnyDirectory::add_file`].
    ///
    /// # Errors
    ///
    /// [`FsError::ReadOnly`] if the filesystem or an affected directory is
    /// frozen.
    pub fn add_file(
        &self,
        path: &str,
        content: impl Into<Rc<str>>,
    ) -> Result<Option<AnyFile>, FsError> {
        self.guard("add_file")?;
        self.root().to_container().add_file(&self.root_relative(path), content)
    }

    /// See [`AnyDirectory::add_empty_file`].
    ///
    /// # Errors
    ///
    /// [`FsError::ReadOnly`] if the filesystem or an affected directory is
    /// frozen.
    pub fn add_empty_file(&self, path: &str) -> Result<Option<AnyFile>, FsError> {
        self.guard("add_file")?;
        self.root().to_container().add_empty_file(&self.root_relative(path))
    }

    /// See [`AnyDirectory::add_symlink`].
    ///
    /// # Errors
    ///
    /// [`FsError::ReadOnly`] if the filesystem or an affected directory is
    /// frozen.
    pub fn add_symlink(&self, path: &str, target: &Entry) -> Result<Option<Entry>, FsError> {
        self.add_symlink_to(path, target.kind(), target.path())
    }

    /// See [`AnyDirectory::add_symlink_to`].
    ///
    /// # Errors
    ///
    /// [`FsError::ReadOnly`] if the filesystem or an affected directory is
    /// frozen.
    pub fn add_symlink_to(
        &self,
        path: &str,
        kind: EntryKind,
        target: &str,
    ) -> Result<Option<Entry>, FsError> {
        self.guard("add_symlink")?;
        self.root()
            .to_container()
            .add_symlink_to(&self.root_relative(path), kind, target)
    }

    /// See [`AnyDirectory::remove_directory`].
    ///
    /// # Errors
    ///
    /// [`FsError::ReadOnly`] if the owning directory is frozen. Freezing the
    /// filesystem freezes every directory, so a missing path is still
    /// `Ok(false)`.
    pub fn remove_directory(&self, path: &str) -> Result<bool, FsError> {
        self.root().remove_directory(&self.root_relative(path))
    }

    /// See [`AnyDirectory::remove_file`].
    ///
    /// # Errors
    ///
    /// [`FsError::ReadOnly`] if the owning directory is frozen. Freezing the
    /// filesystem freezes every directory, so a missing path is still
    /// `Ok(false)`.
    pub fn remove_file(&self, path: &str) -> Result<bool, FsError> {
        self.root().remove_file(&self.root_relative(path))
    }

    // ------------------------------------------------------------------------
    // Cloning and freezing
    // ------------------------------------------------------------------------

    /// Copy-on-write clone with the same case policy and cwd.
    ///
    /// Constant time: nothing is copied until the clone is read. Changes on
    /// either side are invisible to the other, except that content the
    /// clone has not loaded yet is read from the original when first
    /// needed.
    pub fn shadow(&self) -> Self {
        self.shadow_with_case(self.state.case)
    }

    /// Copy-on-write clone using a different case policy.
    pub fn shadow_with_case(&self, case: CaseSensitivity) -> Self {
        let root = self.root();
        debug!(case = ?case, "created shadow filesystem");
        Self::from_seed(case, self.cwd(), Some(Contents::Shadow(root)))
    }

    /// Freeze the filesystem and every entry in it. Irreversible.
    ///
    /// Entries materialized later are frozen as they appear.
    pub fn make_read_only(&self) {
        self.state.read_only.set(true);
        self.root().make_read_only();
    }

    /// Returns `true` once [`make_read_only`](Self::make_read_only) was called.
    pub fn is_read_only(&self) -> bool {
        self.state.read_only.get()
    }

    fn guard(&self, operation: &'static str) -> Result<(), FsError> {
        if self.is_read_only() {
            return Err(FsError::ReadOnly {
                path: "/".to_string(),
                operation,
            });
        }
        Ok(())
    }

    fn root_relative(&self, path: &str) -> String {
        self.resolve_path(path).trim_start_matches('/').to_string()
    }
}

impl fmt::Debug for FileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSystem")
            .field("case", &self.state.case)
            .field("cwd", &*self.state.cwd.borrow())
            .field("read_only", &self.is_read_only())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_shares_the_tree() {
        let fs = FileSystem::new(CaseSensitivity::Sensitive);
        let alias = fs.clone();
        alias.add_file("/a.ts", "x").unwrap();
        assert!(fs.exists("/a.ts"));
        assert!(FileSystem::ptr_eq(&fs, &alias));
        assert!(!FileSystem::ptr_eq(&fs, &fs.shadow()));
    }

    #[test]
    fn cwd_relative_paths() {
        let fs = FileSystem::new(CaseSensitivity::Sensitive);
        fs.add_directory("/proj/src").unwrap();
        assert!(fs.change_directory("/proj").unwrap());
        fs.add_file("src/a.ts", "x").unwrap();
        assert!(fs.exists("/proj/src/a.ts"));
        assert_eq!(fs.resolve_path("../b"), "/b");
        assert_eq!(fs.get_entry(".", false).unwrap().path(), "/proj");
    }

    #[test]
    fn change_directory_requires_a_directory() {
        let fs = FileSystem::new(CaseSensitivity::Sensitive);
        fs.add_file("/a.ts", "x").unwrap();
        assert!(!fs.change_directory("/a.ts").unwrap());
        assert!(!fs.change_directory("/missing").unwrap());
        assert_eq!(fs.cwd(), "/");
    }

    #[test]
    fn change_directory_is_refused_when_frozen() {
        let fs = FileSystem::new(CaseSensitivity::Sensitive);
        fs.add_directory("/proj").unwrap();
        fs.make_read_only();
        assert!(fs.change_directory("/proj").unwrap_err().is_read_only());
    }

    #[test]
    fn root_path_lookups() {
        let fs = FileSystem::new(CaseSensitivity::Sensitive);
        assert_eq!(fs.get_entry("/", false), Some(Entry::Directory(fs.root())));
        assert!(fs.add_file("/", "x").unwrap().is_none());
        assert!(!fs.remove_directory("/").unwrap());
        assert_eq!(fs.add_directory("/").unwrap(), Some(fs.root().to_container()));
    }

    #[test]
    fn frozen_filesystem_rejects_every_mutation() {
        let fs = FileSystem::new(CaseSensitivity::Sensitive);
        fs.add_file("/a.ts", "x").unwrap();
        fs.make_read_only();

        assert!(fs.add_file("/b.ts", "x").unwrap_err().is_read_only());
        assert!(fs.add_directory("/d").unwrap_err().is_read_only());
        assert!(fs.add_empty_file("/e.ts").unwrap_err().is_read_only());
        assert!(fs
            .add_symlink_to("/l", EntryKind::File, "/a.ts")
            .unwrap_err()
            .is_read_only());
        assert!(fs.remove_file("/a.ts").unwrap_err().is_read_only());
        assert!(fs.get_file("/a.ts", false).unwrap().set_content("y").unwrap_err().is_read_only());
        assert_eq!(fs.get_file("/a.ts", false).unwrap().get_content().as_deref(), Some("x"));
    }

    #[test]
    fn shadow_is_lazy() {
        let fs = FileSystem::new(CaseSensitivity::Sensitive);
        fs.add_file("/proj/a.ts", "x").unwrap();
        let copy = fs.shadow();
        assert!(!copy.root().is_populated());
        assert!(copy.exists("/proj/a.ts"));
        assert!(copy.root().is_populated());
    }

    #[test]
    fn shadow_with_other_case_policy() {
        let fs = FileSystem::new(CaseSensitivity::Sensitive);
        fs.add_file("/Proj/A.ts", "x").unwrap();
        let copy = fs.shadow_with_case(CaseSensitivity::Insensitive);
        assert!(copy.exists("/proj/a.ts"));
        assert!(!fs.exists("/proj/a.ts"));
    }

    #[test]
    fn options_debug_hides_resolver() {
        let options = FileSystemOptions::default();
        let rendered = format!("{options:?}");
        assert!(rendered.contains("resolver: false"));
    }
}
