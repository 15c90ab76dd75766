//! # Virtual Paths
//!
//! Forward-slash path helpers used by every part of the tree.
//!
//! Virtual paths are plain strings. Backslashes are accepted on input and
//! normalized to `/`. Absolute paths start with `/`; `..` never climbs above
//! the root of an absolute path.
//!
//! ```rust
//! use anyfs_vtree::vpath;
//!
//! assert_eq!(vpath::normalize("/a/./b/../c"), "/a/c");
//! assert_eq!(vpath::resolve("/proj", "src/a.ts"), "/proj/src/a.ts");
//! assert_eq!(vpath::dirname("/proj/src"), "/proj");
//! assert_eq!(vpath::basename("/proj/src/a.ts"), "a.ts");
//! ```

use crate::CaseSensitivity;

/// Path separator.
pub const SEPARATOR: char = '/';

/// Returns `true` if `path` starts at the root.
#[inline]
pub fn is_absolute(path: &str) -> bool {
    path.starts_with(['/', '\\'])
}

/// Lexically normalize a path.
///
/// Collapses repeated separators and `.` segments and resolves `..`.
/// A relative path keeps leading `..` segments it cannot resolve; an empty
/// relative path normalizes to `""`.
pub fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    let absolute = path.starts_with(SEPARATOR);
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split(SEPARATOR) {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !absolute {
                    parts.push("..");
                }
            }
            name => parts.push(name),
        }
    }

    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Join `rel` onto `base` without normalizing.
///
/// Returns `rel` unchanged if it is absolute.
pub fn combine(base: &str, rel: &str) -> String {
    if is_absolute(rel) || base.is_empty() {
        return rel.to_string();
    }
    if rel.is_empty() {
        return base.to_string();
    }
    if base.ends_with(['/', '\\']) {
        format!("{base}{rel}")
    } else {
        format!("{base}/{rel}")
    }
}

/// Join and normalize.
pub fn resolve(base: &str, rel: &str) -> String {
    normalize(&combine(base, rel))
}

/// Final component of a path, or `""` for the root.
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    match trimmed.rfind(['/', '\\']) {
        Some(index) => &trimmed[index + 1..],
        None => trimmed,
    }
}

/// Everything but the final component.
///
/// The parent of a top-level absolute path is `/`; the parent of a bare
/// name is `""`.
pub fn dirname(path: &str) -> String {
    let normalized = normalize(path);
    match normalized.rfind(SEPARATOR) {
        Some(0) => "/".to_string(),
        Some(index) => normalized[..index].to_string(),
        None => String::new(),
    }
}

/// Compare two paths after normalization under `case`.
pub fn equals(a: &str, b: &str, case: CaseSensitivity) -> bool {
    let a = normalize(a);
    let b = normalize(b);
    let left: Vec<&str> = a.split(SEPARATOR).collect();
    let right: Vec<&str> = b.split(SEPARATOR).collect();
    left.len() == right.len()
        && left
            .iter()
            .zip(&right)
            .all(|(x, y)| case.names_equal(x, y))
}

/// Path leading from `from` to `to`.
///
/// Both paths are normalized first and compared component-wise under
/// `case`. Returns `""` when they name the same location.
///
/// ```rust
/// use anyfs_vtree::{vpath, CaseSensitivity};
///
/// let rel = vpath::relative("/proj/src", "/proj/lib/a.ts", CaseSensitivity::Sensitive);
/// assert_eq!(rel, "../lib/a.ts");
/// ```
pub fn relative(from: &str, to: &str, case: CaseSensitivity) -> String {
    let from = normalize(from);
    let to = normalize(to);
    let from_parts = split(&from);
    let to_parts = split(&to);

    let common = from_parts
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| case.names_equal(a, b))
        .count();

    let mut parts: Vec<&str> = vec![".."; from_parts.len() - common];
    parts.extend_from_slice(&to_parts[common..]);
    parts.join("/")
}

fn split(path: &str) -> Vec<&str> {
    path.split(SEPARATOR).filter(|part| !part.is_empty()).collect()
}

/// Validated segments of a relative path.
///
/// Returns `None` for paths that are empty, absolute, or that escape their
/// starting directory through `..` once normalized.
pub(crate) fn relative_segments(path: &str) -> Option<Vec<String>> {
    if is_absolute(path) {
        return None;
    }
    let normalized = normalize(path);
    if normalized.is_empty() {
        return None;
    }
    let segments: Vec<String> = normalized.split(SEPARATOR).map(str::to_string).collect();
    if segments.iter().any(|segment| segment == "..") {
        return None;
    }
    Some(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_handles_dots() {
        assert_eq!(normalize("/a/./b/../c"), "/a/c");
        assert_eq!(normalize("a//b/"), "a/b");
    }

    #[test]
    fn normalize_handles_root() {
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("/.."), "/");
        assert_eq!(normalize("/../a"), "/a");
    }

    #[test]
    fn normalize_keeps_leading_parent_for_relative() {
        assert_eq!(normalize("../a"), "../a");
        assert_eq!(normalize("a/../../b"), "../b");
        assert_eq!(normalize("a/.."), "");
    }

    #[test]
    fn normalize_converts_backslashes() {
        assert_eq!(normalize("\\proj\\src\\a.ts"), "/proj/src/a.ts");
    }

    #[test]
    fn combine_and_resolve() {
        assert_eq!(combine("/proj", "src"), "/proj/src");
        assert_eq!(combine("/proj/", "src"), "/proj/src");
        assert_eq!(combine("/proj", "/lib"), "/lib");
        assert_eq!(combine("/proj", ""), "/proj");
        assert_eq!(resolve("/proj/src", "../lib/./a.ts"), "/proj/lib/a.ts");
    }

    #[test]
    fn basename_and_dirname() {
        assert_eq!(basename("/proj/src/a.ts"), "a.ts");
        assert_eq!(basename("/proj/src/"), "src");
        assert_eq!(basename("/"), "");
        assert_eq!(dirname("/proj/src/a.ts"), "/proj/src");
        assert_eq!(dirname("/proj"), "/");
        assert_eq!(dirname("/"), "/");
        assert_eq!(dirname("a.ts"), "");
    }

    #[test]
    fn relative_between_paths() {
        let case = CaseSensitivity::Sensitive;
        assert_eq!(relative("/proj", "/proj/src/a.ts", case), "src/a.ts");
        assert_eq!(relative("/proj/src", "/proj", case), "..");
        assert_eq!(relative("/proj", "/proj", case), "");
        assert_eq!(relative("/a/b", "/c", case), "../../c");
    }

    #[test]
    fn relative_honors_case_policy() {
        assert_eq!(
            relative("/Proj", "/proj/a.ts", CaseSensitivity::Insensitive),
            "a.ts"
        );
        assert_eq!(
            relative("/Proj", "/proj/a.ts", CaseSensitivity::Sensitive),
            "../proj/a.ts"
        );
    }

    #[test]
    fn equals_under_case_policy() {
        assert!(equals("/a/B", "/a/./B", CaseSensitivity::Sensitive));
        assert!(!equals("/a/B", "/a/b", CaseSensitivity::Sensitive));
        assert!(equals("/a/B", "/A/b", CaseSensitivity::Insensitive));
    }

    #[test]
    fn relative_segments_validation() {
        assert_eq!(
            relative_segments("src/./a.ts"),
            Some(vec!["src".to_string(), "a.ts".to_string()])
        );
        assert_eq!(relative_segments("a/../b"), Some(vec!["b".to_string()]));
        assert_eq!(relative_segments(""), None);
        assert_eq!(relative_segments("."), None);
        assert_eq!(relative_segments("a/.."), None);
        assert_eq!(relative_segments("../a"), None);
        assert_eq!(relative_segments("/abs"), None);
    }
}
