/// Path utilities for validation, normalization and joining
///
/// All functions are **pure**: given same input, always produce same output with no side effects.

use std::borrow::Cow;

/// Checks whether a path is already in canonical form
///
/// # Rules
///
/// - Must start with `/`
/// - Must not contain `//` or `\`
/// - Must not be empty
///
/// A single trailing slash is kept: it is significant for strict matchers.
///
/// # Examples
///
/// ```
/// use trailhead_router::path::is_canonical;
///
/// assert!(is_canonical("/"));
/// assert!(is_canonical("/about"));
/// assert!(is_canonical("/about/"));
///
/// assert!(!is_canonical(""));
/// assert!(!is_canonical("about")); // Missing leading /
/// assert!(!is_canonical("/about//page")); // Double //
/// assert!(!is_canonical("/about\\page")); // Backslash
/// ```
pub fn is_canonical(path: &str) -> bool {
    path.starts_with('/') && !path.contains("//") && !path.contains('\\')
}

/// Normalize a path to canonical form
///
/// Returns `Cow::Borrowed` when input is already canonical (zero allocations)
/// and `Cow::Owned` when normalization was needed.
///
/// - Missing leading slash: `users` → `/users`
/// - Repeated slashes: `/path//to` → `/path/to`
/// - Backslashes: `\path\to` → `/path/to`
/// - Trailing slash is preserved: `/about/` stays `/about/`
///
/// # Examples
///
/// ```
/// use trailhead_router::path::normalize_path;
/// use std::borrow::Cow;
///
/// let path = normalize_path("/about");
/// assert!(matches!(path, Cow::Borrowed("/about")));
///
/// assert_eq!(normalize_path("users//42"), "/users/42");
/// assert_eq!(normalize_path("\\users\\42\\"), "/users/42/");
/// ```
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    if is_canonical(path) {
        return Cow::Borrowed(path);
    }

    let unified = path.replace('\\', "/");
    let trailing = unified.len() > 1 && unified.ends_with('/');
    let joined = unified
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    match (joined.is_empty(), trailing) {
        (true, _) => Cow::Borrowed("/"),
        (false, true) => Cow::Owned(format!("/{}/", joined)),
        (false, false) => Cow::Owned(format!("/{}", joined)),
    }
}

/// Joins a child path onto its parent's absolute path
///
/// An empty child path resolves to the parent path itself. Repeated
/// slashes at the seam are collapsed.
///
/// # Examples
///
/// ```
/// use trailhead_router::path::join_paths;
///
/// assert_eq!(join_paths("/users/:id", "profile"), "/users/:id/profile");
/// assert_eq!(join_paths("/users/", "profile"), "/users/profile");
/// assert_eq!(join_paths("/users", ""), "/users");
/// assert_eq!(join_paths("/", "about"), "/about");
/// ```
pub fn join_paths(parent: &str, child: &str) -> String {
    if child.is_empty() {
        return collapse_slashes(parent);
    }
    let joined = format!("{}/{}", parent.trim_end_matches('/'), child);
    collapse_slashes(&joined)
}

/// Collapses repeated slashes without touching anything else
///
/// Unlike [`normalize_path`] this leaves backslashes alone, since inside a
/// route pattern they escape custom-constraint characters.
pub(crate) fn collapse_slashes(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 1);
    if !pattern.starts_with('/') {
        out.push('/');
    }
    let mut previous_slash = false;
    for ch in pattern.chars() {
        if ch == '/' && previous_slash {
            continue;
        }
        previous_slash = ch == '/';
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_canonical() {
        assert!(is_canonical("/"));
        assert!(is_canonical("/users/123"));
        assert!(is_canonical("/blog/posts/hello-world/"));

        assert!(!is_canonical(""));
        assert!(!is_canonical("about"));
        assert!(!is_canonical("/about//page"));
        assert!(!is_canonical("/about\\page"));
    }

    #[test]
    fn test_normalize_path_valid() {
        let path = normalize_path("/about");
        assert!(matches!(path, Cow::Borrowed("/about")));

        let path = normalize_path("/");
        assert!(matches!(path, Cow::Borrowed("/")));
    }

    #[test]
    fn test_normalize_path_double_slash() {
        assert_eq!(normalize_path("/about//page"), "/about/page");
        assert_eq!(normalize_path("/path///to////page"), "/path/to/page");
        assert_eq!(normalize_path("//"), "/");
    }

    #[test]
    fn test_normalize_path_keeps_trailing_slash() {
        assert_eq!(normalize_path("/about//"), "/about/");
        assert_eq!(normalize_path("about/"), "/about/");
    }

    #[test]
    fn test_normalize_path_empty() {
        assert_eq!(normalize_path(""), "/");
    }

    #[test]
    fn test_join_paths() {
        assert_eq!(join_paths("/", ""), "/");
        assert_eq!(join_paths("/a", "b/c"), "/a/b/c");
        assert_eq!(join_paths("/a//", "//b"), "/a/b");
    }

    #[test]
    fn test_collapse_slashes_keeps_escapes() {
        assert_eq!(collapse_slashes("//users/:id(\\d+)"), "/users/:id(\\d+)");
        assert_eq!(collapse_slashes("users"), "/users");
    }
}
