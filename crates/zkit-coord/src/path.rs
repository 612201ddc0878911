//! Node path validation and manipulation.
//!
//! Valid node paths:
//! - Must start with `/`
//! - Must not end with `/` (except the root itself)
//! - Must not contain empty components (`//`)
//! - Must not contain `.` or `..` components
//! - Must not contain control characters

use crate::error::{CoordError, Result};

/// Validate an absolute node path, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use zkit_coord::path::validate_path;
///
/// assert!(validate_path("/").is_ok());
/// assert!(validate_path("/storage/widgets").is_ok());
/// assert!(validate_path("storage").is_err());
/// assert!(validate_path("/a//b").is_err());
/// ```
pub fn validate_path(path: &str) -> Result<()> {
    let invalid = |reason: &str| CoordError::InvalidPath {
        path: path.to_string(),
        reason: reason.into(),
    };

    if !path.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }
    if path == "/" {
        return Ok(());
    }
    if path.ends_with('/') {
        return Err(invalid("must not end with '/'"));
    }
    if path.chars().any(char::is_control) {
        return Err(invalid("must not contain control characters"));
    }
    for component in path[1..].split('/') {
        if component.is_empty() {
            return Err(invalid("path components must not be empty"));
        }
        if component == "." || component == ".." {
            return Err(invalid("relative components are not allowed"));
        }
    }
    Ok(())
}

/// Join segments into a clean absolute path.
///
/// Each segment may itself contain slashes; empty components are dropped, so
/// `join(["/storage/", "/widgets/", "buckets"])` yields
/// `"/storage/widgets/buckets"`. Joining nothing yields `"/"`.
pub fn join<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for segment in segments {
        for component in segment.as_ref().split('/').filter(|c| !c.is_empty()) {
            out.push('/');
            out.push_str(component);
        }
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// The parent of `path`, or `None` for the root.
pub fn parent(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/"),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// The final component of `path` (empty for the root).
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or_default()
}

/// Every prefix of `path` from the first component down to `path` itself.
///
/// `prefixes("/a/b/c")` yields `["/a", "/a/b", "/a/b/c"]`.
pub fn prefixes(path: &str) -> Vec<String> {
    let mut current = String::new();
    path.split('/')
        .filter(|c| !c.is_empty())
        .map(|component| {
            current.push('/');
            current.push_str(component);
            current.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_paths() {
        assert!(validate_path("/").is_ok());
        assert!(validate_path("/storage").is_ok());
        assert!(validate_path("/storage/widgets/buckets/42/foo").is_ok());
        assert!(validate_path("/with-dash_and.dot").is_ok());
    }

    #[test]
    fn reject_relative() {
        assert!(validate_path("").is_err());
        assert!(validate_path("storage").is_err());
        assert!(validate_path("/a/./b").is_err());
        assert!(validate_path("/a/../b").is_err());
    }

    #[test]
    fn reject_slash_problems() {
        assert!(validate_path("/trailing/").is_err());
        assert!(validate_path("/a//b").is_err());
    }

    #[test]
    fn reject_control_chars() {
        assert!(validate_path("/a\nb").is_err());
        assert!(validate_path("/a\0b").is_err());
    }

    #[test]
    fn join_collapses_slashes() {
        assert_eq!(join(["/storage", "widgets", "buckets"]), "/storage/widgets/buckets");
        assert_eq!(join(["", "/buckets/", "42"]), "/buckets/42");
        assert_eq!(join(["/storage/things/", "widgets/2017"]), "/storage/things/widgets/2017");
        assert_eq!(join(Vec::<String>::new()), "/");
        assert_eq!(join(["", ""]), "/");
    }

    #[test]
    fn parent_and_base_name() {
        assert_eq!(parent("/a/b/c"), Some("/a/b"));
        assert_eq!(parent("/a"), Some("/"));
        assert_eq!(parent("/"), None);
        assert_eq!(base_name("/a/b/c"), "c");
        assert_eq!(base_name("/"), "");
    }

    #[test]
    fn prefixes_walk_from_root() {
        assert_eq!(prefixes("/a/b/c"), vec!["/a", "/a/b", "/a/b/c"]);
        assert!(prefixes("/").is_empty());
    }
}
