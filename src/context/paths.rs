//! Pure path arithmetic.
//!
//! Nothing here touches the filesystem: results depend only on the
//! path strings passed in, so symlinks are never followed.

use std::path::{Component, Path, PathBuf};

/// Lexically clean a path: drop `.` and fold `..` into its parent.
///
/// `..` at the root stays at the root; leading `..` in a relative path
/// is kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(comp),
            },
            other => out.push(other),
        }
    }
    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

/// Make `path` absolute against `base` (itself absolute) and normalize it.
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}

/// Express `target` relative to `base`, using `..` where needed.
///
/// Both paths should be absolute and normalized. Returns `None` when they
/// share no root (different drive prefixes on Windows).
pub fn relative_to(base: &Path, target: &Path) -> Option<PathBuf> {
    let base: Vec<_> = base.components().collect();
    let target: Vec<_> = target.components().collect();

    match (base.first(), target.first()) {
        (Some(a), Some(b)) if a != b => return None,
        _ => {}
    }

    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base.len() {
        rel.push("..");
    }
    for comp in &target[common..] {
        rel.push(comp.as_os_str());
    }
    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    Some(rel)
}

/// Join a relative path's components with `/`, whatever the platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// `true` if a `/`-separated relative path climbs out of its base.
pub fn escapes(rel: &str) -> bool {
    rel == ".." || rel.starts_with("../")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_folds_dots() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("../a/b/..")), PathBuf::from("../a"));
        assert_eq!(normalize(Path::new("a/..")), PathBuf::from("."));
    }

    #[test]
    fn absolutize_joins_relative_paths() {
        let base = Path::new("/work/proj");
        assert_eq!(
            absolutize(base, Path::new("sub/../f.txt")),
            PathBuf::from("/work/proj/f.txt")
        );
        assert_eq!(
            absolutize(base, Path::new("/etc/./x")),
            PathBuf::from("/etc/x")
        );
    }

    #[test]
    fn relative_to_inside_and_outside() {
        let base = Path::new("/p");
        assert_eq!(
            relative_to(base, Path::new("/p/foo/b")),
            Some(PathBuf::from("foo/b"))
        );
        assert_eq!(
            relative_to(base, Path::new("/q/x")),
            Some(PathBuf::from("../q/x"))
        );
        assert_eq!(relative_to(base, Path::new("/p")), Some(PathBuf::from(".")));
        assert_eq!(
            relative_to(Path::new("/p/a/b"), Path::new("/p")),
            Some(PathBuf::from("../.."))
        );
    }

    #[test]
    fn to_slash_and_escapes() {
        let rel = relative_to(Path::new("/p/sub"), Path::new("/p/other/f")).unwrap();
        let text = to_slash(&rel);
        assert_eq!(text, "../other/f");
        assert!(escapes(&text));
        assert!(!escapes("..hidden/file"));
        assert!(!escapes("a/b"));
    }
}
