//! Glob patterns: matching and expansion against the filesystem.
//!
//! Syntax is gitignore-style (`*`, `**`, `?`, `[...]`, `{a,b}`) and `*`
//! never crosses a `/`.  A pattern is split into a literal base directory
//! and a glob tail; expansion walks only the base.

use std::fs;
use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};
use walkdir::WalkDir;

use crate::context::paths;
use crate::errors::{LockboxError, Result};
use crate::vault::format::VAULT_DIR;

/// Characters that make a path component a glob.
const META: &[char] = &['*', '?', '[', '{'];

/// `true` if `text` contains glob syntax.
pub fn has_meta(text: &str) -> bool {
    text.contains(META)
}

fn compile(pattern: &str) -> Result<GlobMatcher> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .backslash_escape(true)
        .build()
        .map(|g| g.compile_matcher())
        .map_err(|e| LockboxError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.kind().to_string(),
        })
}

/// Match a `/`-separated relative path against a pattern.
pub fn matches(pattern: &str, path: &str) -> Result<bool> {
    Ok(compile(pattern)?.is_match(path))
}

/// An absolute glob, split into its literal base and its glob tail.
#[derive(Debug, Clone)]
pub struct PathGlob {
    base: PathBuf,
    tail: Option<GlobMatcher>,
    max_depth: usize,
}

impl PathGlob {
    /// Compile an absolute, normalized pattern path.
    pub fn new(pattern: &Path) -> Result<Self> {
        let mut base = PathBuf::new();
        let mut tail: Vec<String> = Vec::new();

        for comp in pattern.components() {
            let text = comp.as_os_str().to_string_lossy();
            let literal = matches!(comp, Component::Prefix(_) | Component::RootDir)
                || !has_meta(&text);
            if tail.is_empty() && literal {
                base.push(comp.as_os_str());
            } else {
                tail.push(text.into_owned());
            }
        }

        if tail.is_empty() {
            return Ok(Self {
                base,
                tail: None,
                max_depth: 0,
            });
        }

        let max_depth = if tail.iter().any(|c| c.contains("**")) {
            usize::MAX
        } else {
            tail.len()
        };
        let tail = compile(&tail.join("/"))?;
        Ok(Self {
            base,
            tail: Some(tail),
            max_depth,
        })
    }

    /// The literal directory the pattern starts from.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// `true` if an absolute path is matched by this pattern.
    pub fn is_match(&self, path: &Path) -> bool {
        match &self.tail {
            None => path == self.base,
            Some(tail) => match path.strip_prefix(&self.base) {
                Ok(rel) if !rel.as_os_str().is_empty() => tail.is_match(paths::to_slash(rel)),
                _ => false,
            },
        }
    }

    /// All regular files matched by the pattern, sorted.
    ///
    /// The walk stays inside the vault: it does not descend into `.lockbox`
    /// directories or into nested vaults below the base.
    pub fn expand(&self) -> Result<Vec<PathBuf>> {
        let Some(tail) = &self.tail else {
            let is_file = fs::symlink_metadata(&self.base)
                .map(|m| m.is_file())
                .unwrap_or(false);
            return Ok(if is_file { vec![self.base.clone()] } else { Vec::new() });
        };

        if !self.base.is_dir() {
            return Ok(Vec::new());
        }

        let walker = WalkDir::new(&self.base)
            .min_depth(1)
            .max_depth(self.max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !(e.file_type().is_dir() && is_vault_boundary(e.path())));

        let mut found = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                match e.into_io_error() {
                    Some(io) => LockboxError::io_at(path, io),
                    None => LockboxError::CommandFailed("filesystem loop while expanding".into()),
                }
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(rel) = entry.path().strip_prefix(&self.base) {
                if tail.is_match(paths::to_slash(rel)) {
                    found.push(entry.into_path());
                }
            }
        }
        found.sort();
        Ok(found)
    }
}

fn is_vault_boundary(dir: &Path) -> bool {
    dir.file_name().is_some_and(|n| n == VAULT_DIR) || dir.join(VAULT_DIR).is_dir()
}

/// What a user-supplied `add` input turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Something that exists and is not a directory.
    File(PathBuf),
    /// An existing directory; tracked as `dir/**`.
    Directory(PathBuf),
    /// Anything else is taken as a glob.
    Pattern(PathBuf),
}

impl Input {
    /// Classify an absolute path without following symlinks.
    pub fn classify(abs: &Path) -> Self {
        match fs::symlink_metadata(abs) {
            Ok(meta) if meta.is_dir() => Self::Directory(abs.join("**")),
            Ok(_) => Self::File(abs.to_path_buf()),
            Err(_) => Self::Pattern(abs.to_path_buf()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, rel).unwrap();
        path
    }

    #[test]
    fn star_does_not_cross_separator() {
        assert!(matches("*.env", "prod.env").unwrap());
        assert!(!matches("*.env", "config/prod.env").unwrap());
        assert!(matches("**/*.env", "config/prod.env").unwrap());
        assert!(matches("**/*.env", "prod.env").unwrap());
        assert!(matches("keys/{a,b}.pem", "keys/b.pem").unwrap());
        assert!(matches("f?le[0-9]", "file7").unwrap());
    }

    #[test]
    fn invalid_pattern_is_reported() {
        assert!(matches!(
            matches("[unclosed", "x"),
            Err(LockboxError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn expand_returns_sorted_files_only() {
        let tmp = TempDir::new().unwrap();
        let root = paths::normalize(tmp.path());
        touch(&root, "b.env");
        touch(&root, "a.env");
        touch(&root, "sub/c.env");
        fs::create_dir_all(root.join("dir.env")).unwrap();

        let glob = PathGlob::new(&root.join("*.env")).unwrap();
        assert_eq!(glob.expand().unwrap(), vec![root.join("a.env"), root.join("b.env")]);

        let deep = PathGlob::new(&root.join("**/*.env")).unwrap();
        assert_eq!(deep.expand().unwrap().len(), 3);
    }

    #[test]
    fn expand_skips_vault_directories() {
        let tmp = TempDir::new().unwrap();
        let root = paths::normalize(tmp.path());
        touch(&root, "secret.txt");
        touch(&root, ".lockbox/config");
        touch(&root, "nested/.lockbox/config");
        touch(&root, "nested/inner.txt");

        let all = PathGlob::new(&root.join("**")).unwrap();
        assert_eq!(all.expand().unwrap(), vec![root.join("secret.txt")]);
    }

    #[test]
    fn literal_pattern_expands_to_itself() {
        let tmp = TempDir::new().unwrap();
        let root = paths::normalize(tmp.path());
        let file = touch(&root, "plain.txt");

        assert_eq!(PathGlob::new(&file).unwrap().expand().unwrap(), vec![file]);
        assert!(PathGlob::new(&root.join("missing"))
            .unwrap()
            .expand()
            .unwrap()
            .is_empty());
    }

    #[test]
    fn is_match_uses_base_and_tail() {
        let glob = PathGlob::new(Path::new("/p/conf/*.pem")).unwrap();
        assert_eq!(glob.base(), Path::new("/p/conf"));
        assert!(glob.is_match(Path::new("/p/conf/a.pem")));
        assert!(!glob.is_match(Path::new("/p/conf/x/a.pem")));
        assert!(!glob.is_match(Path::new("/q/conf/a.pem")));

        let exact = PathGlob::new(Path::new("/p/a")).unwrap();
        assert!(exact.is_match(Path::new("/p/a")));
        assert!(!exact.is_match(Path::new("/p/ab")));
    }

    #[test]
    fn classify_inputs() {
        let tmp = TempDir::new().unwrap();
        let root = paths::normalize(tmp.path());
        let file = touch(&root, "f");

        assert_eq!(Input::classify(&file), Input::File(file.clone()));
        assert_eq!(Input::classify(&root), Input::Directory(root.join("**")));
        let glob = root.join("*.txt");
        assert_eq!(Input::classify(&glob), Input::Pattern(glob.clone()));
    }
}
