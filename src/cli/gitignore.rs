//! Shared `.gitignore` patching logic.
//!
//! Used by `add` so that tracked secrets never end up in a commit.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use tracing::warn;

/// Append each of `entries` to `<project>/.gitignore` unless already listed.
///
/// Creates the file if it doesn't exist. Existing content is never
/// rewritten. Returns the entries that were added; errors are logged.
pub fn patch_gitignore(project_dir: &Path, entries: &[String]) -> Vec<String> {
    let gitignore_path = project_dir.join(".gitignore");
    let existing = match fs::read(&gitignore_path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
        Err(e) => {
            warn!("could not read {}: {e}", gitignore_path.display());
            return Vec::new();
        }
    };
    let listed = String::from_utf8_lossy(&existing);

    let mut added: Vec<String> = Vec::new();
    for entry in entries {
        let present = listed.lines().any(|line| line.trim() == entry)
            || added.iter().any(|a| a == entry);
        if !present {
            added.push(entry.clone());
        }
    }
    if added.is_empty() {
        return added;
    }

    let mut content = String::new();
    if !existing.is_empty() && !existing.ends_with(b"\n") {
        content.push('\n');
    }
    for entry in &added {
        content.push_str(entry);
        content.push('\n');
    }

    let appended = OpenOptions::new()
        .append(true)
        .create(true)
        .open(&gitignore_path)
        .and_then(|mut file| file.write_all(content.as_bytes()));
    if let Err(e) = appended {
        warn!("could not update {}: {e}", gitignore_path.display());
        return Vec::new();
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entries(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn adds_entries_to_new_gitignore() {
        let dir = TempDir::new().unwrap();
        let added = patch_gitignore(dir.path(), &entries(&["/secret.env", "/keys/**"]));

        assert_eq!(added.len(), 2);
        let content = fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        assert_eq!(content, "/secret.env\n/keys/**\n");
    }

    #[test]
    fn does_not_duplicate_entry() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "/secret.env\n").unwrap();

        let added = patch_gitignore(dir.path(), &entries(&["/secret.env", "/secret.env"]));

        assert!(added.is_empty());
        let content = fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        assert_eq!(content.matches("/secret.env").count(), 1);
    }

    #[test]
    fn appends_with_newline_separator() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "node_modules/").unwrap(); // no trailing newline

        patch_gitignore(dir.path(), &entries(&["/a.pem"]));

        let content = fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        assert_eq!(content, "node_modules/\n/a.pem\n");
    }

    #[test]
    fn keeps_existing_non_utf8_lines() {
        let dir = TempDir::new().unwrap();
        let original: &[u8] = b"target/\n# caf\xe9\nnode_modules/\n";
        fs::write(dir.path().join(".gitignore"), original).unwrap();

        let added = patch_gitignore(dir.path(), &entries(&["/secret.env", "target/"]));

        assert_eq!(added, vec!["/secret.env"]);
        let content = fs::read(dir.path().join(".gitignore")).unwrap();
        let mut expected = original.to_vec();
        expected.extend_from_slice(b"/secret.env\n");
        assert_eq!(content, expected);
    }

    #[test]
    fn unreadable_gitignore_is_left_alone() {
        let dir = TempDir::new().unwrap();
        // A directory in place of the file cannot be read.
        fs::create_dir(dir.path().join(".gitignore")).unwrap();

        let added = patch_gitignore(dir.path(), &entries(&["/secret.env"]));

        assert!(added.is_empty());
        assert!(dir.path().join(".gitignore").is_dir());
    }
}
