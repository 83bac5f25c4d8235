use crate::error::{ContextError, Result};
use std::fs;
use std::path::Path;

/// Depth cap for the rendered listing; deeper entries are elided.
const TREE_MAX_DEPTH: usize = 7;

/// Render a directory listing rooted at `root`.
///
/// Hidden entries are skipped, children are listed lexicographically with
/// directories first, and recursion stops at [`TREE_MAX_DEPTH`].
pub fn render_tree(root: &Path) -> Result<String> {
    if !root.exists() {
        return Err(ContextError::FileNotFound(root.to_path_buf()));
    }

    let root_name = root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());

    let mut listing = String::new();
    listing.push_str(&root_name);
    listing.push('\n');
    render_children(root, "", 1, &mut listing);
    Ok(listing.trim_end().to_string())
}

fn render_children(dir: &Path, prefix: &str, depth: usize, listing: &mut String) {
    if depth > TREE_MAX_DEPTH {
        return;
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            log::debug!("Skipping unreadable directory {}: {err}", dir.display());
            return;
        }
    };

    let mut children: Vec<_> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .map(|name| !name.to_string_lossy().starts_with('.'))
                .unwrap_or(false)
        })
        .collect();
    children.sort_by_key(|path| (!path.is_dir(), path.file_name().map(|n| n.to_os_string())));

    let count = children.len();
    for (index, child) in children.into_iter().enumerate() {
        let last = index + 1 == count;
        let connector = if last { "└── " } else { "├── " };
        let name = child
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        listing.push_str(prefix);
        listing.push_str(connector);
        listing.push_str(&name);
        listing.push('\n');

        if child.is_dir() {
            let child_prefix = format!("{prefix}{}", if last { "    " } else { "│   " });
            render_children(&child, &child_prefix, depth + 1, listing);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn lists_directories_before_files() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join("src")).unwrap();
        fs::write(temp.path().join("src").join("main.ts"), "").unwrap();
        fs::write(temp.path().join("README.md"), "").unwrap();

        let listing = render_tree(temp.path()).unwrap();
        let lines: Vec<&str> = listing.lines().collect();

        assert!(lines[1].contains("src"));
        assert!(lines[2].contains("main.ts"));
        assert!(lines[3].contains("README.md"));
    }

    #[test]
    fn skips_hidden_entries() {
        let temp = tempdir().unwrap();
        fs::create_dir(temp.path().join(".git")).unwrap();
        fs::write(temp.path().join("visible.ts"), "").unwrap();

        let listing = render_tree(temp.path()).unwrap();

        assert!(!listing.contains(".git"));
        assert!(listing.contains("visible.ts"));
    }

    #[test]
    fn missing_root_is_an_error() {
        let temp = tempdir().unwrap();
        let result = render_tree(&temp.path().join("absent"));
        assert!(matches!(result, Err(ContextError::FileNotFound(_))));
    }
}
