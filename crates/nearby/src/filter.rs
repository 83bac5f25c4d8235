use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Path, PathBuf};

/// Minimal ignore set applied when no `.gitignore` is found in any ancestor.
const DEFAULT_IGNORES: &[&str] = &["node_modules/", ".git/", "dist/", "build/", "coverage/"];

/// Predicate over workspace-relative paths, injected into traversal so the
/// search logic can be tested without real ignore files.
pub trait PathFilter {
    /// Whether `relative` (relative to the filter's root) should be skipped.
    fn is_ignored(&self, relative: &Path, is_dir: bool) -> bool;
}

/// Gitignore-backed [`PathFilter`].
///
/// Walks ancestors of a start directory until a `.gitignore` is found and
/// roots the matcher there. Unreadable ignore files are treated as absent
/// (fail-open); when none exists the built-in default set applies, rooted at
/// the start directory.
pub struct GitignoreFilter {
    root: PathBuf,
    matcher: Gitignore,
}

impl GitignoreFilter {
    /// Build a filter for the given directory, searching ancestors for the
    /// nearest `.gitignore`.
    pub fn for_dir(start: impl AsRef<Path>) -> Self {
        let start = start.as_ref();

        let mut current = Some(start);
        while let Some(dir) = current {
            let candidate = dir.join(".gitignore");
            if candidate.is_file() {
                if let Some(matcher) = Self::load(dir, &candidate) {
                    return Self {
                        root: dir.to_path_buf(),
                        matcher,
                    };
                }
            }
            current = dir.parent();
        }

        Self::with_defaults(start)
    }

    /// Directory the matcher is rooted at; relative paths passed to
    /// [`PathFilter::is_ignored`] are resolved against it.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load(root: &Path, gitignore: &Path) -> Option<Gitignore> {
        let mut builder = GitignoreBuilder::new(root);
        if let Some(err) = builder.add(gitignore) {
            log::warn!(
                "Unreadable ignore file {}, continuing without it: {err}",
                gitignore.display()
            );
            return None;
        }
        match builder.build() {
            Ok(matcher) => Some(matcher),
            Err(err) => {
                log::warn!(
                    "Invalid ignore file {}, continuing without it: {err}",
                    gitignore.display()
                );
                None
            }
        }
    }

    fn with_defaults(root: &Path) -> Self {
        let mut builder = GitignoreBuilder::new(root);
        for pattern in DEFAULT_IGNORES {
            // Patterns are constant and well-formed; add_line only rejects
            // malformed globs.
            let _ = builder.add_line(None, pattern);
        }
        let matcher = builder.build().unwrap_or_else(|_| Gitignore::empty());
        Self {
            root: root.to_path_buf(),
            matcher,
        }
    }
}

impl PathFilter for GitignoreFilter {
    fn is_ignored(&self, relative: &Path, is_dir: bool) -> bool {
        self.matcher
            .matched_path_or_any_parents(relative, is_dir)
            .is_ignore()
    }
}
