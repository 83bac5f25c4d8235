use crate::error::{NearbyError, Result};
use crate::filter::{GitignoreFilter, PathFilter};
use std::collections::{HashSet, VecDeque};
use std::ffi::OsStr;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Default hop budget when callers do not specify one.
pub const DEFAULT_MAX_DEPTH: usize = 5;

/// A file found near the search target.
///
/// `distance` is the hop count on the filesystem graph (each parent/child
/// edge costs one hop), not byte-path depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDistance {
    /// Absolute path of the file
    pub path: PathBuf,
    /// Graph hops from the search origin
    pub distance: usize,
    /// Path relative to the search root
    pub relative_path: PathBuf,
}

/// Breadth-first proximity search over the filesystem graph.
///
/// The search starts at the target's containing directory and expands to
/// children and parents alike, bounded by the subtree of the ignore
/// filter's root. Results are ranked same-extension-first, then lexically.
pub struct NearestFileFinder<F = GitignoreFilter> {
    filter: F,
    root: PathBuf,
}

impl NearestFileFinder<GitignoreFilter> {
    /// Build a finder for a target file or directory, loading ignore rules
    /// from the nearest ancestor `.gitignore`.
    pub fn for_target(target: impl AsRef<Path>) -> Result<Self> {
        let target = target.as_ref();
        if !target.exists() {
            return Err(NearbyError::TargetNotFound(target.to_path_buf()));
        }

        let start_dir = containing_dir(target);
        let filter = GitignoreFilter::for_dir(&start_dir);
        let root = filter.root().to_path_buf();
        Ok(Self { filter, root })
    }
}

impl<F: PathFilter> NearestFileFinder<F> {
    /// Build a finder with an injected filter, bounded to `root`'s subtree.
    pub fn with_filter(filter: F, root: impl Into<PathBuf>) -> Self {
        Self {
            filter,
            root: root.into(),
        }
    }

    /// Find up to `count` files near `target`, each within `max_depth` hops.
    ///
    /// Over-collects up to 3x `count` so that same-extension files found
    /// anywhere in the walk radius can outrank closer files of a different
    /// extension, then sorts and truncates. An empty result is valid.
    pub fn find(
        &self,
        target: impl AsRef<Path>,
        count: usize,
        max_depth: usize,
    ) -> Result<Vec<FileDistance>> {
        let target = target.as_ref();
        if !target.exists() {
            return Err(NearbyError::TargetNotFound(target.to_path_buf()));
        }
        if count == 0 {
            return Ok(Vec::new());
        }

        let target_ext = target.extension().map(OsStr::to_os_string);
        let start_dir = containing_dir(target);

        let mut queue: VecDeque<(PathBuf, usize)> = VecDeque::new();
        queue.push_back((start_dir, 0));
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut accepted: Vec<FileDistance> = Vec::new();

        while accepted.len() < count.saturating_mul(3) {
            let Some((path, distance)) = queue.pop_front() else {
                break;
            };

            if distance > max_depth || !visited.insert(path.clone()) {
                continue;
            }
            let Ok(relative) = path.strip_prefix(&self.root) else {
                // Outside the search root's subtree
                continue;
            };
            if has_hidden_component(relative) {
                continue;
            }

            let is_dir = path.is_dir();
            if !relative.as_os_str().is_empty() && self.filter.is_ignored(relative, is_dir) {
                continue;
            }

            if is_dir {
                if let Some(parent) = path.parent() {
                    if parent.starts_with(&self.root) && !visited.contains(parent) {
                        queue.push_back((parent.to_path_buf(), distance + 1));
                    }
                }

                let entries = match fs::read_dir(&path) {
                    Ok(entries) => entries,
                    Err(err) => {
                        log::debug!("Skipping unreadable directory {}: {err}", path.display());
                        continue;
                    }
                };
                let mut children: Vec<PathBuf> =
                    entries.filter_map(|entry| entry.ok()).map(|e| e.path()).collect();
                children.sort();
                for child in children {
                    if !visited.contains(&child) {
                        queue.push_back((child, distance + 1));
                    }
                }
            } else if path.is_file() {
                if path == target {
                    continue;
                }
                let same_ext = path.extension().map(OsStr::to_os_string) == target_ext;
                // Other-extension files only fill the first `count` slots;
                // same-extension files accumulate up to the over-collect cap.
                if same_ext || accepted.len() < count {
                    accepted.push(FileDistance {
                        relative_path: relative.to_path_buf(),
                        path,
                        distance,
                    });
                }
            }
        }

        accepted.sort_by(|a, b| {
            let a_same = a.path.extension().map(OsStr::to_os_string) == target_ext;
            let b_same = b.path.extension().map(OsStr::to_os_string) == target_ext;
            b_same.cmp(&a_same).then_with(|| a.path.cmp(&b.path))
        });
        accepted.truncate(count);

        log::debug!(
            "Found {} files nearby to {}",
            accepted.len(),
            target.display()
        );
        Ok(accepted)
    }
}

fn containing_dir(target: &Path) -> PathBuf {
    if target.is_dir() {
        target.to_path_buf()
    } else {
        target
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn has_hidden_component(relative: &Path) -> bool {
    relative.components().any(|component| match component {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    struct AllowAll;

    impl PathFilter for AllowAll {
        fn is_ignored(&self, _relative: &Path, _is_dir: bool) -> bool {
            false
        }
    }

    struct RejectNamed(&'static str);

    impl PathFilter for RejectNamed {
        fn is_ignored(&self, relative: &Path, _is_dir: bool) -> bool {
            relative
                .file_name()
                .map(|name| name == self.0)
                .unwrap_or(false)
        }
    }

    #[test]
    fn finds_sibling_at_distance_one() {
        let temp = tempdir().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.ts"), "export const a = 1;").unwrap();
        fs::write(src.join("b.ts"), "export const b = 2;").unwrap();

        let finder = NearestFileFinder::for_target(src.join("a.ts")).unwrap();
        let found = finder.find(src.join("a.ts"), 1, 2).unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, src.join("b.ts"));
        assert_eq!(found[0].distance, 1);
    }

    #[test]
    fn same_extension_outranks_closer_files() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join(".gitignore"), "").unwrap();
        let src = temp.path().join("src");
        let lib = temp.path().join("lib");
        fs::create_dir_all(&src).unwrap();
        fs::create_dir_all(&lib).unwrap();
        fs::write(src.join("main.ts"), "").unwrap();
        fs::write(src.join("notes.md"), "").unwrap();
        fs::write(lib.join("util.ts"), "").unwrap();

        let finder = NearestFileFinder::for_target(src.join("main.ts")).unwrap();
        let found = finder.find(src.join("main.ts"), 2, 5).unwrap();

        // util.ts is three hops away but shares the extension, so it ranks
        // above the sibling markdown file.
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].path, lib.join("util.ts"));
        assert_eq!(found[1].path, src.join("notes.md"));
    }

    #[test]
    fn expands_outward_through_parents() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join(".gitignore"), "").unwrap();
        let nested = temp.path().join("a").join("src");
        let sibling = temp.path().join("a").join("lib");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(&sibling).unwrap();
        fs::write(nested.join("main.ts"), "").unwrap();
        fs::write(sibling.join("util.ts"), "").unwrap();

        let finder = NearestFileFinder::for_target(nested.join("main.ts")).unwrap();
        let found = finder.find(nested.join("main.ts"), 5, 5).unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, sibling.join("util.ts"));
        assert_eq!(found[0].distance, 3);
    }

    #[test]
    fn respects_max_depth() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join(".gitignore"), "").unwrap();
        let nested = temp.path().join("a").join("src");
        let sibling = temp.path().join("a").join("lib");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(&sibling).unwrap();
        fs::write(nested.join("main.ts"), "").unwrap();
        fs::write(sibling.join("util.ts"), "").unwrap();

        let finder = NearestFileFinder::for_target(nested.join("main.ts")).unwrap();
        let found = finder.find(nested.join("main.ts"), 5, 2).unwrap();

        // util.ts sits three hops out, beyond the budget.
        assert!(found.is_empty());
    }

    #[test]
    fn skips_gitignored_and_hidden_paths() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join(".gitignore"), "generated/\n").unwrap();
        let generated = temp.path().join("generated");
        let hidden = temp.path().join(".cache");
        fs::create_dir_all(&generated).unwrap();
        fs::create_dir_all(&hidden).unwrap();
        fs::write(temp.path().join("main.ts"), "").unwrap();
        fs::write(generated.join("gen.ts"), "").unwrap();
        fs::write(hidden.join("cached.ts"), "").unwrap();
        fs::write(temp.path().join("other.ts"), "").unwrap();

        let finder = NearestFileFinder::for_target(temp.path().join("main.ts")).unwrap();
        let found = finder.find(temp.path().join("main.ts"), 10, 4).unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, temp.path().join("other.ts"));
    }

    #[test]
    fn other_extensions_only_fill_requested_count() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("x.ts"), "").unwrap();
        for name in ["m1.md", "m2.md", "m3.md"] {
            fs::write(temp.path().join(name), "").unwrap();
        }
        fs::write(temp.path().join("y.ts"), "").unwrap();
        fs::write(temp.path().join("z.ts"), "").unwrap();

        let finder =
            NearestFileFinder::with_filter(AllowAll, temp.path().to_path_buf());
        let found = finder.find(temp.path().join("x.ts"), 2, 3).unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].path, temp.path().join("y.ts"));
        assert_eq!(found[1].path, temp.path().join("z.ts"));
    }

    #[test]
    fn injected_filter_prunes_matches() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("keep.ts"), "").unwrap();
        fs::write(temp.path().join("drop.ts"), "").unwrap();
        fs::write(temp.path().join("target.ts"), "").unwrap();

        let finder =
            NearestFileFinder::with_filter(RejectNamed("drop.ts"), temp.path().to_path_buf());
        let found = finder.find(temp.path().join("target.ts"), 5, 2).unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, temp.path().join("keep.ts"));
    }

    #[test]
    fn missing_target_is_an_error() {
        let temp = tempdir().unwrap();
        let result = NearestFileFinder::for_target(temp.path().join("missing.ts"));
        assert!(matches!(result, Err(NearbyError::TargetNotFound(_))));
    }

    #[test]
    fn empty_result_is_valid() {
        let temp = tempdir().unwrap();
        let lonely = temp.path().join("only.ts");
        fs::write(&lonely, "").unwrap();

        let finder = NearestFileFinder::for_target(&lonely).unwrap();
        let found = finder.find(&lonely, 5, 3).unwrap();

        assert!(found.is_empty());
    }
}
