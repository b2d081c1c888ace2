//! Recursive repository walk producing a [`FileNode`] tree.
//!
//! The walk is fail-soft: an entry that cannot be stat'ed becomes a
//! zero-size file, a directory that cannot be listed for lack of permission
//! becomes a childless container, and any other listing error drops that
//! directory's whole subtree. None of these aborts the walk.
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

use super::languages::classify;
use crate::models::FileNode;

pub const DEFAULT_MAX_DEPTH: usize = 10;

/// Entry names that are never descended into: VCS metadata, dependency and
/// tool caches, build output, virtual environments.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    "__pycache__",
    ".git",
    ".venv",
    "venv",
    "node_modules",
    ".pytest_cache",
    "*.egg-info",
    "dist",
    "build",
    ".mypy_cache",
    ".tox",
    ".coverage",
];

static DEFAULT_RULES: LazyLock<IgnoreRules> = LazyLock::new(|| {
    IgnoreRules::with_extra::<&str>(&[]).expect("default ignore patterns are valid globs")
});

/// Glob set matched against a single path component name.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    set: GlobSet,
}

impl IgnoreRules {
    /// Default patterns plus `extra`.
    pub fn with_extra<S: AsRef<str>>(extra: &[S]) -> Result<Self, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        for pattern in DEFAULT_IGNORE_PATTERNS {
            builder.add(Glob::new(pattern)?);
        }
        for pattern in extra {
            builder.add(Glob::new(pattern.as_ref())?);
        }
        Ok(Self {
            set: builder.build()?,
        })
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.set.is_match(name)
    }
}

impl Default for IgnoreRules {
    fn default() -> Self {
        DEFAULT_RULES.clone()
    }
}

/// Whether `name` is one of the default ignored entry names.
pub fn should_ignore(name: &str) -> bool {
    DEFAULT_RULES.is_ignored(name)
}

pub struct FileTreeBuilder {
    max_depth: usize,
    ignore: IgnoreRules,
}

impl FileTreeBuilder {
    pub fn new(max_depth: usize, ignore: IgnoreRules) -> Self {
        Self { max_depth, ignore }
    }

    /// Walks `root`. Returns `None` when the root itself is pruned or cannot be listed.
    pub fn build<P: AsRef<Path>>(&self, root: P) -> Option<FileNode> {
        self.build_node(root.as_ref(), 0)
    }

    fn build_node(&self, path: &Path, depth: usize) -> Option<FileNode> {
        if depth > self.max_depth {
            return None;
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        if self.ignore.is_ignored(&name) {
            debug!("Skipping ignored entry {}", path.display());
            return None;
        }

        // Anything that cannot be stat'ed as a directory (a dangling symlink,
        // say) is kept as a file of size 0.
        let metadata = match fs::metadata(path) {
            Ok(m) => Some(m),
            Err(e) => {
                debug!("Cannot stat {}: {e}", path.display());
                None
            }
        };

        if !metadata.as_ref().is_some_and(|m| m.is_dir()) {
            let size = metadata.map_or(0, |m| m.len());
            let language = classify(&name);
            return Some(FileNode::file(path.to_path_buf(), name, language, size, depth));
        }

        let mut node = FileNode::directory(path.to_path_buf(), name, depth);
        let entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                debug!("Permission denied listing {}", path.display());
                return Some(node);
            }
            Err(e) => {
                debug!("Dropping {}: {e}", path.display());
                return None;
            }
        };

        let mut child_paths: Vec<_> = entries
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(e) => {
                    debug!("Unreadable entry under {}: {e}", path.display());
                    None
                }
            })
            .collect();
        child_paths.sort();

        for child_path in child_paths {
            if let Some(child) = self.build_node(&child_path, depth + 1) {
                node.children.push(child);
            }
        }

        Some(node)
    }
}

impl Default for FileTreeBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH, IgnoreRules::default())
    }
}

/// Builds a tree rooted at `root` with the default ignore rules.
pub fn build_tree<P: AsRef<Path>>(root: P, max_depth: usize) -> Option<FileNode> {
    FileTreeBuilder::new(max_depth, IgnoreRules::default()).build(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::languages::Language;
    use tempfile::tempdir;

    fn fixture() -> tempfile::TempDir {
        let temp = tempdir().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("pkg/sub")).unwrap();
        fs::create_dir_all(root.join(".git/objects")).unwrap();
        fs::create_dir_all(root.join("node_modules/left-pad")).unwrap();
        fs::create_dir_all(root.join("mylib.egg-info")).unwrap();
        fs::write(root.join("main.py"), "print('hi')\n").unwrap();
        fs::write(root.join("pkg/graph.jac"), "node A {}\n").unwrap();
        fs::write(root.join("pkg/sub/deep.rs"), "fn main() {}\n").unwrap();
        fs::write(root.join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();
        fs::write(root.join("node_modules/left-pad/index.js"), "").unwrap();
        temp
    }

    fn assert_depths(node: &FileNode) {
        for child in &node.children {
            assert_eq!(child.depth, node.depth + 1, "bad depth at {:?}", child.path);
            assert_depths(child);
        }
    }

    #[test]
    fn test_build_tree_structure() {
        let temp = fixture();
        let tree = build_tree(temp.path(), DEFAULT_MAX_DEPTH).expect("root should build");

        assert!(tree.is_dir);
        assert_eq!(tree.depth, 0);
        assert_eq!(tree.language, Language::Unknown);
        assert_depths(&tree);

        let names: Vec<&str> = tree.iter().map(|n| n.name.as_str()).collect();
        assert!(names.contains(&"main.py"));
        assert!(names.contains(&"graph.jac"));
        assert!(names.contains(&"deep.rs"));
        for ignored in [".git", "HEAD", "node_modules", "index.js", "mylib.egg-info"] {
            assert!(!names.contains(&ignored), "{ignored} should be pruned");
        }
    }

    #[test]
    fn test_file_nodes_are_classified_leaves() {
        let temp = fixture();
        let tree = build_tree(temp.path(), DEFAULT_MAX_DEPTH).unwrap();

        let main = tree.iter().find(|n| n.name == "main.py").unwrap();
        assert!(!main.is_dir);
        assert!(main.children.is_empty());
        assert_eq!(main.language, Language::Python);
        assert_eq!(main.size, "print('hi')\n".len() as u64);

        for dir in tree.iter().filter(|n| n.is_dir) {
            assert_eq!(dir.language, Language::Unknown);
            assert_eq!(dir.size, 0);
        }
    }

    #[test]
    fn test_max_depth_prunes() {
        let temp = fixture();
        let tree = build_tree(temp.path(), 1).unwrap();

        assert!(tree.iter().all(|n| n.depth <= 1));
        let pkg = tree.iter().find(|n| n.name == "pkg").unwrap();
        assert!(pkg.children.is_empty());

        let only_root = build_tree(temp.path(), 0).unwrap();
        assert!(only_root.children.is_empty());
    }

    #[test]
    fn test_missing_root_is_empty_file() {
        let temp = tempdir().unwrap();
        let node = build_tree(temp.path().join("nope"), DEFAULT_MAX_DEPTH).unwrap();
        assert!(!node.is_dir);
        assert_eq!(node.size, 0);
        assert!(node.children.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_zero_size_file() {
        use crate::indexer::core::CodeAnalyzer;

        let temp = tempdir().unwrap();
        fs::write(temp.path().join("a.py"), "def f():\n    pass\n").unwrap();
        std::os::unix::fs::symlink(temp.path().join("gone.py"), temp.path().join("link.py"))
            .unwrap();

        let tree = build_tree(temp.path(), DEFAULT_MAX_DEPTH).unwrap();
        let link = tree.iter().find(|n| n.name == "link.py").expect("link.py kept");
        assert!(!link.is_dir);
        assert_eq!(link.size, 0);
        assert_eq!(link.language, Language::Python);

        let mut analyzer = CodeAnalyzer::new().unwrap();
        let analysis = analyzer.analyze_repository(Some(&tree));
        assert_eq!(analysis.file_count, 2);
        assert_eq!(analysis.entity_count, 1);
    }

    #[test]
    fn test_single_file_root() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("solo.py");
        fs::write(&file, "x = 1\n").unwrap();

        let node = build_tree(&file, DEFAULT_MAX_DEPTH).unwrap();
        assert!(!node.is_dir);
        assert_eq!(node.name, "solo.py");
        assert_eq!(node.language, Language::Python);
    }

    #[test]
    fn test_build_is_idempotent() {
        let temp = fixture();
        let first = build_tree(temp.path(), DEFAULT_MAX_DEPTH).unwrap();
        let second = build_tree(temp.path(), DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_siblings_sorted_by_name() {
        let temp = fixture();
        let tree = build_tree(temp.path(), DEFAULT_MAX_DEPTH).unwrap();
        let top: Vec<&str> = tree.children.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(top, vec!["main.py", "pkg"]);
    }

    #[test]
    fn test_extra_ignore_patterns() {
        let temp = fixture();
        let rules = IgnoreRules::with_extra(&["pkg"]).unwrap();
        let tree = FileTreeBuilder::new(DEFAULT_MAX_DEPTH, rules)
            .build(temp.path())
            .unwrap();

        assert!(tree.iter().all(|n| n.name != "pkg" && n.name != "graph.jac"));
        assert!(tree.iter().any(|n| n.name == "main.py"));
    }

    #[test]
    fn test_invalid_extra_pattern() {
        assert!(IgnoreRules::with_extra(&["[unclosed"]).is_err());
    }

    #[test]
    fn test_should_ignore() {
        assert!(should_ignore("__pycache__"));
        assert!(should_ignore("foo.egg-info"));
        assert!(should_ignore("venv"));
        assert!(!should_ignore("src"));
        assert!(!should_ignore("venvironment"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unlistable_directory_becomes_leafless_container() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempdir().unwrap();
        let locked = temp.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("secret.py"), "x = 1\n").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Running as root bypasses permission checks; nothing to assert then.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let tree = build_tree(temp.path(), DEFAULT_MAX_DEPTH).unwrap();
        let node = tree.iter().find(|n| n.name == "locked").unwrap();
        assert!(node.is_dir);
        assert!(node.children.is_empty());

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
    }
}
