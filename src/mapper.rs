/// Repository acquisition and structural mapping.
///
/// A remote repository is shallow-cloned into a temporary directory that is
/// removed when the returned [`Checkout`] is cleaned up or dropped. A local
/// directory is used in place and never removed.
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tempfile::TempDir;
use thiserror::Error;
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::Config;
use crate::indexer::file_tree::FileTreeBuilder;
use crate::indexer::languages::Language;
use crate::models::FileNode;

const README_NAMES: &[&str] = &["README.md", "README.txt", "README"];
const ENTRY_POINT_NAMES: &[&str] = &["main.py", "index.js", "app.py", "server.py", "start.js"];
const TEMP_PREFIX: &str = "codebase_genius_";

/// Errors that can occur while obtaining repository contents.
#[derive(Error, Debug)]
pub enum AcquireError {
    #[error("failed to create temporary directory: {0}")]
    TempDir(#[source] std::io::Error),

    #[error("failed to run git: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("git clone failed: {0}")]
    CloneFailed(String),

    #[error("git clone timed out after {0}s")]
    Timeout(u64),
}

/// Repository contents on local disk for the duration of one pipeline run.
#[derive(Debug)]
pub struct Checkout {
    root: PathBuf,
    temp: Option<TempDir>,
}

impl Checkout {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the contents live in a temporary clone.
    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }

    /// Removes the temporary clone, if any. Failures are logged only.
    pub fn cleanup(self) {
        if let Some(temp) = self.temp {
            let path = temp.path().to_path_buf();
            match temp.close() {
                Ok(()) => info!("Removed temporary clone {}", path.display()),
                Err(e) => warn!("Failed to remove {}: {e}", path.display()),
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositorySummary {
    pub repo_path: PathBuf,
    pub primary_language: Language,
    /// Relative to the repository root.
    pub entry_points: Vec<PathBuf>,
    pub readme: String,
}

#[derive(Debug, Clone)]
pub struct RepositoryMap {
    pub tree: Option<FileNode>,
    pub summary: RepositorySummary,
}

pub struct RepoMapper {
    clone_timeout: Duration,
    clone_root: Option<PathBuf>,
    tree_builder: FileTreeBuilder,
    readme_summary_lines: usize,
    entry_point_limit: usize,
}

impl RepoMapper {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            clone_timeout: config.clone_timeout(),
            clone_root: config.clone_root.clone(),
            tree_builder: FileTreeBuilder::new(config.max_depth, config.ignore_rules()?),
            readme_summary_lines: config.readme_summary_lines,
            entry_point_limit: config.entry_point_limit,
        })
    }

    /// Resolves `location` to local contents, cloning when it is not an
    /// existing directory.
    pub async fn acquire(&self, location: &str) -> Result<Checkout, AcquireError> {
        let local = Path::new(location);
        if local.is_dir() {
            info!("Using local repository at {}", local.display());
            return Ok(Checkout {
                root: local.to_path_buf(),
                temp: None,
            });
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_PREFIX);
        let temp = match &self.clone_root {
            Some(dir) => builder.tempdir_in(dir),
            None => builder.tempdir(),
        }
        .map_err(AcquireError::TempDir)?;
        info!("Cloning {location} into {}", temp.path().display());

        let mut command = Command::new("git");
        command
            .args(["clone", "--depth", "1", "--", location])
            .arg(temp.path())
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.clone_timeout, command.output()).await {
            Ok(result) => result.map_err(AcquireError::Spawn)?,
            Err(_) => return Err(AcquireError::Timeout(self.clone_timeout.as_secs())),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(AcquireError::CloneFailed(stderr));
        }

        Ok(Checkout {
            root: temp.path().to_path_buf(),
            temp: Some(temp),
        })
    }

    /// Walks the repository rooted at `root` and summarizes it.
    pub fn map(&self, root: &Path) -> RepositoryMap {
        let tree = self.tree_builder.build(root);

        let summary = RepositorySummary {
            repo_path: root.to_path_buf(),
            primary_language: tree.as_ref().map(primary_language).unwrap_or_default(),
            entry_points: tree
                .as_ref()
                .map(|t| entry_points(t, root, self.entry_point_limit))
                .unwrap_or_default(),
            readme: summarize_readme(read_readme(root).as_deref(), self.readme_summary_lines),
        };

        RepositoryMap { tree, summary }
    }
}

/// Display name of a repository: the last path or URL segment without a
/// trailing `.git`.
pub fn repo_name(location: &str) -> String {
    let trimmed = location.trim_end_matches(['/', '\\']);
    let segment = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);
    let name = segment.strip_suffix(".git").unwrap_or(segment);

    if name.is_empty() || name == "." || name == ".." {
        return fs::canonicalize(location)
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "repository".to_string());
    }
    name.to_string()
}

/// Contents of the first README found at the repository root.
pub fn read_readme(root: &Path) -> Option<String> {
    for name in README_NAMES {
        let path = root.join(name);
        if !path.is_file() {
            continue;
        }
        match fs::read(&path) {
            Ok(bytes) => return Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) => warn!("Failed to read {}: {e}", path.display()),
        }
    }
    None
}

/// First `max_lines` lines of the README, marked when cut short.
pub fn summarize_readme(content: Option<&str>, max_lines: usize) -> String {
    let Some(content) = content.filter(|c| !c.is_empty()) else {
        return "No README found.".to_string();
    };

    let lines: Vec<&str> = content.split('\n').collect();
    let mut summary = lines[..lines.len().min(max_lines)].join("\n");
    if lines.len() > max_lines {
        summary.push_str("\n... (truncated)");
    }
    summary
}

/// Most common language among classified files. Ties go to the language
/// seen first in traversal order.
pub fn primary_language(tree: &FileNode) -> Language {
    let mut counts: Vec<(Language, usize)> = Vec::new();
    for file in tree.files().filter(|n| n.language != Language::Unknown) {
        match counts.iter_mut().find(|(l, _)| *l == file.language) {
            Some((_, count)) => *count += 1,
            None => counts.push((file.language, 1)),
        }
    }

    let mut best: Option<(Language, usize)> = None;
    for (language, count) in counts {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((language, count));
        }
    }
    best.map(|(l, _)| l).unwrap_or_default()
}

/// Conventional entry-point files, in traversal order.
pub fn entry_points(tree: &FileNode, root: &Path, limit: usize) -> Vec<PathBuf> {
    tree.files()
        .filter(|n| ENTRY_POINT_NAMES.contains(&n.name.as_str()))
        .map(|n| n.path.strip_prefix(root).unwrap_or(&n.path).to_path_buf())
        .take(limit)
        .collect()
}
