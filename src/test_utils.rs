//! Test utilities for codegenius

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

/// Create a committed git repository with one Python and one JAC file.
pub fn create_git_repo() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    fs::write(root.join("a.py"), "def f():\n    pass\n").unwrap();
    fs::write(root.join("b.jac"), "node N {}\n").unwrap();
    fs::write(root.join("README.md"), "# Cloned\n").unwrap();

    git(root, &["init", "--quiet"]);
    git(root, &["add", "."]);
    git(
        root,
        &[
            "-c",
            "user.name=codegenius",
            "-c",
            "user.email=codegenius@example.com",
            "commit",
            "--quiet",
            "-m",
            "initial",
        ],
    );

    temp_dir
}

/// `file://` URL for a local repository, so git goes through a real clone.
pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap();
    assert!(status.success(), "git {args:?} failed");
}
