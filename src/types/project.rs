// ABOUTME: Project identity discovery from package metadata and git state.
// ABOUTME: Reads package.json for the project name and .git/HEAD for the branch.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use super::stack_name::{ProjectIdentity, StackNameError};

#[derive(Debug, Deserialize)]
struct PackageJson {
    name: Option<String>,
}

impl ProjectIdentity {
    /// Discover the identity of the project rooted at `dir`.
    ///
    /// The project name comes from `package.json`'s `name` when present,
    /// otherwise from the directory name. The branch comes from the nearest
    /// git checkout; detached checkouts and non-git projects use `main`.
    pub fn discover(dir: &Path) -> Result<Self, StackNameError> {
        let project = package_name(dir).unwrap_or_else(|| directory_name(dir));
        let branch = current_branch(dir);
        Self::new(&project, branch.as_deref())
    }
}

fn package_name(dir: &Path) -> Option<String> {
    let content = fs::read_to_string(dir.join("package.json")).ok()?;
    match serde_json::from_str::<PackageJson>(&content) {
        Ok(package) => package.name,
        Err(e) => {
            tracing::debug!("ignoring unreadable package.json: {}", e);
            None
        }
    }
}

fn directory_name(dir: &Path) -> String {
    let resolved = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    resolved
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Resolve the checked-out branch by reading `HEAD` from the nearest git
/// directory, walking up from `dir`.
pub fn current_branch(dir: &Path) -> Option<String> {
    let git_dir = find_git_dir(dir)?;
    let head = fs::read_to_string(git_dir.join("HEAD")).ok()?;
    parse_head(&head)
}

fn find_git_dir(dir: &Path) -> Option<PathBuf> {
    for ancestor in dir.ancestors() {
        let candidate = ancestor.join(".git");
        if candidate.is_dir() {
            return Some(candidate);
        }
        // Worktrees and submodules use a `.git` file pointing at the real dir
        if candidate.is_file() {
            let content = fs::read_to_string(&candidate).ok()?;
            let target = content.trim().strip_prefix("gitdir:")?.trim();
            let target = Path::new(target);
            return Some(if target.is_absolute() {
                target.to_path_buf()
            } else {
                ancestor.join(target)
            });
        }
    }
    None
}

fn parse_head(head: &str) -> Option<String> {
    head.trim()
        .strip_prefix("ref:")
        .map(str::trim)
        .and_then(|r| r.strip_prefix("refs/heads/"))
        .filter(|b| !b.is_empty())
        .map(str::to_string)
}
