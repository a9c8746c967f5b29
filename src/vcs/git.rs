use std::{
    path::{Path, PathBuf},
    process::Command,
};

use crate::foundation::{
    core::Revision,
    error::{LapseError, LapseResult},
    process::{is_tool_on_path, tail_lossy},
};

/// Lists the revisions of a repository in commit order, oldest first.
pub trait RevisionSource {
    fn revisions(&self) -> LapseResult<Vec<Revision>>;
}

/// Moves a working tree to a revision.
///
/// Checkout is forced: uncommitted changes in the working tree are discarded and cannot be
/// recovered. Callers must only point this at a tree they are prepared to lose edits in.
pub trait RevisionCheckout {
    fn checkout(&mut self, revision: &Revision) -> LapseResult<()>;
}

/// A git working tree driven through the system `git` binary.
#[derive(Clone, Debug)]
pub struct GitRepository {
    root: PathBuf,
    tip: String,
}

impl GitRepository {
    /// Open the repository at `root`, walking history reachable from `HEAD`.
    pub fn open(root: impl Into<PathBuf>) -> LapseResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(LapseError::vcs(format!(
                "repository '{}' is not a directory",
                root.display()
            )));
        }
        Ok(Self {
            root,
            tip: "HEAD".to_string(),
        })
    }

    /// Walk history reachable from `tip` instead of `HEAD`.
    pub fn with_tip(mut self, tip: impl Into<String>) -> Self {
        self.tip = tip.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_git_on_path() -> bool {
        is_tool_on_path("git", "--version")
    }

    /// Expand an abbreviated id, branch or tag to the full commit id listed by
    /// [`RevisionSource::revisions`].
    pub fn resolve(&self, name: &str) -> LapseResult<String> {
        let out = self.git(&["rev-parse", "--verify", "--quiet", &format!("{name}^{{commit}}")])?;
        let id = String::from_utf8_lossy(&out.stdout).trim().to_string();
        if id.is_empty() {
            return Err(LapseError::vcs(format!("'{name}' does not name a commit")));
        }
        Ok(id)
    }

    fn git(&self, args: &[&str]) -> LapseResult<std::process::Output> {
        let out = Command::new("git")
            .arg("-C")
            .arg(&self.root)
            .args(args)
            .output()
            .map_err(|e| LapseError::vcs(format!("failed to run git (is it on PATH?): {e}")))?;
        if !out.status.success() {
            return Err(LapseError::vcs(format!(
                "`git {}` exited with {}: {}",
                args.join(" "),
                out.status,
                tail_lossy(&out.stderr, 5)
            )));
        }
        Ok(out)
    }
}

impl RevisionSource for GitRepository {
    fn revisions(&self) -> LapseResult<Vec<Revision>> {
        let out = self.git(&["log", "--reverse", "--format=%H", &self.tip])?;
        let stdout = String::from_utf8_lossy(&out.stdout);
        let revisions = Revision::sequence(
            stdout
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty()),
        );
        tracing::debug!(count = revisions.len(), tip = %self.tip, "listed revisions");
        Ok(revisions)
    }
}

impl RevisionCheckout for GitRepository {
    fn checkout(&mut self, revision: &Revision) -> LapseResult<()> {
        tracing::info!(revision = %revision, "checking out (forced)");
        let out = self.git(&["checkout", "--force", "--quiet", &revision.id])?;
        let stderr = tail_lossy(&out.stderr, 5);
        if !stderr.is_empty() {
            tracing::debug!(revision = %revision, stderr = %stderr, "git checkout");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/vcs/git.rs"]
mod tests;
