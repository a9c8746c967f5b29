use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::{
    core::Revision,
    error::LapseResult,
    process::ensure_parent_dir,
};

/// A revision that produced a frame.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct FrameRecord {
    pub ordinal: u32,
    pub revision: String,
    pub digest: PathBuf,
}

/// Why a revision was skipped.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    /// The artifact could not be rasterized.
    UnreadableDocument(String),
    /// The build failed under the `skip` policy.
    BuildFailed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnreadableDocument(d) => write!(f, "unreadable document: {d}"),
            Self::BuildFailed(d) => write!(f, "build failed: {d}"),
        }
    }
}

/// A revision that was attempted but produced no frame.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SkipRecord {
    pub ordinal: u32,
    pub revision: String,
    pub reason: SkipReason,
}

/// Final state of a run.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct RunReport {
    /// Revisions listed by the repository.
    pub revisions_total: usize,
    /// Revisions left after applying the start revision.
    pub revisions_selected: usize,
    /// Revisions checked out, built and rendered (or skipped).
    pub attempts: u32,
    pub frames: Vec<FrameRecord>,
    pub skipped: Vec<SkipRecord>,
    /// Builds that exited non-zero or timed out, whatever the policy did about them.
    pub build_failures: u32,
    pub reached_end_revision: bool,
    /// Animation path, when one was written.
    pub animation: Option<PathBuf>,
}

impl RunReport {
    pub(crate) fn record_frame(&mut self, ordinal: u32, revision: &Revision, digest: &Path) {
        self.frames.push(FrameRecord {
            ordinal,
            revision: revision.id.clone(),
            digest: digest.to_path_buf(),
        });
    }

    pub(crate) fn record_skip(&mut self, ordinal: u32, revision: &Revision, reason: SkipReason) {
        self.skipped.push(SkipRecord {
            ordinal,
            revision: revision.id.clone(),
            reason,
        });
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        let animation = match &self.animation {
            Some(p) => format!("animation written to {}", p.display()),
            None => "no animation written".to_string(),
        };
        format!(
            "{} of {} revision(s) attempted, {} frame(s), {} skipped, {}",
            self.attempts,
            self.revisions_selected,
            self.frames.len(),
            self.skipped.len(),
            animation
        )
    }

    pub fn write_json(&self, path: &Path) -> LapseResult<()> {
        ensure_parent_dir(path)?;
        let json = serde_json::to_string_pretty(self).context("serialize run report")?;
        std::fs::write(path, json)
            .with_context(|| format!("write run report '{}'", path.display()))?;
        Ok(())
    }
}
