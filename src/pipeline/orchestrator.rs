use std::{collections::VecDeque, path::PathBuf};

use crate::{
    build::runner::{BuildFailurePolicy, BuildRunner, CommandBuildRunner},
    config::LapseConfig,
    encode::{AnimationEncoder, AnimationFormat},
    foundation::{
        core::Revision,
        error::{LapseError, LapseResult},
    },
    pipeline::{
        frames::{Frame, FrameSequence},
        report::{RunReport, SkipReason},
    },
    render::{
        digest::{Digest, DocumentRenderer},
        raster::PopplerRasterizer,
    },
    vcs::git::{GitRepository, RevisionCheckout, RevisionSource},
};

/// Bounds and output for one [`Pipeline::run`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunOpts {
    /// Start at this revision (inclusive). Unknown ids select nothing.
    pub start_revision: Option<String>,
    /// Stop after this revision (inclusive).
    pub end_revision: Option<String>,
    /// Write the animation here when at least one frame was rendered.
    pub animation_out: Option<PathBuf>,
}

/// Drop revisions from the front until `start` is first.
///
/// Without `start` the list is returned whole; with an unknown `start` the result is empty.
pub fn select_revisions(all: Vec<Revision>, start: Option<&str>) -> VecDeque<Revision> {
    let mut pending = VecDeque::from(all);
    if let Some(start) = start {
        while pending.front().is_some_and(|r| r.id != start) {
            pending.pop_front();
        }
    }
    pending
}

/// [`select_revisions`], then cut the list after `end` (inclusive) if it appears.
pub fn plan_revisions(all: Vec<Revision>, start: Option<&str>, end: Option<&str>) -> Vec<Revision> {
    let mut planned = Vec::new();
    for rev in select_revisions(all, start) {
        let last = end == Some(rev.id.as_str());
        planned.push(rev);
        if last {
            break;
        }
    }
    planned
}

enum Attempt {
    Rendered(Digest),
    Skipped(SkipReason),
}

/// Walks revisions oldest first: checkout, build, render, accumulate, then encode.
///
/// Everything runs sequentially on the calling thread. The working tree and the artifact
/// path are assumed to have no other writer for the duration of the run.
pub struct Pipeline {
    source: Box<dyn RevisionSource>,
    checkout: Box<dyn RevisionCheckout>,
    build: Box<dyn BuildRunner>,
    renderer: DocumentRenderer,
    artifact: PathBuf,
    build_failure: BuildFailurePolicy,
    encoder: Option<Box<dyn AnimationEncoder>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("renderer", &self.renderer)
            .field("artifact", &self.artifact)
            .field("build_failure", &self.build_failure)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(
        source: Box<dyn RevisionSource>,
        checkout: Box<dyn RevisionCheckout>,
        build: Box<dyn BuildRunner>,
        renderer: DocumentRenderer,
        artifact: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            checkout,
            build,
            renderer,
            artifact: artifact.into(),
            build_failure: BuildFailurePolicy::default(),
            encoder: None,
        }
    }

    /// Wire the git, build-command and poppler adapters described by `cfg`.
    ///
    /// The run will force-checkout revisions in `cfg.repository`, discarding any
    /// uncommitted changes there.
    pub fn from_config(cfg: &LapseConfig) -> LapseResult<Self> {
        cfg.validate()?;
        if !PopplerRasterizer::is_available() {
            return Err(LapseError::render(
                "pdfinfo and pdftoppm (poppler) are required but were not found on PATH",
            ));
        }

        let repo = GitRepository::open(&cfg.repository)?;
        let build = CommandBuildRunner::new(cfg.build_command.clone(), cfg.build_dir())
            .with_timeout(cfg.build_timeout());
        let renderer =
            DocumentRenderer::new(cfg.render_settings(), Box::new(PopplerRasterizer::new()))?;

        Ok(Self::new(
            Box::new(repo.clone()),
            Box::new(repo),
            Box::new(build),
            renderer,
            cfg.artifact.clone(),
        )
        .with_build_failure_policy(cfg.on_build_failure))
    }

    pub fn with_build_failure_policy(mut self, policy: BuildFailurePolicy) -> Self {
        self.build_failure = policy;
        self
    }

    /// Use `encoder` for every run instead of picking one from each animation path's extension.
    pub fn with_encoder(mut self, encoder: Box<dyn AnimationEncoder>) -> Self {
        self.encoder = Some(encoder);
        self
    }

    pub fn renderer(&self) -> &DocumentRenderer {
        &self.renderer
    }

    /// Revisions a run with `opts` would visit, oldest first, without touching the tree.
    pub fn planned_revisions(&self, opts: &RunOpts) -> LapseResult<Vec<Revision>> {
        Ok(plan_revisions(
            self.source.revisions()?,
            opts.start_revision.as_deref(),
            opts.end_revision.as_deref(),
        ))
    }

    /// Process every selected revision, then encode the accepted frames.
    ///
    /// Unreadable artifacts (and failed builds under [`BuildFailurePolicy::Skip`]) skip the
    /// revision. Any other failure stops the run and no animation is written.
    pub fn run(&mut self, opts: &RunOpts) -> LapseResult<RunReport> {
        let all = self.source.revisions()?;
        let mut report = RunReport {
            revisions_total: all.len(),
            ..RunReport::default()
        };

        let mut pending = select_revisions(all, opts.start_revision.as_deref());
        report.revisions_selected = pending.len();
        if let Some(start) = &opts.start_revision
            && pending.is_empty()
        {
            tracing::warn!(start = %start, "start revision not found in history; nothing to do");
        }

        let mut frames = FrameSequence::new();
        let mut counter: u32 = 1;
        while let Some(rev) = pending.pop_front() {
            tracing::info!(
                revision = %rev,
                attempt = counter,
                remaining = pending.len(),
                "processing revision"
            );
            match self.attempt(&rev, counter, &mut report)? {
                Attempt::Rendered(digest) => {
                    report.record_frame(counter, &rev, &digest.path);
                    frames.push(Frame {
                        ordinal: counter,
                        revision: rev.clone(),
                        canvas: digest.canvas,
                    });
                }
                Attempt::Skipped(reason) => {
                    tracing::warn!(revision = %rev, attempt = counter, %reason, "skipping revision");
                    report.record_skip(counter, &rev, reason);
                }
            }
            report.attempts = counter;
            counter += 1;

            if opts.end_revision.as_deref() == Some(rev.id.as_str()) {
                tracing::info!(revision = %rev, "reached end revision");
                report.reached_end_revision = true;
                break;
            }
        }

        if let Some(out) = &opts.animation_out {
            if frames.is_empty() {
                tracing::warn!(path = %out.display(), "no frames rendered; animation not written");
            } else {
                match self.encoder.as_mut() {
                    Some(encoder) => encoder.encode(&frames, out)?,
                    None => AnimationFormat::from_path(out).encoder().encode(&frames, out)?,
                }
                report.animation = Some(out.clone());
            }
        }

        tracing::info!(summary = %report.summary(), "run complete");
        Ok(report)
    }

    fn attempt(
        &mut self,
        rev: &Revision,
        counter: u32,
        report: &mut RunReport,
    ) -> LapseResult<Attempt> {
        self.checkout
            .checkout(rev)
            .map_err(|e| e.at_revision(&rev.id, "checkout"))?;

        let outcome = self
            .build
            .run()
            .map_err(|e| e.at_revision(&rev.id, "build"))?;
        if !outcome.success {
            report.build_failures += 1;
            let detail = if outcome.stderr_tail.is_empty() {
                outcome.describe()
            } else {
                format!("{}: {}", outcome.describe(), outcome.stderr_tail)
            };
            match self.build_failure {
                BuildFailurePolicy::Continue => {
                    tracing::warn!(revision = %rev, detail = %detail, "build failed; rendering anyway");
                }
                BuildFailurePolicy::Skip => return Ok(Attempt::Skipped(SkipReason::BuildFailed(detail))),
                BuildFailurePolicy::Abort => {
                    return Err(LapseError::build(detail).at_revision(&rev.id, "build"));
                }
            }
        }

        match self.renderer.render(&self.artifact, &counter.to_string()) {
            Ok(digest) => Ok(Attempt::Rendered(digest)),
            Err(e) if e.is_unreadable_document() => {
                Ok(Attempt::Skipped(SkipReason::UnreadableDocument(e.to_string())))
            }
            Err(e) => Err(e.at_revision(&rev.id, "render")),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/orchestrator.rs"]
mod tests;
