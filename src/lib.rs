//! revlapse renders the history of a document as an animation.
//!
//! Every revision of a repository is checked out (oldest first), built with a user command,
//! and the resulting PDF is rasterized into a grid of page thumbnails on a fixed canvas. The
//! canvases become the frames of a looping GIF (or an MP4):
//!
//! - List revisions with a [`RevisionSource`] and check them out with a [`RevisionCheckout`]
//! - Build with a [`BuildRunner`]
//! - Render each artifact with a [`DocumentRenderer`]
//! - Drive the whole walk with a [`Pipeline`]
#![forbid(unsafe_code)]

mod build;
mod foundation;
mod layout;
mod render;
mod vcs;

pub mod config;
pub mod encode;
pub mod logging;
pub mod pipeline;

pub use crate::build::runner::{
    BuildCommand, BuildFailurePolicy, BuildOutcome, BuildRunner, CommandBuildRunner,
};
pub use crate::config::LapseConfig;
pub use crate::encode::animated_gif::GifAnimationEncoder;
pub use crate::encode::ffmpeg::{Mp4AnimationEncoder, is_ffmpeg_on_path};
pub use crate::encode::{AnimationEncoder, AnimationFormat, FRAME_DELAY_MS};
pub use crate::foundation::core::{Dimensions, MIN_CANVAS_EDGE, MIN_PAGE_EDGE, PageRange, Revision};
pub use crate::foundation::error::{LapseError, LapseResult};
pub use crate::foundation::process::is_tool_on_path;
pub use crate::layout::grid::{PageGrid, Placement, layout_pages};
pub use crate::logging::{LoggingConfig, init_logging};
pub use crate::pipeline::frames::{Frame, FrameSequence};
pub use crate::pipeline::orchestrator::{
    Pipeline, RunOpts, plan_revisions, select_revisions,
};
pub use crate::pipeline::report::{FrameRecord, RunReport, SkipReason, SkipRecord};
pub use crate::render::digest::{
    BACKGROUND_RGBA, DIGEST_SUFFIX, Digest, DocumentRenderer, RenderSettings,
};
pub use crate::render::raster::{PageImage, PopplerRasterizer, Rasterizer};
pub use crate::vcs::git::{GitRepository, RevisionCheckout, RevisionSource};
