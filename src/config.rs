use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;

use crate::{
    build::runner::{BuildCommand, BuildFailurePolicy},
    encode::AnimationFormat,
    foundation::{
        core::{Dimensions, PageRange},
        error::{LapseError, LapseResult},
    },
    layout::grid::PageGrid,
    pipeline::orchestrator::RunOpts,
    render::digest::RenderSettings,
};

/// Everything a run needs, as read from JSON or assembled from CLI flags.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LapseConfig {
    /// Root of the working tree whose history is walked.
    pub repository: PathBuf,
    pub build_command: BuildCommand,
    /// The PDF the build produces. Relative paths resolve against the process directory.
    pub artifact: PathBuf,
    /// Build inside this directory of the repository instead of its root.
    #[serde(default)]
    pub subdirectory: Option<PathBuf>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub animation: Option<PathBuf>,
    #[serde(default, deserialize_with = "clamped_canvas")]
    pub canvas: Dimensions,
    #[serde(default = "default_page", deserialize_with = "clamped_page")]
    pub page: Dimensions,
    #[serde(default)]
    pub pages: PageRange,
    #[serde(default)]
    pub start_revision: Option<String>,
    #[serde(default)]
    pub end_revision: Option<String>,
    #[serde(default)]
    pub build_timeout_secs: Option<u64>,
    #[serde(default)]
    pub on_build_failure: BuildFailurePolicy,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_page() -> Dimensions {
    Dimensions::page(80, 100)
}

fn clamped_canvas<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Dimensions, D::Error> {
    let raw = <Dimensions as serde::Deserialize>::deserialize(d)?;
    Ok(Dimensions::canvas(raw.width, raw.height))
}

fn clamped_page<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Dimensions, D::Error> {
    let raw = <Dimensions as serde::Deserialize>::deserialize(d)?;
    Ok(Dimensions::page(raw.width, raw.height))
}

impl LapseConfig {
    pub fn new(
        repository: impl Into<PathBuf>,
        build_command: BuildCommand,
        artifact: impl Into<PathBuf>,
    ) -> Self {
        Self {
            repository: repository.into(),
            build_command,
            artifact: artifact.into(),
            subdirectory: None,
            output_dir: default_output_dir(),
            animation: None,
            canvas: Dimensions::default(),
            page: default_page(),
            pages: PageRange::all(),
            start_revision: None,
            end_revision: None,
            build_timeout_secs: None,
            on_build_failure: BuildFailurePolicy::default(),
        }
    }

    /// Read a JSON config. Dimensions are clamped to their minimums; nothing else is checked.
    pub fn from_path(path: &Path) -> LapseResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_str(&text)
            .with_context(|| format!("parse config JSON '{}'", path.display()))?;
        Ok(cfg.normalized())
    }

    /// Clamp canvas and page dimensions up to their minimum edges.
    pub fn normalized(mut self) -> Self {
        self.canvas = Dimensions::canvas(self.canvas.width, self.canvas.height);
        self.page = Dimensions::page(self.page.width, self.page.height);
        self
    }

    pub fn validate(&self) -> LapseResult<()> {
        self.build_command.validate()?;
        self.pages.validate()?;
        PageGrid::new(self.canvas, self.page)?;
        if self.build_timeout_secs == Some(0) {
            return Err(LapseError::validation("build timeout must be > 0 seconds"));
        }

        match self.animation_format() {
            Some(AnimationFormat::Mp4) => {
                crate::encode::ffmpeg::validate_mp4_size(self.canvas.width, self.canvas.height)?;
            }
            Some(AnimationFormat::Gif) => {
                if self.canvas.width > u32::from(u16::MAX) || self.canvas.height > u32::from(u16::MAX)
                {
                    return Err(LapseError::validation(format!(
                        "canvas {} exceeds the GIF size limit of 65535x65535",
                        self.canvas
                    )));
                }
            }
            None => {}
        }
        Ok(())
    }

    /// Directory the build command runs in.
    pub fn build_dir(&self) -> PathBuf {
        match &self.subdirectory {
            Some(sub) => self.repository.join(sub),
            None => self.repository.clone(),
        }
    }

    pub fn build_timeout(&self) -> Option<Duration> {
        self.build_timeout_secs.map(Duration::from_secs)
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            canvas: self.canvas,
            page: self.page,
            pages: self.pages,
            output_dir: self.output_dir.clone(),
        }
    }

    pub fn animation_format(&self) -> Option<AnimationFormat> {
        self.animation.as_deref().map(AnimationFormat::from_path)
    }

    pub fn run_opts(&self) -> RunOpts {
        RunOpts {
            start_revision: self.start_revision.clone(),
            end_revision: self.end_revision.clone(),
            animation_out: self.animation.clone(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
