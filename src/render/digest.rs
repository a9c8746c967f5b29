use std::path::{Path, PathBuf};

use image::{ImageFormat, Rgba, RgbaImage};

use crate::{
    foundation::{
        core::{Dimensions, PageRange},
        error::{LapseError, LapseResult},
        process::ensure_dir,
    },
    layout::grid::PageGrid,
    render::raster::{PageImage, Rasterizer},
};

/// Opaque white, the canvas background.
pub const BACKGROUND_RGBA: [u8; 4] = [255, 255, 255, 255];

/// File name suffix of every digest image: `<prefix>_digest.png`.
pub const DIGEST_SUFFIX: &str = "_digest.png";

/// Canvas geometry, page selection and output location for [`DocumentRenderer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderSettings {
    pub canvas: Dimensions,
    pub page: Dimensions,
    pub pages: PageRange,
    /// Directory that receives the digest images.
    pub output_dir: PathBuf,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            canvas: Dimensions::canvas(800, 600),
            page: Dimensions::page(80, 100),
            pages: PageRange::all(),
            output_dir: PathBuf::from("."),
        }
    }
}

/// A rendered revision: the digest file on disk and the canvas it holds.
#[derive(Clone, Debug)]
pub struct Digest {
    pub path: PathBuf,
    pub canvas: RgbaImage,
}

/// Rasterizes an artifact and composites its pages onto one canvas.
pub struct DocumentRenderer {
    settings: RenderSettings,
    grid: PageGrid,
    rasterizer: Box<dyn Rasterizer>,
}

impl std::fmt::Debug for DocumentRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentRenderer")
            .field("settings", &self.settings)
            .field("grid", &self.grid)
            .finish_non_exhaustive()
    }
}

impl DocumentRenderer {
    pub fn new(settings: RenderSettings, rasterizer: Box<dyn Rasterizer>) -> LapseResult<Self> {
        let grid = PageGrid::new(settings.canvas, settings.page)?;
        settings.pages.validate()?;
        Ok(Self {
            settings,
            grid,
            rasterizer,
        })
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn grid(&self) -> &PageGrid {
        &self.grid
    }

    pub fn digest_path(&self, prefix: &str) -> PathBuf {
        self.settings
            .output_dir
            .join(format!("{prefix}{DIGEST_SUFFIX}"))
    }

    /// Paste `pages` onto a fresh white canvas in grid order.
    ///
    /// Pixels are replaced, not blended. Anything outside the canvas is clipped.
    pub fn compose(&self, pages: &[PageImage]) -> RgbaImage {
        let canvas_dims = self.settings.canvas;
        let mut canvas =
            RgbaImage::from_pixel(canvas_dims.width, canvas_dims.height, Rgba(BACKGROUND_RGBA));
        if pages.len() as u64 > self.grid.capacity() {
            tracing::debug!(
                pages = pages.len(),
                capacity = self.grid.capacity(),
                "pages beyond the canvas are clipped"
            );
        }
        for (page, at) in pages.iter().zip(self.grid.placements(pages.len())) {
            image::imageops::replace(&mut canvas, page, to_coord(at.x), to_coord(at.y));
        }
        canvas
    }

    /// Rasterize `artifact`, compose its pages, and write `<prefix>_digest.png`.
    #[tracing::instrument(skip(self, artifact), fields(artifact = %artifact.display()))]
    pub fn render(&self, artifact: &Path, prefix: &str) -> LapseResult<Digest> {
        let pages =
            self.rasterizer
                .rasterize(artifact, self.settings.page, self.settings.pages)?;
        if pages.is_empty() {
            return Err(LapseError::unreadable_document(format!(
                "'{}' yielded no pages",
                artifact.display()
            )));
        }

        let canvas = self.compose(&pages);

        ensure_dir(&self.settings.output_dir)?;
        let path = self.digest_path(prefix);
        canvas
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|e| LapseError::render(format!("write png '{}': {e}", path.display())))?;
        tracing::info!(path = %path.display(), pages = pages.len(), "saved digest");

        Ok(Digest { path, canvas })
    }
}

fn to_coord(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

#[cfg(test)]
#[path = "../../tests/unit/render/digest.rs"]
mod tests;
