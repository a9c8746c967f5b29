use std::{
    path::{Path, PathBuf},
    process::Command,
};

use image::{RgbaImage, imageops::FilterType};

use crate::foundation::{
    core::{Dimensions, PageRange},
    error::{LapseError, LapseResult},
    process::{is_tool_on_path, tail_lossy},
};

/// One rasterized page, always exactly the configured page size.
pub type PageImage = RgbaImage;

/// Converts a build artifact into page images.
///
/// Implementations must report a missing, corrupt or empty artifact (or a page range that
/// selects nothing) as [`LapseError::UnreadableDocument`], and anything else (missing tools,
/// temp-dir failures) as another kind.
pub trait Rasterizer {
    fn rasterize(
        &self,
        artifact: &Path,
        page_size: Dimensions,
        pages: PageRange,
    ) -> LapseResult<Vec<PageImage>>;
}

/// PDF rasterizer backed by the poppler command line tools (`pdfinfo` and `pdftoppm`).
#[derive(Clone, Debug)]
pub struct PopplerRasterizer {
    pdfinfo: PathBuf,
    pdftoppm: PathBuf,
}

impl Default for PopplerRasterizer {
    fn default() -> Self {
        Self {
            pdfinfo: PathBuf::from("pdfinfo"),
            pdftoppm: PathBuf::from("pdftoppm"),
        }
    }
}

impl PopplerRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_available() -> bool {
        is_tool_on_path("pdfinfo", "-v") && is_tool_on_path("pdftoppm", "-v")
    }

    /// Number of pages reported by `pdfinfo`.
    pub fn page_count(&self, artifact: &Path) -> LapseResult<u32> {
        if !artifact.is_file() {
            return Err(LapseError::unreadable_document(format!(
                "'{}' does not exist",
                artifact.display()
            )));
        }

        let out = Command::new(&self.pdfinfo)
            .arg(artifact)
            .output()
            .map_err(|e| {
                LapseError::render(format!(
                    "failed to run {} (is poppler installed?): {e}",
                    self.pdfinfo.display()
                ))
            })?;
        if !out.status.success() {
            return Err(LapseError::unreadable_document(format!(
                "pdfinfo rejected '{}': {}",
                artifact.display(),
                tail_lossy(&out.stderr, 3)
            )));
        }

        parse_page_count(&String::from_utf8_lossy(&out.stdout)).ok_or_else(|| {
            LapseError::unreadable_document(format!(
                "pdfinfo reported no page count for '{}'",
                artifact.display()
            ))
        })
    }
}

impl Rasterizer for PopplerRasterizer {
    fn rasterize(
        &self,
        artifact: &Path,
        page_size: Dimensions,
        pages: PageRange,
    ) -> LapseResult<Vec<PageImage>> {
        let count = self.page_count(artifact)?;
        let (first, last) = pages.resolve(count).ok_or_else(|| {
            LapseError::unreadable_document(format!(
                "'{}' has {count} page(s), none selected by {pages:?}",
                artifact.display()
            ))
        })?;

        let scratch = tempfile::Builder::new()
            .prefix("revlapse-pages")
            .tempdir()
            .map_err(|e| LapseError::render(format!("failed to create scratch dir: {e}")))?;
        let out_root = scratch.path().join("page");

        let out = Command::new(&self.pdftoppm)
            .arg("-png")
            .args(["-scale-to-x", &page_size.width.to_string()])
            .args(["-scale-to-y", &page_size.height.to_string()])
            .args(["-f", &first.to_string(), "-l", &last.to_string()])
            .arg(artifact)
            .arg(&out_root)
            .output()
            .map_err(|e| {
                LapseError::render(format!(
                    "failed to run {} (is poppler installed?): {e}",
                    self.pdftoppm.display()
                ))
            })?;
        if !out.status.success() {
            return Err(LapseError::unreadable_document(format!(
                "pdftoppm could not rasterize '{}': {}",
                artifact.display(),
                tail_lossy(&out.stderr, 3)
            )));
        }

        let files = list_page_files(scratch.path())?;
        if files.is_empty() {
            return Err(LapseError::unreadable_document(format!(
                "pdftoppm produced no pages for '{}'",
                artifact.display()
            )));
        }

        files
            .iter()
            .map(|path| load_page(path, page_size))
            .collect()
    }
}

fn parse_page_count(pdfinfo_stdout: &str) -> Option<u32> {
    pdfinfo_stdout.lines().find_map(|line| {
        let rest = line.strip_prefix("Pages:")?;
        rest.trim().parse().ok()
    })
}

// pdftoppm zero-pads page numbers to a common width, so name order is page order.
fn list_page_files(dir: &Path) -> LapseResult<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| LapseError::render(format!("failed to list '{}': {e}", dir.display())))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| LapseError::render(format!("failed to list '{}': {e}", dir.display())))?
            .path();
        if path.extension().is_some_and(|ext| ext == "png") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn load_page(path: &Path, page_size: Dimensions) -> LapseResult<PageImage> {
    let img = image::open(path)
        .map_err(|e| LapseError::render(format!("failed to decode '{}': {e}", path.display())))?
        .to_rgba8();
    Ok(fit_page(img, page_size))
}

/// Resize to exactly `page_size` when the rasterizer rounded differently.
pub(crate) fn fit_page(img: RgbaImage, page_size: Dimensions) -> PageImage {
    if img.dimensions() == (page_size.width, page_size.height) {
        return img;
    }
    image::imageops::resize(&img, page_size.width, page_size.height, FilterType::Triangle)
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
