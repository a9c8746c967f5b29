use crate::foundation::{
    core::Dimensions,
    error::{LapseError, LapseResult},
};

/// Top-left pixel position of one page on the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Placement {
    pub x: u64,
    pub y: u64,
}

/// Row-major page grid for a fixed canvas and page size.
///
/// Every row shares the same left margin, computed from a full row. Rows past the bottom
/// of the canvas are still placed; the compositor clips them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageGrid {
    canvas: Dimensions,
    page: Dimensions,
    pages_per_row: u32,
    margin: u32,
}

impl PageGrid {
    pub fn new(canvas: Dimensions, page: Dimensions) -> LapseResult<Self> {
        if [canvas.width, canvas.height, page.width, page.height].contains(&0) {
            return Err(LapseError::validation(format!(
                "canvas {canvas} and page {page} must have non-zero edges"
            )));
        }
        if page.width > canvas.width || page.height > canvas.height {
            return Err(LapseError::validation(format!(
                "page size {page} does not fit on canvas {canvas}"
            )));
        }
        let pages_per_row = canvas.width / page.width;
        let margin = (canvas.width - pages_per_row * page.width) / 2;
        Ok(Self {
            canvas,
            page,
            pages_per_row,
            margin,
        })
    }

    pub fn canvas(&self) -> Dimensions {
        self.canvas
    }

    pub fn page(&self) -> Dimensions {
        self.page
    }

    pub fn pages_per_row(&self) -> u32 {
        self.pages_per_row
    }

    pub fn margin(&self) -> u32 {
        self.margin
    }

    /// Rows that fit entirely on the canvas.
    pub fn visible_rows(&self) -> u32 {
        self.canvas.height / self.page.height
    }

    /// Pages that fit entirely on the canvas; later pages are clipped or fall off.
    pub fn capacity(&self) -> u64 {
        u64::from(self.pages_per_row) * u64::from(self.visible_rows())
    }

    pub fn placement(&self, index: usize) -> Placement {
        let per_row = self.pages_per_row as u64;
        let i = index as u64;
        Placement {
            x: u64::from(self.margin) + u64::from(self.page.width) * (i % per_row),
            y: u64::from(self.page.height) * (i / per_row),
        }
    }

    pub fn placements(&self, count: usize) -> Vec<Placement> {
        (0..count).map(|i| self.placement(i)).collect()
    }
}

/// Lay out `count` pages of size `page` on `canvas`, one placement per page in order.
pub fn layout_pages(
    canvas: Dimensions,
    page: Dimensions,
    count: usize,
) -> LapseResult<Vec<Placement>> {
    Ok(PageGrid::new(canvas, page)?.placements(count))
}

#[cfg(test)]
#[path = "../../tests/unit/layout/grid.rs"]
mod tests;
