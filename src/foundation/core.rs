use crate::foundation::error::{LapseError, LapseResult};

/// Smallest canvas edge, in pixels.
pub const MIN_CANVAS_EDGE: u32 = 100;
/// Smallest page edge, in pixels.
pub const MIN_PAGE_EDGE: u32 = 10;

/// Width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// Canvas dimensions, each edge clamped up to [`MIN_CANVAS_EDGE`].
    pub fn canvas(width: u32, height: u32) -> Self {
        Self {
            width: width.max(MIN_CANVAS_EDGE),
            height: height.max(MIN_CANVAS_EDGE),
        }
    }

    /// Page dimensions, each edge clamped up to [`MIN_PAGE_EDGE`].
    pub fn page(width: u32, height: u32) -> Self {
        Self {
            width: width.max(MIN_PAGE_EDGE),
            height: height.max(MIN_PAGE_EDGE),
        }
    }

    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self::canvas(800, 600)
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Inclusive, 1-based page selection. `None` leaves that side unbounded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PageRange {
    pub first: Option<u32>,
    pub last: Option<u32>,
}

impl PageRange {
    pub fn new(first: Option<u32>, last: Option<u32>) -> LapseResult<Self> {
        let r = Self { first, last };
        r.validate()?;
        Ok(r)
    }

    pub fn all() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> LapseResult<()> {
        if self.first == Some(0) || self.last == Some(0) {
            return Err(LapseError::validation("page numbers are 1-based"));
        }
        if let (Some(first), Some(last)) = (self.first, self.last)
            && first > last
        {
            return Err(LapseError::validation(format!(
                "first page {first} is after last page {last}"
            )));
        }
        Ok(())
    }

    /// Clip the range against a document with `page_count` pages.
    ///
    /// Returns `None` when no page of the document falls inside the range.
    pub fn resolve(&self, page_count: u32) -> Option<(u32, u32)> {
        let first = self.first.unwrap_or(1).max(1);
        let last = self.last.unwrap_or(page_count).min(page_count);
        (page_count > 0 && first <= last).then_some((first, last))
    }
}

/// One historical revision: an opaque identifier and its chronological position.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Revision {
    pub id: String,
    /// 0-based position in commit order, oldest first.
    pub position: usize,
}

impl Revision {
    pub fn new(id: impl Into<String>, position: usize) -> Self {
        Self {
            id: id.into(),
            position,
        }
    }

    /// Number a list of identifiers in the order given.
    pub fn sequence<I, S>(ids: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ids.into_iter()
            .enumerate()
            .map(|(position, id)| Self::new(id, position))
            .collect()
    }
}

impl std::fmt::Display for Revision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
