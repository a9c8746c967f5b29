//! Turning a built document into a single digest image.

/// Composites rasterized pages onto one canvas and saves it.
pub mod digest;
/// PDF page rasterization.
pub mod raster;
