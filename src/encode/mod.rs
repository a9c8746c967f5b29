//! Animation encoders.
//!
//! An encoder consumes the whole [`FrameSequence`](crate::FrameSequence) once, after the last
//! revision has been processed, and writes a single animated file.

/// GIF output via the `gif` crate.
pub mod animated_gif;
/// `ffmpeg`-based MP4 output.
pub mod ffmpeg;

use std::path::Path;

use crate::{foundation::error::LapseResult, pipeline::frames::FrameSequence};

/// Display time of every frame.
pub const FRAME_DELAY_MS: u32 = 200;

/// Writes an ordered frame sequence as one animation.
pub trait AnimationEncoder {
    /// Encode `frames` in order into `out_path`. An empty sequence is an error.
    fn encode(&mut self, frames: &FrameSequence, out_path: &Path) -> LapseResult<()>;
}

/// Container format of the animation, picked from the output file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnimationFormat {
    /// Looping GIF.
    Gif,
    /// H.264 MP4 through the system `ffmpeg`.
    Mp4,
}

impl AnimationFormat {
    /// `.mp4` selects MP4; every other extension (or none) selects GIF.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("mp4") => Self::Mp4,
            _ => Self::Gif,
        }
    }

    /// Create the default encoder for this format.
    pub fn encoder(self) -> Box<dyn AnimationEncoder> {
        match self {
            Self::Gif => Box::new(animated_gif::GifAnimationEncoder::default()),
            Self::Mp4 => Box::new(ffmpeg::Mp4AnimationEncoder::default()),
        }
    }
}
