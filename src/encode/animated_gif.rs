use std::{fs::File, io::BufWriter, path::Path};

use gif::{Encoder, Repeat};

use crate::{
    encode::{AnimationEncoder, FRAME_DELAY_MS},
    foundation::{
        error::{LapseError, LapseResult},
        process::ensure_parent_dir,
    },
    pipeline::frames::FrameSequence,
};

/// Encodes frames as an infinitely looping GIF.
#[derive(Clone, Debug)]
pub struct GifAnimationEncoder {
    delay_ms: u32,
    /// Palette quantization speed, 1 (best) to 30 (fastest).
    speed: i32,
}

impl Default for GifAnimationEncoder {
    fn default() -> Self {
        Self {
            delay_ms: FRAME_DELAY_MS,
            speed: 10,
        }
    }
}

impl GifAnimationEncoder {
    pub fn with_speed(mut self, speed: i32) -> Self {
        self.speed = speed.clamp(1, 30);
        self
    }

    /// GIF delays are stored in hundredths of a second.
    pub fn delay_centis(&self) -> u16 {
        u16::try_from(self.delay_ms / 10).unwrap_or(u16::MAX).max(1)
    }
}

impl AnimationEncoder for GifAnimationEncoder {
    fn encode(&mut self, frames: &FrameSequence, out_path: &Path) -> LapseResult<()> {
        let first = frames
            .first()
            .ok_or_else(|| LapseError::encode("cannot encode an animation with no frames"))?;
        let (width, height) = first.canvas.dimensions();
        let (w16, h16) = match (u16::try_from(width), u16::try_from(height)) {
            (Ok(w), Ok(h)) => (w, h),
            _ => {
                return Err(LapseError::encode(format!(
                    "{width}x{height} exceeds the GIF size limit of 65535x65535"
                )));
            }
        };

        ensure_parent_dir(out_path)?;
        let file = File::create(out_path).map_err(|e| {
            LapseError::encode(format!("failed to create '{}': {e}", out_path.display()))
        })?;

        let mut encoder = Encoder::new(BufWriter::new(file), w16, h16, &[])
            .map_err(|e| LapseError::encode(format!("failed to start GIF: {e}")))?;
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| LapseError::encode(format!("failed to set GIF repeat: {e}")))?;

        let delay = self.delay_centis();
        let mut scratch = Vec::with_capacity(width as usize * height as usize * 4);
        for frame in frames {
            if frame.canvas.dimensions() != (width, height) {
                return Err(LapseError::encode(format!(
                    "frame {} is {}x{}, expected {width}x{height}",
                    frame.ordinal,
                    frame.canvas.width(),
                    frame.canvas.height()
                )));
            }
            scratch.clear();
            scratch.extend_from_slice(frame.canvas.as_raw());

            let mut gif_frame = gif::Frame::from_rgba_speed(w16, h16, &mut scratch, self.speed);
            gif_frame.delay = delay;
            encoder
                .write_frame(&gif_frame)
                .map_err(|e| LapseError::encode(format!("failed to write GIF frame: {e}")))?;
        }

        tracing::info!(path = %out_path.display(), frames = frames.len(), "wrote gif");
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/animated_gif.rs"]
mod tests;
