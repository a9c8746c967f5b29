use std::{
    io::Write as _,
    path::Path,
    process::{Command, Stdio},
};

use crate::{
    encode::{AnimationEncoder, FRAME_DELAY_MS},
    foundation::{
        error::{LapseError, LapseResult},
        math::mul_div255_u16,
        process::{drain, ensure_parent_dir, is_tool_on_path, join_drain, tail_lossy},
    },
    pipeline::frames::FrameSequence,
};

pub fn is_ffmpeg_on_path() -> bool {
    is_tool_on_path("ffmpeg", "-version")
}

/// Streams frames as raw RGBA into the system `ffmpeg` and writes an H.264 MP4.
///
/// MP4 has no loop flag; players decide whether to repeat.
#[derive(Clone, Debug)]
pub struct Mp4AnimationEncoder {
    pub overwrite: bool,
    /// Background used to flatten alpha (straight RGBA8).
    pub bg_rgba: [u8; 4],
    delay_ms: u32,
}

impl Default for Mp4AnimationEncoder {
    fn default() -> Self {
        Self {
            overwrite: true,
            bg_rgba: [255, 255, 255, 255],
            delay_ms: FRAME_DELAY_MS,
        }
    }
}

impl Mp4AnimationEncoder {
    /// Frame rate as an `ffmpeg` rational, e.g. `1000/200` for 5 fps.
    fn frame_rate_arg(&self) -> String {
        format!("1000/{}", self.delay_ms.max(1))
    }
}

/// yuv420p needs even dimensions.
pub fn validate_mp4_size(width: u32, height: u32) -> LapseResult<()> {
    if width == 0 || height == 0 {
        return Err(LapseError::validation("mp4 width/height must be non-zero"));
    }
    if !width.is_multiple_of(2) || !height.is_multiple_of(2) {
        return Err(LapseError::validation(format!(
            "mp4 output needs even dimensions, got {width}x{height}"
        )));
    }
    Ok(())
}

impl AnimationEncoder for Mp4AnimationEncoder {
    fn encode(&mut self, frames: &FrameSequence, out_path: &Path) -> LapseResult<()> {
        let first = frames
            .first()
            .ok_or_else(|| LapseError::encode("cannot encode an animation with no frames"))?;
        let (width, height) = first.canvas.dimensions();
        validate_mp4_size(width, height)?;
        if let Some(frame) = frames.iter().find(|f| f.canvas.dimensions() != (width, height)) {
            return Err(LapseError::encode(format!(
                "frame {} is {}x{}, expected {width}x{height}",
                frame.ordinal,
                frame.canvas.width(),
                frame.canvas.height()
            )));
        }

        ensure_parent_dir(out_path)?;
        if !self.overwrite && out_path.exists() {
            return Err(LapseError::encode(format!(
                "output file '{}' already exists",
                out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(LapseError::encode(
                "ffmpeg is required for MP4 output, but was not found on PATH",
            ));
        }

        let mut cmd = Command::new("ffmpeg");
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        cmd.arg(if self.overwrite { "-y" } else { "-n" });
        cmd.args([
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{width}x{height}"),
            "-r",
            &self.frame_rate_arg(),
            "-i",
            "pipe:0",
            "-an",
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-movflags",
            "+faststart",
        ])
        .arg(out_path);

        let mut child = cmd
            .spawn()
            .map_err(|e| LapseError::encode(format!("failed to spawn ffmpeg: {e}")))?;
        let stderr = child.stderr.take().map(drain);
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| LapseError::encode("failed to open ffmpeg stdin"))?;

        let mut scratch = vec![0u8; width as usize * height as usize * 4];
        for frame in frames {
            flatten_to_opaque_rgba8(&mut scratch, frame.canvas.as_raw(), self.bg_rgba)?;
            stdin.write_all(&scratch).map_err(|e| {
                LapseError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
            })?;
        }
        drop(stdin);

        let status = child
            .wait()
            .map_err(|e| LapseError::encode(format!("failed to wait for ffmpeg: {e}")))?;
        let stderr = join_drain(stderr);
        if !status.success() {
            return Err(LapseError::encode(format!(
                "ffmpeg exited with status {status}: {}",
                tail_lossy(&stderr, 10)
            )));
        }

        tracing::info!(path = %out_path.display(), frames = frames.len(), "wrote mp4");
        Ok(())
    }
}

/// Composite straight-alpha RGBA8 over an opaque background.
fn flatten_to_opaque_rgba8(dst: &mut [u8], src: &[u8], bg_rgba: [u8; 4]) -> LapseResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(LapseError::encode(
            "flatten_to_opaque_rgba8 expects equal-length rgba8 buffers",
        ));
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = u16::from(s[3]);
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - a;
        for c in 0..3 {
            let v = mul_div255_u16(u16::from(s[c]), a) + mul_div255_u16(u16::from(bg_rgba[c]), inv);
            d[c] = v.min(255) as u8;
        }
        d[3] = 255;
    }

    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
