use super::*;
use crate::{foundation::core::Revision, pipeline::frames::Frame};
use image::{Rgba, RgbaImage};

#[test]
fn size_validation_catches_bad_values() {
    assert!(validate_mp4_size(0, 10).is_err());
    assert!(validate_mp4_size(801, 600).is_err());
    assert!(validate_mp4_size(800, 601).is_err());
    assert!(validate_mp4_size(800, 600).is_ok());
}

#[test]
fn frame_rate_matches_frame_delay() {
    assert_eq!(Mp4AnimationEncoder::default().frame_rate_arg(), "1000/200");
}

#[test]
fn flatten_straight_over_black_produces_expected_rgb() {
    // Straight red @ 50% alpha => rgb becomes 128,0,0 over black.
    let src = vec![255u8, 0u8, 0u8, 128u8];
    let mut dst = vec![0u8; 4];
    flatten_to_opaque_rgba8(&mut dst, &src, [0, 0, 0, 255]).unwrap();
    assert_eq!(dst, vec![128u8, 0u8, 0u8, 255u8]);
}

#[test]
fn flatten_transparent_over_white_is_white() {
    let src = vec![10u8, 20u8, 30u8, 0u8, 1u8, 2u8, 3u8, 255u8];
    let mut dst = vec![0u8; 8];
    flatten_to_opaque_rgba8(&mut dst, &src, [255, 255, 255, 255]).unwrap();
    assert_eq!(dst, vec![255, 255, 255, 255, 1, 2, 3, 255]);
}

#[test]
fn flatten_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 8];
    assert!(flatten_to_opaque_rgba8(&mut dst, &[0u8; 4], [0, 0, 0, 255]).is_err());
}

#[test]
fn odd_canvas_is_rejected_before_spawning() {
    let dir = tempfile::tempdir().unwrap();
    let frames: FrameSequence = std::iter::once(Frame {
        ordinal: 1,
        revision: Revision::new("a", 0),
        canvas: RgbaImage::from_pixel(101, 100, Rgba([255, 255, 255, 255])),
    })
    .collect();
    let out = dir.path().join("lapse.mp4");
    assert!(Mp4AnimationEncoder::default().encode(&frames, &out).is_err());
    assert!(!out.exists());
}

#[test]
fn encodes_mp4_when_ffmpeg_present() {
    if !is_ffmpeg_on_path() {
        eprintln!("skipping: ffmpeg not on PATH");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let frames: FrameSequence = (1..=3)
        .map(|i| Frame {
            ordinal: i,
            revision: Revision::new(format!("r{i}"), i as usize - 1),
            canvas: RgbaImage::from_pixel(128, 96, Rgba([(i * 60) as u8, 0, 0, 255])),
        })
        .collect();
    let out = dir.path().join("lapse.mp4");
    Mp4AnimationEncoder::default().encode(&frames, &out).unwrap();
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
}
