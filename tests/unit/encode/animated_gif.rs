use super::*;
use crate::{foundation::core::Revision, pipeline::frames::Frame};
use image::{Rgba, RgbaImage};

fn solid(ordinal: u32, w: u32, h: u32, rgba: [u8; 4]) -> Frame {
    Frame {
        ordinal,
        revision: Revision::new(format!("r{ordinal}"), ordinal as usize - 1),
        canvas: RgbaImage::from_pixel(w, h, Rgba(rgba)),
    }
}

#[test]
fn default_delay_is_twenty_centiseconds() {
    assert_eq!(GifAnimationEncoder::default().delay_centis(), 20);
}

#[test]
fn writes_one_gif_frame_per_canvas_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("nested").join("lapse.gif");
    let frames: FrameSequence = vec![
        solid(1, 120, 100, [255, 0, 0, 255]),
        solid(3, 120, 100, [0, 0, 255, 255]),
    ]
    .into_iter()
    .collect();

    GifAnimationEncoder::default().encode(&frames, &out).unwrap();

    let mut opts = gif::DecodeOptions::new();
    opts.set_color_output(gif::ColorOutput::RGBA);
    let mut decoder = opts.read_info(File::open(&out).unwrap()).unwrap();
    assert_eq!((decoder.width(), decoder.height()), (120, 100));

    let mut seen = Vec::new();
    while let Some(frame) = decoder.read_next_frame().unwrap() {
        assert_eq!(frame.delay, 20);
        seen.push([frame.buffer[0], frame.buffer[1], frame.buffer[2]]);
    }
    assert_eq!(seen.len(), 2);
    assert!(seen[0][0] > 200 && seen[0][2] < 50, "first frame is red: {:?}", seen[0]);
    assert!(seen[1][2] > 200 && seen[1][0] < 50, "second frame is blue: {:?}", seen[1]);
}

#[test]
fn empty_sequence_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("lapse.gif");
    let err = GifAnimationEncoder::default()
        .encode(&FrameSequence::new(), &out)
        .unwrap_err();
    assert!(matches!(err, LapseError::Encode(_)));
    assert!(!out.exists());
}

#[test]
fn mismatched_frame_sizes_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let frames: FrameSequence = vec![
        solid(1, 120, 100, [255, 255, 255, 255]),
        solid(2, 100, 100, [255, 255, 255, 255]),
    ]
    .into_iter()
    .collect();
    assert!(
        GifAnimationEncoder::default()
            .encode(&frames, &dir.path().join("x.gif"))
            .is_err()
    );
}
