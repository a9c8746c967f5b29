use image::RgbaImage;

use crate::foundation::core::Revision;

/// One accepted revision's canvas, numbered by its attempt counter.
#[derive(Clone, Debug)]
pub struct Frame {
    /// 1-based attempt counter; skipped revisions leave gaps.
    pub ordinal: u32,
    pub revision: Revision,
    pub canvas: RgbaImage,
}

/// Append-only list of frames in the order they were accepted.
#[derive(Clone, Debug, Default)]
pub struct FrameSequence {
    frames: Vec<Frame>,
}

impl FrameSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push(frame);
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn first(&self) -> Option<&Frame> {
        self.frames.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    pub fn as_slice(&self) -> &[Frame] {
        &self.frames
    }
}

impl<'a> IntoIterator for &'a FrameSequence {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

impl FromIterator<Frame> for FrameSequence {
    fn from_iter<T: IntoIterator<Item = Frame>>(iter: T) -> Self {
        Self {
            frames: iter.into_iter().collect(),
        }
    }
}
