//! Frame sources feeding the scanner.

use std::collections::VecDeque;
use std::path::PathBuf;

use image::GrayImage;
use tracing::debug;

use crate::error::{Error, Result};

use super::FacingMode;

/// Something that can be opened into a stream of greyscale frames, such as
/// a camera or a set of still images.
pub trait FrameSource: Send + Sync + std::fmt::Debug {
    /// Open a stream, preferring the camera facing `facing` where that
    /// means anything.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScanStart`] if the source can't produce frames.
    fn open(&self, facing: FacingMode) -> Result<Box<dyn FrameStream>>;
}

/// An open stream of frames. `None` means the source is exhausted.
pub trait FrameStream: Send + std::fmt::Debug {
    /// Pull the next frame. May block.
    fn next_frame(&mut self) -> Option<Result<GrayImage>>;
}

/// Still image files, read in order, one per frame.
#[derive(Debug, Clone)]
pub struct ImageFileSource {
    paths: Vec<PathBuf>,
}

impl ImageFileSource {
    /// Create a source over `paths`.
    #[must_use]
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl FrameSource for ImageFileSource {
    fn open(&self, facing: FacingMode) -> Result<Box<dyn FrameStream>> {
        if self.paths.is_empty() {
            return Err(Error::scan_start("no image files given"));
        }
        debug!(
            "Opening {} image file(s) (facing mode {} ignored)",
            self.paths.len(),
            facing
        );
        Ok(Box::new(ImageFileStream {
            pending: self.paths.iter().cloned().collect(),
        }))
    }
}

#[derive(Debug)]
struct ImageFileStream {
    pending: VecDeque<PathBuf>,
}

impl FrameStream for ImageFileStream {
    fn next_frame(&mut self) -> Option<Result<GrayImage>> {
        let path = self.pending.pop_front()?;
        Some(
            image::open(&path)
                .map(|img| img.to_luma8())
                .map_err(|e| Error::scan_frame(format!("{}: {e}", path.display()))),
        )
    }
}

/// Frames held in memory, replayed from the start on every open.
#[derive(Debug, Clone, Default)]
pub struct MemoryFrameSource {
    frames: Vec<GrayImage>,
}

impl MemoryFrameSource {
    /// Create a source replaying `frames`.
    #[must_use]
    pub fn new(frames: Vec<GrayImage>) -> Self {
        Self { frames }
    }
}

impl FrameSource for MemoryFrameSource {
    fn open(&self, _facing: FacingMode) -> Result<Box<dyn FrameStream>> {
        Ok(Box::new(MemoryFrameStream {
            pending: self.frames.iter().cloned().collect(),
        }))
    }
}

#[derive(Debug)]
struct MemoryFrameStream {
    pending: VecDeque<GrayImage>,
}

impl FrameStream for MemoryFrameStream {
    fn next_frame(&mut self) -> Option<Result<GrayImage>> {
        self.pending.pop_front().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_empty_file_list_fails_to_open() {
        let err = ImageFileSource::new(Vec::new())
            .open(FacingMode::Environment)
            .unwrap_err();
        assert!(matches!(err, Error::ScanStart { .. }));
    }

    #[test]
    fn test_file_stream_reads_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("frame.png");
        GrayImage::from_pixel(8, 4, Luma([0])).save(&good).unwrap();
        let missing = dir.path().join("missing.png");

        let mut stream = ImageFileSource::new(vec![good, missing])
            .open(FacingMode::User)
            .unwrap();

        let frame = stream.next_frame().unwrap().unwrap();
        assert_eq!(frame.dimensions(), (8, 4));
        assert!(matches!(
            stream.next_frame(),
            Some(Err(Error::ScanFrame { .. }))
        ));
        assert!(stream.next_frame().is_none());
    }

    #[test]
    fn test_memory_source_replays() {
        let source = MemoryFrameSource::new(vec![GrayImage::new(2, 2)]);

        for _ in 0..2 {
            let mut stream = source.open(FacingMode::Environment).unwrap();
            assert!(stream.next_frame().is_some());
            assert!(stream.next_frame().is_none());
        }
    }
}
