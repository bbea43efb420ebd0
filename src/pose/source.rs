use std::{
    collections::VecDeque,
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use log::{debug, warn};
use serde_jsonlines::JsonLinesReader;

use crate::errors::RepCoachError;

use super::PoseFrame;

/// Producer of pose frames, one call per captured frame.
///
/// Implementations wrap whatever runs the pose estimation model. The runner pulls frames until the
/// source reports the end of the stream.
pub trait PoseSource {
    /// Get the next frame from the pose model.
    ///
    /// Returns `Ok(None)` once the stream is exhausted. A frame in which nobody was detected is still
    /// a frame, with empty landmarks.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying stream cannot be read or contains a malformed frame.
    fn next_frame(&mut self) -> Result<Option<PoseFrame>, RepCoachError>;
}

impl<S: PoseSource + ?Sized> PoseSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<PoseFrame>, RepCoachError> {
        (**self).next_frame()
    }
}

/// Reads frames written one JSON object per line, either from a recording or piped in from a pose
/// estimation process.
pub struct JsonlPoseSource {
    reader: JsonLinesReader<Box<dyn BufRead>>,
    line: usize,
}

impl JsonlPoseSource {
    pub fn from_reader(reader: impl BufRead + 'static) -> Self {
        Self {
            reader: JsonLinesReader::new(Box::new(reader)),
            line: 0,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, RepCoachError> {
        debug!("Reading pose frames from {:?}", path);
        let file = File::open(path).map_err(|e| RepCoachError::FrameSourceError { source: e })?;
        Ok(Self::from_reader(BufReader::new(file)))
    }

    pub fn from_stdin() -> Self {
        debug!("Reading pose frames from stdin");
        Self::from_reader(BufReader::new(io::stdin()))
    }
}

impl PoseSource for JsonlPoseSource {
    fn next_frame(&mut self) -> Result<Option<PoseFrame>, RepCoachError> {
        self.line += 1;
        self.reader.read::<PoseFrame>().map_err(|e| {
            warn!("Could not read pose frame on line {}: {}", self.line, e);
            RepCoachError::InvalidFrame {
                line: self.line,
                source: e,
            }
        })
    }
}

/// Replays frames held in memory. Useful for tests and for offline analysis of decoded recordings.
#[derive(Default)]
pub struct MockPoseSource {
    frames: VecDeque<PoseFrame>,
}

impl MockPoseSource {
    pub fn from_frames(frames: Vec<PoseFrame>) -> Self {
        Self {
            frames: frames.into(),
        }
    }
}

impl PoseSource for MockPoseSource {
    fn next_frame(&mut self) -> Result<Option<PoseFrame>, RepCoachError> {
        Ok(self.frames.pop_front())
    }
}
