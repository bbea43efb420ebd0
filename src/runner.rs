use std::{
    io,
    path::PathBuf,
    sync::atomic::{AtomicBool, Ordering},
};

use jiff::Timestamp;
use log::{error, info, warn};

use crate::{
    errors::RepCoachError,
    pose::{PoseFrame, PoseSource},
    session::{FrameOutput, SessionController},
    writer::SessionWriter,
};

/// Outcome of a [`run_session`] call.
#[derive(Debug, Default, PartialEq)]
pub struct RunSummary {
    pub frames: usize,
    /// The goal was reached, as opposed to the stream ending or a stop request
    pub goal_reached: bool,
    pub session_dir: Option<PathBuf>,
}

/// Feeds frames from `source` to the controller until the session completes, the stream ends or
/// `stop` is raised. Whatever the reason, the session is persisted through `writer` before
/// returning.
///
/// The countdown of a freshly started session is measured from the first frame, in the frames' own
/// clock. Malformed frames are skipped. Read errors end the session; it is still saved before the
/// error is returned.
pub fn run_session(
    mut source: impl PoseSource,
    controller: &mut SessionController,
    writer: &mut impl SessionWriter,
    stop: &AtomicBool,
    mut on_frame: impl FnMut(&FrameOutput),
) -> Result<RunSummary, RepCoachError> {
    let mut summary = RunSummary::default();
    let mut stream_error = None;

    while !stop.load(Ordering::SeqCst) {
        let frame = match source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                info!("Pose stream ended after {} frames", summary.frames);
                break;
            }
            Err(RepCoachError::InvalidFrame { line, source: e })
                if e.kind() == io::ErrorKind::InvalidData =>
            {
                warn!("Skipping malformed frame on line {}: {}", line, e);
                continue;
            }
            Err(e) => {
                error!("Could not read pose frame: {}", e);
                stream_error = Some(e);
                break;
            }
        };

        let now = frame_time(&frame);
        if summary.frames == 0 {
            controller.anchor_countdown(now);
        }
        summary.frames += 1;
        let output = controller.process_frame(&frame, now);
        on_frame(&output);

        if let Some(record) = output.finished {
            summary.goal_reached = true;
            summary.session_dir = Some(writer.persist(&record)?);
            return Ok(summary);
        }
    }

    if stop.load(Ordering::SeqCst) {
        info!("Stop requested, saving session");
    }
    if let Some(record) = controller.quit_and_save() {
        match writer.persist(&record) {
            Ok(session_dir) => summary.session_dir = Some(session_dir),
            Err(e) => {
                if let Some(stream_error) = &stream_error {
                    error!(
                        "Session could not be saved after the pose stream failed ({})",
                        stream_error
                    );
                }
                return Err(e);
            }
        }
    }

    match stream_error {
        Some(e) => Err(e),
        None => Ok(summary),
    }
}

/// Capture time of the frame, or the current time for frames that were not stamped.
pub fn frame_time(frame: &PoseFrame) -> Timestamp {
    frame
        .timestamp_ms
        .and_then(|ms| Timestamp::from_millisecond(ms).ok())
        .unwrap_or_else(Timestamp::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::source::MockPoseSource;
    use crate::session::SessionRecord;

    #[derive(Default)]
    struct RecordingWriter {
        records: Vec<SessionRecord>,
        fail: bool,
    }

    impl SessionWriter for RecordingWriter {
        fn persist(&mut self, record: &SessionRecord) -> Result<PathBuf, RepCoachError> {
            if self.fail {
                return Err(RepCoachError::PersistenceError {
                    operation: "test".to_string(),
                    source: io::Error::other("disk full"),
                });
            }
            self.records.push(record.clone());
            Ok(PathBuf::from(format!("session_{}", record.session_no)))
        }
    }

    struct BrokenSource {
        frames: MockPoseSource,
    }

    impl PoseSource for BrokenSource {
        fn next_frame(&mut self) -> Result<Option<PoseFrame>, RepCoachError> {
            match self.frames.next_frame()? {
                Some(frame) => Ok(Some(frame)),
                None => Err(RepCoachError::FrameSourceError {
                    source: io::Error::other("camera unplugged"),
                }),
            }
        }
    }

    fn stamped_curl_frames(from_ms: i64, angles: &[f32]) -> Vec<PoseFrame> {
        use crate::pose::{Joint, LandmarkSet, Position2D};

        angles
            .iter()
            .enumerate()
            .map(|(i, angle)| {
                let radians = angle.to_radians();
                let landmarks = LandmarkSet::new()
                    .with(Joint::RightShoulder, Position2D::new(0.5, 0.3))
                    .with(Joint::RightElbow, Position2D::new(0.5, 0.5))
                    .with(
                        Joint::RightWrist,
                        Position2D::new(0.5 + 0.2 * radians.sin(), 0.5 - 0.2 * radians.cos()),
                    );
                PoseFrame::detected(from_ms + i as i64 * 100, landmarks)
            })
            .collect()
    }

    #[test]
    fn test_frame_time_prefers_frame_stamp() {
        let frame = PoseFrame::empty(1_500);
        assert_eq!(frame_time(&frame).as_millisecond(), 1_500);
    }

    #[test]
    fn test_stream_end_saves_session() {
        let mut controller = SessionController::default();
        controller.start_session("Squat", "3", Timestamp::UNIX_EPOCH).unwrap();
        let source = MockPoseSource::from_frames(vec![PoseFrame::empty(0), PoseFrame::empty(6_000)]);
        let mut writer = RecordingWriter::default();
        let mut outputs = 0;

        let summary = run_session(
            source,
            &mut controller,
            &mut writer,
            &AtomicBool::new(false),
            |_| outputs += 1,
        )
        .unwrap();

        assert_eq!(summary.frames, 2);
        assert_eq!(outputs, 2);
        assert!(!summary.goal_reached);
        assert_eq!(summary.session_dir, Some(PathBuf::from("session_1")));
        assert_eq!(writer.records.len(), 1);
    }

    #[test]
    fn test_countdown_follows_relative_frame_stamps() {
        let mut controller = SessionController::default();
        controller.start_session("Curl", "1", Timestamp::now()).unwrap();
        let mut frames: Vec<PoseFrame> = (0..=10).map(|i| PoseFrame::empty(i * 500)).collect();
        frames.extend(stamped_curl_frames(5_100, &[150., 30., 165.]));
        let mut writer = RecordingWriter::default();

        let summary = run_session(
            MockPoseSource::from_frames(frames),
            &mut controller,
            &mut writer,
            &AtomicBool::new(false),
            |_| {},
        )
        .unwrap();

        assert!(summary.goal_reached);
        assert_eq!(controller.rep_count(), 1);
        assert_eq!(writer.records[0].rep_events.len(), 1);
    }

    #[test]
    fn test_stream_failure_saves_session() {
        let mut controller = SessionController::default();
        controller.start_session("Curl", "5", Timestamp::UNIX_EPOCH).unwrap();
        let source = BrokenSource {
            frames: MockPoseSource::from_frames(vec![PoseFrame::empty(0)]),
        };
        let mut writer = RecordingWriter::default();

        let result = run_session(
            source,
            &mut controller,
            &mut writer,
            &AtomicBool::new(false),
            |_| {},
        );
        assert!(matches!(
            result,
            Err(RepCoachError::FrameSourceError { .. })
        ));
        assert_eq!(writer.records.len(), 1);
    }

    #[test]
    fn test_save_failure_after_stream_failure_reports_save() {
        let mut controller = SessionController::default();
        controller.start_session("Curl", "5", Timestamp::UNIX_EPOCH).unwrap();
        let source = BrokenSource {
            frames: MockPoseSource::default(),
        };
        let mut writer = RecordingWriter {
            fail: true,
            ..Default::default()
        };

        let result = run_session(
            source,
            &mut controller,
            &mut writer,
            &AtomicBool::new(false),
            |_| {},
        );
        assert!(matches!(
            result,
            Err(RepCoachError::PersistenceError { .. })
        ));
        assert!(controller.last_record().is_some());
    }

    #[test]
    fn test_stop_flag_saves_without_reading() {
        let mut controller = SessionController::default();
        controller.start_session("Curl", "3", Timestamp::UNIX_EPOCH).unwrap();
        let source = MockPoseSource::from_frames(vec![PoseFrame::empty(0)]);
        let mut writer = RecordingWriter::default();

        let summary = run_session(
            source,
            &mut controller,
            &mut writer,
            &AtomicBool::new(true),
            |_| {},
        )
        .unwrap();

        assert_eq!(summary.frames, 0);
        assert_eq!(writer.records.len(), 1);
    }

    #[test]
    fn test_idle_controller_saves_nothing() {
        let mut controller = SessionController::default();
        let source = MockPoseSource::from_frames(vec![PoseFrame::empty(0)]);
        let mut writer = RecordingWriter::default();

        let summary = run_session(
            source,
            &mut controller,
            &mut writer,
            &AtomicBool::new(false),
            |_| {},
        )
        .unwrap();

        assert!(summary.session_dir.is_none());
        assert!(writer.records.is_empty());
    }

    #[test]
    fn test_persistence_failure_surfaces() {
        let mut controller = SessionController::default();
        controller.start_session("Curl", "3", Timestamp::UNIX_EPOCH).unwrap();
        let mut writer = RecordingWriter {
            fail: true,
            ..Default::default()
        };

        let result = run_session(
            MockPoseSource::default(),
            &mut controller,
            &mut writer,
            &AtomicBool::new(false),
            |_| {},
        );
        assert!(matches!(
            result,
            Err(RepCoachError::PersistenceError { .. })
        ));

        // the record stays available for another attempt
        writer.fail = false;
        let record = controller.last_record().unwrap().clone();
        writer.persist(&record).unwrap();
        assert_eq!(writer.records[0].session_no, 1);
    }
}
