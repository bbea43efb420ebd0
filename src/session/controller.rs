use std::path::{Path, PathBuf};

use jiff::{Timestamp, tz::TimeZone};
use log::{debug, info, warn};

use crate::{
    coaching::{FormFeedback, TipLogEntry, TipThrottle},
    errors::RepCoachError,
    exercise::{Direction, ExerciseMode, FormAnalyzer, RepCounter, RepTransition},
    pose::{LandmarkSet, PoseFrame, angle_at},
};

use super::{
    DEFAULT_GOAL_REPS, FrameOutput, Overlay, RepEvent, SessionPhase, SessionRecord,
    SessionSettings,
};

/// Drives a tracking session one frame at a time.
///
/// The controller owns all session state: the rep counter, the tip throttle, the rep and tip logs
/// and the session sequence number. It never touches the filesystem, finished sessions are handed
/// out as [`SessionRecord`]s.
pub struct SessionController {
    settings: SessionSettings,
    phase: SessionPhase,
    mode: ExerciseMode,
    goal_reps: u32,
    rep_counter: RepCounter,
    form_analyzer: Box<dyn FormAnalyzer>,
    throttle: TipThrottle,
    rep_events: Vec<RepEvent>,
    bad_form_count: u32,
    countdown_started_at: Option<Timestamp>,
    video_path: Option<PathBuf>,
    last_record: Option<SessionRecord>,
    // survives resets so successive recordings get distinct names
    session_no: u32,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new(SessionSettings::default())
    }
}

impl SessionController {
    pub fn new(settings: SessionSettings) -> Self {
        let mode = ExerciseMode::default();
        Self {
            settings,
            phase: SessionPhase::Idle,
            mode,
            goal_reps: DEFAULT_GOAL_REPS,
            rep_counter: RepCounter::new(mode.thresholds()),
            form_analyzer: mode.form_analyzer(),
            throttle: TipThrottle::new(settings.tip_cooldown),
            rep_events: Vec::new(),
            bad_form_count: 0,
            countdown_started_at: None,
            video_path: None,
            last_record: None,
            session_no: 1,
        }
    }

    /// Numbers finalized sessions starting from `session_no` instead of 1.
    pub fn starting_at(mut self, session_no: u32) -> Self {
        self.session_no = session_no.max(1);
        self
    }

    /// Starts a new session from the raw values of the control surface.
    ///
    /// Any session in progress is discarded. On invalid input nothing changes.
    ///
    /// # Errors
    ///
    /// Returns [`RepCoachError::InvalidUserInput`] if the mode is unknown or the goal is not a
    /// positive integer.
    pub fn start_session(
        &mut self,
        mode_name: &str,
        goal_reps_text: &str,
        now: Timestamp,
    ) -> Result<(), RepCoachError> {
        let mode = mode_name.parse::<ExerciseMode>()?;
        let goal_reps = parse_goal_reps(goal_reps_text)?;
        self.start(mode, goal_reps, now);
        Ok(())
    }

    // callers validate the goal, see `start_session`
    pub(crate) fn start(&mut self, mode: ExerciseMode, goal_reps: u32, now: Timestamp) {
        if matches!(self.phase, SessionPhase::Countdown | SessionPhase::Active) {
            warn!(
                "Discarding unfinished {} session {} with {} reps",
                self.mode,
                self.session_no,
                self.rep_counter.count()
            );
        }

        self.mode = mode;
        self.goal_reps = goal_reps;
        self.rep_counter = RepCounter::new(mode.thresholds());
        self.form_analyzer = mode.form_analyzer();
        self.throttle.clear();
        self.rep_events.clear();
        self.bad_form_count = 0;
        self.countdown_started_at = Some(now);
        self.video_path = Some(video_file_name(now));
        self.last_record = None;
        self.phase = SessionPhase::Countdown;

        info!(
            "Starting {} session {} with a goal of {} reps",
            self.mode, self.session_no, self.goal_reps
        );
    }

    /// Restarts the countdown at `now` if the session is still counting down.
    ///
    /// Used when frames come with their own clock, such as stamps relative to the start of a
    /// recording, so the countdown is measured in the same time base as the frames.
    pub fn anchor_countdown(&mut self, now: Timestamp) {
        if self.phase == SessionPhase::Countdown {
            debug!("Countdown anchored at {}", now);
            self.countdown_started_at = Some(now);
        }
    }

    /// Processes one frame from the pose model.
    ///
    /// Frames without a detection, or with landmarks that do not form a valid angle, leave the
    /// rep state untouched.
    pub fn process_frame(&mut self, frame: &PoseFrame, now: Timestamp) -> FrameOutput {
        let mut overlay = Overlay::RepsOnly;
        let mut rep_completed = false;
        let mut finished = None;

        match self.phase {
            SessionPhase::Idle => {}
            SessionPhase::Complete => {
                if frame.landmarks.is_some() {
                    overlay = Overlay::Skeleton;
                }
            }
            SessionPhase::Countdown => {
                let remaining_s = self.countdown_remaining_s(now);
                if remaining_s > 0 {
                    overlay = Overlay::GetReady { remaining_s };
                } else {
                    info!("Countdown over, tracking {} reps", self.mode);
                    self.phase = SessionPhase::Active;
                    self.throttle.reset_clock(now);
                }
            }
            SessionPhase::Active => {
                if let Some(landmarks) = &frame.landmarks {
                    overlay = Overlay::Skeleton;
                    rep_completed = self.track(landmarks, now);
                    if self.rep_counter.count() >= self.goal_reps {
                        info!("{} goal of {} reps reached", self.mode, self.goal_reps);
                        self.phase = SessionPhase::Complete;
                        finished = Some(self.finalize());
                    }
                }
            }
        }

        FrameOutput {
            phase: self.phase,
            overlay,
            progress_pct: self.progress_pct(),
            reps_label: self.reps_label(),
            tip_label: self.tip_label(),
            record_frame: self.phase == SessionPhase::Active || finished.is_some(),
            rep_completed,
            finished,
        }
    }

    /// Ends the session early and returns its record for persistence.
    ///
    /// Returns `None` when there is nothing left to save: no session was started, or the session
    /// already completed and handed out its record.
    pub fn quit_and_save(&mut self) -> Option<SessionRecord> {
        match self.phase {
            SessionPhase::Idle | SessionPhase::Complete => {
                debug!("Quit requested in {} phase, nothing to save", self.phase);
                None
            }
            SessionPhase::Countdown | SessionPhase::Active => {
                info!(
                    "Stopping {} session with {}/{} reps",
                    self.mode,
                    self.rep_counter.count(),
                    self.goal_reps
                );
                self.phase = SessionPhase::Complete;
                Some(self.finalize())
            }
        }
    }

    // runs rep counting and form analysis, returns whether a rep was completed
    fn track(&mut self, landmarks: &LandmarkSet, now: Timestamp) -> bool {
        let (outer_a, vertex, outer_c) = self.mode.joints();
        let (Some(a), Some(b), Some(c)) = (
            landmarks.get(outer_a),
            landmarks.get(vertex),
            landmarks.get(outer_c),
        ) else {
            debug!("Frame is missing joints for {}, skipping", self.mode);
            return false;
        };

        let angle = match angle_at(a, b, c) {
            Ok(angle) => angle,
            Err(e) => {
                debug!("Skipping frame: {}", e);
                return false;
            }
        };

        let rep_completed = self.rep_counter.update(angle) == RepTransition::Completed;
        if rep_completed {
            info!(
                "{} rep {}/{}",
                self.mode,
                self.rep_counter.count(),
                self.goal_reps
            );
            self.rep_events.push(RepEvent {
                timestamp: now,
                mode: self.mode,
                reps: self.rep_counter.count(),
                bad_form_count: self.bad_form_count,
            });
        }

        if let Some(tip) = self.form_analyzer.analyze(angle, landmarks) {
            if self.throttle.offer(tip, self.mode, now) {
                self.bad_form_count += 1;
            }
        }
        rep_completed
    }

    fn finalize(&mut self) -> SessionRecord {
        let record = SessionRecord {
            session_no: self.session_no,
            mode: self.mode,
            goal_reps: self.goal_reps,
            rep_events: self.rep_events.clone(),
            tips: self.throttle.log().to_vec(),
            video_path: self.video_path.clone(),
        };
        self.session_no += 1;
        info!(
            "Finalized {} session {}: {} reps, {} tips",
            record.mode,
            record.session_no,
            record.rep_events.len(),
            record.tips.len()
        );
        self.last_record = Some(record.clone());
        record
    }

    fn countdown_remaining_s(&self, now: Timestamp) -> i64 {
        let elapsed_s = self
            .countdown_started_at
            .map(|started| now.duration_since(started).as_secs().max(0))
            .unwrap_or(0);
        self.settings.countdown_s as i64 - elapsed_s
    }

    pub fn progress_pct(&self) -> f32 {
        (self.rep_counter.count() as f32 / self.goal_reps as f32 * 100.).min(100.)
    }

    pub fn reps_label(&self) -> String {
        format!("Reps: {}/{}", self.rep_counter.count(), self.goal_reps)
    }

    pub fn tip_label(&self) -> String {
        match self.throttle.feedback() {
            Some(feedback) => format!("Tip: {}", feedback.tip),
            None => "Tip: ".to_string(),
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn mode(&self) -> ExerciseMode {
        self.mode
    }

    pub fn goal_reps(&self) -> u32 {
        self.goal_reps
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_counter.count()
    }

    pub fn direction(&self) -> Direction {
        self.rep_counter.direction()
    }

    pub fn bad_form_count(&self) -> u32 {
        self.bad_form_count
    }

    pub fn rep_events(&self) -> &[RepEvent] {
        &self.rep_events
    }

    pub fn tip_log(&self) -> &[TipLogEntry] {
        self.throttle.log()
    }

    pub fn feedback(&self) -> Option<&FormFeedback> {
        self.throttle.feedback()
    }

    pub fn video_path(&self) -> Option<&Path> {
        self.video_path.as_deref()
    }

    /// Record of the last finalized session, kept until the next session starts so persistence
    /// can be retried.
    pub fn last_record(&self) -> Option<&SessionRecord> {
        self.last_record.as_ref()
    }

    /// Number the next finalized session will get
    pub fn session_no(&self) -> u32 {
        self.session_no
    }
}

fn parse_goal_reps(text: &str) -> Result<u32, RepCoachError> {
    let invalid = || RepCoachError::InvalidUserInput {
        field: "goal_reps".to_string(),
        reason: format!("'{}' is not a positive integer", text.trim()),
    };
    match text.trim().parse::<u32>() {
        Ok(goal) if goal > 0 => Ok(goal),
        _ => Err(invalid()),
    }
}

fn video_file_name(now: Timestamp) -> PathBuf {
    let stamp = now.to_zoned(TimeZone::system()).strftime("%Y%m%d_%H%M%S");
    PathBuf::from(format!("temp_{}.avi", stamp))
}
