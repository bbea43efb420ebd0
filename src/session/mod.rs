pub mod controller;

use std::path::PathBuf;

use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};

use crate::{
    coaching::{DEFAULT_TIP_COOLDOWN_MS, TipLogEntry},
    exercise::ExerciseMode,
};

pub use controller::SessionController;

pub const DEFAULT_COUNTDOWN_S: u64 = 5;
pub const DEFAULT_GOAL_REPS: u32 = 10;

/// Timing knobs for a tracking session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionSettings {
    /// Seconds of "get ready" time before reps are counted
    pub countdown_s: u64,
    /// Minimum time between two coaching tips
    pub tip_cooldown: SignedDuration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            countdown_s: DEFAULT_COUNTDOWN_S,
            tip_cooldown: SignedDuration::from_millis(DEFAULT_TIP_COOLDOWN_MS as i64),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum SessionPhase {
    #[default]
    Idle,
    Countdown,
    Active,
    Complete,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::Idle => write!(f, "Idle"),
            SessionPhase::Countdown => write!(f, "Countdown"),
            SessionPhase::Active => write!(f, "Active"),
            SessionPhase::Complete => write!(f, "Complete"),
        }
    }
}

/// Recorded once for every completed repetition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RepEvent {
    pub timestamp: Timestamp,
    pub mode: ExerciseMode,
    /// Rep count including this rep
    pub reps: u32,
    /// Tips emitted so far in the session
    pub bad_form_count: u32,
}

/// Everything a finished session leaves behind. Handed to a
/// [`SessionWriter`](crate::writer::SessionWriter) for persistence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_no: u32,
    pub mode: ExerciseMode,
    pub goal_reps: u32,
    pub rep_events: Vec<RepEvent>,
    pub tips: Vec<TipLogEntry>,
    /// Video file the recording collaborator wrote frames to
    pub video_path: Option<PathBuf>,
}

/// What the display should draw on top of the camera frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Overlay {
    /// Countdown text, with the whole seconds left
    GetReady { remaining_s: i64 },
    /// Skeleton of the detected pose plus the rep counter
    Skeleton,
    /// Rep counter only
    RepsOnly,
}

/// Result of processing one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameOutput {
    pub phase: SessionPhase,
    pub overlay: Overlay,
    /// Goal completion from 0 to 100
    pub progress_pct: f32,
    pub reps_label: String,
    pub tip_label: String,
    /// Whether the annotated frame belongs in the session video
    pub record_frame: bool,
    /// A rep was completed on this frame
    pub rep_completed: bool,
    /// Set on the frame that reached the goal
    pub finished: Option<SessionRecord>,
}
