use jiff::{SignedDuration, Timestamp};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::exercise::{ExerciseMode, FormTip};

pub const DEFAULT_TIP_COOLDOWN_MS: u64 = 2000;

/// The tip currently shown to the athlete.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormFeedback {
    pub tip: FormTip,
    pub emitted_at: Timestamp,
    pub mode: ExerciseMode,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TipLogEntry {
    pub timestamp: Timestamp,
    pub mode: ExerciseMode,
    pub tip: FormTip,
}

/// Gates coaching tips so that at most one is shown per cooldown window.
///
/// The gate does not look at the tip content: a different tip offered inside the window is
/// dropped as well, and the last emitted tip stays on screen.
pub struct TipThrottle {
    cooldown: SignedDuration,
    last_emitted_at: Option<Timestamp>,
    feedback: Option<FormFeedback>,
    log: Vec<TipLogEntry>,
}

impl Default for TipThrottle {
    fn default() -> Self {
        Self::new(SignedDuration::from_millis(DEFAULT_TIP_COOLDOWN_MS as i64))
    }
}

impl TipThrottle {
    pub fn new(cooldown: SignedDuration) -> Self {
        Self {
            cooldown,
            last_emitted_at: None,
            feedback: None,
            log: Vec::new(),
        }
    }

    /// Offers a tip for display. Returns whether the tip was emitted.
    pub fn offer(&mut self, tip: FormTip, mode: ExerciseMode, now: Timestamp) -> bool {
        if let Some(last) = self.last_emitted_at {
            if now.duration_since(last) <= self.cooldown {
                return false;
            }
        }

        debug!("Emitting {} tip: {}", mode, tip);
        self.feedback = Some(FormFeedback {
            tip,
            emitted_at: now,
            mode,
        });
        self.log.push(TipLogEntry {
            timestamp: now,
            mode,
            tip,
        });
        self.last_emitted_at = Some(now);
        true
    }

    /// Restarts the cooldown window at `now` without emitting anything.
    pub fn reset_clock(&mut self, now: Timestamp) {
        self.last_emitted_at = Some(now);
    }

    /// Forgets the displayed tip, the log and the cooldown clock.
    pub fn clear(&mut self) {
        self.last_emitted_at = None;
        self.feedback = None;
        self.log.clear();
    }

    pub fn feedback(&self) -> Option<&FormFeedback> {
        self.feedback.as_ref()
    }

    pub fn log(&self) -> &[TipLogEntry] {
        &self.log
    }
}
