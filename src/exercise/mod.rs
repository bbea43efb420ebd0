pub(crate) mod curl_analyzer;
pub(crate) mod pushup_analyzer;
pub mod rep_counter;
pub(crate) mod squat_analyzer;

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    errors::RepCoachError,
    pose::{Joint, LandmarkSet},
};

pub use rep_counter::{Direction, RepCounter, RepThresholds, RepTransition};

use curl_analyzer::CurlFormAnalyzer;
use pushup_analyzer::PushUpFormAnalyzer;
use squat_analyzer::SquatFormAnalyzer;

/// Exercises the tracker can count.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum ExerciseMode {
    #[default]
    Curl,
    #[serde(rename = "Push-up")]
    PushUp,
    Squat,
}

impl ExerciseMode {
    pub const ALL: [ExerciseMode; 3] = [
        ExerciseMode::Curl,
        ExerciseMode::PushUp,
        ExerciseMode::Squat,
    ];

    /// The three joints whose angle drives the rep counter, as (outer, vertex, outer).
    pub fn joints(&self) -> (Joint, Joint, Joint) {
        match self {
            ExerciseMode::Curl => (Joint::RightShoulder, Joint::RightElbow, Joint::RightWrist),
            ExerciseMode::PushUp => (Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftWrist),
            ExerciseMode::Squat => (Joint::RightHip, Joint::RightKnee, Joint::RightAnkle),
        }
    }

    pub fn thresholds(&self) -> RepThresholds {
        match self {
            ExerciseMode::Curl => RepThresholds {
                flexed_below: 40.,
                extended_above: 160.,
            },
            ExerciseMode::PushUp => RepThresholds {
                flexed_below: 90.,
                extended_above: 150.,
            },
            ExerciseMode::Squat => RepThresholds {
                flexed_below: 90.,
                extended_above: 160.,
            },
        }
    }

    pub fn form_analyzer(&self) -> Box<dyn FormAnalyzer> {
        match self {
            ExerciseMode::Curl => Box::new(CurlFormAnalyzer),
            ExerciseMode::PushUp => Box::new(PushUpFormAnalyzer),
            ExerciseMode::Squat => Box::new(SquatFormAnalyzer),
        }
    }
}

impl std::fmt::Display for ExerciseMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExerciseMode::Curl => write!(f, "Curl"),
            ExerciseMode::PushUp => write!(f, "Push-up"),
            ExerciseMode::Squat => write!(f, "Squat"),
        }
    }
}

impl FromStr for ExerciseMode {
    type Err = RepCoachError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "curl" => Ok(ExerciseMode::Curl),
            "push-up" | "pushup" | "push_up" => Ok(ExerciseMode::PushUp),
            "squat" => Ok(ExerciseMode::Squat),
            _ => Err(RepCoachError::InvalidUserInput {
                field: "mode".to_string(),
                reason: format!("unknown exercise '{}', expected Curl, Push-up or Squat", s),
            }),
        }
    }
}

/// Coaching messages produced by the form analyzers.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum FormTip {
    /// Wrist raised well above the shoulder during a curl
    KeepElbowsDown,
    /// Curl angle at either extreme of the range of motion
    AvoidSwinging,
    /// Push-up arms locked straight
    GoLower,
    /// Push-up elbows bent too deep
    DontCollapse,
    /// Hips still above the knees
    SquatDeeper,
    /// Knee angle outside the stable range
    KeepKneesAligned,
}

impl FormTip {
    pub fn message(&self) -> &'static str {
        match self {
            FormTip::KeepElbowsDown => "Keep elbows down and steady.",
            FormTip::AvoidSwinging => "Avoid swinging, control motion.",
            FormTip::GoLower => "Go lower for a full rep.",
            FormTip::DontCollapse => "Don't collapse, keep control.",
            FormTip::SquatDeeper => "Go lower into your squat.",
            FormTip::KeepKneesAligned => "Keep knees aligned and stable.",
        }
    }
}

impl std::fmt::Display for FormTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Checks a single frame for bad form.
///
/// Rules are evaluated in priority order and only the first match is reported, even when the
/// conditions of later rules also hold.
pub trait FormAnalyzer {
    fn analyze(&self, angle: f32, landmarks: &LandmarkSet) -> Option<FormTip>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Curl".parse::<ExerciseMode>().unwrap(), ExerciseMode::Curl);
        assert_eq!("Push-up".parse::<ExerciseMode>().unwrap(), ExerciseMode::PushUp);
        assert_eq!("pushup".parse::<ExerciseMode>().unwrap(), ExerciseMode::PushUp);
        assert_eq!(" squat ".parse::<ExerciseMode>().unwrap(), ExerciseMode::Squat);
        assert!(matches!(
            "Plank".parse::<ExerciseMode>(),
            Err(RepCoachError::InvalidUserInput { .. })
        ));
    }

    #[test]
    fn test_mode_display_parses_back() {
        for mode in ExerciseMode::ALL {
            assert_eq!(mode.to_string().parse::<ExerciseMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_thresholds_leave_hysteresis_gap() {
        for mode in ExerciseMode::ALL {
            let thresholds = mode.thresholds();
            assert!(thresholds.flexed_below < thresholds.extended_above);
        }
    }

    #[test]
    fn test_mode_joints() {
        assert_eq!(ExerciseMode::Curl.joints().1, Joint::RightElbow);
        assert_eq!(ExerciseMode::PushUp.joints().1, Joint::LeftElbow);
        assert_eq!(ExerciseMode::Squat.joints().1, Joint::RightKnee);
    }
}
