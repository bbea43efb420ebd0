use crate::pose::{Joint, LandmarkSet};

use super::{FormAnalyzer, FormTip};

/// How far above the knee, in normalized units, the hip may stay
const HIP_DEPTH_MARGIN: f32 = 0.05;
const MIN_STABLE_KNEE_ANGLE: f32 = 70.;
const MAX_STABLE_KNEE_ANGLE: f32 = 170.;

pub(crate) struct SquatFormAnalyzer;

impl FormAnalyzer for SquatFormAnalyzer {
    fn analyze(&self, angle: f32, landmarks: &LandmarkSet) -> Option<FormTip> {
        if let (Some(hip), Some(knee)) = (
            landmarks.get(Joint::RightHip),
            landmarks.get(Joint::RightKnee),
        ) {
            if hip.y < knee.y - HIP_DEPTH_MARGIN {
                return Some(FormTip::SquatDeeper);
            }
        }

        if !(MIN_STABLE_KNEE_ANGLE..=MAX_STABLE_KNEE_ANGLE).contains(&angle) {
            return Some(FormTip::KeepKneesAligned);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Position2D;

    fn legs(hip_y: f32, knee_y: f32) -> LandmarkSet {
        LandmarkSet::new()
            .with(Joint::RightHip, Position2D::new(0.5, hip_y))
            .with(Joint::RightKnee, Position2D::new(0.55, knee_y))
            .with(Joint::RightAnkle, Position2D::new(0.5, 0.9))
    }

    #[test]
    fn test_hips_high() {
        assert_eq!(
            SquatFormAnalyzer.analyze(120., &legs(0.4, 0.6)),
            Some(FormTip::SquatDeeper)
        );
    }

    #[test]
    fn test_depth_rule_takes_precedence() {
        // standing tall triggers both rules, the depth cue wins
        assert_eq!(
            SquatFormAnalyzer.analyze(178., &legs(0.4, 0.6)),
            Some(FormTip::SquatDeeper)
        );
    }

    #[test]
    fn test_knee_angle_out_of_range() {
        assert_eq!(
            SquatFormAnalyzer.analyze(65., &legs(0.6, 0.62)),
            Some(FormTip::KeepKneesAligned)
        );
        assert_eq!(
            SquatFormAnalyzer.analyze(172., &legs(0.6, 0.62)),
            Some(FormTip::KeepKneesAligned)
        );
    }

    #[test]
    fn test_good_squat() {
        assert!(SquatFormAnalyzer.analyze(95., &legs(0.6, 0.62)).is_none());
    }
}
