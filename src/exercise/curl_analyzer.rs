use crate::pose::{Joint, LandmarkSet};

use super::{FormAnalyzer, FormTip};

/// How far above the shoulder, in normalized units, the wrist may rise
const WRIST_RAISE_MARGIN: f32 = 0.1;
const MIN_CONTROLLED_ANGLE: f32 = 20.;
const MAX_CONTROLLED_ANGLE: f32 = 170.;

pub(crate) struct CurlFormAnalyzer;

impl FormAnalyzer for CurlFormAnalyzer {
    fn analyze(&self, angle: f32, landmarks: &LandmarkSet) -> Option<FormTip> {
        // image y grows downwards, a smaller y means the wrist is higher up
        if let (Some(shoulder), Some(wrist)) = (
            landmarks.get(Joint::RightShoulder),
            landmarks.get(Joint::RightWrist),
        ) {
            if wrist.y < shoulder.y - WRIST_RAISE_MARGIN {
                return Some(FormTip::KeepElbowsDown);
            }
        }

        if !(MIN_CONTROLLED_ANGLE..=MAX_CONTROLLED_ANGLE).contains(&angle) {
            return Some(FormTip::AvoidSwinging);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pose::Position2D;

    fn arm(shoulder_y: f32, wrist_y: f32) -> LandmarkSet {
        LandmarkSet::new()
            .with(Joint::RightShoulder, Position2D::new(0.5, shoulder_y))
            .with(Joint::RightElbow, Position2D::new(0.5, 0.5))
            .with(Joint::RightWrist, Position2D::new(0.6, wrist_y))
    }

    #[test]
    fn test_good_curl() {
        let output = CurlFormAnalyzer.analyze(90., &arm(0.3, 0.4));
        assert!(output.is_none());
    }

    #[test]
    fn test_wrist_above_shoulder() {
        let output = CurlFormAnalyzer.analyze(90., &arm(0.3, 0.15));
        assert_eq!(output, Some(FormTip::KeepElbowsDown));
    }

    #[test]
    fn test_elbow_rule_takes_precedence_over_swing() {
        let output = CurlFormAnalyzer.analyze(10., &arm(0.3, 0.1));
        assert_eq!(output, Some(FormTip::KeepElbowsDown));
    }

    #[test]
    fn test_swinging_at_both_extremes() {
        assert_eq!(
            CurlFormAnalyzer.analyze(15., &arm(0.3, 0.4)),
            Some(FormTip::AvoidSwinging)
        );
        assert_eq!(
            CurlFormAnalyzer.analyze(175., &arm(0.3, 0.8)),
            Some(FormTip::AvoidSwinging)
        );
        assert!(CurlFormAnalyzer.analyze(20., &arm(0.3, 0.4)).is_none());
        assert!(CurlFormAnalyzer.analyze(170., &arm(0.3, 0.4)).is_none());
    }
}
