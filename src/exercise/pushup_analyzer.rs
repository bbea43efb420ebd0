use crate::pose::LandmarkSet;

use super::{FormAnalyzer, FormTip};

const LOCKED_OUT_ANGLE: f32 = 170.;
const COLLAPSED_ANGLE: f32 = 60.;

pub(crate) struct PushUpFormAnalyzer;

impl FormAnalyzer for PushUpFormAnalyzer {
    fn analyze(&self, angle: f32, _landmarks: &LandmarkSet) -> Option<FormTip> {
        if angle > LOCKED_OUT_ANGLE {
            Some(FormTip::GoLower)
        } else if angle < COLLAPSED_ANGLE {
            Some(FormTip::DontCollapse)
        } else {
            None
        }
    }
}
