use serde::{Deserialize, Serialize};

/// Which extreme of the range of motion the tracked joint last reached.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Extended,
    Flexed,
}

/// Joint angles, in degrees, that latch the counter into each direction. The gap between the two
/// values keeps small oscillations around one threshold from counting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RepThresholds {
    pub flexed_below: f32,
    pub extended_above: f32,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RepTransition {
    None,
    Flexed,
    /// The joint returned to extension and a rep was counted
    Completed,
}

/// Turns a stream of joint angles into discrete repetitions.
pub struct RepCounter {
    thresholds: RepThresholds,
    direction: Direction,
    count: u32,
}

impl RepCounter {
    pub fn new(thresholds: RepThresholds) -> Self {
        Self {
            thresholds,
            direction: Direction::Extended,
            count: 0,
        }
    }

    pub fn update(&mut self, angle: f32) -> RepTransition {
        match self.direction {
            Direction::Extended if angle < self.thresholds.flexed_below => {
                self.direction = Direction::Flexed;
                RepTransition::Flexed
            }
            Direction::Flexed if angle > self.thresholds.extended_above => {
                self.direction = Direction::Extended;
                self.count += 1;
                RepTransition::Completed
            }
            _ => RepTransition::None,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}
