// Library interface for repcoach
// This allows integration tests to access internal modules

pub mod coaching;
pub mod config;
pub mod errors;
pub mod exercise;
pub mod pose;
pub mod runner;
pub mod session;
pub mod writer;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::RepCoachError;
pub use exercise::{ExerciseMode, FormTip};
pub use pose::{Joint, LandmarkSet, PoseFrame, Position2D};
pub use session::{FrameOutput, SessionController, SessionPhase, SessionRecord};
pub use writer::{FileSessionWriter, SessionWriter};
