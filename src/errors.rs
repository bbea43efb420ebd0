// Error types for repcoach

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RepCoachError {
    // Control surface validation errors
    #[snafu(display("Invalid user input: {field} - {reason}"))]
    InvalidUserInput { field: String, reason: String },

    // Per-frame errors, contained within the frame step
    #[snafu(display("Invalid geometry: {reason}"))]
    InvalidGeometry { reason: String },

    // Errors while reading pose frames
    #[snafu(display("Invalid pose frame on line {line}"))]
    InvalidFrame {
        line: usize,
        source: io::Error,
    },
    #[snafu(display("Error opening pose frame source"))]
    FrameSourceError { source: io::Error },

    // Errors for the session writer
    #[snafu(display("Error persisting session: {operation}"))]
    PersistenceError {
        operation: String,
        source: io::Error,
    },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error reading or writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },
}
