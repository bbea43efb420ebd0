use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use itertools::Itertools;
use jiff::{Timestamp, tz::TimeZone};
use log::{debug, info, warn};

use crate::{errors::RepCoachError, session::SessionRecord};

pub const DATA_FILE_NAME: &str = "data.csv";
pub const TIPS_FILE_NAME: &str = "tips.csv";

/// Persistence collaborator for finished sessions.
pub trait SessionWriter {
    /// Persists the logs and the video of a finished session. Returns the directory the session was
    /// written to.
    ///
    /// # Errors
    ///
    /// Returns an error if any file or directory cannot be written. The record is left untouched
    /// so the call can be retried.
    fn persist(&mut self, record: &SessionRecord) -> Result<PathBuf, RepCoachError>;
}

/// Writes each session to `<recordings_dir>/session_<n>/<Mode>/`.
pub struct FileSessionWriter {
    recordings_dir: PathBuf,
    /// Directory the recording collaborator writes temporary videos to
    video_dir: PathBuf,
}

impl FileSessionWriter {
    pub fn new(recordings_dir: PathBuf, video_dir: PathBuf) -> Self {
        Self {
            recordings_dir,
            video_dir,
        }
    }

    /// First session number without a directory under the recordings root, so a new process does
    /// not overwrite earlier sessions.
    pub fn next_free_session_no(&self) -> u32 {
        let Ok(entries) = fs::read_dir(&self.recordings_dir) else {
            return 1;
        };
        entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                entry
                    .file_name()
                    .to_str()?
                    .strip_prefix("session_")?
                    .parse::<u32>()
                    .ok()
            })
            .max()
            .map_or(1, |last| last + 1)
    }

    pub fn session_dir(&self, record: &SessionRecord) -> PathBuf {
        self.recordings_dir
            .join(format!("session_{}", record.session_no))
            .join(record.mode.to_string())
    }
}

impl SessionWriter for FileSessionWriter {
    fn persist(&mut self, record: &SessionRecord) -> Result<PathBuf, RepCoachError> {
        let session_dir = self.session_dir(record);
        fs::create_dir_all(&session_dir).map_err(|e| RepCoachError::PersistenceError {
            operation: format!("create directory {:?}", session_dir),
            source: e,
        })?;

        if let Some(video_path) = &record.video_path {
            let source = self.video_dir.join(video_path);
            match source.file_name() {
                Some(file_name) if source.exists() => {
                    let destination = session_dir.join(file_name);
                    debug!("Moving video {:?} to {:?}", source, destination);
                    fs::rename(&source, &destination).map_err(|e| {
                        RepCoachError::PersistenceError {
                            operation: format!("move video {:?}", source),
                            source: e,
                        }
                    })?;
                }
                _ => warn!("No video found at {:?}, saving logs only", source),
            }
        }

        let rep_rows = record.rep_events.iter().map(|event| {
            vec![
                format_time(event.timestamp),
                event.mode.to_string(),
                event.reps.to_string(),
                event.bad_form_count.to_string(),
            ]
        });
        write_csv(
            &session_dir.join(DATA_FILE_NAME),
            &["Time", "Mode", "Reps", "Bad Form Count"],
            rep_rows,
        )?;

        let tip_rows = record.tips.iter().map(|entry| {
            vec![
                format_time(entry.timestamp),
                entry.mode.to_string(),
                entry.tip.to_string(),
            ]
        });
        write_csv(
            &session_dir.join(TIPS_FILE_NAME),
            &["Time", "Mode", "Tip"],
            tip_rows,
        )?;

        info!(
            "Saved {} session {} to {:?}",
            record.mode, record.session_no, session_dir
        );
        Ok(session_dir)
    }
}

fn write_csv(
    path: &Path,
    header: &[&str],
    rows: impl Iterator<Item = Vec<String>>,
) -> Result<(), RepCoachError> {
    let to_error = |e: std::io::Error| RepCoachError::PersistenceError {
        operation: format!("write {:?}", path),
        source: e,
    };

    let file = File::create(path).map_err(to_error)?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{}", header.iter().map(|h| csv_field(h)).join(",")).map_err(to_error)?;
    for row in rows {
        writeln!(writer, "{}", row.iter().map(|f| csv_field(f)).join(",")).map_err(to_error)?;
    }
    writer.flush().map_err(to_error)
}

// quotes fields that would otherwise break the column layout
fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn format_time(timestamp: Timestamp) -> String {
    timestamp
        .to_zoned(TimeZone::system())
        .strftime("%H:%M:%S")
        .to_string()
}
