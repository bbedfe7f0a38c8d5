//! Error types for gaze-saliency

use thiserror::Error;

/// Errors that can occur while computing fixations and saliency maps
#[derive(Debug, Error)]
pub enum SaliencyError {
    #[error("Failed to parse log {log} at line {line}: {reason}")]
    Parse {
        log: String,
        line: usize,
        reason: String,
    },

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(
        "Time window [{start} -- {end}] is bigger than the one logged in log {log} \
         (logged interval is [{logged_start} -- {logged_end}])"
    )]
    WindowNotCovered {
        log: String,
        logged_start: f64,
        logged_end: f64,
        start: f64,
        end: f64,
    },

    #[error(
        "Frames {start_frame} to {end_frame} are not contained within clip {clip} \
         ({frame_count} frames)"
    )]
    FrameRangeOutOfBounds {
        clip: usize,
        start_frame: u64,
        end_frame: u64,
        frame_count: u64,
    },

    #[error("No metadata for clip index {0}")]
    UnknownClip(usize),

    #[error("Cannot determine clip index from log name: {0}")]
    ClipIndex(String),

    #[error("Log {log} refers to clip {other} but the run is for clip {first}")]
    MixedClips {
        first: usize,
        other: usize,
        log: String,
    },

    #[error("No logs to process")]
    NoLogs,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

/// Coarse classification of a [`SaliencyError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed log, configuration or catalog content
    Parse,
    /// Configuration inconsistent with the logs or the clip
    ConfigValidation,
    /// Missing input or unwritable output
    Io,
}

impl SaliencyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SaliencyError::Parse { .. } | SaliencyError::Json(_) => ErrorKind::Parse,
            SaliencyError::InvalidConfig(_)
            | SaliencyError::WindowNotCovered { .. }
            | SaliencyError::FrameRangeOutOfBounds { .. }
            | SaliencyError::UnknownClip(_)
            | SaliencyError::ClipIndex(_)
            | SaliencyError::MixedClips { .. }
            | SaliencyError::NoLogs => ErrorKind::ConfigValidation,
            SaliencyError::Io(_) | SaliencyError::Image(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn parse(log: &str, line: usize, reason: impl Into<String>) -> Self {
        SaliencyError::Parse {
            log: log.to_string(),
            line,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(SaliencyError::parse("a", 3, "bad").kind(), ErrorKind::Parse);
        assert_eq!(SaliencyError::NoLogs.kind(), ErrorKind::ConfigValidation);
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(SaliencyError::from(io).kind(), ErrorKind::Io);
    }

    #[test]
    fn test_window_message_names_log_and_intervals() {
        let err = SaliencyError::WindowNotCovered {
            log: "clip1_head".to_string(),
            logged_start: 0.5,
            logged_end: 9.0,
            start: 0.0,
            end: 2.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("clip1_head"));
        assert!(msg.contains("[0.5 -- 9]"));
        assert!(msg.contains("[0 -- 2]"));
    }
}
