//! Clip metadata and identity
//!
//! The pipeline needs each clip's frame rate, frame count and resolution.
//! They come from whatever knows about the videos, behind [`ClipCatalog`].
//! [`ClipTable`] is a JSON-backed catalog.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SaliencyError;

/// Title used when no title is known for a clip
pub const UNKNOWN_TITLE: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipMetadata {
    /// Frames per second
    pub frame_rate: f64,
    pub frame_count: u64,
    pub width: u32,
    pub height: u32,
}

/// Source of per-clip video metadata
pub trait ClipCatalog {
    fn clip(&self, index: usize) -> Option<ClipMetadata>;
}

/// Catalog loaded from `{"clips": [...]}`, indexed by position
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipTable {
    pub clips: Vec<ClipMetadata>,
}

impl ClipTable {
    pub fn new(clips: Vec<ClipMetadata>) -> Self {
        Self { clips }
    }

    pub fn from_json(json: &str) -> Result<Self, SaliencyError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SaliencyError> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}

impl ClipCatalog for ClipTable {
    fn clip(&self, index: usize) -> Option<ClipMetadata> {
        self.clips.get(index).copied()
    }
}

/// Clip index encoded in a log file name
///
/// Loggers name files `ddMMyyyy_HHmmss_clipN_<layout>.csv`; the index is the
/// last character of the third `_`-separated token.
pub fn clip_index_from_log_name(name: &str) -> Result<usize, SaliencyError> {
    let file_name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    file_name
        .split('_')
        .nth(2)
        .and_then(|token| token.chars().last())
        .and_then(|c| c.to_digit(10))
        .map(|d| d as usize)
        .ok_or_else(|| SaliencyError::ClipIndex(name.to_string()))
}

/// Clip titles, one per line, in clip index order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TitleList {
    titles: Vec<String>,
}

impl TitleList {
    pub fn parse(text: &str) -> Self {
        let titles = text
            .lines()
            .map(|line| line.trim_end_matches('\r').to_string())
            .collect();
        Self { titles }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SaliencyError> {
        Ok(Self::parse(&fs::read_to_string(path)?))
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn title_for(&self, index: usize) -> &str {
        match self.titles.get(index) {
            Some(title) if !title.trim().is_empty() => title,
            _ => UNKNOWN_TITLE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn clip(frame_rate: f64, frame_count: u64) -> ClipMetadata {
        ClipMetadata {
            frame_rate,
            frame_count,
            width: 3840,
            height: 1920,
        }
    }

    #[test]
    fn test_clip_index_from_log_name() {
        assert_eq!(clip_index_from_log_name("24022022_101010_clip3_head.csv").unwrap(), 3);
        assert_eq!(
            clip_index_from_log_name("Logs/session_a/01012023_093000_clip0_gaze.csv").unwrap(),
            0
        );
        // Only the last character counts
        assert_eq!(clip_index_from_log_name("01012023_093000_clip12_gaze.csv").unwrap(), 2);
    }

    #[test]
    fn test_clip_index_missing() {
        for name in ["head.csv", "01012023_093000", "01012023_093000_clipX_head.csv"] {
            let err = clip_index_from_log_name(name).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ConfigValidation);
        }
    }

    #[test]
    fn test_clip_table_lookup() {
        let table = ClipTable::from_json(
            r#"{"clips": [
                {"frame_rate": 30.0, "frame_count": 900, "width": 3840, "height": 1920},
                {"frame_rate": 25.0, "frame_count": 250, "width": 3840, "height": 1920}
            ]}"#,
        )
        .unwrap();

        assert_eq!(table.clip(0), Some(clip(30.0, 900)));
        assert_eq!(table.clip(1), Some(clip(25.0, 250)));
        assert_eq!(table.clip(2), None);
    }

    #[test]
    fn test_clip_table_bad_json() {
        assert_eq!(
            ClipTable::from_json(r#"{"clips": [{"frame_rate": 30}]}"#)
                .unwrap_err()
                .kind(),
            ErrorKind::Parse
        );
    }

    #[test]
    fn test_titles() {
        let titles = TitleList::parse("Ocean Dive\r\nCity Walk\n\nMountain\n");
        assert_eq!(titles.len(), 4);
        assert_eq!(titles.title_for(0), "Ocean Dive");
        assert_eq!(titles.title_for(1), "City Walk");
        assert_eq!(titles.title_for(2), UNKNOWN_TITLE);
        assert_eq!(titles.title_for(3), "Mountain");
        assert_eq!(titles.title_for(9), UNKNOWN_TITLE);
        assert!(TitleList::default().is_empty());
    }
}
