//! Output persistence
//!
//! Lays out the per-run output directory, encodes fixation and saliency maps
//! and writes the `run.json` manifest describing how they were produced.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use image::{DynamicImage, GrayImage, ImageFormat};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregator::FrameRange;
use crate::config::SaliencyConfig;
use crate::error::SaliencyError;
use crate::types::{Fixation, LogLayout};
use crate::{PRODUCER_NAME, VERSION};

pub const FIXATIONS_DIR: &str = "Fixations";
pub const SALIENCY_DIR: &str = "Saliency";
pub const MANIFEST_FILE: &str = "run.json";

/// `<title without spaces>_<ddMMyyyy_HHmmss>_<n>_users`
pub fn run_directory_name(title: &str, created_at: &DateTime<Local>, num_logs: usize) -> String {
    let title: String = title.chars().filter(|c| !c.is_whitespace()).collect();
    format!(
        "{}_{}_{}_users",
        title,
        created_at.format("%d%m%Y_%H%M%S"),
        num_logs
    )
}

pub fn fixation_file_name(range: FrameRange, frame: u64) -> String {
    format!(
        "FIX_startFrame_{}_currFrame_{}_of_{}.PNG",
        range.start, frame, range.end
    )
}

pub fn saliency_file_name(range: FrameRange, frame: u64) -> String {
    format!(
        "SAL_startFrame_{}_currFrame_{}_of_{}.bmp",
        range.start, frame, range.end
    )
}

/// Directories of one run
#[derive(Debug, Clone, PartialEq)]
pub struct OutputLayout {
    /// `<base>/<run directory name>`
    pub root: PathBuf,
    /// `<root>/<headData|gazeData>`
    pub data_dir: PathBuf,
    pub fixations_dir: Option<PathBuf>,
    pub saliency_dir: Option<PathBuf>,
}

impl OutputLayout {
    /// Compute the paths without touching the filesystem
    pub fn plan(
        base_dir: &Path,
        run_name: &str,
        layout: LogLayout,
        fixation_maps: bool,
        saliency_maps: bool,
    ) -> Self {
        let root = base_dir.join(run_name);
        let data_dir = root.join(layout.output_dir_name());
        Self {
            fixations_dir: fixation_maps.then(|| data_dir.join(FIXATIONS_DIR)),
            saliency_dir: saliency_maps.then(|| data_dir.join(SALIENCY_DIR)),
            root,
            data_dir,
        }
    }

    /// Create the data directory and the requested map directories
    pub fn create(&self) -> Result<(), SaliencyError> {
        fs::create_dir_all(&self.data_dir)?;
        for dir in self.fixations_dir.iter().chain(self.saliency_dir.iter()) {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    /// Write a fixation map as PNG; no-op when fixation maps are disabled
    pub fn write_fixation_map(
        &self,
        range: FrameRange,
        frame: u64,
        map: &GrayImage,
    ) -> Result<Option<PathBuf>, SaliencyError> {
        let Some(dir) = &self.fixations_dir else {
            return Ok(None);
        };
        let path = dir.join(fixation_file_name(range, frame));
        write_rgb(map, &path, ImageFormat::Png)?;
        Ok(Some(path))
    }

    /// Write a saliency map as BMP; no-op when saliency maps are disabled
    pub fn write_saliency_map(
        &self,
        range: FrameRange,
        frame: u64,
        map: &GrayImage,
    ) -> Result<Option<PathBuf>, SaliencyError> {
        let Some(dir) = &self.saliency_dir else {
            return Ok(None);
        };
        let path = dir.join(saliency_file_name(range, frame));
        write_rgb(map, &path, ImageFormat::Bmp)?;
        Ok(Some(path))
    }
}

/// Gray maps are stored as 3-channel images with identical channels
fn write_rgb(map: &GrayImage, path: &Path, format: ImageFormat) -> Result<(), SaliencyError> {
    let rgb = DynamicImage::ImageLuma8(map.clone()).to_rgb8();
    rgb.save_with_format(path, format)?;
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipInfo {
    pub index: usize,
    pub title: String,
    pub frame_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogThreshold {
    pub log: String,
    /// Velocity threshold in deg/s; `null` when no velocity was eligible
    pub threshold: Option<f64>,
}

/// Provenance record written next to the maps of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: String,
    pub producer: RunProducer,
    pub computed_at_utc: String,
    pub clip: ClipInfo,
    pub layout: LogLayout,
    pub width: u32,
    pub height: u32,
    pub frame_range: FrameRange,
    pub frames_completed: u64,
    pub cancelled: bool,
    pub thresholds: Vec<LogThreshold>,
    pub config: SaliencyConfig,
    pub fixations: Vec<Fixation>,
}

impl RunManifest {
    /// Fresh manifest with a new run id and no completed frames
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        clip: ClipInfo,
        layout: LogLayout,
        width: u32,
        height: u32,
        frame_range: FrameRange,
        thresholds: Vec<LogThreshold>,
        config: SaliencyConfig,
        fixations: Vec<Fixation>,
    ) -> Self {
        let run_id = Uuid::new_v4().to_string();
        Self {
            producer: RunProducer {
                name: PRODUCER_NAME.to_string(),
                version: VERSION.to_string(),
                instance_id: run_id.clone(),
            },
            run_id,
            computed_at_utc: Utc::now().to_rfc3339(),
            clip,
            layout,
            width,
            height,
            frame_range,
            frames_completed: 0,
            cancelled: false,
            thresholds,
            config,
            fixations,
        }
    }

    pub fn write(&self, path: &Path) -> Result<(), SaliencyError> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn read(path: &Path) -> Result<Self, SaliencyError> {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }
}
