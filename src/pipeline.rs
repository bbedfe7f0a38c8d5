//! Pipeline orchestration
//!
//! This module provides the public API for gaze-saliency.
//! It drives a run from raw log text to per-frame fixation and saliency maps.
//!
//! Pipeline stages:
//! 1. LogParser - Parse log text into samples
//! 2. VelocityComputer - Angular velocity per sample pair
//! 3. IvtClassifier - Group slow samples into fixations
//! 4. FrameAggregator - Project fixations onto each frame
//! 5. SaliencyRenderer - Smooth each frame's fixation map
//!
//! [`SaliencyPipeline::prepare`] runs every check and the first three stages
//! without touching the filesystem. [`PreparedRun::frames`] then yields the
//! frames lazily, and [`SaliencyPipeline::run`] persists them.

use std::fs;
use std::ops::{ControlFlow, RangeInclusive};
use std::path::{Path, PathBuf};

use chrono::Local;
use image::GrayImage;
use tracing::{debug, info, warn};

use crate::aggregator::{validate_coverage, FrameAggregator, FrameGazeGrid, FrameRange};
use crate::catalog::{clip_index_from_log_name, ClipCatalog, ClipMetadata};
use crate::config::SaliencyConfig;
use crate::error::SaliencyError;
use crate::fixation::IvtClassifier;
use crate::log::LogParser;
use crate::output::{run_directory_name, ClipInfo, LogThreshold, OutputLayout, RunManifest};
use crate::renderer::{SaliencyMap, SaliencyRenderer};
use crate::types::{Fixation, LogLayout, LogSeries};
use crate::velocity::VelocityComputer;

/// Raw contents of one log, with the file name it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct LogInput {
    pub name: String,
    pub contents: String,
}

impl LogInput {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }

    /// Read a log from disk, naming it after its file name
    pub fn read(path: impl AsRef<Path>) -> Result<Self, SaliencyError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(Self { name, contents })
    }
}

/// Saliency pipeline bound to a configuration and a clip catalog
pub struct SaliencyPipeline<'a, C: ClipCatalog + ?Sized> {
    config: SaliencyConfig,
    catalog: &'a C,
}

impl<'a, C: ClipCatalog + ?Sized> SaliencyPipeline<'a, C> {
    pub fn new(config: SaliencyConfig, catalog: &'a C) -> Self {
        Self { config, catalog }
    }

    pub fn config(&self) -> &SaliencyConfig {
        &self.config
    }

    /// Validate, parse and classify every log of a run.
    ///
    /// Fails before any frame is produced if a log is malformed, if the logs
    /// refer to different clips, or if the window is not covered by the clip
    /// and by every log.
    pub fn prepare(&self, logs: &[LogInput]) -> Result<PreparedRun, SaliencyError> {
        self.config.validate()?;

        let first = logs.first().ok_or(SaliencyError::NoLogs)?;
        let clip_index = clip_index_from_log_name(&first.name)?;
        for log in &logs[1..] {
            let other = clip_index_from_log_name(&log.name)?;
            if other != clip_index {
                return Err(SaliencyError::MixedClips {
                    first: clip_index,
                    other,
                    log: log.name.clone(),
                });
            }
        }

        let clip = self
            .catalog
            .clip(clip_index)
            .ok_or(SaliencyError::UnknownClip(clip_index))?;
        if !(clip.frame_rate > 0.0 && clip.frame_rate.is_finite()) {
            return Err(SaliencyError::InvalidConfig(format!(
                "clip {} has frame rate {}",
                clip_index, clip.frame_rate
            )));
        }

        let window = self.config.window();
        let frame_range = FrameRange::for_window(clip.frame_rate, window);
        info!(
            clip = clip_index,
            start_frame = frame_range.start,
            end_frame = frame_range.end,
            "Resolved frame range"
        );
        frame_range.validate(clip_index, clip.frame_count)?;

        let layout = self.config.layout();
        let parser = LogParser::new(layout);
        let velocity = VelocityComputer::new(layout, self.config.confidence_threshold);

        let mut series = Vec::with_capacity(logs.len());
        for log in logs {
            if let Some(named) = LogLayout::from_file_name(&log.name) {
                if named != layout {
                    warn!(
                        log = %log.name,
                        expected = layout.as_str(),
                        found = named.as_str(),
                        "Log file name does not match the configured layout"
                    );
                }
            }

            let parsed = parser.parse(&log.name, &log.contents)?;
            let velocities = velocity.compute(&parsed.samples);
            series.push(LogSeries::new(
                parsed.name,
                parsed.layout,
                parsed.header,
                parsed.samples,
                velocities,
            ));
        }

        for log in &series {
            validate_coverage(log, window)?;
        }

        let (width, height) = self.output_size(&clip);
        if width == 0 || height == 0 {
            return Err(SaliencyError::InvalidConfig(format!(
                "output size {}x{} is empty",
                width, height
            )));
        }
        info!(width, height, "Resolved output size");

        let classifier = IvtClassifier::new(
            self.config.threshold_policy(),
            self.config.max_fixations_per_centroid,
            window,
        );
        let (fixations, per_log) = classifier.classify_all(&series);
        let thresholds = series
            .iter()
            .zip(per_log)
            .map(|(log, threshold)| LogThreshold {
                log: log.name().to_string(),
                threshold,
            })
            .collect();

        Ok(PreparedRun {
            config: self.config.clone(),
            clip_index,
            clip,
            layout,
            width,
            height,
            frame_range,
            series,
            fixations,
            thresholds,
        })
    }

    /// Prepare the run, then write every frame's maps under `base_dir`.
    ///
    /// `progress` is called after each frame; returning `Break` stops the
    /// run. Frames already written are kept, and the manifest records the
    /// cancellation.
    pub fn run<F>(
        &self,
        logs: &[LogInput],
        title: &str,
        base_dir: impl AsRef<Path>,
        mut progress: F,
    ) -> Result<RunSummary, SaliencyError>
    where
        F: FnMut(Progress) -> ControlFlow<()>,
    {
        let prepared = self.prepare(logs)?;

        let run_name = run_directory_name(title, &Local::now(), logs.len());
        let layout = OutputLayout::plan(
            base_dir.as_ref(),
            &run_name,
            prepared.layout,
            self.config.output_fixation_maps,
            self.config.output_saliency_maps,
        );
        layout.create()?;
        info!(dir = %layout.root.display(), "Writing maps");

        let mut manifest = prepared.manifest(title);
        let range = prepared.frame_range;

        for output in prepared.frames() {
            layout.write_fixation_map(range, output.frame, &output.fixation_map)?;
            if let Some(saliency) = &output.saliency {
                layout.write_saliency_map(range, output.frame, saliency.as_image())?;
            }
            manifest.frames_completed += 1;

            let percent_complete = range.percent_complete(output.frame);
            debug!(frame = output.frame, percent_complete, "Frame complete");

            let step = Progress {
                frame: output.frame,
                frame_range: range,
                frames_completed: manifest.frames_completed,
                percent_complete,
            };
            if progress(step).is_break() {
                warn!(
                    frame = output.frame,
                    frames_completed = manifest.frames_completed,
                    "Run cancelled"
                );
                manifest.cancelled = true;
                break;
            }
        }

        manifest.write(&layout.manifest_path())?;
        info!(
            frames = manifest.frames_completed,
            fixations = manifest.fixations.len(),
            "Run complete"
        );

        Ok(RunSummary {
            run_id: manifest.run_id,
            output_dir: layout.root,
            frames_written: manifest.frames_completed,
            cancelled: manifest.cancelled,
            fixations: manifest.fixations.len(),
        })
    }

    fn output_size(&self, clip: &ClipMetadata) -> (u32, u32) {
        let width = match self.config.output_frame_width {
            0 => clip.width,
            w => w,
        };
        let height = match self.config.output_frame_height {
            0 => clip.height,
            h => h,
        };
        (width, height)
    }
}

/// A validated run, ready to produce frames
#[derive(Debug, Clone)]
pub struct PreparedRun {
    config: SaliencyConfig,
    clip_index: usize,
    clip: ClipMetadata,
    layout: LogLayout,
    width: u32,
    height: u32,
    frame_range: FrameRange,
    series: Vec<LogSeries>,
    fixations: Vec<Fixation>,
    thresholds: Vec<LogThreshold>,
}

impl PreparedRun {
    pub fn clip_index(&self) -> usize {
        self.clip_index
    }

    pub fn clip(&self) -> &ClipMetadata {
        &self.clip
    }

    pub fn layout(&self) -> LogLayout {
        self.layout
    }

    /// Resolved output width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Resolved output height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn frame_range(&self) -> FrameRange {
        self.frame_range
    }

    pub fn series(&self) -> &[LogSeries] {
        &self.series
    }

    /// Fixations of every log, concatenated in log order
    pub fn fixations(&self) -> &[Fixation] {
        &self.fixations
    }

    pub fn thresholds(&self) -> &[LogThreshold] {
        &self.thresholds
    }

    /// Frames in increasing order, computed on demand
    pub fn frames(&self) -> FrameSequence<'_> {
        FrameSequence {
            run: self,
            aggregator: FrameAggregator::new(
                self.clip.frame_rate,
                self.width,
                self.height,
                self.series.len(),
            ),
            renderer: self
                .config
                .output_saliency_maps
                .then(|| SaliencyRenderer::new(self.config.sigma_in_degs)),
            frames: self.frame_range.start..=self.frame_range.end,
        }
    }

    fn manifest(&self, title: &str) -> RunManifest {
        RunManifest::new(
            ClipInfo {
                index: self.clip_index,
                title: title.to_string(),
                frame_rate: self.clip.frame_rate,
            },
            self.layout,
            self.width,
            self.height,
            self.frame_range,
            self.thresholds.clone(),
            self.config.clone(),
            self.fixations.clone(),
        )
    }
}

/// Maps of one frame
#[derive(Debug, Clone)]
pub struct FrameOutput {
    pub frame: u64,
    pub grid: FrameGazeGrid,
    pub fixation_map: GrayImage,
    /// Present when saliency maps are enabled
    pub saliency: Option<SaliencyMap>,
}

/// Lazy per-frame iterator over a [`PreparedRun`]
pub struct FrameSequence<'a> {
    run: &'a PreparedRun,
    aggregator: FrameAggregator,
    renderer: Option<SaliencyRenderer>,
    frames: RangeInclusive<u64>,
}

impl Iterator for FrameSequence<'_> {
    type Item = FrameOutput;

    fn next(&mut self) -> Option<FrameOutput> {
        let frame = self.frames.next()?;
        let grid = self.aggregator.gaze_grid(&self.run.fixations, frame);
        let fixation_map = self.aggregator.splat(&grid);
        let saliency = self.renderer.map(|r| r.render(&fixation_map));
        Some(FrameOutput {
            frame,
            grid,
            fixation_map,
            saliency,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.frames.size_hint()
    }
}

/// Reported after every completed frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub frame: u64,
    pub frame_range: FrameRange,
    pub frames_completed: u64,
    pub percent_complete: f64,
}

/// Outcome of [`SaliencyPipeline::run`]
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub run_id: String,
    pub output_dir: PathBuf,
    pub frames_written: u64,
    pub cancelled: bool,
    pub fixations: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ClipTable;
    use crate::error::ErrorKind;
    use crate::log::format::writer::{format_data_line, format_header};
    use crate::output::{RunManifest, MANIFEST_FILE};
    use crate::types::{LogHeader, LogSample, Quat, Uv, Vec3};
    use pretty_assertions::assert_eq;

    const HEAD_LOG: &str = "24022022_101010_clip1_head.csv";

    fn catalog() -> ClipTable {
        let clip = ClipMetadata {
            frame_rate: 10.0,
            frame_count: 100,
            width: 720,
            height: 360,
        };
        ClipTable::new(vec![clip, clip])
    }

    /// Log text for samples `(timestamp, euler_y, u, v, confidence)`
    fn log_text(layout: LogLayout, rows: &[(f64, f64, f64, f64, f64)]) -> String {
        let header = LogHeader {
            starting_timestamp: Some(0.0),
            initial_rotation: (layout == LogLayout::Head).then(Quat::identity),
        };
        let mut text = format_header(layout, &header);
        for &(t, ey, u, v, c) in rows {
            text.push_str(&format_data_line(&LogSample {
                timestamp: t,
                euler: Vec3::new(0.0, ey, 0.0),
                rotation: Quat::identity(),
                direction: Vec3::new(0.0, 0.0, 1.0),
                uv: Uv::new(u, v),
                confidence: layout.has_confidence().then_some(c),
            }));
        }
        text
    }

    /// Five motionless samples over 0.4 s
    fn still_head_log() -> LogInput {
        let rows = [
            (0.0, 10.0, 0.4, 0.5, 1.0),
            (0.1, 10.0, 0.45, 0.5, 1.0),
            (0.2, 10.0, 0.5, 0.5, 1.0),
            (0.3, 10.0, 0.45, 0.5, 1.0),
            (0.4, 10.0, 0.9, 0.5, 1.0),
        ];
        LogInput::new(HEAD_LOG, log_text(LogLayout::Head, &rows))
    }

    fn config() -> SaliencyConfig {
        SaliencyConfig {
            start: 0.0,
            seconds_to_consider: 0.3,
            max_fixations_per_centroid: 10,
            ..Default::default()
        }
    }

    fn count_files(dir: &Path) -> usize {
        fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    #[test]
    fn test_single_still_log_makes_one_fixation() {
        let catalog = catalog();
        let prepared = SaliencyPipeline::new(config(), &catalog)
            .prepare(&[still_head_log()])
            .unwrap();

        assert_eq!(prepared.clip_index(), 1);
        assert_eq!(prepared.fixations().len(), 1);
        let fixation = prepared.fixations()[0];
        assert!((fixation.centroid.u - 0.45).abs() < 1e-12);
        assert!((fixation.centroid.v - 0.5).abs() < 1e-12);
        assert_eq!(fixation.start_time, 0.0);
        assert!((fixation.duration - 0.4).abs() < 1e-12);
        assert_eq!(prepared.thresholds()[0].threshold, Some(30.0));
    }

    #[test]
    fn test_output_size_from_catalog_when_zero() {
        let catalog = catalog();
        let prepared = SaliencyPipeline::new(config(), &catalog)
            .prepare(&[still_head_log()])
            .unwrap();
        assert_eq!((prepared.width(), prepared.height()), (720, 360));

        let sized = SaliencyConfig {
            output_frame_width: 360,
            ..config()
        };
        let prepared = SaliencyPipeline::new(sized, &catalog)
            .prepare(&[still_head_log()])
            .unwrap();
        assert_eq!((prepared.width(), prepared.height()), (360, 360));
    }

    #[test]
    fn test_frames_are_lazy_and_ordered() {
        let catalog = catalog();
        let prepared = SaliencyPipeline::new(config(), &catalog)
            .prepare(&[still_head_log()])
            .unwrap();
        assert_eq!(prepared.frame_range(), FrameRange { start: 0, end: 3 });

        let frames: Vec<FrameOutput> = prepared.frames().collect();
        let numbers: Vec<u64> = frames.iter().map(|f| f.frame).collect();
        assert_eq!(numbers, vec![0, 1, 2, 3]);

        // The fixation spans 0.0..0.4 s and so lands in every frame
        for frame in &frames {
            assert_eq!(frame.grid.non_empty_cells(), 1);
            assert_eq!(frame.grid.get(324, 180), 1.0);
            assert_eq!(frame.fixation_map.get_pixel(324, 180)[0], 255);
            let saliency = frame.saliency.as_ref().unwrap();
            assert!(saliency.get(324, 180) > 0);
            assert_eq!(saliency.get(100, 100), 0);
        }
    }

    #[test]
    fn test_gaze_logs_share_weight() {
        let catalog = catalog();
        let rows = |u: f64| {
            [
                (0.0, 10.0, u, 0.5, 0.9),
                (0.1, 10.0, u, 0.5, 0.9),
                (0.2, 10.0, u, 0.5, 0.9),
                (0.3, 10.0, u, 0.5, 0.9),
                (0.4, 10.0, u, 0.5, 0.9),
            ]
        };
        let logs = [
            LogInput::new("01012023_120000_clip0_gaze.csv", log_text(LogLayout::Gaze, &rows(0.25))),
            LogInput::new("01012023_130000_clip0_gaze.csv", log_text(LogLayout::Gaze, &rows(0.75))),
        ];
        let config = SaliencyConfig {
            gaze_logs: true,
            ..config()
        };
        let prepared = SaliencyPipeline::new(config, &catalog).prepare(&logs).unwrap();

        assert_eq!(prepared.fixations().len(), 2);
        assert_eq!(prepared.fixations()[1].source_log_index, 1);
        let names: Vec<&str> = prepared.thresholds().iter().map(|t| t.log.as_str()).collect();
        assert_eq!(
            names,
            vec!["01012023_120000_clip0_gaze.csv", "01012023_130000_clip0_gaze.csv"]
        );

        let frame = prepared.frames().next().unwrap();
        assert_eq!(frame.grid.get(180, 180), 0.5);
        assert_eq!(frame.grid.get(540, 180), 0.5);
        assert_eq!(frame.fixation_map.get_pixel(180, 180)[0], 128);
    }

    #[test]
    fn test_low_confidence_gaze_yields_no_fixation() {
        let catalog = catalog();
        let rows: Vec<(f64, f64, f64, f64, f64)> = (0..5)
            .map(|i| (i as f64 * 0.1, 10.0, 0.5, 0.5, 0.1))
            .collect();
        let logs = [LogInput::new(
            "01012023_120000_clip0_gaze.csv",
            log_text(LogLayout::Gaze, &rows),
        )];
        let config = SaliencyConfig {
            gaze_logs: true,
            dynamic_velocity_threshold: true,
            ..config()
        };
        let prepared = SaliencyPipeline::new(config, &catalog).prepare(&logs).unwrap();

        assert!(prepared.fixations().is_empty());
        assert_eq!(prepared.thresholds()[0].threshold, None);
        assert!(prepared.frames().all(|f| f.grid.total() == 0.0));
    }

    #[test]
    fn test_run_writes_maps_and_manifest() {
        let catalog = catalog();
        let base = tempfile::tempdir().unwrap();
        let config = SaliencyConfig {
            output_frame_width: 72,
            output_frame_height: 36,
            ..config()
        };

        let mut reported = Vec::new();
        let summary = SaliencyPipeline::new(config, &catalog)
            .run(&[still_head_log()], "Ocean Dive", base.path(), |p| {
                reported.push(p.percent_complete);
                ControlFlow::Continue(())
            })
            .unwrap();

        assert_eq!(summary.frames_written, 4);
        assert!(!summary.cancelled);
        assert_eq!(summary.fixations, 1);

        let dir_name = summary.output_dir.file_name().unwrap().to_string_lossy().into_owned();
        assert!(dir_name.starts_with("OceanDive_"));
        assert!(dir_name.ends_with("_1_users"));

        let data = summary.output_dir.join("headData");
        assert_eq!(count_files(&data.join("Fixations")), 4);
        assert_eq!(count_files(&data.join("Saliency")), 4);
        assert!(data
            .join("Fixations/FIX_startFrame_0_currFrame_2_of_3.PNG")
            .is_file());
        assert!(data
            .join("Saliency/SAL_startFrame_0_currFrame_3_of_3.bmp")
            .is_file());

        assert_eq!(reported.len(), 4);
        assert!((reported[3] - 100.0).abs() < 1e-9);

        let manifest = RunManifest::read(&summary.output_dir.join(MANIFEST_FILE)).unwrap();
        assert_eq!(manifest.run_id, summary.run_id);
        assert_eq!(manifest.frames_completed, 4);
        assert_eq!((manifest.width, manifest.height), (72, 36));
        assert_eq!(manifest.clip.title, "Ocean Dive");
        assert_eq!(manifest.fixations.len(), 1);
    }

    #[test]
    fn test_run_without_fixation_maps() {
        let catalog = catalog();
        let base = tempfile::tempdir().unwrap();
        let config = SaliencyConfig {
            output_frame_width: 72,
            output_frame_height: 36,
            output_fixation_maps: false,
            ..config()
        };

        let summary = SaliencyPipeline::new(config, &catalog)
            .run(&[still_head_log()], "clip", base.path(), |_| ControlFlow::Continue(()))
            .unwrap();

        let data = summary.output_dir.join("headData");
        assert!(!data.join("Fixations").exists());
        assert_eq!(count_files(&data.join("Saliency")), 4);
    }

    #[test]
    fn test_cancel_keeps_completed_frames() {
        let catalog = catalog();
        let base = tempfile::tempdir().unwrap();
        let config = SaliencyConfig {
            output_frame_width: 72,
            output_frame_height: 36,
            ..config()
        };

        let summary = SaliencyPipeline::new(config, &catalog)
            .run(&[still_head_log()], "clip", base.path(), |p| {
                if p.frames_completed >= 2 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();

        assert!(summary.cancelled);
        assert_eq!(summary.frames_written, 2);
        assert_eq!(count_files(&summary.output_dir.join("headData/Saliency")), 2);

        let manifest = RunManifest::read(&summary.output_dir.join(MANIFEST_FILE)).unwrap();
        assert!(manifest.cancelled);
        assert_eq!(manifest.frames_completed, 2);
    }

    #[test]
    fn test_uncovered_window_creates_nothing() {
        let catalog = catalog();
        let base = tempfile::tempdir().unwrap();
        let config = SaliencyConfig {
            seconds_to_consider: 2.0,
            ..config()
        };

        let err = SaliencyPipeline::new(config, &catalog)
            .run(&[still_head_log()], "clip", base.path(), |_| ControlFlow::Continue(()))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ConfigValidation);
        match err {
            SaliencyError::WindowNotCovered { log, logged_end, .. } => {
                assert_eq!(log, HEAD_LOG);
                assert_eq!(logged_end, 0.4);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(count_files(base.path()), 0);
    }

    #[test]
    fn test_frame_range_outside_clip() {
        let short = ClipTable::new(vec![
            ClipMetadata {
                frame_rate: 10.0,
                frame_count: 100,
                width: 720,
                height: 360,
            },
            ClipMetadata {
                frame_rate: 10.0,
                frame_count: 3,
                width: 720,
                height: 360,
            },
        ]);
        let base = tempfile::tempdir().unwrap();

        let err = SaliencyPipeline::new(config(), &short)
            .run(&[still_head_log()], "clip", base.path(), |_| ControlFlow::Continue(()))
            .unwrap_err();

        assert!(matches!(
            err,
            SaliencyError::FrameRangeOutOfBounds {
                clip: 1,
                end_frame: 3,
                frame_count: 3,
                ..
            }
        ));
        assert_eq!(count_files(base.path()), 0);
    }

    #[test]
    fn test_repeated_timestamp_splits_fixation() {
        let catalog = catalog();
        let rows = [
            (0.0, 10.0, 0.4, 0.5, 1.0),
            (0.1, 10.0, 0.4, 0.5, 1.0),
            (0.1, 10.0, 0.6, 0.5, 1.0),
            (0.2, 10.0, 0.6, 0.5, 1.0),
            (0.3, 10.0, 0.6, 0.5, 1.0),
            (0.4, 10.0, 0.6, 0.5, 1.0),
        ];
        let log = LogInput::new(HEAD_LOG, log_text(LogLayout::Head, &rows));
        let prepared = SaliencyPipeline::new(config(), &catalog)
            .prepare(&[log])
            .unwrap();

        // The zero-length pair (1, 2) is ineligible and ends the first fixation
        let fixations = prepared.fixations();
        assert_eq!(fixations.len(), 2);
        assert_eq!(fixations[0].start_time, 0.0);
        assert!((fixations[0].centroid.u - 0.4).abs() < 1e-12);
        assert_eq!(fixations[1].start_time, 0.1);
        assert!((fixations[1].centroid.u - 0.6).abs() < 1e-12);
        assert!((fixations[1].duration - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_parse_error_aborts_run() {
        let catalog = catalog();
        let mut log = still_head_log();
        log.contents = log.contents.replace("0.2;", "0.2x;");

        let err = SaliencyPipeline::new(config(), &catalog)
            .prepare(&[log])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_clip_identity_checks() {
        let catalog = catalog();
        let pipeline = SaliencyPipeline::new(config(), &catalog);

        assert!(matches!(pipeline.prepare(&[]), Err(SaliencyError::NoLogs)));

        let mut other = still_head_log();
        other.name = "24022022_111111_clip0_head.csv".to_string();
        assert!(matches!(
            pipeline.prepare(&[still_head_log(), other]),
            Err(SaliencyError::MixedClips { first: 1, other: 0, .. })
        ));

        let mut unknown = still_head_log();
        unknown.name = "24022022_101010_clip7_head.csv".to_string();
        assert!(matches!(
            pipeline.prepare(&[unknown]),
            Err(SaliencyError::UnknownClip(7))
        ));
    }

    #[test]
    fn test_invalid_config_rejected_before_parsing() {
        let catalog = catalog();
        let config = SaliencyConfig {
            confidence_threshold: 2.0,
            ..config()
        };
        let err = SaliencyPipeline::new(config, &catalog)
            .prepare(&[LogInput::new(HEAD_LOG, "garbage")])
            .unwrap_err();
        assert!(matches!(err, SaliencyError::InvalidConfig(_)));
    }

    #[test]
    fn test_log_input_read_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(HEAD_LOG);
        fs::write(&path, still_head_log().contents).unwrap();

        let input = LogInput::read(&path).unwrap();
        assert_eq!(input, still_head_log());
    }
}
