//! Per-frame fixation aggregation
//!
//! Maps fixations onto the video frames they overlap and accumulates them
//! into a gaze-count grid the size of the output image. The grid is then
//! splatted into an 8-bit fixation map, one filled disk per non-empty cell.

use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

use crate::error::SaliencyError;
use crate::types::{Fixation, LogSeries, TimeWindow};

/// Inclusive frame range covered by an analysis window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRange {
    pub start: u64,
    pub end: u64,
}

impl FrameRange {
    /// `[floor(rate * start), floor(rate * (start + seconds))]`
    pub fn for_window(frame_rate: f64, window: TimeWindow) -> Self {
        Self {
            start: (frame_rate * window.start).floor() as u64,
            end: (frame_rate * window.end()).floor() as u64,
        }
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start) + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> {
        self.start..=self.end
    }

    /// Percent of the range completed once `frame` is done
    pub fn percent_complete(&self, frame: u64) -> f64 {
        if self.end == self.start {
            return 100.0;
        }
        (frame.saturating_sub(self.start) as f64 * 100.0) / (self.end - self.start) as f64
    }

    /// Fails unless both ends lie in `[0, frame_count)`
    pub fn validate(&self, clip: usize, frame_count: u64) -> Result<(), SaliencyError> {
        if self.start >= frame_count || self.end >= frame_count {
            return Err(SaliencyError::FrameRangeOutOfBounds {
                clip,
                start_frame: self.start,
                end_frame: self.end,
                frame_count,
            });
        }
        Ok(())
    }
}

/// Fails unless the log's recorded interval contains the whole window
///
/// The window end must fall strictly before the last sample so that every
/// sample in the window has an outgoing velocity.
pub fn validate_coverage(series: &LogSeries, window: TimeWindow) -> Result<(), SaliencyError> {
    let (logged_start, logged_end) = series.time_span().unwrap_or((f64::NAN, f64::NAN));

    if !(window.start >= logged_start && window.end() < logged_end) {
        return Err(SaliencyError::WindowNotCovered {
            log: series.name().to_string(),
            logged_start,
            logged_end,
            start: window.start,
            end: window.end(),
        });
    }
    Ok(())
}

/// Gaze counts for one output frame, indexed `[y * width + x]`
#[derive(Debug, Clone, PartialEq)]
pub struct FrameGazeGrid {
    width: u32,
    height: u32,
    cells: Vec<f32>,
}

impl FrameGazeGrid {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cells: vec![0.0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> f32 {
        self.cells[y as usize * self.width as usize + x as usize]
    }

    fn add(&mut self, x: u32, y: u32, amount: f32) {
        self.cells[y as usize * self.width as usize + x as usize] += amount;
    }

    /// Sum over all cells
    pub fn total(&self) -> f32 {
        self.cells.iter().sum()
    }

    pub fn non_empty_cells(&self) -> usize {
        self.cells.iter().filter(|&&c| c != 0.0).count()
    }
}

/// Accumulates fixations into per-frame grids
#[derive(Debug, Clone, Copy)]
pub struct FrameAggregator {
    frame_rate: f64,
    width: u32,
    height: u32,
    num_logs: usize,
}

impl FrameAggregator {
    pub fn new(frame_rate: f64, width: u32, height: u32, num_logs: usize) -> Self {
        Self {
            frame_rate,
            width,
            height,
            num_logs,
        }
    }

    /// Splat radius: one pixel per 720 px of width
    pub fn disk_radius(&self) -> u32 {
        (self.width as f64 / 720.0).round_ties_even() as u32
    }

    /// True when `[t, t + d]` meets frame `[f / rate, (f + 1) / rate)`.
    ///
    /// A fixation counts if it starts inside the frame, or started earlier
    /// and is still running after the frame begins.
    pub fn overlaps_frame(&self, fixation: &Fixation, frame: u64) -> bool {
        let frame_start = frame as f64 / self.frame_rate;
        let frame_end = (frame as f64 + 1.0) / self.frame_rate;
        let t = fixation.start_time;

        let starts_in_frame = t >= frame_start && t < frame_end;
        let spans_into_frame = t < frame_start && fixation.end_time() > frame_start;
        starts_in_frame || spans_into_frame
    }

    /// Pixel coordinates of a fixation centroid, wrapped into the image
    pub fn pixel_of(&self, fixation: &Fixation) -> (u32, u32) {
        let w = wrap_pixel(fixation.centroid.u, self.width);
        let h = wrap_pixel(fixation.centroid.v, self.height);
        (w, h)
    }

    /// Build the gaze-count grid for `frame`
    pub fn gaze_grid(&self, fixations: &[Fixation], frame: u64) -> FrameGazeGrid {
        let mut grid = FrameGazeGrid::new(self.width, self.height);
        if self.width == 0 || self.height == 0 {
            return grid;
        }
        let weight = 1.0 / self.num_logs.max(1) as f32;

        for fixation in fixations.iter().filter(|f| self.overlaps_frame(f, frame)) {
            let (w, h) = self.pixel_of(fixation);
            grid.add(w, h, weight);
        }
        grid
    }

    /// Paint every non-empty cell as a filled disk of its own intensity
    ///
    /// Cells are visited column by column; where disks overlap, the later
    /// cell wins.
    pub fn splat(&self, grid: &FrameGazeGrid) -> GrayImage {
        let (width, height) = (grid.width(), grid.height());
        let mut image = GrayImage::new(width, height);
        let radius = self.disk_radius() as i64;

        for x in 0..width {
            for y in 0..height {
                let count = grid.get(x, y);
                if count == 0.0 {
                    continue;
                }
                let intensity = Luma([to_intensity(count)]);

                for dx in -radius..=radius {
                    for dy in -radius..=radius {
                        if dx * dx + dy * dy > radius * radius {
                            continue;
                        }
                        let px = x as i64 + dx;
                        let py = y as i64 + dy;
                        if px >= 0 && px < width as i64 && py >= 0 && py < height as i64 {
                            image.put_pixel(px as u32, py as u32, intensity);
                        }
                    }
                }
            }
        }
        image
    }
}

fn wrap_pixel(coord: f64, size: u32) -> u32 {
    let scaled = (coord * size as f64).round_ties_even() as i64;
    scaled.rem_euclid(size as i64) as u32
}

fn to_intensity(count: f32) -> u8 {
    (count.clamp(0.0, 1.0) * 255.0).round() as u8
}
