//! gaze-saliency - Fixation detection and saliency maps for 360° video viewing logs
//!
//! Turns head rotation or eye gaze logs recorded while watching an
//! equirectangular video into per-frame fixation and saliency maps through a
//! deterministic pipeline: log parsing → angular velocity → I-VT fixation
//! classification → per-frame aggregation → anisotropic Gaussian smoothing.
//!
//! ## Modules
//!
//! - **Stages**: `log`, `velocity`, `fixation`, `aggregator`, `renderer`
//! - **Orchestration**: `pipeline` drives a run, `output` persists it
//! - **Inputs**: `config` for run settings, `catalog` for clip metadata

pub mod aggregator;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fixation;
pub mod log;
pub mod output;
pub mod pipeline;
pub mod renderer;
pub mod types;
pub mod velocity;

pub use catalog::{ClipCatalog, ClipMetadata, ClipTable, TitleList};
pub use config::SaliencyConfig;
pub use error::{ErrorKind, SaliencyError};
pub use fixation::{IvtClassifier, ThresholdPolicy};
pub use pipeline::{LogInput, PreparedRun, Progress, RunSummary, SaliencyPipeline};
pub use types::{Fixation, LogLayout, LogSample, LogSeries};

/// Crate version recorded in every run manifest
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name recorded in every run manifest
pub const PRODUCER_NAME: &str = "gaze-saliency";
