// Library interface for trainload modules
// This allows integration tests and benches to access the core functionality

pub mod advice;
pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod load_model;
pub mod logging;
pub mod models;
pub mod stress;
pub mod summary;
pub mod windows;

// Re-export commonly used types for convenience
pub use models::*;
pub use load_model::{
    classify_ratio, compute_series, FormInterpretation, LoadModel, LoadModelConfig,
    LoadModelError, LoadSnapshot, RatioStatus, SeriesRequest,
};
pub use stress::{HeartRateProfile, StressScorer, TrimpWeighting};
pub use summary::{ActivityCategory, ActivitySummary, ProjectTargets, VolumeTrend, YearTotals};
pub use windows::LookbackWindow;
pub use error::{Result, TrainLoadError};
pub use logging::{LogConfig, LogFormat, LogLevel};
