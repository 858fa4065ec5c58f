//! Unified error hierarchy for trainload
//!
//! Each subsystem owns a `thiserror` enum; [`TrainLoadError`] wraps them so
//! callers can classify any failure by severity and retryability.

use crate::advice::AdviceError;
use crate::export::ExportError;
use crate::import::ImportError;
use crate::load_model::LoadModelError;
use crate::stress::StressError;
use thiserror::Error;

/// Top-level error type for all trainload operations
#[derive(Debug, Error)]
pub enum TrainLoadError {
    /// Load model input or parameter errors
    #[error("Load model error: {0}")]
    LoadModel(#[from] LoadModelError),

    /// Stress scoring errors
    #[error("Stress scoring error: {0}")]
    Stress(#[from] StressError),

    /// Activity import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Advice generation errors
    #[error("Advice error: {0}")]
    Advice(#[from] AdviceError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for trainload operations
pub type Result<T> = std::result::Result<T, TrainLoadError>;

impl TrainLoadError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            TrainLoadError::Advice(err) => err.is_retryable(),
            TrainLoadError::Io(_) => true,
            _ => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TrainLoadError::Advice(AdviceError::RateLimited { .. }) => ErrorSeverity::Warning,
            TrainLoadError::Advice(AdviceError::EmptyHistory) => ErrorSeverity::Info,
            TrainLoadError::LoadModel(LoadModelError::DuplicateObservation { .. }) => {
                ErrorSeverity::Warning
            }
            TrainLoadError::LoadModel(_) => ErrorSeverity::Error,
            TrainLoadError::Import(ImportError::UnsupportedFormat { .. }) => ErrorSeverity::Warning,
            TrainLoadError::Configuration(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            TrainLoadError::LoadModel(LoadModelError::InvalidRange { start, end }) => {
                format!("The start date {} is after the end date {}.", start, end)
            }
            TrainLoadError::LoadModel(LoadModelError::DuplicateObservation { date }) => {
                format!(
                    "Two stress values were supplied for {}. Combine same-day activities first.",
                    date
                )
            }
            TrainLoadError::Import(ImportError::UnsupportedFormat { path }) => {
                format!(
                    "Don't know how to read {}. Use a CSV or JSON activity export.",
                    path.display()
                )
            }
            TrainLoadError::Advice(AdviceError::RateLimited { .. }) => {
                "Coach is resting (rate limit hit). Try again later.".to_string()
            }
            TrainLoadError::Advice(AdviceError::AllModelsFailed { .. }) => {
                format!("Coach offline: {}", self)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Broken setup that stops every command
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}
