//! Common utilities module
//!
//! This module contains shared utilities used across the NDVI pipeline.

pub mod error;
pub mod timing;

pub use error::{AnalysisError, Result};
pub use timing::{PipelineTimings, StepTiming, Timer};
