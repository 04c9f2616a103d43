use thiserror::Error;

/// Failures that abort a whole synthesis or analysis call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EcgError {
    #[error("duration must be at least one second, got {0} s")]
    InvalidDuration(u32),
    #[error("non-finite amplitude at sample {index}")]
    NonFiniteSample { index: usize },
    #[error("no samples to analyse")]
    EmptySignal,
}

/// Failure measuring the intervals of a single beat. Never aborts a batch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MeasurementError {
    #[error("R-peak index {index} outside signal of {len} samples")]
    PeakOutOfRange { index: usize, len: usize },
    #[error("amplitude column has {amplitudes} samples but time column has {times}")]
    LengthMismatch { amplitudes: usize, times: usize },
}
