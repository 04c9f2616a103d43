pub mod detectors;
pub mod error;
pub mod inputs;
pub mod io;
pub mod leads;
pub mod metrics;
pub mod plot;
pub mod signal;
pub mod synth;

pub use detectors::*;
pub use error::{EcgError, MeasurementError};
pub use inputs::{BloodPressure, PhysiologicalInputs, StressLevel};
pub use leads::LeadSpec;
pub use metrics::*;
pub use signal::*;
pub use synth::*;
