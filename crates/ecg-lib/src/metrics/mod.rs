pub mod hrv;
pub mod report;
pub mod sqi;
pub mod stats;

pub use hrv::*;
pub use report::*;
pub use sqi::*;
