pub mod ecg;
pub mod intervals;

pub use ecg::*;
pub use intervals::*;
