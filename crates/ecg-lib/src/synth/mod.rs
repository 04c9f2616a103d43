pub mod assembler;
pub mod schedule;
pub mod waveform;

pub use assembler::*;
pub use schedule::*;
pub use waveform::*;

use rand::Rng;
use rand_distr::StandardNormal;

/// Zero-mean Gaussian draw with standard deviation `sd`.
pub(crate) fn gaussian<R: Rng + ?Sized>(rng: &mut R, sd: f64) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    sd * z
}
