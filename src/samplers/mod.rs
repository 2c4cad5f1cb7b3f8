//! Defines the `Sampler` trait - an object that can randomly sample from a `Model`.

use crate::variable::Assignment;

use rand::Rng;

pub mod forward;

pub use self::forward::ForwardSampler;

pub trait Sampler {

    /// Draw a full assignment from the associated `Model`, using `rng` as the source of randomness
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Assignment;

}
