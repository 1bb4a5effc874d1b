use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand::SeedableRng;

/// Builds the generator used for weight initialization and shuffling.
///
/// A fixed seed gives identical weights across runs; `None` seeds from OS entropy.
pub fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Xavier (Glorot) uniform initialization: samples from
/// `[-sqrt(6 / (fan_in + fan_out)), sqrt(6 / (fan_in + fan_out))]`.
///
/// Keeps the variance of activations and gradients roughly equal across layers.
pub fn xavier<R: Rng>(values: &mut [f32], fan_in: usize, fan_out: usize, rng: &mut R) {
    let limit = (6.0 / (fan_in + fan_out) as f32).sqrt();
    let dist = Uniform::new_inclusive(-limit, limit);
    values.iter_mut().for_each(|v| *v = dist.sample(rng));
}

/// Uniform values in `[-0.5, 0.5)`; used for biases.
pub fn randomize<R: Rng>(values: &mut [f32], rng: &mut R) {
    let dist = Uniform::new(-0.5f32, 0.5f32);
    values.iter_mut().for_each(|v| *v = dist.sample(rng));
}
