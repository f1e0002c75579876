//! RNG construction for generators, using ChaCha8.
//!
//! Same seed -> same cases, always. The entropy-seeded source is only for
//! callers that do not need reproducibility.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Create a deterministic RNG for a generator seed.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Derive an independent stream from a base seed, one per generation attempt.
pub fn stream_rng(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

/// Create a non-reproducible RNG seeded from system entropy.
pub fn entropy_rng() -> ChaCha8Rng {
    ChaCha8Rng::from_entropy()
}
