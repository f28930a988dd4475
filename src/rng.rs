use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Generator owned by the engine and lent to every policy call.
pub type SimRng = StdRng;

pub fn seeded(seed: u64) -> SimRng {
    StdRng::seed_from_u64(seed)
}

pub fn chance<R: Rng + ?Sized>(rng: &mut R, probability: f32) -> bool {
    if probability <= 0.0 {
        return false;
    }
    if probability >= 1.0 {
        return true;
    }
    rng.random::<f32>() < probability
}

pub fn pick_index<R: Rng + ?Sized>(rng: &mut R, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    rng.random_range(0..len)
}
