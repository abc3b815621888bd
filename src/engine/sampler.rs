use rand::seq::SliceRandom;
use rand::Rng;

pub const MAX_SESSION_SIZE: usize = 15;

/// Uniform sample without replacement, in random order, of at most `cap` items.
///
/// Shuffles with Fisher-Yates and truncates, so every permutation of the pool is
/// equally likely before the cut.
pub fn sample<T: Clone, R: Rng + ?Sized>(pool: &[T], cap: usize, rng: &mut R) -> Vec<T> {
    let mut picked = pool.to_vec();
    picked.shuffle(rng);
    picked.truncate(cap);
    picked
}
