//! Uniform random permutation of the mirror list.
//!
//! Spreads load across mirrors and avoids always hitting the same one first.
//! Takes the random source as a parameter so tests can pin the order.

use rand::seq::SliceRandom;
use rand::Rng;

/// Returns a uniformly shuffled copy of `items` (Fisher-Yates).
pub fn shuffled<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut out = items.to_vec();
    out.shuffle(rng);
    out
}
