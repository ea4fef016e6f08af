//! Random pair selection for head-to-head comparisons.

use rand::{Rng, seq::SliceRandom};

/// Draw two distinct elements uniformly at random, without replacement.
///
/// Runs two steps of a Fisher–Yates shuffle, so every unordered pair is
/// equally likely. Returns `None` when fewer than two elements exist.
pub fn pick_two<T, R>(items: &mut [T], rng: &mut R) -> Option<(T, T)>
where
  T: Clone,
  R: Rng + ?Sized,
{
  if items.len() < 2 {
    return None;
  }
  let (picked, _) = items.partial_shuffle(rng, 2);
  match picked {
    [a, b] => Some((a.clone(), b.clone())),
    _ => None,
  }
}
