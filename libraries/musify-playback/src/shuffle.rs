//! Shuffle index selection
//!
//! Shuffle never reorders the queue. It only changes which index "next"
//! lands on, so turning shuffle off resumes sequential order from wherever
//! playback currently is.

use rand::seq::IteratorRandom;
use rand::Rng;
use std::collections::HashSet;

/// Uniform pick among `0..len`, excluding `current`
///
/// Returns `None` when there is no other index to pick.
pub fn pick_other<R: Rng + ?Sized>(len: usize, current: usize, rng: &mut R) -> Option<usize> {
    (0..len).filter(|&index| index != current).choose(rng)
}

/// Uniform pick among indices in `0..len` not yet visited this pass
///
/// Returns `None` once every index has been visited.
pub fn pick_unvisited<R: Rng + ?Sized>(
    len: usize,
    visited: &HashSet<usize>,
    rng: &mut R,
) -> Option<usize> {
    (0..len).filter(|index| !visited.contains(index)).choose(rng)
}
