//! Uniform sampling from containers whose length is known but which need not be randomly
//! indexable, such as the members of a compartment.

use rand::seq::index::sample as choose_range;
use rand::Rng;

/// Sample `requested` elements uniformly without replacement from a container of known
/// length, preserving their iteration order. If more are requested than available, every
/// element is returned.
pub fn sample_multiple_from_known_length<I, R, T>(rng: &mut R, iter: I, requested: usize) -> Vec<T>
where
    R: Rng,
    I: ExactSizeIterator<Item = T>,
{
    let len = iter.len();
    if requested >= len {
        return iter.collect();
    }
    if requested == 0 {
        return Vec::new();
    }

    let mut indexes = choose_range(rng, len, requested).into_vec();
    indexes.sort_unstable();
    let mut wanted = indexes.into_iter().peekable();
    let mut selected = Vec::with_capacity(requested);

    for (idx, item) in iter.enumerate() {
        match wanted.peek() {
            Some(&next) if next == idx => {
                selected.push(item);
                wanted.next();
            }
            Some(_) => {}
            None => break,
        }
    }

    selected
}
