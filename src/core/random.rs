/// Random source capability used by expansion.

use rand::Rng;

/// Anything that can pick a uniformly random index.
pub trait RandomSource {
    /// Return an index in `0..len`. Callers never pass `len == 0`.
    fn pick_index(&mut self, len: usize) -> usize;
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn pick_index(&mut self, len: usize) -> usize {
        self.gen_range(0..len)
    }
}
