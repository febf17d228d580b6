// ------------------------------
// Streaming interface (generic)
// ------------------------------
//
// A token moves only on a tick where the producer has `valid` set and the
// consumer reports ready. Otherwise both sides hold.

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Stream<T> {
    pub data: T,
    pub valid: bool,
}

impl<T: Copy + Default> Stream<T> {
    #[inline(always)]
    pub fn valid(data: T) -> Self {
        Self { data, valid: true }
    }

    #[inline(always)]
    pub fn idle() -> Self {
        Self::default()
    }

    /// Transfer happens this tick.
    #[inline(always)]
    pub fn fires(&self, ready: bool) -> bool {
        self.valid & ready
    }
}
