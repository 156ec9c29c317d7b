//! Resource name generation.
//!
//! The provider namespace is shared by every concurrently running test
//! scenario, so generated names carry a random suffix. A seeded generator is
//! available for reproducible output in tests and golden files.

use uuid::Uuid;

/// Produces resource names for random-with-prefix fixture values.
pub trait NameGenerator {
    /// Returns a fresh name starting with `prefix` followed by a dash.
    fn name_with_prefix(&mut self, prefix: &str) -> String;
}

impl<N: NameGenerator + ?Sized> NameGenerator for Box<N> {
    fn name_with_prefix(&mut self, prefix: &str) -> String {
        (**self).name_with_prefix(prefix)
    }
}

/// Generator backed by UUID v4 suffixes; unique across processes.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomNames;

impl NameGenerator for RandomNames {
    fn name_with_prefix(&mut self, prefix: &str) -> String {
        format!("{prefix}-{}", Uuid::new_v4().simple())
    }
}

/// Deterministic generator: the same seed yields the same name sequence.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SeededNames {
    state: u64,
}

impl SeededNames {
    /// Creates a generator starting from `seed`.
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    // splitmix64
    const fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

impl NameGenerator for SeededNames {
    fn name_with_prefix(&mut self, prefix: &str) -> String {
        let high = self.next_u64();
        let low = self.next_u64();
        format!("{prefix}-{}", Uuid::from_u64_pair(high, low).simple())
    }
}
