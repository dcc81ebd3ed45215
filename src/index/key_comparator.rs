use std::cmp::Ordering;

/// Total order over index keys, supplied by the caller when the tree is
/// built. All key comparisons inside the tree and its node pages go through
/// this trait.
pub trait KeyComparator: Send + Sync {
    fn compare(&self, a: u64, b: u64) -> Ordering;
}

/// Natural numeric order.
pub struct NumericComparator;

impl KeyComparator for NumericComparator {
    fn compare(&self, a: u64, b: u64) -> Ordering {
        a.cmp(&b)
    }
}
