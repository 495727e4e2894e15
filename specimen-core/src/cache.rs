//! Memoized materialization of integer ranges.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A memoizing cache of materialized integer ranges.
///
/// Cloning the cache yields another handle onto the same store, so one
/// cache can back many templates. Equal bounds always return a clone of
/// the *same* underlying allocation (`Rc::ptr_eq` holds), which keeps
/// heavily-reused ranges cheap across many generator invocations.
/// Entries are never evicted.
#[derive(Debug, Clone, Default)]
pub struct RangeCache {
    store: Rc<RefCell<HashMap<(i64, i64), Rc<Vec<i64>>>>>,
}

impl RangeCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        RangeCache::default()
    }

    /// Materialize the inclusive range `[low, high]`.
    ///
    /// An inverted range materializes as an empty sequence.
    pub fn materialize(&self, low: i64, high: i64) -> Rc<Vec<i64>> {
        let mut store = self.store.borrow_mut();
        store
            .entry((low, high))
            .or_insert_with(|| Rc::new((low..=high).collect()))
            .clone()
    }

    /// Number of distinct ranges materialized so far.
    pub fn len(&self) -> usize {
        self.store.borrow().len()
    }

    /// True when no range has been materialized yet.
    pub fn is_empty(&self) -> bool {
        self.store.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_bounds_share_one_allocation() {
        let cache = RangeCache::new();
        let first = cache.materialize(1, 3);
        let second = cache.materialize(1, 3);
        assert!(Rc::ptr_eq(&first, &second));

        let wider = cache.materialize(1, 4);
        assert!(!Rc::ptr_eq(&first, &wider));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn materialized_contents_are_inclusive() {
        let cache = RangeCache::new();
        assert_eq!(*cache.materialize(1, 3), vec![1, 2, 3]);
        assert_eq!(*cache.materialize(-2, 1), vec![-2, -1, 0, 1]);
        assert_eq!(*cache.materialize(5, 5), vec![5]);
    }

    #[test]
    fn inverted_bounds_materialize_empty() {
        let cache = RangeCache::new();
        assert!(cache.materialize(3, 1).is_empty());
    }

    #[test]
    fn clones_share_the_store() {
        let cache = RangeCache::new();
        let handle = cache.clone();
        let first = cache.materialize(0, 9);
        let second = handle.materialize(0, 9);
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(handle.len(), 1);
    }
}
