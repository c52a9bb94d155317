use std::sync::atomic::{AtomicUsize, Ordering};

use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, OPoint};

use crate::misc::{FieldValue, FloatingPoint};

/// Counts target function calls, safe to share between parallel subtrees.
#[derive(Debug, Default)]
pub struct EvaluationCounter(AtomicUsize);

impl EvaluationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }

    fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

/// Wrap a target function so every call is recorded by `counter`.
/// # Example
/// ```
/// use nalgebra::{Point2, U2};
/// use spacetree::prelude::{counted, EvaluationCounter};
/// let counter = EvaluationCounter::new();
/// let f = counted::<f64, U2, f64, _>(|p| p.x, &counter);
/// f(&Point2::new(1., 2.));
/// f(&Point2::new(3., 4.));
/// assert_eq!(counter.count(), 2);
/// ```
pub fn counted<'a, T, D, V, F>(
    f: F,
    counter: &'a EvaluationCounter,
) -> impl Fn(&OPoint<T, D>) -> V + Sync + 'a
where
    T: FloatingPoint,
    D: DimName,
    V: FieldValue,
    F: Fn(&OPoint<T, D>) -> V + Sync + 'a,
    DefaultAllocator: Allocator<D>,
{
    move |p: &OPoint<T, D>| {
        counter.increment();
        f(p)
    }
}
