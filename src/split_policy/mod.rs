pub mod midpoint_split;
pub mod weighted_split;

pub use midpoint_split::*;
pub use weighted_split::*;

use std::fmt::Debug;

use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, OPoint};

use crate::{
    misc::{FieldValue, FloatingPoint},
    primitive::Primitive,
    sampler::Sampler,
};

/// Chooses where a node is split, given the values sampled inside of it.
///
/// The returned point must lie within the primitive.
/// Policies are shared by every node of a tree, possibly across threads.
pub trait SplitPolicy<T: FloatingPoint, D: DimName, V: FieldValue>: Debug + Send + Sync
where
    DefaultAllocator: Allocator<D>,
{
    /// `values[i]` is the target function at `sampler.sample_point(primitive, i)`.
    fn split_point(
        &self,
        primitive: &Primitive<T, D>,
        sampler: &Sampler,
        values: &[V],
    ) -> OPoint<T, D>;
}
