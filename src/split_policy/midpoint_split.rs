use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, OPoint};

use crate::{
    misc::{FieldValue, FloatingPoint},
    primitive::Primitive,
    sampler::Sampler,
};

use super::SplitPolicy;

/// Always splits at the geometric center.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MidpointSplit;

impl<T: FloatingPoint, D: DimName, V: FieldValue> SplitPolicy<T, D, V> for MidpointSplit
where
    DefaultAllocator: Allocator<D>,
{
    fn split_point(&self, primitive: &Primitive<T, D>, _: &Sampler, _: &[V]) -> OPoint<T, D> {
        primitive.center()
    }
}
