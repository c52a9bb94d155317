use nalgebra::{allocator::Allocator, DefaultAllocator, DimName};

use crate::{misc::FloatingPoint, primitive::Primitive};

use super::AABBox;

/// An object that can report its axis aligned extent.
pub trait Boundable<T: FloatingPoint, D: DimName>
where
    DefaultAllocator: Allocator<D>,
{
    fn bounding_box(&self) -> AABBox<T, D>;
}

impl<T: FloatingPoint, D: DimName> Boundable<T, D> for AABBox<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    fn bounding_box(&self) -> AABBox<T, D> {
        self.clone()
    }
}

impl<T: FloatingPoint, D: DimName> Boundable<T, D> for Primitive<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    fn bounding_box(&self) -> AABBox<T, D> {
        self.to_aabb()
    }
}
