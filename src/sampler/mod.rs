use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, OPoint};

use crate::{
    error::SpaceTreeError,
    misc::{FloatingPoint, IndexConverter},
    primitive::Primitive,
};

/// Enumerates sample points inside a primitive on a regular grid.
///
/// With `k` points per dimension the samples lie at `base + length * c / (k - 1)`
/// for every grid coordinate `c` in `0..k`, faces included.
/// A single point per dimension samples the center only.
/// Sizing fails in a dimension where `k^D` overflows a `usize`.
/// # Example
/// ```
/// use nalgebra::{Point2, U2};
/// use spacetree::prelude::{Primitive, Sampler};
/// let cube = Primitive::cube(Point2::new(0., 0.), 2.).unwrap();
/// let sampler = Sampler::new(3).unwrap();
/// assert_eq!(sampler.size::<U2>().unwrap(), 9);
/// assert_eq!(sampler.sample_point(&cube, 5).unwrap(), Point2::new(2., 1.));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sampler {
    points_per_dim: usize,
}

impl Sampler {
    pub fn new(points_per_dim: usize) -> anyhow::Result<Self> {
        if points_per_dim == 0 {
            return Err(SpaceTreeError::Geometry(
                "a sampler needs at least one point per dimension".to_string(),
            )
            .into());
        }
        Ok(Self { points_per_dim })
    }

    /// Sample the center of the primitive only
    pub fn center() -> Self {
        Self { points_per_dim: 1 }
    }

    pub fn points_per_dim(&self) -> usize {
        self.points_per_dim
    }

    /// Number of sample points in D space
    pub fn size<D: DimName>(&self) -> anyhow::Result<usize> {
        Ok(self.converter::<D>()?.size())
    }

    /// Index layout of the samples in D space
    pub fn converter<D: DimName>(&self) -> anyhow::Result<IndexConverter> {
        IndexConverter::new(self.points_per_dim, D::dim())
    }

    /// Get the sample point at `index`
    pub fn sample_point<T: FloatingPoint, D: DimName>(
        &self,
        primitive: &Primitive<T, D>,
        index: usize,
    ) -> anyhow::Result<OPoint<T, D>>
    where
        DefaultAllocator: Allocator<D>,
    {
        let converter = self.converter::<D>()?;
        let size = converter.size();
        if index >= size {
            return Err(SpaceTreeError::OutOfRange { index, size }.into());
        }
        Ok(self.point_at(&converter, primitive, index))
    }

    /// Every sample point in index order
    pub fn sample_points<'a, T: FloatingPoint, D: DimName>(
        &'a self,
        primitive: &'a Primitive<T, D>,
    ) -> anyhow::Result<impl Iterator<Item = OPoint<T, D>> + 'a>
    where
        DefaultAllocator: Allocator<D>,
    {
        let converter = self.converter::<D>()?;
        Ok((0..converter.size()).map(move |index| self.point_at(&converter, primitive, index)))
    }

    fn point_at<T: FloatingPoint, D: DimName>(
        &self,
        converter: &IndexConverter,
        primitive: &Primitive<T, D>,
        index: usize,
    ) -> OPoint<T, D>
    where
        DefaultAllocator: Allocator<D>,
    {
        if self.points_per_dim == 1 {
            return primitive.center();
        }

        let base = primitive.base();
        let lengths = primitive.lengths();
        let denom = (self.points_per_dim - 1) as f64;
        let mut point = base.clone();
        for (axis, c) in converter.digits(index).enumerate() {
            point[axis] = base[axis] + lengths[axis] * T::constant(c as f64 / denom);
        }
        point
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::center()
    }
}
