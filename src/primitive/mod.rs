pub mod cell;
pub use cell::*;

use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, OPoint, OVector};

use crate::{
    bounding_box::AABBox,
    error::SpaceTreeError,
    misc::{FloatingPoint, IndexConverter},
};

/// An axis aligned shape in D space, closed on every face.
///
/// A cube has one edge length shared by all axes, a box has one length per axis.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(
        serialize = "T: serde::Serialize, OPoint<T, D>: serde::Serialize, OVector<T, D>: serde::Serialize",
        deserialize = "T: serde::Deserialize<'de>, OPoint<T, D>: serde::Deserialize<'de>, OVector<T, D>: serde::Deserialize<'de>"
    ))
)]
pub enum Primitive<T: FloatingPoint, D: DimName>
where
    DefaultAllocator: Allocator<D>,
{
    Cube { base: OPoint<T, D>, length: T },
    Box { base: OPoint<T, D>, lengths: OVector<T, D> },
}

impl<T: FloatingPoint, D: DimName> Primitive<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    /// Create a cube from its lower corner and edge length.
    pub fn cube(base: OPoint<T, D>, length: T) -> anyhow::Result<Self> {
        if length < T::zero() || !length.is_finite() {
            return Err(SpaceTreeError::Geometry(format!(
                "cube length must be finite and non-negative, got {:?}",
                length
            ))
            .into());
        }
        Ok(Self::Cube { base, length })
    }

    /// Create a box from its lower corner and per-axis lengths.
    /// # Examples
    /// ```
    /// use nalgebra::{Point2, Vector2};
    /// use spacetree::prelude::Primitive;
    /// let b = Primitive::boxed(Point2::new(0., 0.), Vector2::new(2., 1.)).unwrap();
    /// assert!(b.evaluate(&Point2::new(2., 1.)));
    /// assert!(Primitive::boxed(Point2::new(0., 0.), Vector2::new(-1., 1.)).is_err());
    /// ```
    pub fn boxed(base: OPoint<T, D>, lengths: OVector<T, D>) -> anyhow::Result<Self> {
        ensure_lengths(&lengths)?;
        Ok(Self::Box { base, lengths })
    }

    /// Lower corner
    pub fn base(&self) -> &OPoint<T, D> {
        match self {
            Self::Cube { base, .. } | Self::Box { base, .. } => base,
        }
    }

    /// Per-axis lengths, a cube repeats its edge length
    pub fn lengths(&self) -> OVector<T, D> {
        match self {
            Self::Cube { length, .. } => OVector::<T, D>::from_element(*length),
            Self::Box { lengths, .. } => lengths.clone(),
        }
    }

    /// Upper corner
    pub fn max(&self) -> OPoint<T, D> {
        self.base() + self.lengths()
    }

    pub fn center(&self) -> OPoint<T, D> {
        self.base() + self.lengths() * T::constant(0.5)
    }

    pub fn volume(&self) -> T {
        self.lengths().iter().fold(T::one(), |acc, l| acc * *l)
    }

    pub fn is_cube(&self) -> bool {
        matches!(self, Self::Cube { .. })
    }

    /// Check if the point lies within the primitive, faces included.
    pub fn evaluate(&self, point: &OPoint<T, D>) -> bool {
        let base = self.base();
        let max = self.max();
        (0..D::dim()).all(|i| base[i] <= point[i] && point[i] <= max[i])
    }

    /// Split the primitive into `2^D` children.
    ///
    /// A cube always splits at its center into equal cubes and ignores `point`.
    /// A box splits at `point`, which must lie inside of it,
    /// and its children tile the parent without overlap.
    /// Child `i` covers the upper part of axis `j` iff bit `j` of `i` is set.
    pub fn split(&self, point: &OPoint<T, D>) -> anyhow::Result<Vec<Self>> {
        match self {
            Self::Cube { base, length } => {
                let half = *length * T::constant(0.5);
                let center = self.center();
                Ok(tile(base, &self.max(), &center)
                    .into_iter()
                    .map(|(base, _)| Self::Cube { base, length: half })
                    .collect())
            }
            Self::Box { base, .. } => {
                if !self.evaluate(point) {
                    return Err(SpaceTreeError::Geometry(format!(
                        "split point {:?} lies outside of the box [{:?}, {:?}]",
                        point.coords.as_slice(),
                        base.coords.as_slice(),
                        self.max().coords.as_slice()
                    ))
                    .into());
                }
                Ok(tile(base, &self.max(), point)
                    .into_iter()
                    .map(|(base, lengths)| Self::Box { base, lengths })
                    .collect())
            }
        }
    }

    /// The extent of the primitive as a bounding box.
    pub fn to_aabb(&self) -> AABBox<T, D> {
        AABBox::from_parts(self.base().clone(), self.lengths())
    }
}

/// Reject negative or NaN lengths.
pub(crate) fn ensure_lengths<T: FloatingPoint, D: DimName>(
    lengths: &OVector<T, D>,
) -> anyhow::Result<()>
where
    DefaultAllocator: Allocator<D>,
{
    if lengths.iter().all(|l| *l >= T::zero() && l.is_finite()) {
        Ok(())
    } else {
        Err(SpaceTreeError::Geometry(format!(
            "lengths must be finite and non-negative, got {:?}",
            lengths.as_slice()
        ))
        .into())
    }
}

/// Tile the extent `[base, max]` into `2^D` parts meeting at `point`.
/// Returns `(base, lengths)` per part in split order.
pub(crate) fn tile<T: FloatingPoint, D: DimName>(
    base: &OPoint<T, D>,
    max: &OPoint<T, D>,
    point: &OPoint<T, D>,
) -> Vec<(OPoint<T, D>, OVector<T, D>)>
where
    DefaultAllocator: Allocator<D>,
{
    let converter = IndexConverter::binary(D::dim());
    (0..converter.size())
        .map(|index| {
            let mut child_base = base.clone();
            let mut lengths = OVector::<T, D>::zeros();
            for (axis, upper) in converter.digits(index).enumerate() {
                if upper == 0 {
                    lengths[axis] = point[axis] - base[axis];
                } else {
                    child_base[axis] = point[axis];
                    lengths[axis] = max[axis] - point[axis];
                }
            }
            (child_base, lengths)
        })
        .collect()
}

impl<T: FloatingPoint, D: DimName> From<AABBox<T, D>> for Primitive<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    fn from(value: AABBox<T, D>) -> Self {
        Self::Box {
            base: value.base().clone(),
            lengths: value.lengths().clone(),
        }
    }
}
