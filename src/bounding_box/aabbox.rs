use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, OPoint, OVector};
use simba::scalar::SupersetOf;

use crate::{
    error::SpaceTreeError,
    misc::FloatingPoint,
    primitive::{ensure_lengths, tile},
};

/// An axis aligned bounding box in D space, stored as lower corner and per-axis lengths.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(bound(
        serialize = "OPoint<T, D>: serde::Serialize, OVector<T, D>: serde::Serialize",
        deserialize = "OPoint<T, D>: serde::Deserialize<'de>, OVector<T, D>: serde::Deserialize<'de>"
    ))
)]
pub struct AABBox<T: FloatingPoint, D: DimName>
where
    DefaultAllocator: Allocator<D>,
{
    base: OPoint<T, D>,
    lengths: OVector<T, D>,
}

impl<T: FloatingPoint, D: DimName> AABBox<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    /// Create a new bounding box from its lower corner and per-axis lengths.
    pub fn new(base: OPoint<T, D>, lengths: OVector<T, D>) -> anyhow::Result<Self> {
        ensure_lengths(&lengths)?;
        Ok(Self { base, lengths })
    }

    pub(crate) fn from_parts(base: OPoint<T, D>, lengths: OVector<T, D>) -> Self {
        Self { base, lengths }
    }

    /// Create a new bounding box spanning two corners given in any order.
    pub fn from_corners(a: &OPoint<T, D>, b: &OPoint<T, D>) -> Self {
        let mut base = a.clone();
        let mut lengths = OVector::<T, D>::zeros();
        for i in 0..D::dim() {
            base[i] = a[i].min(b[i]);
            lengths[i] = a[i].max(b[i]) - base[i];
        }
        Self { base, lengths }
    }

    pub fn base(&self) -> &OPoint<T, D> {
        &self.base
    }

    pub fn lengths(&self) -> &OVector<T, D> {
        &self.lengths
    }

    /// Upper corner
    pub fn max(&self) -> OPoint<T, D> {
        &self.base + &self.lengths
    }

    pub fn center(&self) -> OPoint<T, D> {
        &self.base + &self.lengths * T::constant(0.5)
    }

    pub fn volume(&self) -> T {
        self.lengths.iter().fold(T::one(), |acc, l| acc * *l)
    }

    /// Check if every point of `other` lies within this box, faces included.
    /// # Examples
    /// ```
    /// use nalgebra::{Point2, Vector2};
    /// use spacetree::prelude::AABBox;
    /// let unit = AABBox::new(Point2::new(0., 0.), Vector2::new(1., 1.)).unwrap();
    /// let small = AABBox::new(Point2::new(0.45, 0.45), Vector2::new(0.1, 0.1)).unwrap();
    /// assert!(unit.contains(&small));
    /// assert!(unit.contains(&unit));
    /// assert!(!small.contains(&unit));
    /// ```
    pub fn contains(&self, other: &Self) -> bool {
        let max = self.max();
        let other_max = other.max();
        (0..D::dim()).all(|i| other.base[i] >= self.base[i] && other_max[i] <= max[i])
    }

    /// Check if the point lies within this box, faces included.
    pub fn contains_point(&self, point: &OPoint<T, D>) -> bool {
        let max = self.max();
        (0..D::dim()).all(|i| self.base[i] <= point[i] && point[i] <= max[i])
    }

    /// Check if `other` partially overlaps this box.
    ///
    /// The overlap must have a non-empty interior along every axis and `other` must not be contained,
    /// so boxes that only touch are neither contained nor intersecting.
    /// # Examples
    /// ```
    /// use nalgebra::{Point2, Vector2};
    /// use spacetree::prelude::AABBox;
    /// let unit = AABBox::new(Point2::new(0., 0.), Vector2::new(1., 1.)).unwrap();
    /// let crossing = AABBox::new(Point2::new(0.95, 0.45), Vector2::new(0.1, 0.1)).unwrap();
    /// let touching = AABBox::new(Point2::new(1., 0.45), Vector2::new(0.1, 0.1)).unwrap();
    /// assert!(unit.intersects(&crossing));
    /// assert!(!unit.intersects(&touching));
    /// assert!(!unit.contains(&touching));
    /// ```
    pub fn intersects(&self, other: &Self) -> bool {
        let max = self.max();
        let other_max = other.max();
        let overlapping = (0..D::dim()).all(|i| other.base[i] < max[i] && other_max[i] > self.base[i]);
        overlapping && !self.contains(other)
    }

    /// Check if the closed boxes share at least one point.
    pub fn overlaps(&self, other: &Self) -> bool {
        let max = self.max();
        let other_max = other.max();
        (0..D::dim()).all(|i| other.base[i] <= max[i] && other_max[i] >= self.base[i])
    }

    /// Grow this box to the smallest box covering both boxes.
    pub fn include(&mut self, other: &Self) {
        let max = self.max();
        let other_max = other.max();
        for i in 0..D::dim() {
            let lo = self.base[i].min(other.base[i]);
            let hi = max[i].max(other_max[i]);
            self.base[i] = lo;
            self.lengths[i] = hi - lo;
        }
    }

    /// The closed region shared by both boxes, if any.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.overlaps(other) {
            return None;
        }
        let max = self.max();
        let other_max = other.max();
        let mut base = self.base.clone();
        let mut lengths = OVector::<T, D>::zeros();
        for i in 0..D::dim() {
            base[i] = self.base[i].max(other.base[i]);
            lengths[i] = max[i].min(other_max[i]) - base[i];
        }
        Some(Self { base, lengths })
    }

    /// Set every length to zero, keeping the lower corner.
    pub fn collapse(&mut self) {
        self.lengths = OVector::<T, D>::zeros();
    }

    /// Split into `2^D` boxes tiling this one, meeting at `point`.
    pub fn split(&self, point: &OPoint<T, D>) -> anyhow::Result<Vec<Self>> {
        if !self.contains_point(point) {
            return Err(SpaceTreeError::Geometry(format!(
                "split point {:?} lies outside of the bounding box",
                point.coords.as_slice()
            ))
            .into());
        }
        Ok(self.tiles(point))
    }

    pub(crate) fn tiles(&self, point: &OPoint<T, D>) -> Vec<Self> {
        tile(&self.base, &self.max(), point)
            .into_iter()
            .map(|(base, lengths)| Self { base, lengths })
            .collect()
    }

    /// Cast the bounding box to another floating point type
    pub fn cast<F: FloatingPoint + SupersetOf<T>>(&self) -> AABBox<F, D> {
        AABBox {
            base: self.base.clone().cast(),
            lengths: self.lengths.clone().cast(),
        }
    }
}

impl<T: FloatingPoint, D: DimName> FromIterator<OPoint<T, D>> for AABBox<T, D>
where
    DefaultAllocator: Allocator<D>,
{
    /// Smallest box covering every point. An empty iterator yields an empty box at the origin.
    fn from_iter<I: IntoIterator<Item = OPoint<T, D>>>(iter: I) -> Self {
        let mut points = iter.into_iter();
        let Some(first) = points.next() else {
            return Self::from_parts(OPoint::origin(), OVector::<T, D>::zeros());
        };
        let mut aabb = Self::from_corners(&first, &first);
        for p in points {
            aabb.include(&Self::from_corners(&p, &p));
        }
        aabb
    }
}
