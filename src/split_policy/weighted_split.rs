use nalgebra::{allocator::Allocator, DefaultAllocator, DimName, OPoint};

use crate::{
    misc::{FieldValue, FloatingPoint},
    primitive::Primitive,
    sampler::Sampler,
};

use super::SplitPolicy;

/// Splits near the surface crossings found between neighbouring samples.
///
/// Along each axis every pair of adjacent samples with differing sides contributes
/// the linearly interpolated zero crossing, and the crossings are averaged.
/// Axes without crossings, boolean fields and single sample grids fall back to the midpoint.
/// The result keeps a relative `margin` away from the faces so children never degenerate.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightedSplit {
    margin: f64,
}

impl WeightedSplit {
    /// `margin` is a fraction of each axis length, clamped to `[0, 0.5]`.
    pub fn new(margin: f64) -> Self {
        Self {
            margin: if margin.is_nan() {
                0.
            } else {
                margin.clamp(0., 0.5)
            },
        }
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }
}

impl Default for WeightedSplit {
    fn default() -> Self {
        Self::new(0.1)
    }
}

/// Fraction of the way from `a` to `b` where the field changes side.
fn crossing<V: FieldValue>(a: &V, b: &V) -> Option<f64> {
    if a.is_inside() == b.is_inside() {
        return None;
    }
    let (ma, mb) = (a.magnitude()?, b.magnitude()?);
    let sum = ma + mb;
    if sum > 0. && sum.is_finite() {
        Some(ma / sum)
    } else {
        Some(0.5)
    }
}

impl<T: FloatingPoint, D: DimName, V: FieldValue> SplitPolicy<T, D, V> for WeightedSplit
where
    DefaultAllocator: Allocator<D>,
{
    fn split_point(
        &self,
        primitive: &Primitive<T, D>,
        sampler: &Sampler,
        values: &[V],
    ) -> OPoint<T, D> {
        let mut point = primitive.center();
        let k = sampler.points_per_dim();
        let Ok(converter) = sampler.converter::<D>() else {
            return point;
        };
        if k < 2 || values.len() != converter.size() {
            return point;
        }

        let base = primitive.base();
        let lengths = primitive.lengths();
        let last = (k - 1) as f64;
        for axis in 0..D::dim() {
            let stride = converter.stride(axis);
            let (sum, count) = (0..values.len())
                .filter_map(|i| {
                    let c = (i / stride) % k;
                    if c + 1 >= k {
                        return None;
                    }
                    crossing(&values[i], &values[i + stride]).map(|t| (c as f64 + t) / last)
                })
                .fold((0., 0usize), |(sum, count), f| (sum + f, count + 1));
            if count > 0 {
                let fraction = (sum / count as f64).clamp(self.margin, 1. - self.margin);
                point[axis] = base[axis] + lengths[axis] * T::constant(fraction);
            }
        }
        point
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::{Point2, Vector2, U2};

    use super::{SplitPolicy, WeightedSplit};
    use crate::{primitive::Primitive, sampler::Sampler, split_policy::MidpointSplit};

    fn values<F: Fn(&Point2<f64>) -> f64>(
        primitive: &Primitive<f64, U2>,
        sampler: &Sampler,
        f: F,
    ) -> Vec<f64> {
        sampler.sample_points(primitive).unwrap().map(|p| f(&p)).collect()
    }

    #[test]
    fn follows_the_crossing() {
        let b = Primitive::boxed(Point2::new(0., 0.), Vector2::new(2., 1.)).unwrap();
        let sampler = Sampler::new(3).unwrap();
        // plane x = 0.6
        let vs = values(&b, &sampler, |p| p.x - 0.6);
        let p = WeightedSplit::default().split_point(&b, &sampler, &vs);
        assert_relative_eq!(p, Point2::new(0.6, 0.5), epsilon = 1e-12);
        assert!(b.evaluate(&p));
    }

    #[test]
    fn margin_keeps_children_non_degenerate() {
        let b = Primitive::boxed(Point2::new(0., 0.), Vector2::new(1., 1.)).unwrap();
        let sampler = Sampler::new(2).unwrap();
        let vs = values(&b, &sampler, |p| p.y - 0.001);
        let p = WeightedSplit::new(0.2).split_point(&b, &sampler, &vs);
        assert_relative_eq!(p, Point2::new(0.5, 0.2), epsilon = 1e-12);
    }

    #[test]
    fn uniform_values_fall_back_to_midpoint() {
        let b = Primitive::boxed(Point2::new(1., 1.), Vector2::new(2., 4.)).unwrap();
        let sampler = Sampler::new(4).unwrap();
        let vs = values(&b, &sampler, |_| 1.);
        let p = WeightedSplit::default().split_point(&b, &sampler, &vs);
        assert_relative_eq!(p, b.center());

        let flags: Vec<bool> = sampler
            .sample_points(&b)
            .unwrap()
            .map(|p| p.x < 2.)
            .collect();
        let p = WeightedSplit::default().split_point(&b, &sampler, &flags);
        assert_relative_eq!(p, b.center());

        let single = Sampler::center();
        let p = WeightedSplit::default().split_point(&b, &single, &[-1.0_f64]);
        assert_relative_eq!(p, b.center());
        let p = MidpointSplit.split_point(&b, &sampler, &vs);
        assert_relative_eq!(p, b.center());
    }

    #[test]
    fn margin_is_clamped() {
        assert_eq!(WeightedSplit::new(2.).margin(), 0.5);
        assert_eq!(WeightedSplit::new(-1.).margin(), 0.);
        assert_eq!(WeightedSplit::new(f64::NAN).margin(), 0.);
    }
}
