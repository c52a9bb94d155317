use std::fmt::Debug;

/// A value produced by a target function at a sample point.
///
/// Real valued fields are signed distances (or anything with a meaningful sign),
/// boolean fields are plain inside/outside predicates.
pub trait FieldValue: Copy + Debug + PartialEq + Send + Sync {
    /// Which side of the implicit surface the value lies on.
    /// Real values are inside when strictly negative, so zero belongs to the outside.
    fn is_inside(&self) -> bool;

    /// Absolute value of the field used to interpolate surface crossings.
    /// `None` when the field carries no magnitude (booleans).
    fn magnitude(&self) -> Option<f64>;

    /// The value as a plain number, for export.
    fn as_f64(&self) -> f64;
}

impl FieldValue for f64 {
    fn is_inside(&self) -> bool {
        *self < 0.
    }

    fn magnitude(&self) -> Option<f64> {
        Some(self.abs())
    }

    fn as_f64(&self) -> f64 {
        *self
    }
}

impl FieldValue for f32 {
    fn is_inside(&self) -> bool {
        *self < 0.
    }

    fn magnitude(&self) -> Option<f64> {
        Some(self.abs() as f64)
    }

    fn as_f64(&self) -> f64 {
        *self as f64
    }
}

impl FieldValue for bool {
    fn is_inside(&self) -> bool {
        *self
    }

    fn magnitude(&self) -> Option<f64> {
        None
    }

    fn as_f64(&self) -> f64 {
        if *self {
            1.
        } else {
            0.
        }
    }
}
