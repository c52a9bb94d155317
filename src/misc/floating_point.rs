use nalgebra::RealField;
use num_traits::ToPrimitive;

/// Trait for floating point types (f32, f64)
/// Mainly used to identify the type of the coordinates in nalgebra
pub trait FloatingPoint: RealField + ToPrimitive + Copy {
    /// Convert an `f64` constant into this type.
    fn constant(value: f64) -> Self {
        nalgebra::convert(value)
    }

    /// Convert this value into `f64`, yielding NaN when it is not representable.
    fn to_f64_lossy(&self) -> f64 {
        self.to_f64().unwrap_or(f64::NAN)
    }
}

impl FloatingPoint for f32 {}
impl FloatingPoint for f64 {}
