//! Floating-point component type of amplitudes.

use num_traits::{Float, FloatConst};
use std::fmt::Debug;

use qmc_ir::Precision;

/// Real scalar backing a complex amplitude: `f32` or `f64`.
pub trait Real: Float + FloatConst + Default + Debug + Send + Sync + 'static {
    /// The precision tag of this type.
    const PRECISION: Precision;

    /// Convert from `f64`, rounding when narrowing.
    fn real(value: f64) -> Self;

    /// Widen to `f64`.
    fn into_f64(self) -> f64;
}

impl Real for f32 {
    const PRECISION: Precision = Precision::Single;

    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    fn real(value: f64) -> Self {
        value as f32
    }

    #[inline]
    fn into_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Real for f64 {
    const PRECISION: Precision = Precision::Double;

    #[inline]
    fn real(value: f64) -> Self {
        value
    }

    #[inline]
    fn into_f64(self) -> f64 {
        self
    }
}
