// src/kernels/mod.rs

//! Lane-level slice kernels and per-dtype dispatch.
//!
//! Public operations never call the arch submodules directly: they go
//! through [`SimdOps`], which clamps the requested level to what the CPU
//! actually supports and falls back to the scalar loops everywhere else.

pub(crate) mod scalar;

#[cfg(target_arch = "x86_64")]
pub(crate) mod sse;

#[cfg(target_arch = "x86_64")]
pub(crate) mod avx;

use crate::element::Scalar;
use crate::simd::SimdLevel;

/// Slice kernels for one element dtype.
///
/// Every method takes the execution path to run on. A level wider than the
/// CPU supports is clamped down, so the kernels themselves are safe to call
/// with any level. Integer dtypes run the scalar loops at every level
/// (there is no integer SIMD division); the float dtypes carry the SSE and
/// AVX paths.
pub trait SimdOps: Scalar {
    fn fill_slice(dst: &mut [Self], value: Self, level: SimdLevel);
    fn add_slice(a: &[Self], b: &[Self], dst: &mut [Self], level: SimdLevel);
    fn sub_slice(a: &[Self], b: &[Self], dst: &mut [Self], level: SimdLevel);
    fn mul_slice(a: &[Self], b: &[Self], dst: &mut [Self], level: SimdLevel);
    fn div_slice(a: &[Self], b: &[Self], dst: &mut [Self], level: SimdLevel);
    fn scale_slice(a: &[Self], factor: Self, dst: &mut [Self], level: SimdLevel);
    fn dot_slice(a: &[Self], b: &[Self], level: SimdLevel) -> Self;
}

#[cfg(target_arch = "x86_64")]
fn clamp(level: SimdLevel) -> SimdLevel {
    level.min(SimdLevel::detect())
}

macro_rules! float_simd_ops {
    ($ty:ty, $fill:ident, $add:ident, $sub:ident, $mul:ident, $div:ident, $scale:ident, $dot:ident) => {
        impl SimdOps for $ty {
            fn fill_slice(dst: &mut [Self], value: Self, level: SimdLevel) {
                #[cfg(target_arch = "x86_64")]
                match clamp(level) {
                    SimdLevel::Avx => return unsafe { avx::$fill(dst, value) },
                    SimdLevel::Sse => return unsafe { sse::$fill(dst, value) },
                    SimdLevel::Scalar => {}
                }
                #[cfg(not(target_arch = "x86_64"))]
                let _ = level;
                scalar::fill(dst, value);
            }

            fn add_slice(a: &[Self], b: &[Self], dst: &mut [Self], level: SimdLevel) {
                debug_assert_eq!(a.len(), dst.len());
                debug_assert_eq!(b.len(), dst.len());
                #[cfg(target_arch = "x86_64")]
                match clamp(level) {
                    SimdLevel::Avx => return unsafe { avx::$add(a, b, dst) },
                    SimdLevel::Sse => return unsafe { sse::$add(a, b, dst) },
                    SimdLevel::Scalar => {}
                }
                #[cfg(not(target_arch = "x86_64"))]
                let _ = level;
                scalar::add(a, b, dst);
            }

            fn sub_slice(a: &[Self], b: &[Self], dst: &mut [Self], level: SimdLevel) {
                debug_assert_eq!(a.len(), dst.len());
                debug_assert_eq!(b.len(), dst.len());
                #[cfg(target_arch = "x86_64")]
                match clamp(level) {
                    SimdLevel::Avx => return unsafe { avx::$sub(a, b, dst) },
                    SimdLevel::Sse => return unsafe { sse::$sub(a, b, dst) },
                    SimdLevel::Scalar => {}
                }
                #[cfg(not(target_arch = "x86_64"))]
                let _ = level;
                scalar::sub(a, b, dst);
            }

            fn mul_slice(a: &[Self], b: &[Self], dst: &mut [Self], level: SimdLevel) {
                debug_assert_eq!(a.len(), dst.len());
                debug_assert_eq!(b.len(), dst.len());
                #[cfg(target_arch = "x86_64")]
                match clamp(level) {
                    SimdLevel::Avx => return unsafe { avx::$mul(a, b, dst) },
                    SimdLevel::Sse => return unsafe { sse::$mul(a, b, dst) },
                    SimdLevel::Scalar => {}
                }
                #[cfg(not(target_arch = "x86_64"))]
                let _ = level;
                scalar::mul(a, b, dst);
            }

            fn div_slice(a: &[Self], b: &[Self], dst: &mut [Self], level: SimdLevel) {
                debug_assert_eq!(a.len(), dst.len());
                debug_assert_eq!(b.len(), dst.len());
                #[cfg(target_arch = "x86_64")]
                match clamp(level) {
                    SimdLevel::Avx => return unsafe { avx::$div(a, b, dst) },
                    SimdLevel::Sse => return unsafe { sse::$div(a, b, dst) },
                    SimdLevel::Scalar => {}
                }
                #[cfg(not(target_arch = "x86_64"))]
                let _ = level;
                scalar::div(a, b, dst);
            }

            fn scale_slice(a: &[Self], factor: Self, dst: &mut [Self], level: SimdLevel) {
                debug_assert_eq!(a.len(), dst.len());
                #[cfg(target_arch = "x86_64")]
                match clamp(level) {
                    SimdLevel::Avx => return unsafe { avx::$scale(a, factor, dst) },
                    SimdLevel::Sse => return unsafe { sse::$scale(a, factor, dst) },
                    SimdLevel::Scalar => {}
                }
                #[cfg(not(target_arch = "x86_64"))]
                let _ = level;
                scalar::scale(a, factor, dst);
            }

            fn dot_slice(a: &[Self], b: &[Self], level: SimdLevel) -> Self {
                debug_assert_eq!(a.len(), b.len());
                #[cfg(target_arch = "x86_64")]
                match clamp(level) {
                    SimdLevel::Avx => return unsafe { avx::$dot(a, b) },
                    SimdLevel::Sse => return unsafe { sse::$dot(a, b) },
                    SimdLevel::Scalar => {}
                }
                #[cfg(not(target_arch = "x86_64"))]
                let _ = level;
                scalar::dot(a, b)
            }
        }
    };
}

macro_rules! scalar_simd_ops {
    ($ty:ty) => {
        impl SimdOps for $ty {
            fn fill_slice(dst: &mut [Self], value: Self, _level: SimdLevel) {
                scalar::fill(dst, value);
            }

            fn add_slice(a: &[Self], b: &[Self], dst: &mut [Self], _level: SimdLevel) {
                debug_assert_eq!(a.len(), dst.len());
                debug_assert_eq!(b.len(), dst.len());
                scalar::add(a, b, dst);
            }

            fn sub_slice(a: &[Self], b: &[Self], dst: &mut [Self], _level: SimdLevel) {
                debug_assert_eq!(a.len(), dst.len());
                debug_assert_eq!(b.len(), dst.len());
                scalar::sub(a, b, dst);
            }

            fn mul_slice(a: &[Self], b: &[Self], dst: &mut [Self], _level: SimdLevel) {
                debug_assert_eq!(a.len(), dst.len());
                debug_assert_eq!(b.len(), dst.len());
                scalar::mul(a, b, dst);
            }

            fn div_slice(a: &[Self], b: &[Self], dst: &mut [Self], _level: SimdLevel) {
                debug_assert_eq!(a.len(), dst.len());
                debug_assert_eq!(b.len(), dst.len());
                scalar::div(a, b, dst);
            }

            fn scale_slice(a: &[Self], factor: Self, dst: &mut [Self], _level: SimdLevel) {
                debug_assert_eq!(a.len(), dst.len());
                scalar::scale(a, factor, dst);
            }

            fn dot_slice(a: &[Self], b: &[Self], _level: SimdLevel) -> Self {
                debug_assert_eq!(a.len(), b.len());
                scalar::dot(a, b)
            }
        }
    };
}

float_simd_ops!(f32, fill_f32, add_f32, sub_f32, mul_f32, div_f32, scale_f32, dot_f32);
float_simd_ops!(f64, fill_f64, add_f64, sub_f64, mul_f64, div_f64, scale_f64, dot_f64);

scalar_simd_ops!(i16);
scalar_simd_ops!(i32);
