// src/lib.rs

//! Dense tensors with SIMD-accelerated element kernels.
//!
//! Tensors are row-major over i16/i32/f32/f64 elements. Arithmetic runs on
//! the widest execution path the CPU supports (AVX, then SSE, then plain
//! loops); every operation also has a `_with` variant that pins the path,
//! and `SimdLevel::is_available` exposes the capability flags so callers
//! can gate on them the way the bundled CLI does.

pub mod element;
pub mod io;
pub mod kernels;
mod ops;
pub mod simd;
pub mod tensor;

pub use element::{DType, Scalar};
pub use io::{load_tensor, save_tensor, TensorIoError};
pub use kernels::SimdOps;
pub use simd::{Capabilities, SimdLevel};
pub use tensor::{Tensor, TensorError};
