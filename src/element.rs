// src/element.rs

use std::fmt;
use std::ops::{Add, Div, Mul, Sub};

/// Element dtypes a tensor can hold. The string names are stable and are
/// what the tensor file header records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    I16,
    I32,
    F32,
    F64,
}

impl DType {
    pub fn name(self) -> &'static str {
        match self {
            DType::I16 => "I16",
            DType::I32 => "I32",
            DType::F32 => "F32",
            DType::F64 => "F64",
        }
    }

    pub fn size_bytes(self) -> usize {
        match self {
            DType::I16 => 2,
            DType::I32 => 4,
            DType::F32 => 4,
            DType::F64 => 8,
        }
    }

    pub fn from_name(name: &str) -> Option<DType> {
        match name {
            "I16" => Some(DType::I16),
            "I32" => Some(DType::I32),
            "F32" => Some(DType::F32),
            "F64" => Some(DType::F64),
            _ => None,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Scalar element of a tensor.
///
/// The `bytemuck::Pod` bound is what lets the io module view element storage
/// as raw bytes without copying; `Send + Sync` is required by the rayon path
/// in matrix products.
pub trait Scalar:
    Copy
    + Default
    + PartialEq
    + PartialOrd
    + fmt::Debug
    + fmt::Display
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + bytemuck::Pod
    + Send
    + Sync
    + 'static
{
    const DTYPE: DType;

    fn zero() -> Self;
    fn one() -> Self;

    fn is_zero(self) -> bool {
        self == Self::zero()
    }
}

impl Scalar for i16 {
    const DTYPE: DType = DType::I16;

    fn zero() -> Self {
        0
    }

    fn one() -> Self {
        1
    }
}

impl Scalar for i32 {
    const DTYPE: DType = DType::I32;

    fn zero() -> Self {
        0
    }

    fn one() -> Self {
        1
    }
}

impl Scalar for f32 {
    const DTYPE: DType = DType::F32;

    fn zero() -> Self {
        0.0
    }

    fn one() -> Self {
        1.0
    }
}

impl Scalar for f64 {
    const DTYPE: DType = DType::F64;

    fn zero() -> Self {
        0.0
    }

    fn one() -> Self {
        1.0
    }
}
