// src/tensor.rs

use std::fmt;

/// Cap on elements written by the `Display` rendering; anything beyond is
/// elided with `...`.
const TENSOR_PRINT_LIMIT: usize = 100;

#[derive(Debug, PartialEq)]
pub enum TensorError {
    ShapeMismatch(String),
    InvalidDimension(String),
    OutOfBounds(String),
    IncompatibleShapes(String),
    DivisionByZero(String),
    SimdUnavailable(String),
    UnsupportedOperation(String),
}

impl fmt::Display for TensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TensorError::ShapeMismatch(s) => write!(f, "Shape mismatch: {}", s),
            TensorError::InvalidDimension(s) => write!(f, "Invalid dimension: {}", s),
            TensorError::OutOfBounds(s) => write!(f, "Out of bounds: {}", s),
            TensorError::IncompatibleShapes(s) => write!(f, "Incompatible shapes: {}", s),
            TensorError::DivisionByZero(s) => write!(f, "Division by zero: {}", s),
            TensorError::SimdUnavailable(s) => write!(f, "SIMD path unavailable: {}", s),
            TensorError::UnsupportedOperation(s) => write!(f, "Unsupported operation: {}", s),
        }
    }
}

impl std::error::Error for TensorError {}

/// Number of elements a shape describes: 1 for the empty (rank-0) shape,
/// 0 if any dimension is zero.
pub(crate) fn element_count(shape: &[usize]) -> usize {
    if shape.is_empty() {
        1
    } else if shape.iter().any(|&dim| dim == 0) {
        0
    } else {
        shape.iter().product()
    }
}

/// Dense row-major tensor.
///
/// `data.len()` always equals the element count of `shape`; `Tensor::new`
/// enforces it and every operation preserves it. An empty shape is a rank-0
/// scalar holding exactly one element.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T> {
    pub data: Vec<T>,
    pub shape: Vec<usize>,
}

impl<T> Tensor<T> {
    pub fn new(data: Vec<T>, shape: Vec<usize>) -> Result<Self, TensorError> {
        let expected = element_count(&shape);
        if data.len() != expected {
            return Err(TensorError::ShapeMismatch(format!(
                "Data length {} does not match shape product {} (shape: {:?})",
                data.len(),
                expected,
                shape
            )));
        }
        Ok(Tensor { data, shape })
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    pub fn num_elements(&self) -> usize {
        element_count(&self.shape)
    }

    fn flat_index(&self, indices: &[usize]) -> Result<usize, TensorError> {
        if indices.len() != self.rank() {
            return Err(TensorError::InvalidDimension(format!(
                "Expected {} indices for tensor of rank {}, got {}",
                self.rank(),
                self.rank(),
                indices.len()
            )));
        }
        let mut flat = 0;
        let mut stride = 1;
        for (i, &dim_idx) in indices.iter().rev().enumerate() {
            let dim = self.rank() - 1 - i;
            let dim_size = self.shape[dim];
            if dim_idx >= dim_size {
                return Err(TensorError::OutOfBounds(format!(
                    "Index {} out of bounds for dimension {} with size {}",
                    dim_idx, dim, dim_size
                )));
            }
            flat += dim_idx * stride;
            stride *= dim_size;
        }
        Ok(flat)
    }

    pub fn get(&self, indices: &[usize]) -> Result<&T, TensorError> {
        let flat = self.flat_index(indices)?;
        self.data.get(flat).ok_or_else(|| {
            TensorError::OutOfBounds(format!(
                "Flat index {} out of bounds for data length {}",
                flat,
                self.data.len()
            ))
        })
    }

    pub fn get_mut(&mut self, indices: &[usize]) -> Result<&mut T, TensorError> {
        let flat = self.flat_index(indices)?;
        let len = self.data.len();
        self.data.get_mut(flat).ok_or_else(|| {
            TensorError::OutOfBounds(format!(
                "Flat index {} out of bounds for data length {}",
                flat, len
            ))
        })
    }
}

impl<T: Clone> Tensor<T> {
    pub fn reshape(&self, new_shape: Vec<usize>) -> Result<Self, TensorError> {
        let current = self.num_elements();
        let wanted = element_count(&new_shape);
        if current != wanted {
            return Err(TensorError::ShapeMismatch(format!(
                "Cannot reshape tensor with {} elements (shape {:?}) into shape {:?} ({} elements)",
                current, self.shape, new_shape, wanted
            )));
        }
        Ok(Tensor {
            data: self.data.clone(),
            shape: new_shape,
        })
    }

    pub fn transpose(&self) -> Result<Self, TensorError> {
        if self.rank() != 2 {
            return Err(TensorError::InvalidDimension(
                "Transpose only supports 2D tensors".to_string(),
            ));
        }
        let rows = self.shape[0];
        let cols = self.shape[1];
        let new_shape = vec![cols, rows];
        if self.num_elements() == 0 {
            return Tensor::new(Vec::new(), new_shape);
        }
        let mut new_data = Vec::with_capacity(self.data.len());
        for j in 0..cols {
            for i in 0..rows {
                new_data.push(self.data[i * cols + j].clone());
            }
        }
        Tensor::new(new_data, new_shape)
    }
}

impl<T: fmt::Display> Tensor<T> {
    fn fmt_dim(
        &self,
        f: &mut fmt::Formatter<'_>,
        dim: usize,
        indent: usize,
        index: &mut usize,
        printed: &mut usize,
    ) -> fmt::Result {
        if *printed >= TENSOR_PRINT_LIMIT {
            return write!(f, "...");
        }

        let ndim = self.shape.len();
        let n = self.shape[dim];

        if dim == ndim - 1 {
            write!(f, "[")?;
            for i in 0..n {
                if *printed >= TENSOR_PRINT_LIMIT {
                    write!(f, ", ...")?;
                    break;
                }
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", self.data[*index])?;
                *index += 1;
                *printed += 1;
            }
            return write!(f, "]");
        }

        writeln!(f, "[")?;
        for i in 0..n {
            write!(f, "{:width$}", "", width = indent + 2)?;
            if *printed >= TENSOR_PRINT_LIMIT {
                write!(f, "...")?;
                break;
            }
            self.fmt_dim(f, dim + 1, indent + 2, index, printed)?;
            if i + 1 < n {
                writeln!(f, ",")?;
            }
        }
        write!(f, "\n{:width$}]", "", width = indent)
    }
}

impl<T: fmt::Display> fmt::Display for Tensor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tensor([")?;
        for (i, dim) in self.shape.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", dim)?;
        }
        writeln!(f, "]")?;

        // Rank-0 scalar prints its single value on the shape line's successor.
        if self.shape.is_empty() {
            return match self.data.first() {
                Some(value) => write!(f, "{})", value),
                None => write!(f, ")"),
            };
        }

        let mut index = 0;
        let mut printed = 0;
        self.fmt_dim(f, 0, 0, &mut index, &mut printed)?;
        write!(f, "\n)")
    }
}
