// src/ops.rs

//! Tensor constructors and arithmetic.
//!
//! Every operation exists in two forms: the plain one runs on the best
//! detected path, the `_with` one runs on a caller-chosen [`SimdLevel`] and
//! fails with `SimdUnavailable` when the CPU lacks it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::element::Scalar;
use crate::kernels::SimdOps;
use crate::simd::SimdLevel;
use crate::tensor::{element_count, Tensor, TensorError};

/// Work threshold (n * k * m) above which matrix-matrix dot partitions its
/// output rows across the rayon pool.
const DOT_PAR_THRESHOLD: usize = 64 * 64 * 64;

fn validate_level(level: SimdLevel) -> Result<SimdLevel, TensorError> {
    if level.is_available() {
        Ok(level)
    } else {
        Err(TensorError::SimdUnavailable(format!(
            "{} path requested but not supported by this CPU",
            level
        )))
    }
}

impl<T: SimdOps> Tensor<T> {
    /// Tensor of the given shape with every element set to `value`.
    pub fn full(shape: &[usize], value: T) -> Result<Self, TensorError> {
        Self::full_with(shape, value, SimdLevel::detect())
    }

    /// `full` on an explicit execution path.
    pub fn full_with(shape: &[usize], value: T, level: SimdLevel) -> Result<Self, TensorError> {
        let level = validate_level(level)?;
        let mut data = vec![T::default(); element_count(shape)];
        T::fill_slice(&mut data, value, level);
        Tensor::new(data, shape.to_vec())
    }

    pub fn zeros(shape: &[usize]) -> Result<Self, TensorError> {
        Self::full(shape, T::zero())
    }

    pub fn ones(shape: &[usize]) -> Result<Self, TensorError> {
        Self::full(shape, T::one())
    }

    fn check_same_shape(&self, other: &Self, op: &str) -> Result<(), TensorError> {
        if self.shape != other.shape {
            return Err(TensorError::ShapeMismatch(format!(
                "{}: left shape {:?} does not match right shape {:?}",
                op, self.shape, other.shape
            )));
        }
        Ok(())
    }

    pub fn add(&self, other: &Self) -> Result<Self, TensorError> {
        self.add_with(other, SimdLevel::detect())
    }

    pub fn add_with(&self, other: &Self, level: SimdLevel) -> Result<Self, TensorError> {
        let level = validate_level(level)?;
        self.check_same_shape(other, "add")?;
        let mut data = vec![T::default(); self.data.len()];
        T::add_slice(&self.data, &other.data, &mut data, level);
        Tensor::new(data, self.shape.clone())
    }

    pub fn sub(&self, other: &Self) -> Result<Self, TensorError> {
        self.sub_with(other, SimdLevel::detect())
    }

    pub fn sub_with(&self, other: &Self, level: SimdLevel) -> Result<Self, TensorError> {
        let level = validate_level(level)?;
        self.check_same_shape(other, "sub")?;
        let mut data = vec![T::default(); self.data.len()];
        T::sub_slice(&self.data, &other.data, &mut data, level);
        Tensor::new(data, self.shape.clone())
    }

    pub fn mul(&self, other: &Self) -> Result<Self, TensorError> {
        self.mul_with(other, SimdLevel::detect())
    }

    pub fn mul_with(&self, other: &Self, level: SimdLevel) -> Result<Self, TensorError> {
        let level = validate_level(level)?;
        self.check_same_shape(other, "mul")?;
        let mut data = vec![T::default(); self.data.len()];
        T::mul_slice(&self.data, &other.data, &mut data, level);
        Tensor::new(data, self.shape.clone())
    }

    pub fn div(&self, other: &Self) -> Result<Self, TensorError> {
        self.div_with(other, SimdLevel::detect())
    }

    pub fn div_with(&self, other: &Self, level: SimdLevel) -> Result<Self, TensorError> {
        let level = validate_level(level)?;
        self.check_same_shape(other, "div")?;
        if let Some(pos) = other.data.iter().position(|v| v.is_zero()) {
            return Err(TensorError::DivisionByZero(format!(
                "divisor element at flat index {} is zero",
                pos
            )));
        }
        let mut data = vec![T::default(); self.data.len()];
        T::div_slice(&self.data, &other.data, &mut data, level);
        Tensor::new(data, self.shape.clone())
    }

    /// Multiply every element by `factor`.
    pub fn scalar_mul(&self, factor: T) -> Result<Self, TensorError> {
        self.scalar_mul_with(factor, SimdLevel::detect())
    }

    pub fn scalar_mul_with(&self, factor: T, level: SimdLevel) -> Result<Self, TensorError> {
        let level = validate_level(level)?;
        let mut data = vec![T::default(); self.data.len()];
        T::scale_slice(&self.data, factor, &mut data, level);
        Tensor::new(data, self.shape.clone())
    }

    /// Dot product: vector·matrix (`[k]·[k,m] -> [m]`), matrix·vector
    /// (`[n,k]·[k] -> [n]`) or matrix·matrix (`[n,k]·[k,m] -> [n,m]`).
    pub fn dot(a: &Self, b: &Self) -> Result<Self, TensorError> {
        Self::dot_with(a, b, SimdLevel::detect())
    }

    pub fn dot_with(a: &Self, b: &Self, level: SimdLevel) -> Result<Self, TensorError> {
        let level = validate_level(level)?;
        match (a.rank(), b.rank()) {
            (1, 2) => {
                let k = a.shape[0];
                let m = b.shape[1];
                if b.shape[0] != k {
                    return Err(TensorError::IncompatibleShapes(format!(
                        "vector-matrix dot: vector length {} does not match matrix rows {}",
                        k, b.shape[0]
                    )));
                }
                // Transposing makes each matrix column contiguous.
                let bt = b.transpose()?;
                let mut out = vec![T::default(); m];
                for (j, slot) in out.iter_mut().enumerate() {
                    *slot = T::dot_slice(&a.data, &bt.data[j * k..(j + 1) * k], level);
                }
                Tensor::new(out, vec![m])
            }
            (2, 1) => {
                let n = a.shape[0];
                let k = a.shape[1];
                if b.shape[0] != k {
                    return Err(TensorError::IncompatibleShapes(format!(
                        "matrix-vector dot: matrix columns {} do not match vector length {}",
                        k, b.shape[0]
                    )));
                }
                let mut out = vec![T::default(); n];
                for (i, slot) in out.iter_mut().enumerate() {
                    *slot = T::dot_slice(&a.data[i * k..(i + 1) * k], &b.data, level);
                }
                Tensor::new(out, vec![n])
            }
            (2, 2) => {
                let n = a.shape[0];
                let k = a.shape[1];
                let m = b.shape[1];
                if b.shape[0] != k {
                    return Err(TensorError::IncompatibleShapes(format!(
                        "matrix-matrix dot: A is [{}, {}], B is [{}, {}]",
                        n, k, b.shape[0], m
                    )));
                }
                let mut out = vec![T::default(); n * m];
                if n > 0 && m > 0 {
                    let bt = b.transpose()?;
                    if n * k * m >= DOT_PAR_THRESHOLD {
                        out.par_chunks_mut(m).enumerate().for_each(|(i, row)| {
                            let a_row = &a.data[i * k..(i + 1) * k];
                            for (j, slot) in row.iter_mut().enumerate() {
                                *slot = T::dot_slice(a_row, &bt.data[j * k..(j + 1) * k], level);
                            }
                        });
                    } else {
                        for i in 0..n {
                            let a_row = &a.data[i * k..(i + 1) * k];
                            for j in 0..m {
                                out[i * m + j] =
                                    T::dot_slice(a_row, &bt.data[j * k..(j + 1) * k], level);
                            }
                        }
                    }
                }
                Tensor::new(out, vec![n, m])
            }
            (ra, rb) => Err(TensorError::IncompatibleShapes(format!(
                "dot supports vector-matrix, matrix-vector and matrix-matrix operands, got ranks {} and {}",
                ra, rb
            ))),
        }
    }
}

macro_rules! impl_random_constructors {
    ($ty:ty, $log:path, $sqrt:path, $sin:path, $cos:path, $pi:expr) => {
        impl Tensor<$ty> {
            /// Tensor with elements drawn uniformly from `[0, 1)`.
            pub fn rand(shape: &[usize]) -> Result<Self, TensorError> {
                Self::rand_from(&mut rand::thread_rng(), shape)
            }

            /// Deterministic `rand` for tests and benchmarks.
            pub fn rand_seeded(shape: &[usize], seed: u64) -> Result<Self, TensorError> {
                Self::rand_from(&mut StdRng::seed_from_u64(seed), shape)
            }

            fn rand_from<R: Rng>(rng: &mut R, shape: &[usize]) -> Result<Self, TensorError> {
                let count = element_count(shape);
                let data = (0..count).map(|_| rng.gen::<$ty>()).collect();
                Tensor::new(data, shape.to_vec())
            }

            /// Tensor with elements drawn from the standard normal
            /// distribution, generated with the Box-Muller transform.
            pub fn randn(shape: &[usize]) -> Result<Self, TensorError> {
                Self::randn_from(&mut rand::thread_rng(), shape)
            }

            /// Deterministic `randn` for tests and benchmarks.
            pub fn randn_seeded(shape: &[usize], seed: u64) -> Result<Self, TensorError> {
                Self::randn_from(&mut StdRng::seed_from_u64(seed), shape)
            }

            fn randn_from<R: Rng>(rng: &mut R, shape: &[usize]) -> Result<Self, TensorError> {
                let count = element_count(shape);
                let mut data = Vec::with_capacity(count);
                while data.len() < count {
                    // u1 stays off zero so the log below is finite.
                    let u1: $ty = rng.gen_range(<$ty>::EPSILON..1.0);
                    let u2: $ty = rng.gen();
                    let radius = $sqrt(-2.0 * $log(u1));
                    let theta = 2.0 * $pi * u2;
                    data.push(radius * $cos(theta));
                    if data.len() < count {
                        data.push(radius * $sin(theta));
                    }
                }
                Tensor::new(data, shape.to_vec())
            }
        }
    };
}

impl_random_constructors!(
    f32,
    libm::logf,
    libm::sqrtf,
    libm::sinf,
    libm::cosf,
    std::f32::consts::PI
);
impl_random_constructors!(
    f64,
    libm::log,
    libm::sqrt,
    libm::sin,
    libm::cos,
    std::f64::consts::PI
);

#[cfg(test)]
mod tests {
    use super::*;

    const FLOAT_TOLERANCE: f32 = 1e-5;

    fn assert_f32_slice_eq(a: &[f32], b: &[f32], tolerance: f32) {
        assert_eq!(a.len(), b.len(), "Slice lengths differ");
        for (i, (va, vb)) in a.iter().zip(b.iter()).enumerate() {
            assert!(
                (va - vb).abs() < tolerance,
                "Mismatch at index {}: {} vs {}",
                i,
                va,
                vb
            );
        }
    }

    fn available_simd_levels() -> Vec<SimdLevel> {
        [SimdLevel::Scalar, SimdLevel::Sse, SimdLevel::Avx]
            .into_iter()
            .filter(|l| l.is_available())
            .collect()
    }

    #[test]
    fn test_full_fills_every_element() {
        let t = Tensor::<f32>::full(&[3, 3], 1.5).unwrap();
        assert_eq!(t.shape, vec![3, 3]);
        assert!(t.data.iter().all(|&v| v == 1.5));
    }

    #[test]
    fn test_full_with_available_paths_smoke() {
        // The smoke flow: each available capability path builds a [3, 3]
        // tensor of 1.5 whose rendering is non-empty.
        for level in [SimdLevel::Sse, SimdLevel::Avx] {
            if !level.is_available() {
                continue;
            }
            let t = Tensor::<f32>::full_with(&[3, 3], 1.5, level).unwrap();
            assert!(t.data.iter().all(|&v| v == 1.5));
            let rendered = t.to_string();
            assert!(rendered.starts_with("tensor([3, 3]"));
            assert!(!rendered.is_empty());
        }
    }

    #[test]
    fn test_full_with_unavailable_level_fails() {
        // Scalar is always available, so probe the widest level only.
        if !SimdLevel::Avx.is_available() {
            let result = Tensor::<f32>::full_with(&[2, 2], 1.0, SimdLevel::Avx);
            assert!(matches!(result, Err(TensorError::SimdUnavailable(_))));
        }
    }

    #[test]
    fn test_zeros_and_ones() {
        let z = Tensor::<i32>::zeros(&[2, 3]).unwrap();
        assert_eq!(z.data, vec![0; 6]);
        let o = Tensor::<f64>::ones(&[4]).unwrap();
        assert_eq!(o.data, vec![1.0; 4]);

        let scalar_zeros = Tensor::<f32>::zeros(&[]).unwrap();
        assert_eq!(scalar_zeros.data, vec![0.0]);
        let empty = Tensor::<f32>::zeros(&[2, 0, 3]).unwrap();
        assert!(empty.data.is_empty());
    }

    #[test]
    fn test_elementwise_ops() {
        let a = Tensor::new(vec![1.0f32, 2.0, 3.0, 4.0], vec![2, 2]).unwrap();
        let b = Tensor::new(vec![4.0f32, 3.0, 2.0, 1.0], vec![2, 2]).unwrap();

        assert_eq!(a.add(&b).unwrap().data, vec![5.0, 5.0, 5.0, 5.0]);
        assert_eq!(a.sub(&b).unwrap().data, vec![-3.0, -1.0, 1.0, 3.0]);
        assert_eq!(a.mul(&b).unwrap().data, vec![4.0, 6.0, 6.0, 4.0]);
        assert_eq!(a.div(&b).unwrap().data, vec![0.25, 2.0 / 3.0, 1.5, 4.0]);
    }

    #[test]
    fn test_elementwise_shape_mismatch() {
        let a = Tensor::<f32>::ones(&[2, 2]).unwrap();
        let b = Tensor::<f32>::ones(&[4]).unwrap();
        for result in [a.add(&b), a.sub(&b), a.mul(&b), a.div(&b)] {
            assert!(matches!(result, Err(TensorError::ShapeMismatch(_))));
        }
    }

    #[test]
    fn test_div_by_zero_is_an_error() {
        let a = Tensor::new(vec![1.0f32, 2.0], vec![2]).unwrap();
        let b = Tensor::new(vec![4.0f32, 0.0], vec![2]).unwrap();
        let result = a.div(&b);
        assert!(
            matches!(result, Err(TensorError::DivisionByZero(ref s)) if s.contains("index 1"))
        );

        let ai = Tensor::new(vec![6i32, 8], vec![2]).unwrap();
        let bi = Tensor::new(vec![0i32, 2], vec![2]).unwrap();
        assert!(matches!(ai.div(&bi), Err(TensorError::DivisionByZero(_))));
    }

    #[test]
    fn test_scalar_mul() {
        let t = Tensor::new(vec![1.0f32, -2.0, 3.0], vec![3]).unwrap();
        assert_eq!(t.scalar_mul(2.0).unwrap().data, vec![2.0, -4.0, 6.0]);
        let ti = Tensor::new(vec![1i16, 2, 3], vec![3]).unwrap();
        assert_eq!(ti.scalar_mul(-1).unwrap().data, vec![-1, -2, -3]);
    }

    #[test]
    fn test_integer_elementwise() {
        let a = Tensor::new(vec![10i32, 20, 30], vec![3]).unwrap();
        let b = Tensor::new(vec![1i32, 2, 3], vec![3]).unwrap();
        assert_eq!(a.add(&b).unwrap().data, vec![11, 22, 33]);
        assert_eq!(a.div(&b).unwrap().data, vec![10, 10, 10]);
    }

    #[test]
    fn test_dot_matrix_matrix() {
        let a = Tensor::new(vec![1.0f32, 2.0, 3.0, 4.0], vec![2, 2]).unwrap();
        let b = Tensor::new(vec![5.0f32, 6.0, 7.0, 8.0], vec![2, 2]).unwrap();
        let c = Tensor::dot(&a, &b).unwrap();
        assert_eq!(c.shape, vec![2, 2]);
        assert_f32_slice_eq(&c.data, &[19.0, 22.0, 43.0, 50.0], FLOAT_TOLERANCE);

        let a2 = Tensor::new(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]).unwrap();
        let b2 = Tensor::new(vec![7.0f32, 8.0, 9.0, 10.0, 11.0, 12.0], vec![3, 2]).unwrap();
        let c2 = Tensor::dot(&a2, &b2).unwrap();
        assert_eq!(c2.shape, vec![2, 2]);
        assert_f32_slice_eq(&c2.data, &[58.0, 64.0, 139.0, 154.0], FLOAT_TOLERANCE);
    }

    #[test]
    fn test_dot_vector_matrix() {
        let a = Tensor::new(vec![1.0f32, 2.0], vec![2]).unwrap();
        let b = Tensor::new(vec![1.0f32, 2.0, 3.0, 4.0], vec![2, 2]).unwrap();
        let c = Tensor::dot(&a, &b).unwrap();
        assert_eq!(c.shape, vec![2]);
        assert_f32_slice_eq(&c.data, &[7.0, 10.0], FLOAT_TOLERANCE);
    }

    #[test]
    fn test_dot_matrix_vector() {
        let a = Tensor::new(vec![1.0f32, 2.0, 3.0, 4.0], vec![2, 2]).unwrap();
        let b = Tensor::new(vec![1.0f32, 2.0], vec![2]).unwrap();
        let c = Tensor::dot(&a, &b).unwrap();
        assert_eq!(c.shape, vec![2]);
        assert_f32_slice_eq(&c.data, &[5.0, 11.0], FLOAT_TOLERANCE);
    }

    #[test]
    fn test_dot_rejects_bad_operands() {
        let v = Tensor::new(vec![1.0f32, 2.0], vec![2]).unwrap();
        let m = Tensor::new(vec![1.0f32; 6], vec![3, 2]).unwrap();

        // Inner dimension mismatch.
        assert!(matches!(
            Tensor::dot(&v, &m),
            Err(TensorError::IncompatibleShapes(_))
        ));
        // Unsupported rank pairing.
        assert!(matches!(
            Tensor::dot(&v, &v),
            Err(TensorError::IncompatibleShapes(_))
        ));
        let cube = Tensor::<f32>::ones(&[2, 2, 2]).unwrap();
        assert!(matches!(
            Tensor::dot(&cube, &m),
            Err(TensorError::IncompatibleShapes(_))
        ));
    }

    #[test]
    fn test_dot_agrees_across_levels() {
        let a = Tensor::<f32>::rand_seeded(&[5, 7], 101).unwrap();
        let b = Tensor::<f32>::rand_seeded(&[7, 3], 202).unwrap();
        let reference = Tensor::dot_with(&a, &b, SimdLevel::Scalar).unwrap();
        for level in available_simd_levels() {
            let got = Tensor::dot_with(&a, &b, level).unwrap();
            assert_eq!(got.shape, reference.shape);
            assert_f32_slice_eq(&got.data, &reference.data, FLOAT_TOLERANCE);
        }
    }

    #[test]
    fn test_dot_large_uses_parallel_path() {
        // 80^3 crosses DOT_PAR_THRESHOLD; verify a few entries against the
        // closed form of an all-ones product.
        let a = Tensor::<f32>::ones(&[80, 80]).unwrap();
        let b = Tensor::<f32>::ones(&[80, 80]).unwrap();
        let c = Tensor::dot(&a, &b).unwrap();
        assert_eq!(c.shape, vec![80, 80]);
        assert!(c.data.iter().all(|&v| (v - 80.0).abs() < FLOAT_TOLERANCE));
    }

    #[test]
    fn test_rand_is_in_unit_interval() {
        let t = Tensor::<f32>::rand_seeded(&[4, 4], 7).unwrap();
        assert_eq!(t.num_elements(), 16);
        assert!(t.data.iter().all(|&v| (0.0..1.0).contains(&v)));
        // Same seed, same tensor; different seed, different tensor.
        let again = Tensor::<f32>::rand_seeded(&[4, 4], 7).unwrap();
        assert_eq!(t, again);
        let other = Tensor::<f32>::rand_seeded(&[4, 4], 8).unwrap();
        assert_ne!(t, other);
    }

    #[test]
    fn test_randn_moments_are_plausible() {
        let t = Tensor::<f64>::randn_seeded(&[64, 64], 99).unwrap();
        let n = t.data.len() as f64;
        let mean = t.data.iter().sum::<f64>() / n;
        let variance = t.data.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        assert!(mean.abs() < 0.1, "mean {} too far from 0", mean);
        assert!((variance - 1.0).abs() < 0.2, "variance {} too far from 1", variance);
    }

    #[test]
    fn test_randn_odd_element_count() {
        let t = Tensor::<f32>::randn_seeded(&[3, 3], 1).unwrap();
        assert_eq!(t.num_elements(), 9);
        assert!(t.data.iter().all(|v| v.is_finite()));
    }
}
