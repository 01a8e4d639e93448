// src/io.rs

//! Tensor persistence.
//!
//! The on-disk layout is a little-endian `u64` header length, a JSON header
//! describing dtype, shape and payload size, then the raw element bytes.
//! Loading validates the header against the requested element type before
//! touching the payload.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::element::Scalar;
use crate::tensor::{element_count, Tensor};

#[derive(Serialize, Deserialize, Debug)]
struct TensorFileHeader {
    dtype: String,
    shape: Vec<usize>,
    data_len: usize,
}

#[derive(Debug)]
pub enum TensorIoError {
    Io(io::Error),
    Json(serde_json::Error),
    InvalidHeaderLength,
    DtypeMismatch(String),
    DataCorruption(String),
}

impl fmt::Display for TensorIoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TensorIoError::Io(e) => write!(f, "I/O error: {}", e),
            TensorIoError::Json(e) => write!(f, "JSON header error: {}", e),
            TensorIoError::InvalidHeaderLength => write!(f, "Header length is zero"),
            TensorIoError::DtypeMismatch(s) => write!(f, "Dtype mismatch: {}", s),
            TensorIoError::DataCorruption(s) => write!(f, "Data corruption: {}", s),
        }
    }
}

impl std::error::Error for TensorIoError {}

impl From<io::Error> for TensorIoError {
    fn from(err: io::Error) -> TensorIoError {
        TensorIoError::Io(err)
    }
}

impl From<serde_json::Error> for TensorIoError {
    fn from(err: serde_json::Error) -> TensorIoError {
        TensorIoError::Json(err)
    }
}

/// Write `tensor` to `path` in the length-prefixed envelope. Element bytes
/// are written in the machine's layout, which is little-endian on every
/// target the SIMD paths support.
pub fn save_tensor<T: Scalar, P: AsRef<Path>>(
    path: P,
    tensor: &Tensor<T>,
) -> Result<(), TensorIoError> {
    let header = TensorFileHeader {
        dtype: T::DTYPE.name().to_string(),
        shape: tensor.shape.clone(),
        data_len: tensor.data.len() * std::mem::size_of::<T>(),
    };
    let header_bytes = serde_json::to_vec(&header)?;

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(&(header_bytes.len() as u64).to_le_bytes())?;
    writer.write_all(&header_bytes)?;
    writer.write_all(bytemuck::cast_slice(&tensor.data))?;
    writer.flush()?;
    Ok(())
}

/// Read a tensor of element type `T` from `path`, validating the header's
/// dtype and declared sizes along the way.
pub fn load_tensor<T: Scalar, P: AsRef<Path>>(path: P) -> Result<Tensor<T>, TensorIoError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut header_len_bytes = [0u8; 8];
    reader.read_exact(&mut header_len_bytes)?;
    let header_length = u64::from_le_bytes(header_len_bytes) as usize;
    if header_length == 0 {
        return Err(TensorIoError::InvalidHeaderLength);
    }

    let mut header_bytes = vec![0u8; header_length];
    reader.read_exact(&mut header_bytes)?;
    let header: TensorFileHeader = serde_json::from_slice(&header_bytes)?;

    if header.dtype != T::DTYPE.name() {
        return Err(TensorIoError::DtypeMismatch(format!(
            "file holds {} data, {} was requested",
            header.dtype,
            T::DTYPE.name()
        )));
    }

    let expected_bytes = element_count(&header.shape) * std::mem::size_of::<T>();
    if header.data_len != expected_bytes {
        return Err(TensorIoError::DataCorruption(format!(
            "header declares {} payload bytes, but shape {:?} with dtype {} needs {}",
            header.data_len,
            header.shape,
            header.dtype,
            expected_bytes
        )));
    }

    let mut payload = vec![0u8; header.data_len];
    reader.read_exact(&mut payload)?;

    // pod_collect_to_vec copes with the payload buffer's alignment.
    let data: Vec<T> = bytemuck::pod_collect_to_vec(&payload);
    Tensor::new(data, header.shape)
        .map_err(|e| TensorIoError::DataCorruption(format!("failed to assemble tensor: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn temp_path(file: &NamedTempFile) -> String {
        file.path().to_str().unwrap().to_string()
    }

    #[test]
    fn test_round_trip_f32() {
        let tensor = Tensor::new(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0], vec![2, 3]).unwrap();
        let file = NamedTempFile::new().unwrap();
        save_tensor(file.path(), &tensor).unwrap();
        let loaded: Tensor<f32> = load_tensor(file.path()).unwrap();
        assert_eq!(loaded, tensor);
    }

    #[test]
    fn test_round_trip_every_dtype() {
        let file = NamedTempFile::new().unwrap();

        let t_i16 = Tensor::new(vec![-1i16, 0, 1, 2], vec![4]).unwrap();
        save_tensor(file.path(), &t_i16).unwrap();
        assert_eq!(load_tensor::<i16, _>(file.path()).unwrap(), t_i16);

        let t_i32 = Tensor::new(vec![i32::MIN, 0, i32::MAX], vec![3]).unwrap();
        save_tensor(file.path(), &t_i32).unwrap();
        assert_eq!(load_tensor::<i32, _>(file.path()).unwrap(), t_i32);

        let t_f64 = Tensor::new(vec![1.25f64, -0.5], vec![2, 1]).unwrap();
        save_tensor(file.path(), &t_f64).unwrap();
        assert_eq!(load_tensor::<f64, _>(file.path()).unwrap(), t_f64);
    }

    #[test]
    fn test_round_trip_scalar_and_empty() {
        let file = NamedTempFile::new().unwrap();

        let scalar = Tensor::new(vec![42.0f32], vec![]).unwrap();
        save_tensor(file.path(), &scalar).unwrap();
        assert_eq!(load_tensor::<f32, _>(file.path()).unwrap(), scalar);

        let empty: Tensor<f32> = Tensor::new(Vec::new(), vec![0, 3]).unwrap();
        save_tensor(file.path(), &empty).unwrap();
        assert_eq!(load_tensor::<f32, _>(file.path()).unwrap(), empty);
    }

    #[test]
    fn test_file_not_found() {
        let result = load_tensor::<f32, _>("does_not_exist.vectra");
        assert!(matches!(result, Err(TensorIoError::Io(_))));
    }

    #[test]
    fn test_truncated_header_length() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&[1, 0, 0, 0, 0, 0, 0]).unwrap(); // 7 of 8 bytes
        let result = load_tensor::<f32, _>(temp_path(&file));
        assert!(
            matches!(result, Err(TensorIoError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof)
        );
    }

    #[test]
    fn test_zero_header_length() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&0u64.to_le_bytes()).unwrap();
        let result = load_tensor::<f32, _>(temp_path(&file));
        assert!(matches!(result, Err(TensorIoError::InvalidHeaderLength)));
    }

    #[test]
    fn test_malformed_json_header() {
        let mut file = NamedTempFile::new().unwrap();
        let bad_json = br#"{"dtype": "F32", "shape": [2]"#; // Missing closing brace
        file.write_all(&(bad_json.len() as u64).to_le_bytes()).unwrap();
        file.write_all(bad_json).unwrap();
        let result = load_tensor::<f32, _>(temp_path(&file));
        assert!(matches!(result, Err(TensorIoError::Json(_))));
    }

    #[test]
    fn test_dtype_mismatch() {
        let tensor = Tensor::new(vec![1.0f32, 2.0], vec![2]).unwrap();
        let file = NamedTempFile::new().unwrap();
        save_tensor(file.path(), &tensor).unwrap();
        let result = load_tensor::<f64, _>(file.path());
        assert!(matches!(result, Err(TensorIoError::DtypeMismatch(s)) if s.contains("F32")));
    }

    #[test]
    fn test_declared_size_mismatch() {
        let mut file = NamedTempFile::new().unwrap();
        // Shape [2, 2] of f32 needs 16 bytes but the header declares 10.
        let header = br#"{"dtype": "F32", "shape": [2, 2], "data_len": 10}"#;
        file.write_all(&(header.len() as u64).to_le_bytes()).unwrap();
        file.write_all(header).unwrap();
        let result = load_tensor::<f32, _>(temp_path(&file));
        assert!(
            matches!(result, Err(TensorIoError::DataCorruption(s)) if s.contains("needs 16"))
        );
    }

    #[test]
    fn test_truncated_payload() {
        let mut file = NamedTempFile::new().unwrap();
        let header = br#"{"dtype": "F32", "shape": [2, 2], "data_len": 16}"#;
        file.write_all(&(header.len() as u64).to_le_bytes()).unwrap();
        file.write_all(header).unwrap();
        file.write_all(&1.0f32.to_le_bytes()).unwrap(); // 4 of 16 bytes
        let result = load_tensor::<f32, _>(temp_path(&file));
        assert!(
            matches!(result, Err(TensorIoError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof)
        );
    }
}
