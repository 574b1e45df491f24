//! Named-tensor parameter bundles and their persistence.
//!
//! A [`ParameterBundle`] is the only externally persisted form of a brain's
//! learnable state: the eight network tensors keyed by name plus the brain's
//! display name. Bundles are plain serde data, so JSON files, message payloads
//! or any other serde format can carry them.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Control network, input to hidden weights `[59, 32]`.
pub const W1_A: &str = "W1_A";
/// Control network hidden bias `[32]`.
pub const B1_A: &str = "b1_A";
/// Control network, hidden to output weights `[32, 4]`.
pub const W2_A: &str = "W2_A";
/// Control network output bias `[4]`.
pub const B2_A: &str = "b2_A";
/// Predictor network, input to hidden weights `[63, 24]`.
pub const W1_B: &str = "W1_B";
/// Predictor network hidden bias `[24]`.
pub const B1_B: &str = "b1_B";
/// Predictor network, hidden to output weights `[24, 9]`.
pub const W2_B: &str = "W2_B";
/// Predictor network output bias `[9]`.
pub const B2_B: &str = "b2_B";

/// Every tensor name, in the order they are validated on import.
pub const TENSOR_NAMES: [&str; 8] = [W1_A, B1_A, W2_A, B2_A, W1_B, B1_B, W2_B, B2_B];

/// A dense row-major array with an explicit shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Tensor {
    /// Wrap `data` with the given shape. Consistency is checked on import,
    /// not here, so deserialised tensors and hand-built ones behave alike.
    #[must_use]
    pub fn new(shape: Vec<usize>, data: Vec<f32>) -> Self {
        Self { shape, data }
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Check this tensor against an expected shape.
    ///
    /// # Errors
    ///
    /// [`ImportError::ShapeMismatch`] when the declared shape differs from
    /// `expected`; [`ImportError::MalformedTensor`] when the data length does
    /// not match the declared shape.
    pub fn expect_shape(&self, name: &str, expected: &[usize]) -> Result<(), ImportError> {
        if self.shape != expected {
            return Err(ImportError::ShapeMismatch {
                tensor: name.to_string(),
                expected: expected.to_vec(),
                actual: self.shape.clone(),
            });
        }
        let len: usize = self.shape.iter().product();
        if self.data.len() != len {
            return Err(ImportError::MalformedTensor {
                tensor: name.to_string(),
                shape: self.shape.clone(),
                len: self.data.len(),
            });
        }
        Ok(())
    }
}

/// Tensors keyed by name.
pub type TensorMap = BTreeMap<String, Tensor>;

/// Snapshot of a brain's learnable state plus its display name.
///
/// A bundle owns its data outright; mutating the brain it came from never
/// changes a bundle that was already exported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterBundle {
    /// Display name of the brain, including its lineage markers.
    pub name: String,
    /// The eight network tensors keyed by [`TENSOR_NAMES`].
    pub tensors: TensorMap,
}

/// Look up a tensor by name.
///
/// # Errors
///
/// Returns [`ImportError::MissingTensor`] if no tensor has that name.
pub fn lookup<'a>(map: &'a TensorMap, name: &str) -> Result<&'a Tensor, ImportError> {
    map.get(name)
        .ok_or_else(|| ImportError::MissingTensor(name.to_string()))
}

impl ParameterBundle {
    /// Serialise to a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::Format`] if serialisation fails.
    pub fn to_json(&self) -> Result<String, PersistError> {
        serde_json::to_string(self).map_err(PersistError::Format)
    }

    /// Parse a bundle from a JSON string. Shapes are validated only when the
    /// bundle is imported into a brain.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::Format`] if the JSON is not a valid bundle.
    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        serde_json::from_str(json).map_err(PersistError::Format)
    }

    /// Write the bundle to `path` as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::Io`] on filesystem failure or
    /// [`PersistError::Format`] on serialisation failure.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistError> {
        let json = self.to_json()?;
        fs::write(path, json).map_err(PersistError::Io)
    }

    /// Read a bundle previously written by [`save_json`](Self::save_json).
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::Io`] if the file cannot be read or
    /// [`PersistError::Format`] if it is not a valid bundle.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, PersistError> {
        let json = fs::read_to_string(path).map_err(PersistError::Io)?;
        Self::from_json(&json)
    }
}

/// Reasons a parameter import is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// A tensor's shape disagrees with the network's fixed dimensions.
    ShapeMismatch {
        /// Name of the offending tensor.
        tensor: String,
        /// Shape the network requires.
        expected: Vec<usize>,
        /// Shape found in the bundle.
        actual: Vec<usize>,
    },
    /// A required tensor is absent from the bundle.
    MissingTensor(String),
    /// A tensor's data length does not match its own declared shape.
    MalformedTensor {
        /// Name of the offending tensor.
        tensor: String,
        /// Declared shape.
        shape: Vec<usize>,
        /// Actual number of elements.
        len: usize,
    },
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::ShapeMismatch {
                tensor,
                expected,
                actual,
            } => write!(
                f,
                "incompatible brain: tensor {} has shape {:?}, expected {:?}",
                tensor, actual, expected
            ),
            ImportError::MissingTensor(name) => write!(f, "missing tensor {}", name),
            ImportError::MalformedTensor { tensor, shape, len } => write!(
                f,
                "tensor {} declares shape {:?} but holds {} values",
                tensor, shape, len
            ),
        }
    }
}

impl std::error::Error for ImportError {}

/// Failures while reading or writing a bundle file.
#[derive(Debug)]
pub enum PersistError {
    /// Filesystem error.
    Io(std::io::Error),
    /// The content is not a valid JSON parameter bundle.
    Format(serde_json::Error),
}

impl std::fmt::Display for PersistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistError::Io(err) => write!(f, "parameter file i/o failed: {}", err),
            PersistError::Format(err) => write!(f, "invalid parameter bundle: {}", err),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistError::Io(err) => Some(err),
            PersistError::Format(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bundle() -> ParameterBundle {
        let mut tensors = TensorMap::new();
        tensors.insert(B2_A.to_string(), Tensor::new(vec![4], vec![0.7, -0.5, 0.0, 0.0]));
        ParameterBundle {
            name: "ensemble".to_string(),
            tensors,
        }
    }

    #[test]
    fn test_expect_shape_accepts_matching_tensor() {
        let t = Tensor::new(vec![2, 3], vec![0.0; 6]);
        assert!(t.expect_shape("t", &[2, 3]).is_ok());
    }

    #[test]
    fn test_expect_shape_reports_malformed_data() {
        let t = Tensor::new(vec![2, 3], vec![0.0; 5]);
        let err = t.expect_shape("t", &[2, 3]).unwrap_err();
        assert!(matches!(err, ImportError::MalformedTensor { len: 5, .. }));
    }

    #[test]
    fn test_missing_tensor_lookup() {
        let bundle = sample_bundle();
        assert!(lookup(&bundle.tensors, B2_A).is_ok());
        assert_eq!(
            lookup(&bundle.tensors, W1_A).unwrap_err(),
            ImportError::MissingTensor(W1_A.to_string())
        );
    }

    #[test]
    fn test_json_file_roundtrip() {
        let bundle = sample_bundle();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brain.json");

        bundle.save_json(&path).unwrap();
        let restored = ParameterBundle::load_json(&path).unwrap();
        assert_eq!(restored, bundle);
    }

    #[test]
    fn test_load_json_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ParameterBundle::load_json(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, PersistError::Io(_)));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = ParameterBundle::from_json("{\"name\": 3}").unwrap_err();
        assert!(matches!(err, PersistError::Format(_)));
        assert!(err.to_string().contains("invalid parameter bundle"));
    }

    #[test]
    fn test_shape_mismatch_display_names_tensor() {
        let err = ImportError::ShapeMismatch {
            tensor: W1_A.to_string(),
            expected: vec![59, 32],
            actual: vec![10, 32],
        };
        let msg = err.to_string();
        assert!(msg.contains("W1_A"), "{msg}");
        assert!(msg.contains("[59, 32]"), "{msg}");
    }
}
