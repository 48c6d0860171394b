/////////////////////////////////////////////////////////////////////////////////////////////
//
// Reads and writes solved interpolants as versioned JSON envelopes.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Model persistence.
//!
//! A solved interpolant is written as `{ format, version, ...snapshot }`. The
//! snapshot carries the mesh, the kernel, the centre indices and the solved
//! weights, so a model can be evaluated again after loading without
//! reassembling or re-solving its system. The geodesic service is not stored;
//! the default service is rebuilt over the stored mesh.

use crate::{
    common,
    errors::{GeodesicRbfError, Result},
    mesh::TriangleMesh,
};
use faer::Mat;
use geodesic_rbf_utils::KernelParams;
use serde::{Deserialize, Serialize};
use std::{
    error::Error,
    fmt,
    fs::File,
    io::{self, BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

const JSON_FORMAT_NAME: &str = "geodesic_rbf.json";
const JSON_VERSION: u32 = 1;

/// Borrowing envelope for SAVE (no clone of the model).
#[derive(Serialize)]
struct JsonEnvelopeRef<'a, T: ?Sized> {
    format: &'static str,
    version: u32,
    #[serde(flatten)]
    model: &'a T,
}

/// Owning envelope for LOAD (generic over the concrete model).
#[derive(Serialize, Deserialize)]
struct JsonEnvelopeOwned<T> {
    format: String,
    version: u32,
    #[serde(flatten)]
    model: T,
}

/// Which interpolant a snapshot was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ModelKind {
    Rbf,
    Kansa { coef: f64, num_operator_rows: usize },
}

impl ModelKind {
    fn name(&self) -> &'static str {
        match self {
            ModelKind::Rbf => "rbf",
            ModelKind::Kansa { .. } => "kansa",
        }
    }
}

/// Everything needed to evaluate a solved interpolant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ModelSnapshot {
    pub kind: ModelKind,
    pub mesh: TriangleMesh,
    pub kernel_params: KernelParams,
    pub center_indices: Vec<usize>,
    pub weights: Vec<f64>,
    pub is_singular: bool,
    /// Right-hand side the weights were solved against.
    pub reduced_values: Vec<f64>,
}

impl ModelSnapshot {
    /// Checks the invariants a freshly built interpolant satisfies.
    fn validate(self) -> Result<Self> {
        let mesh = self.mesh.validated()?;
        let n = self.center_indices.len();

        common::check_center_indices(&self.center_indices, mesh.num_vertices())?;
        if self.weights.len() != n || self.reduced_values.len() != n {
            return Err(GeodesicRbfError::invalid_config(format!(
                "snapshot holds {} centres but {} weights and {} values",
                n,
                self.weights.len(),
                self.reduced_values.len()
            )));
        }
        if !self.kernel_params.epsilon.is_finite() {
            return Err(GeodesicRbfError::invalid_config(
                "snapshot shape parameter is not finite",
            ));
        }
        if let ModelKind::Kansa {
            num_operator_rows, ..
        } = self.kind
        {
            let in_vertex_order = self.center_indices.iter().enumerate().all(|(i, &c)| i == c);
            if n != mesh.num_vertices() || num_operator_rows > n || !in_vertex_order {
                return Err(GeodesicRbfError::invalid_config(
                    "kansa snapshot does not cover every mesh vertex",
                ));
            }
        }

        Ok(Self { mesh, ..self })
    }

    pub(crate) fn weights_mat(&self) -> Mat<f64> {
        Mat::from_fn(self.weights.len(), 1, |i, _| self.weights[i])
    }

    pub(crate) fn reduced_values_mat(&self) -> Mat<f64> {
        Mat::from_fn(self.reduced_values.len(), 1, |i, _| self.reduced_values[i])
    }
}

pub(crate) fn column_to_vec(m: &Mat<f64>) -> Vec<f64> {
    (0..m.nrows()).map(|i| m[(i, 0)]).collect()
}

pub type ModelIOResult<T> = std::result::Result<T, ModelIOError>;

/// Errors that can occur when saving or loading a model.
///
/// This is the error type returned by the `save_model` and `load_model`
/// methods of [`GeodesicRBFInterpolator`](crate::GeodesicRBFInterpolator) and
/// [`KansaSolver`](crate::KansaSolver), wrapping lower-level I/O and JSON
/// serialization issues as well as format/version validation failures.
#[derive(Debug)]
pub enum ModelIOError {
    /// Failed to create the target file before writing a model.
    Create { path: PathBuf, source: io::Error },
    /// Failed to open an existing model file for reading.
    Open { path: PathBuf, source: io::Error },
    /// Failed to flush buffered output when finishing a write.
    Flush { path: PathBuf, source: io::Error },
    /// Error serializing the in-memory model to JSON.
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// Error parsing JSON when reading a model from disk.
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    /// The JSON `format` field does not match the expected model format.
    FormatMismatch {
        path: PathBuf,
        found: String,
        expected: &'static str,
    },
    /// The JSON `version` field does not match the supported version.
    VersionMismatch {
        path: PathBuf,
        found: u32,
        expected: u32,
    },
    /// The file parsed, but its contents cannot be turned back into the
    /// requested interpolant (wrong model kind, inconsistent sizes, bad mesh).
    Rebuild {
        path: PathBuf,
        source: GeodesicRbfError,
    },
}

impl fmt::Display for ModelIOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelIOError::Create { path, source } => {
                write!(f, "creating {}: {}", path.display(), source)
            }
            ModelIOError::Open { path, source } => {
                write!(f, "opening {}: {}", path.display(), source)
            }
            ModelIOError::Flush { path, source } => {
                write!(f, "flushing {}: {}", path.display(), source)
            }
            ModelIOError::Serialize { path, source } => {
                write!(f, "serializing JSON to {}: {}", path.display(), source)
            }
            ModelIOError::Parse { path, source } => {
                write!(f, "parsing JSON in {}: {}", path.display(), source)
            }
            ModelIOError::FormatMismatch {
                path,
                found,
                expected,
            } => write!(
                f,
                "unsupported format {:?} (expected {:?}) in {}",
                found,
                expected,
                path.display()
            ),
            ModelIOError::VersionMismatch {
                path,
                found,
                expected,
            } => write!(
                f,
                "unsupported version {} (expected {}) in {}",
                found,
                expected,
                path.display()
            ),
            ModelIOError::Rebuild { path, source } => {
                write!(f, "rebuilding model from {}: {}", path.display(), source)
            }
        }
    }
}

impl Error for ModelIOError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ModelIOError::Create { source, .. }
            | ModelIOError::Open { source, .. }
            | ModelIOError::Flush { source, .. } => Some(source),
            ModelIOError::Serialize { source, .. } | ModelIOError::Parse { source, .. } => {
                Some(source)
            }
            ModelIOError::Rebuild { source, .. } => Some(source),
            ModelIOError::FormatMismatch { .. } | ModelIOError::VersionMismatch { .. } => None,
        }
    }
}

/// Writes `snapshot` to `path` inside a versioned envelope.
pub(crate) fn write_snapshot(path: &Path, snapshot: &ModelSnapshot) -> ModelIOResult<()> {
    let file = File::create(path).map_err(|e| ModelIOError::Create {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut w = BufWriter::new(file);

    let env = JsonEnvelopeRef {
        format: JSON_FORMAT_NAME,
        version: JSON_VERSION,
        model: snapshot,
    };

    serde_json::to_writer_pretty(&mut w, &env).map_err(|e| ModelIOError::Serialize {
        path: path.to_path_buf(),
        source: e,
    })?;
    w.flush().map_err(|e| ModelIOError::Flush {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

/// Reads a snapshot of the expected kind back from `path`, validating the
/// envelope and the snapshot contents.
pub(crate) fn read_snapshot(path: &Path, expected: ModelKind) -> ModelIOResult<ModelSnapshot> {
    let file = File::open(path).map_err(|e| ModelIOError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;
    let reader = BufReader::new(file);

    let env: JsonEnvelopeOwned<ModelSnapshot> =
        serde_json::from_reader(reader).map_err(|e| ModelIOError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

    // Validate envelope
    if env.format != JSON_FORMAT_NAME {
        return Err(ModelIOError::FormatMismatch {
            path: path.to_path_buf(),
            found: env.format,
            expected: JSON_FORMAT_NAME,
        });
    }

    if env.version != JSON_VERSION {
        return Err(ModelIOError::VersionMismatch {
            path: path.to_path_buf(),
            found: env.version,
            expected: JSON_VERSION,
        });
    }

    let rebuild = |source: GeodesicRbfError| ModelIOError::Rebuild {
        path: path.to_path_buf(),
        source,
    };

    if env.model.kind.name() != expected.name() {
        return Err(rebuild(GeodesicRbfError::invalid_config(format!(
            "file holds a {} model, expected {}",
            env.model.kind.name(),
            expected.name()
        ))));
    }

    env.model.validate().map_err(rebuild)
}

#[cfg(test)]
mod tests {
    use super::*;
    use equator::assert;
    use geodesic_rbf_utils::KernelType;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("geodesic_rbf_{}_{}.json", name, std::process::id()))
    }

    fn snapshot() -> ModelSnapshot {
        ModelSnapshot {
            kind: ModelKind::Rbf,
            mesh: TriangleMesh::grid(2, 2, 1.0, 1.0),
            kernel_params: KernelParams::builder(KernelType::Gaussian).epsilon(0.5).build(),
            center_indices: vec![3, 0],
            weights: vec![0.25, -1.5],
            is_singular: false,
            reduced_values: vec![1.0, 2.0],
        }
    }

    #[test]
    fn snapshot_round_trip() {
        let path = temp_path("snapshot_round_trip");
        write_snapshot(&path, &snapshot()).unwrap();
        let back = read_snapshot(&path, ModelKind::Rbf).unwrap();
        let _ = std::fs::remove_file(&path);

        assert!(back == snapshot());
    }

    fn write_with_envelope(path: &Path, field: &str, replacement: serde_json::Value) {
        let mut value = serde_json::to_value(JsonEnvelopeRef {
            format: JSON_FORMAT_NAME,
            version: JSON_VERSION,
            model: &snapshot(),
        })
        .unwrap();
        value[field] = replacement;
        std::fs::write(path, value.to_string()).unwrap();
    }

    #[test]
    fn envelope_is_checked() {
        let path = temp_path("envelope_format");
        write_with_envelope(&path, "format", serde_json::json!("some_other_model.json"));
        let err = read_snapshot(&path, ModelKind::Rbf).unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert!(matches!(err, ModelIOError::FormatMismatch { .. }));

        let path = temp_path("envelope_version");
        write_with_envelope(&path, "version", serde_json::json!(99));
        let err = read_snapshot(&path, ModelKind::Rbf).unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert!(matches!(err, ModelIOError::VersionMismatch { found: 99, .. }));
    }

    #[test]
    fn truncated_files_fail_to_parse() {
        let path = temp_path("truncated");
        std::fs::write(&path, r#"{"format": "geodesic_rbf.json", "version": 1"#).unwrap();
        let err = read_snapshot(&path, ModelKind::Rbf).unwrap_err();
        let _ = std::fs::remove_file(&path);
        assert!(matches!(err, ModelIOError::Parse { .. }));
    }

    #[test]
    fn wrong_kind_is_a_rebuild_error() {
        let path = temp_path("wrong_kind");
        write_snapshot(&path, &snapshot()).unwrap();
        let err = read_snapshot(
            &path,
            ModelKind::Kansa {
                coef: 1.0,
                num_operator_rows: 0,
            },
        )
        .unwrap_err();
        let _ = std::fs::remove_file(&path);

        assert!(matches!(err, ModelIOError::Rebuild { .. }));
        assert!(err.to_string().contains("rbf"));
    }

    #[test]
    fn inconsistent_snapshots_are_rejected() {
        let path = temp_path("inconsistent");
        let mut bad = snapshot();
        bad.weights.pop();
        write_snapshot(&path, &bad).unwrap();
        let err = read_snapshot(&path, ModelKind::Rbf).unwrap_err();
        let _ = std::fs::remove_file(&path);

        assert!(matches!(err, ModelIOError::Rebuild { .. }));
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let err = read_snapshot(&temp_path("does_not_exist"), ModelKind::Rbf).unwrap_err();
        assert!(matches!(err, ModelIOError::Open { .. }));
    }
}
