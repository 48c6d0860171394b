/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares the error type raised while configuring, assembling, and querying interpolants.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use geodesic_rbf_utils::UnknownKernelError;
use std::{error::Error, fmt};

/// Errors raised while building or querying a geodesic interpolant.
///
/// A singular collocation matrix is deliberately **not** an error. It is
/// recorded on the interpolant instead, see
/// [`GeodesicRBFInterpolator::is_singular`](crate::GeodesicRBFInterpolator::is_singular).
#[derive(Debug, Clone, PartialEq)]
pub enum GeodesicRbfError {
    /// The inputs are inconsistent: unknown kernel family, malformed centre
    /// indices, mismatched operator/right-hand-side shapes, non-finite values.
    /// Raised before any distance query or solve takes place.
    InvalidConfig { reason: String },

    /// A distance query referenced a vertex outside `[0, num_vertices)`.
    OutOfRange { index: usize, num_vertices: usize },
}

impl GeodesicRbfError {
    pub(crate) fn invalid_config<S: Into<String>>(reason: S) -> Self {
        GeodesicRbfError::InvalidConfig {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for GeodesicRbfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeodesicRbfError::InvalidConfig { reason } => {
                write!(f, "invalid configuration: {}", reason)
            }
            GeodesicRbfError::OutOfRange {
                index,
                num_vertices,
            } => write!(
                f,
                "vertex index {} is out of range for a mesh with {} vertices",
                index, num_vertices
            ),
        }
    }
}

impl Error for GeodesicRbfError {}

impl From<UnknownKernelError> for GeodesicRbfError {
    fn from(err: UnknownKernelError) -> Self {
        GeodesicRbfError::invalid_config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GeodesicRbfError>;

#[cfg(test)]
mod tests {
    use super::*;
    use equator::assert;
    use geodesic_rbf_utils::KernelType;

    #[test]
    fn unknown_kernel_becomes_invalid_config() {
        let err: GeodesicRbfError = "spline".parse::<KernelType>().unwrap_err().into();
        match &err {
            GeodesicRbfError::InvalidConfig { reason } => assert!(reason.contains("spline")),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn out_of_range_message_names_the_index() {
        let err = GeodesicRbfError::OutOfRange {
            index: 12,
            num_vertices: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("3 vertices"));
    }
}
