/////////////////////////////////////////////////////////////////////////////////////////////
//
// Supplies the kernel registry, name parsing, and dense kernel-matrix helpers.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{KernelFromParams, KernelParams, RadialKernel};
use faer::Mat;
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt, str::FromStr};

/// Returned when a kernel family name is not part of the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKernelError {
    pub name: String,
}

impl fmt::Display for UnknownKernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown kernel {:?} (expected one of {})",
            self.name,
            KernelType::ALL
                .iter()
                .map(|k| k.name())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl Error for UnknownKernelError {}

/// Builds a dense kernel matrix by applying a typed kernel to every entry of a
/// distance matrix.
#[inline(always)]
pub fn get_kernel_matrix_typed<K>(distances: &Mat<f64>, kernel_function: &K) -> Mat<f64>
where
    K: RadialKernel,
{
    let m = distances.nrows();
    let n = distances.ncols();

    let mut k_matrix = Mat::<f64>::zeros(m, n);

    for j in 0..n {
        for i in 0..m {
            k_matrix[(i, j)] = kernel_function.phi(distances[(i, j)]);
        }
    }

    k_matrix
}

/// Builds a symmetric kernel matrix from the lower triangle (diagonal included)
/// of a square distance matrix. The upper triangle of `distances` is never read.
#[inline(always)]
pub fn get_kernel_matrix_symmetric_typed<K>(distances: &Mat<f64>, kernel_function: &K) -> Mat<f64>
where
    K: RadialKernel,
{
    let n = distances.nrows();
    assert_eq!(n, distances.ncols(), "symmetric kernel matrix needs a square distance matrix");

    let mut k_matrix = Mat::<f64>::zeros(n, n);

    for j in 0..n {
        for i in j..n {
            let k_val = kernel_function.phi(distances[(i, j)]);

            // Write both symmetric entries
            k_matrix[(i, j)] = k_val;
            k_matrix[(j, i)] = k_val;
        }
    }

    k_matrix
}

// K-free dispatcher generated from the kernel registry below.
// Assumes each kernel type implements `KernelFromParams::from_params(&KernelParams) -> K`.
macro_rules! for_each_kernel {
    ( registry = [ $( ($V:ident, $name:literal, $Kty:path) ),* $(,)? ] ) => {

        /// Runtime kernel selector built from the kernel registry.
        ///
        /// Parsed from (and displayed as) the snake case family names
        /// `linear`, `cubic`, `thin_plate_spline`, `quintic`, `gaussian`,
        /// `multiquadric` and `inverse_quadric`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum KernelType {
            $( $V, )*
        }

        impl KernelType {
            /// Every registered kernel type, in registry order.
            pub const ALL: &'static [KernelType] = &[ $( KernelType::$V, )* ];

            /// Returns the family name used when parsing kernel names.
            pub fn name(&self) -> &'static str {
                match self {
                    $( KernelType::$V => $name, )*
                }
            }
        }

        impl FromStr for KernelType {
            type Err = UnknownKernelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $name => Ok(KernelType::$V), )*
                    _ => Err(UnknownKernelError { name: s.to_string() }),
                }
            }
        }

        /// Builds a dense kernel matrix for the selected [`KernelType`].
        #[inline(always)]
        pub fn get_kernel_matrix(distances: &Mat<f64>, params: &KernelParams) -> Mat<f64> {
            match params.kernel_type {
                $(
                    KernelType::$V => {
                        // Convert uniform params -> concrete kernel type
                        let k = <$Kty as KernelFromParams>::from_params(params);
                        get_kernel_matrix_typed(distances, &k)
                    }
                ),*
            }
        }

        /// Builds a symmetric kernel matrix from the lower triangle of `distances`.
        #[inline(always)]
        pub fn get_kernel_matrix_symmetric(distances: &Mat<f64>, params: &KernelParams) -> Mat<f64> {
            match params.kernel_type {
                $(
                    KernelType::$V => {
                        let k = <$Kty as KernelFromParams>::from_params(params);
                        get_kernel_matrix_symmetric_typed(distances, &k)
                    }
                ),*
            }
        }

        /// Evaluates the selected kernel function at distance `r`.
        #[inline(always)]
        pub fn kernel_phi(r: f64, params: &KernelParams) -> f64 {
            match params.kernel_type {
                $(
                    KernelType::$V => {
                        let k = <$Kty as KernelFromParams>::from_params(params);
                        k.phi(r)
                    }
                ),*
            }
        }
    };
}

for_each_kernel! {
    registry = [
        (Linear,          "linear",            crate::kernels::LinearRbfKernel),
        (Cubic,           "cubic",             crate::kernels::CubicRbfKernel),
        (ThinPlateSpline, "thin_plate_spline", crate::kernels::ThinPlateSplineRbfKernel),
        (Quintic,         "quintic",           crate::kernels::QuinticRbfKernel),
        (Gaussian,        "gaussian",          crate::kernels::GaussianRbfKernel),
        (Multiquadric,    "multiquadric",      crate::kernels::MultiquadricRbfKernel),
        (InverseQuadric,  "inverse_quadric",   crate::kernels::InverseQuadricRbfKernel),
    ]
}

impl Default for KernelType {
    fn default() -> Self {
        KernelType::Linear
    }
}

impl fmt::Display for KernelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
