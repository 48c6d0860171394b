/////////////////////////////////////////////////////////////////////////////////////////////
//
// Re-exports kernel utilities and helper functions used across the geodesic_rbf crates.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Utilities for the [`geodesic_rbf`] crate
//!
//! Radial kernels in this crate are functions of a scalar distance only. The
//! distance itself is supplied by the caller, which is what allows the
//! interpolators in [`geodesic_rbf`] to feed surface-following (geodesic)
//! distances into otherwise ordinary RBF kernels.
mod rbf_kernels;
mod traits;
mod utils;
mod kernel_helpers;

/// Implemented Kernels for use in the [`geodesic_rbf`] crate.
pub mod kernels {
    pub use super::rbf_kernels::*;
}

pub use {
    kernel_helpers::{KernelParams, KernelParamsBuilder},
    utils::{
        KernelType, UnknownKernelError, get_kernel_matrix, get_kernel_matrix_symmetric,
        kernel_phi,
    },
    traits::{KernelFromParams, RadialKernel},
};
