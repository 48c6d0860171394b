/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides parameter and builder types for configuring RBF kernels.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use serde::{Deserialize, Serialize};
use crate::utils::KernelType;

/// Defines the [`KernelType`] to use, along with its shape parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KernelParams {
    /// KernelType enum variant to use.
    pub kernel_type: KernelType,

    /// Shape parameter of the kernel.
    ///
    /// For the polyharmonic kernels (linear, cubic, quintic, thin plate spline)
    /// this is a plain multiplicative scale. For the gaussian, multiquadric and
    /// inverse quadric kernels it scales the distance, so larger values give
    /// narrower, more local basis functions.
    pub epsilon: f64,
}

impl KernelParams {
    /// Begins building a [`KernelParams`] instance for the given kernel type.
    pub fn builder(kernel_type: KernelType) -> KernelParamsBuilder {
        KernelParamsBuilder {
            kernel_type,
            epsilon: 1.0,
        }
    }

    /// Evaluates the configured kernel at distance `r`.
    #[inline(always)]
    pub fn phi(&self, r: f64) -> f64 {
        crate::kernel_phi(r, self)
    }
}

impl Default for KernelParams {
    fn default() -> Self {
        KernelParams::builder(KernelType::default()).build()
    }
}

/// Builder for [`KernelParams`] that provides sensible defaults.
#[derive(Debug, Clone, Copy)]
pub struct KernelParamsBuilder {
    kernel_type: KernelType,
    epsilon: f64,
}

impl KernelParamsBuilder {
    /// Sets the `epsilon` shape parameter on the builder.
    pub fn epsilon(mut self, v: f64) -> Self {
        self.epsilon = v;
        self
    }

    /// Finalises the builder into a [`KernelParams`] value.
    ///
    /// The shape parameter is not checked here; the interpolators reject
    /// non-finite values when they are constructed.
    pub fn build(self) -> KernelParams {
        KernelParams {
            kernel_type: self.kernel_type,
            epsilon: self.epsilon,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use equator::assert;

    #[test]
    fn epsilon_defaults_to_one() {
        let params = KernelParams::builder(KernelType::Gaussian).build();
        assert!(params.epsilon == 1.0);
        assert!(params.kernel_type == KernelType::Gaussian);
    }

    #[test]
    fn default_params_use_linear_kernel() {
        let params = KernelParams::default();
        assert!(params.kernel_type == KernelType::Linear);
        assert!(params.phi(2.5) == 2.5);
    }

    #[test]
    fn phi_dispatches_to_selected_kernel() {
        let params = KernelParams::builder(KernelType::Cubic).epsilon(2.0).build();
        assert!(params.phi(2.0) == 16.0);
    }
}
