/////////////////////////////////////////////////////////////////////////////////////////////
//
// Specifies kernel and collocation options for configuring geodesic interpolants.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Specifies kernel and collocation options for configuring geodesic interpolants.
use crate::errors::{GeodesicRbfError, Result};
use geodesic_rbf_utils::{KernelParams, KernelType};
use serde::{Deserialize, Serialize};

/// A convenience builder for constructing an [`InterpolantSettings`] instance.
///
/// The builder should be called via the [`InterpolantSettings::builder`] method.
#[derive(Debug, Clone, Copy)]
pub struct InterpolantSettingsBuilder {
    pub kernel_type: KernelType,
    pub epsilon: f64,
}

impl InterpolantSettingsBuilder {
    fn new(kernel_type: KernelType) -> Self {
        Self {
            kernel_type,
            epsilon: 1.0,
        }
    }

    /// Sets the shape parameter.
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Builds and returns an instance of [`InterpolantSettings`] from the values
    /// defined in the builder.
    pub fn build(self) -> InterpolantSettings {
        InterpolantSettings {
            kernel_type: self.kernel_type,
            epsilon: self.epsilon,
        }
    }
}

/// Kernel configuration of a [`GeodesicRBFInterpolator`](crate::GeodesicRBFInterpolator).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InterpolantSettings {
    /// The radial kernel family.
    pub kernel_type: KernelType,

    /// Shape parameter handed to the kernel. Defaults to `1.0`.
    pub epsilon: f64,
}

impl InterpolantSettings {
    /// Creates a builder for the given kernel type.
    pub fn builder(kernel_type: KernelType) -> InterpolantSettingsBuilder {
        InterpolantSettingsBuilder::new(kernel_type)
    }

    /// Creates a builder from a kernel family name such as `"gaussian"`.
    ///
    /// ### Errors
    /// - `InvalidConfig` if the name is not a registered kernel family.
    pub fn builder_from_name(name: &str) -> Result<InterpolantSettingsBuilder> {
        Ok(InterpolantSettingsBuilder::new(name.parse()?))
    }

    pub(crate) fn validate(&self) -> Result<()> {
        check_epsilon(self.epsilon)
    }
}

impl Default for InterpolantSettings {
    /// Linear kernel with unit shape parameter.
    fn default() -> Self {
        InterpolantSettings::builder(KernelType::Linear).build()
    }
}

impl From<InterpolantSettings> for KernelParams {
    fn from(s: InterpolantSettings) -> Self {
        KernelParams::builder(s.kernel_type).epsilon(s.epsilon).build()
    }
}

/// A convenience builder for constructing a [`KansaSettings`] instance.
///
/// The builder should be called via the [`KansaSettings::builder`] method.
#[derive(Debug, Clone, Copy)]
pub struct KansaSettingsBuilder {
    pub kernel_type: KernelType,
    pub epsilon: f64,
    pub coef: f64,
}

impl KansaSettingsBuilder {
    fn new(kernel_type: KernelType) -> Self {
        Self {
            kernel_type,
            epsilon: 1.0,
            coef: 1.0,
        }
    }

    /// Sets the shape parameter.
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Sets the scale applied to the operator-constrained rows.
    pub fn coef(mut self, coef: f64) -> Self {
        self.coef = coef;
        self
    }

    pub fn build(self) -> KansaSettings {
        KansaSettings {
            kernel_type: self.kernel_type,
            epsilon: self.epsilon,
            coef: self.coef,
        }
    }
}

/// Kernel and collocation configuration of a [`KansaSolver`](crate::KansaSolver).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KansaSettings {
    /// The radial kernel family. Defaults to multiquadric.
    pub kernel_type: KernelType,

    /// Shape parameter handed to the kernel. Defaults to `1.0`.
    pub epsilon: f64,

    /// Scale applied to every operator-constrained row of the collocation
    /// matrix. Defaults to `1.0`.
    pub coef: f64,
}

impl KansaSettings {
    /// Creates a builder for the given kernel type.
    pub fn builder(kernel_type: KernelType) -> KansaSettingsBuilder {
        KansaSettingsBuilder::new(kernel_type)
    }

    /// Creates a builder from a kernel family name such as `"multiquadric"`.
    ///
    /// ### Errors
    /// - `InvalidConfig` if the name is not a registered kernel family.
    pub fn builder_from_name(name: &str) -> Result<KansaSettingsBuilder> {
        Ok(KansaSettingsBuilder::new(name.parse()?))
    }

    pub(crate) fn validate(&self) -> Result<()> {
        check_epsilon(self.epsilon)?;
        if !self.coef.is_finite() {
            return Err(GeodesicRbfError::invalid_config(format!(
                "operator scale must be finite, got {}",
                self.coef
            )));
        }
        Ok(())
    }
}

impl Default for KansaSettings {
    /// Multiquadric kernel, unit shape parameter and unit operator scale.
    fn default() -> Self {
        KansaSettings::builder(KernelType::Multiquadric).build()
    }
}

impl From<KansaSettings> for KernelParams {
    fn from(s: KansaSettings) -> Self {
        KernelParams::builder(s.kernel_type).epsilon(s.epsilon).build()
    }
}

fn check_epsilon(epsilon: f64) -> Result<()> {
    match epsilon.is_finite() {
        true => Ok(()),
        false => Err(GeodesicRbfError::invalid_config(format!(
            "shape parameter must be finite, got {}",
            epsilon
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use equator::assert;

    #[test]
    fn defaults() {
        let rbf = InterpolantSettings::default();
        assert!(rbf.kernel_type == KernelType::Linear);
        assert!(rbf.epsilon == 1.0);

        let kansa = KansaSettings::default();
        assert!(kansa.kernel_type == KernelType::Multiquadric);
        assert!(kansa.epsilon == 1.0);
        assert!(kansa.coef == 1.0);
    }

    #[test]
    fn builders_from_names() {
        let settings = InterpolantSettings::builder_from_name("thin_plate_spline")
            .unwrap()
            .epsilon(0.5)
            .build();
        assert!(settings.kernel_type == KernelType::ThinPlateSpline);

        let params: KernelParams = settings.into();
        assert!(params.epsilon == 0.5);

        assert!(matches!(
            KansaSettings::builder_from_name("sinc"),
            Err(GeodesicRbfError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn validation_rejects_non_finite_parameters() {
        let settings = InterpolantSettings::builder(KernelType::Gaussian)
            .epsilon(f64::NAN)
            .build();
        assert!(settings.validate().is_err());

        let kansa = KansaSettings::builder(KernelType::Gaussian)
            .coef(f64::INFINITY)
            .build();
        assert!(kansa.validate().is_err());
        assert!(KansaSettings::default().validate().is_ok());
    }
}
