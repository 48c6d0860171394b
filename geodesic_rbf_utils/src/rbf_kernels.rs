/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the concrete RBF kernel functions of a scalar distance.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

// Powers go through `powf` rather than `powi` so that values agree with the
// C `pow` used by reference implementations down to the last bit.

use crate::{KernelFromParams, KernelParams, RadialKernel};

// Every kernel here is parameterised by the shape parameter alone.
macro_rules! shape_parameter_kernel {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Debug, Copy, PartialEq)]
        pub struct $name {
            pub epsilon: f64,
        }

        impl $name {
            #[inline(always)]
            pub fn new(epsilon: f64) -> Self {
                Self { epsilon }
            }
        }

        impl KernelFromParams for $name {
            #[inline(always)]
            fn from_params(p: &KernelParams) -> Self {
                Self::new(p.epsilon)
            }
        }
    };
}

shape_parameter_kernel! {
    /// Linear RBF kernel with `phi(r) = epsilon * r`.
    LinearRbfKernel
}

impl RadialKernel for LinearRbfKernel {
    #[inline(always)]
    fn phi(&self, r: f64) -> f64 {
        self.epsilon * r
    }
}

shape_parameter_kernel! {
    /// Cubic RBF kernel with `phi(r) = epsilon * r^3`.
    CubicRbfKernel
}

impl RadialKernel for CubicRbfKernel {
    #[inline(always)]
    fn phi(&self, r: f64) -> f64 {
        self.epsilon * r.powf(3.0)
    }
}

shape_parameter_kernel! {
    /// Thin plate spline RBF kernel with `phi(r) = epsilon * r^2 log r`.
    ///
    /// Defined as exactly zero at `r = 0`, where the limit of `r^2 log r` is zero
    /// but its direct evaluation is `NaN`.
    ThinPlateSplineRbfKernel
}

impl RadialKernel for ThinPlateSplineRbfKernel {
    #[inline(always)]
    fn phi(&self, r: f64) -> f64 {
        match r == 0.0 {
            true => 0.0,
            false => self.epsilon * r.powf(2.0) * r.ln(),
        }
    }
}

shape_parameter_kernel! {
    /// Quintic RBF kernel with `phi(r) = epsilon * r^5`.
    QuinticRbfKernel
}

impl RadialKernel for QuinticRbfKernel {
    #[inline(always)]
    fn phi(&self, r: f64) -> f64 {
        self.epsilon * r.powf(5.0)
    }
}

shape_parameter_kernel! {
    /// Gaussian RBF kernel with `phi(r) = exp(-(epsilon * r)^2)`.
    GaussianRbfKernel
}

impl RadialKernel for GaussianRbfKernel {
    #[inline(always)]
    fn phi(&self, r: f64) -> f64 {
        (-(self.epsilon * r).powf(2.0)).exp()
    }
}

shape_parameter_kernel! {
    /// Multiquadric RBF kernel with `phi(r) = -sqrt(1 + (epsilon * r)^2)`.
    MultiquadricRbfKernel
}

impl RadialKernel for MultiquadricRbfKernel {
    #[inline(always)]
    fn phi(&self, r: f64) -> f64 {
        -(1.0 + (self.epsilon * r).powf(2.0)).sqrt()
    }
}

shape_parameter_kernel! {
    /// Inverse quadric RBF kernel with `phi(r) = 1 / (1 + (epsilon * r)^2)`.
    InverseQuadricRbfKernel
}

impl RadialKernel for InverseQuadricRbfKernel {
    #[inline(always)]
    fn phi(&self, r: f64) -> f64 {
        1.0 / (1.0 + (self.epsilon * r).powf(2.0))
    }
}
