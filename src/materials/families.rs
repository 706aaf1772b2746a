//! Shared parameter packs for material families.
//!
//! These structs define the vocabulary used to configure the constitutive
//! models. They carry no per-particle state, so a host can edit them from a
//! settings panel and hand them to the solver on the next step.

use crate::config::constants;
use crate::error::MpmError;
use crate::materials::utils::{check, physics};
use crate::math::Real;

/// Parameters describing a weakly-compressible fluid.
///
/// The rest density is not stored here: it follows from the seeding lattice
/// (particles per cell, particle mass and grid spacing).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluidParams {
    pub name: &'static str,
    pub eos_stiffness: Real,
    pub eos_power: Real,
    pub dynamic_viscosity: Real,
}

impl FluidParams {
    pub const fn new(
        name: &'static str,
        eos_stiffness: Real,
        eos_power: Real,
        dynamic_viscosity: Real,
    ) -> Self {
        Self {
            name,
            eos_stiffness,
            eos_power,
            dynamic_viscosity,
        }
    }

    /// Default parameters matching the fluid demo.
    pub const fn water() -> Self {
        Self::new(
            "water",
            constants::EOS_STIFFNESS,
            constants::EOS_POWER,
            constants::DYNAMIC_VISCOSITY,
        )
    }

    pub fn validate(&self) -> Result<(), MpmError> {
        if !check::stiffness_ok(self.eos_stiffness) {
            return Err(MpmError::InvalidMaterial {
                name: "eos_stiffness",
                value: self.eos_stiffness,
            });
        }
        if !check::exponent_ok(self.eos_power) {
            return Err(MpmError::InvalidMaterial {
                name: "eos_power",
                value: self.eos_power,
            });
        }
        if !check::viscosity_ok(self.dynamic_viscosity) {
            return Err(MpmError::InvalidMaterial {
                name: "dynamic_viscosity",
                value: self.dynamic_viscosity,
            });
        }
        Ok(())
    }
}

impl Default for FluidParams {
    fn default() -> Self {
        Self::water()
    }
}

/// Hyperelastic energy used by the elastic variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ElasticModel {
    /// Stress from the distance between `F` and its closest rotation.
    #[default]
    FixedCorotated,
    /// Compressible Neo-Hookean energy.
    NeoHookean,
}

/// Parameters describing an isotropic elastic solid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElasticParams {
    pub name: &'static str,
    pub lambda: Real,
    pub mu: Real,
    pub model: ElasticModel,
}

impl ElasticParams {
    pub const fn new(name: &'static str, lambda: Real, mu: Real, model: ElasticModel) -> Self {
        Self {
            name,
            lambda,
            mu,
            model,
        }
    }

    pub const fn jelly() -> Self {
        Self::new(
            "jelly",
            constants::ELASTIC_LAMBDA,
            constants::ELASTIC_MU,
            ElasticModel::FixedCorotated,
        )
    }

    pub fn from_young_poisson(
        name: &'static str,
        young_modulus: Real,
        poisson_ratio: Real,
        model: ElasticModel,
    ) -> Self {
        let (lambda, mu) = physics::lame_lambda_mu(young_modulus, poisson_ratio);
        Self::new(name, lambda, mu, model)
    }

    pub fn with_model(mut self, model: ElasticModel) -> Self {
        self.model = model;
        self
    }

    pub fn validate(&self) -> Result<(), MpmError> {
        if !check::lame_ok(self.lambda, self.mu) {
            let (name, value) = if self.mu > 0.0 && self.mu.is_finite() {
                ("lambda", self.lambda)
            } else {
                ("mu", self.mu)
            };
            return Err(MpmError::InvalidMaterial { name, value });
        }
        Ok(())
    }
}

impl Default for ElasticParams {
    fn default() -> Self {
        Self::jelly()
    }
}
