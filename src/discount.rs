//! Validated discount factor newtype.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// A scalar γ in [0, 1] giving the rate at which reinforcements decay per
/// timestep.
///
/// Temporally-extended actions with duration `d` are discounted by γ^d,
/// computed with [`DiscountFactor::pow`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct DiscountFactor(f64);

impl DiscountFactor {
    /// Create a new discount factor, validating it lies in [0, 1].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDiscountFactor`] if `gamma` is outside the
    /// interval or not a number.
    pub fn new(gamma: f64) -> Result<Self> {
        if (0.0..=1.0).contains(&gamma) {
            Ok(DiscountFactor(gamma))
        } else {
            Err(Error::InvalidDiscountFactor { value: gamma })
        }
    }

    /// Get the inner value.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// γ^duration, the discount applied to an action that takes `duration`
    /// timesteps to return control.
    pub fn pow(&self, duration: u32) -> f64 {
        self.0.powi(duration as i32)
    }
}

impl From<DiscountFactor> for f64 {
    fn from(gamma: DiscountFactor) -> Self {
        gamma.0
    }
}

impl fmt::Display for DiscountFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
