//! Inclusive ranges used throughout strategy configuration.

use serde::{Deserialize, Serialize};

use crate::phase::ConfigError;

/// Inclusive integer range `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct IntervalInt {
    pub min: i32,
    pub max: i32,
}

impl IntervalInt {
    #[must_use]
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    /// Degenerate interval that always yields `value`.
    #[must_use]
    pub const fn exactly(value: i32) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    #[must_use]
    pub const fn contains(self, value: i32) -> bool {
        value >= self.min && value <= self.max
    }

    pub(crate) fn validate(self, field: &'static str) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::IntervalInverted {
                field,
                min: f64::from(self.min),
                max: f64::from(self.max),
            });
        }
        Ok(())
    }

    pub(crate) fn validate_non_negative(self, field: &'static str) -> Result<(), ConfigError> {
        self.validate(field)?;
        if self.min < 0 {
            return Err(ConfigError::MinViolation {
                field,
                min: 0.0,
                value: f64::from(self.min),
            });
        }
        Ok(())
    }
}

/// Inclusive float range `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

/// Where a value sits relative to an [`Interval`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Valence {
    Below,
    Inside,
    Above,
}

impl Interval {
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn valence(self, value: f32) -> Valence {
        if value < self.min {
            Valence::Below
        } else if value > self.max {
            Valence::Above
        } else {
            Valence::Inside
        }
    }

    pub(crate) fn validate(self, field: &'static str) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(ConfigError::IntervalInverted {
                field,
                min: f64::from(self.min),
                max: f64::from(self.max),
            });
        }
        Ok(())
    }
}
