//! Phase pipeline configuration: which customizers and karma strategies run,
//! for how wide, under which clearance and seed.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{DEFAULT_CHUNK_PROTOTYPE, DEFAULT_VCLEAR, PRESET_LEVEL_JSON};
use crate::customize::Customizer;
use crate::karma::Karma;

/// Errors raised when generator configuration invariants are violated.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("configuration defines no phases")]
    NoPhases,
    #[error("phase {phase} has no customizers")]
    EmptyPhase { phase: usize },
    #[error("phase {phase} width must be positive (got {width})")]
    PhaseWidth { phase: usize, width: i32 },
    #[error("{field} must not be empty")]
    EmptyCatalogue { field: &'static str },
    #[error("{field} interval inverted (min {min} > max {max})")]
    IntervalInverted {
        field: &'static str,
        min: f64,
        max: f64,
    },
    #[error("{field} must be at least {min} (got {value})")]
    MinViolation {
        field: &'static str,
        min: f64,
        value: f64,
    },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.2})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
}

pub(crate) fn validate_odds(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::RangeViolation {
            field,
            min: 0.0,
            max: 1.0,
            value: f64::from(value),
        });
    }
    Ok(())
}

pub(crate) fn validate_min(field: &'static str, min: i64, value: i64) -> Result<(), ConfigError> {
    if value < min {
        #[allow(clippy::cast_precision_loss)]
        return Err(ConfigError::MinViolation {
            field,
            min: min as f64,
            value: value as f64,
        });
    }
    Ok(())
}

pub(crate) fn validate_catalogue<T: AsRef<str>>(
    field: &'static str,
    entries: &[T],
) -> Result<(), ConfigError> {
    if entries.is_empty() || entries.iter().any(|entry| entry.as_ref().trim().is_empty()) {
        return Err(ConfigError::EmptyCatalogue { field });
    }
    Ok(())
}

/// One stage of the level: its strategy catalogues and its span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomizerPhase {
    pub customizers: Vec<Customizer>,
    #[serde(default)]
    pub karmas: Vec<Karma>,
    /// Columns this phase covers, measured from where the previous phase ended.
    pub width: i32,
}

impl CustomizerPhase {
    fn validate(&self, phase: usize) -> Result<(), ConfigError> {
        if self.customizers.is_empty() {
            return Err(ConfigError::EmptyPhase { phase });
        }
        if self.width <= 0 {
            return Err(ConfigError::PhaseWidth {
                phase,
                width: self.width,
            });
        }
        for customizer in &self.customizers {
            customizer.validate()?;
        }
        for karma in &self.karmas {
            karma.validate()?;
        }
        Ok(())
    }
}

/// Complete generator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "GeneratorConfig::default_vclear")]
    pub vclear: i32,
    #[serde(default = "GeneratorConfig::default_chunk_prototype")]
    pub chunk_prototype: String,
    pub phases: Vec<CustomizerPhase>,
}

impl GeneratorConfig {
    #[must_use]
    pub const fn default_vclear() -> i32 {
        DEFAULT_VCLEAR
    }

    #[must_use]
    pub fn default_chunk_prototype() -> String {
        DEFAULT_CHUNK_PROTOTYPE.to_string()
    }

    #[must_use]
    pub fn new(phases: Vec<CustomizerPhase>, vclear: i32, seed: u64) -> Self {
        Self {
            seed,
            vclear,
            chunk_prototype: Self::default_chunk_prototype(),
            phases,
        }
    }

    /// Parse a level file.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a generator configuration.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The bundled preset level.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled asset fails to parse.
    pub fn preset() -> Result<Self, serde_json::Error> {
        Self::from_json(PRESET_LEVEL_JSON)
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Sum of every phase width.
    #[must_use]
    pub fn total_width(&self) -> i32 {
        self.phases
            .iter()
            .fold(0i32, |total, phase| total.saturating_add(phase.width.max(0)))
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when any field violates the documented bounds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_min("vclear", 1, i64::from(self.vclear))?;
        if self.chunk_prototype.trim().is_empty() {
            return Err(ConfigError::EmptyCatalogue {
                field: "chunk_prototype",
            });
        }
        if self.phases.is_empty() {
            return Err(ConfigError::NoPhases);
        }
        for (index, phase) in self.phases.iter().enumerate() {
            phase.validate(index)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::customize::Extrude;
    use crate::interval::IntervalInt;

    fn extrude_phase(width: i32) -> CustomizerPhase {
        CustomizerPhase {
            customizers: vec![Customizer::Extrude(Extrude {
                width: IntervalInt::new(4, 8),
            })],
            karmas: Vec::new(),
            width,
        }
    }

    #[test]
    fn preset_parses_and_validates() {
        let config = GeneratorConfig::preset().expect("bundled preset parses");
        config.validate().expect("bundled preset is valid");
        assert!(config.total_width() > 0);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config = GeneratorConfig::from_json(
            r#"{"phases":[{"width":10,"customizers":[{"kind":"extrude","width":{"min":1,"max":2}}]}]}"#,
        )
        .expect("deserialize");
        assert_eq!(config.vclear, DEFAULT_VCLEAR);
        assert_eq!(config.chunk_prototype, DEFAULT_CHUNK_PROTOTYPE);
        assert_eq!(config.seed, 0);
        assert!(config.phases[0].karmas.is_empty());
        config.validate().expect("defaults are valid");
    }

    #[test]
    fn validation_rejects_structural_problems() {
        assert_eq!(
            GeneratorConfig::new(Vec::new(), 2, 0).validate(),
            Err(ConfigError::NoPhases)
        );
        let empty = CustomizerPhase {
            customizers: Vec::new(),
            karmas: Vec::new(),
            width: 10,
        };
        assert_eq!(
            GeneratorConfig::new(vec![extrude_phase(10), empty], 2, 0).validate(),
            Err(ConfigError::EmptyPhase { phase: 1 })
        );
        assert_eq!(
            GeneratorConfig::new(vec![extrude_phase(0)], 2, 0).validate(),
            Err(ConfigError::PhaseWidth { phase: 0, width: 0 })
        );
        assert!(matches!(
            GeneratorConfig::new(vec![extrude_phase(5)], 0, 0).validate(),
            Err(ConfigError::MinViolation { field: "vclear", .. })
        ));
    }

    #[test]
    fn odds_outside_unit_range_rejected() {
        assert!(validate_odds("odds", 0.5).is_ok());
        assert!(matches!(
            validate_odds("odds", 1.5),
            Err(ConfigError::RangeViolation { field: "odds", .. })
        ));
        assert!(validate_odds("odds", f32::NAN).is_err());
    }

    #[test]
    fn total_width_sums_phases() {
        let config = GeneratorConfig::new(vec![extrude_phase(10), extrude_phase(15)], 2, 0);
        assert_eq!(config.total_width(), 25);
    }
}
