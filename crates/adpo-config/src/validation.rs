//! Typed validation errors and the range checks shared by trainer configs.

use thiserror::Error;

/// Error returned when a trainer configuration violates a field constraint.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigValidationError {
    #[error("config field '{field}' must be finite")]
    NonFinite { field: &'static str },
    #[error("config field '{field}' is {value}; expected {expected}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
    #[error("config field '{field}' must be greater than 0")]
    ZeroCount { field: &'static str },
    #[error("num_generations is {num_generations}; group-relative advantages need at least 2")]
    TooFewGenerations { num_generations: usize },
    #[error("generation_batch_size and steps_per_generation cannot both be set")]
    ConflictingGenerationSizing,
    #[error(
        "generation batch size {generation_batch_size} is not divisible by num_generations {num_generations}"
    )]
    IndivisibleGenerationBatch {
        generation_batch_size: usize,
        num_generations: usize,
    },
    #[error("adaptive_tau_min ({min}) must not exceed adaptive_tau_max ({max})")]
    InvertedTauBounds { min: f64, max: f64 },
    #[error("reward_weights[{index}] must be finite")]
    RewardWeightsNonFinite { index: usize },
}

pub(crate) fn ensure_finite(field: &'static str, value: f64) -> Result<(), ConfigValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigValidationError::NonFinite { field })
    }
}

pub(crate) fn ensure_positive(
    field: &'static str,
    value: f64,
) -> Result<(), ConfigValidationError> {
    ensure_finite(field, value)?;
    if value <= 0.0 {
        return Err(ConfigValidationError::OutOfRange {
            field,
            value,
            expected: "a value greater than 0",
        });
    }
    Ok(())
}

pub(crate) fn ensure_non_negative(
    field: &'static str,
    value: f64,
) -> Result<(), ConfigValidationError> {
    ensure_finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigValidationError::OutOfRange {
            field,
            value,
            expected: "a value of at least 0",
        });
    }
    Ok(())
}

pub(crate) fn ensure_unit_interval(
    field: &'static str,
    value: f64,
) -> Result<(), ConfigValidationError> {
    ensure_finite(field, value)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigValidationError::OutOfRange {
            field,
            value,
            expected: "a value in [0, 1]",
        });
    }
    Ok(())
}

pub(crate) fn ensure_nonzero_count(
    field: &'static str,
    value: usize,
) -> Result<(), ConfigValidationError> {
    if value == 0 {
        return Err(ConfigValidationError::ZeroCount { field });
    }
    Ok(())
}
