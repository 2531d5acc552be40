//! Typed configuration for Anchored Direct Preference Optimization training.
//!
//! [`AdpoConfig`] extends the group-relative base settings in [`GrpoConfig`]
//! with anchoring, reward-temperature and adaptive-tau hyperparameters. Both
//! implement [`TrainerArgs`], which the file loader and CLI are written
//! against.

mod adaptive_tau;
mod adpo_config;
mod anchor_update_mode;
mod config_file;
mod field_schema;
mod grpo_config;
mod overrides;
mod trainer_args;
mod validation;

pub use adaptive_tau::AdaptiveTauSignals;
pub use adpo_config::{AdpoConfig, ConfigAdvisory};
pub use anchor_update_mode::{AnchorUpdateMode, ParseAnchorUpdateModeError};
pub use config_file::{
    load_trainer_config, parse_config_text, read_config_overrides, render_config, ConfigFormat,
};
pub use field_schema::{render_field_table, FieldKind, FieldSpec};
pub use grpo_config::{GrpoConfig, ImportanceSamplingLevel, LossType, ScaleRewards};
pub use overrides::{apply_json_overrides, apply_key_value_overrides, parse_key_value_override};
pub use trainer_args::TrainerArgs;
pub use validation::ConfigValidationError;
