//! Base group-relative policy optimization (GRPO) trainer configuration.

use serde::{Deserialize, Serialize};

use crate::field_schema::{build_field_specs, FieldHelp, FieldKind, FieldSpec};
use crate::validation::{
    ensure_finite, ensure_non_negative, ensure_nonzero_count, ensure_positive,
    ConfigValidationError,
};

/// Granularity of the policy/old-policy importance ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImportanceSamplingLevel {
    #[default]
    Token,
    Sequence,
}

/// Normalization applied when aggregating the per-token loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LossType {
    Grpo,
    Bnpo,
    DrGrpo,
    #[default]
    Dapo,
}

/// Population used for the reward standard deviation when scaling advantages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScaleRewards {
    #[default]
    Group,
    Batch,
    None,
}

/// Settings shared by every group-relative trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrpoConfig {
    pub output_dir: String,
    pub learning_rate: f64,
    pub per_device_train_batch_size: usize,
    pub gradient_accumulation_steps: usize,
    pub num_train_epochs: f64,
    pub max_steps: Option<u64>,
    pub logging_steps: usize,
    pub save_steps: usize,
    pub seed: u64,
    /// Completions sampled per prompt; one group per prompt.
    pub num_generations: usize,
    pub generation_batch_size: Option<usize>,
    pub steps_per_generation: Option<usize>,
    pub max_prompt_length: Option<usize>,
    pub max_completion_length: usize,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: Option<usize>,
    pub repetition_penalty: f64,
    /// KL coefficient against the reference model. 0 skips loading it.
    pub beta: f64,
    pub num_iterations: usize,
    pub epsilon: f64,
    pub epsilon_high: Option<f64>,
    pub importance_sampling_level: ImportanceSamplingLevel,
    pub loss_type: LossType,
    pub scale_rewards: ScaleRewards,
    pub mask_truncated_completions: bool,
    pub reward_weights: Option<Vec<f64>>,
}

impl Default for GrpoConfig {
    fn default() -> Self {
        Self {
            output_dir: "trainer_output".to_string(),
            learning_rate: 1e-6,
            per_device_train_batch_size: 8,
            gradient_accumulation_steps: 1,
            num_train_epochs: 3.0,
            max_steps: None,
            logging_steps: 10,
            save_steps: 500,
            seed: 42,
            num_generations: 8,
            generation_batch_size: None,
            steps_per_generation: None,
            max_prompt_length: Some(512),
            max_completion_length: 256,
            temperature: 1.0,
            top_p: 1.0,
            top_k: None,
            repetition_penalty: 1.0,
            beta: 0.0,
            num_iterations: 1,
            epsilon: 0.2,
            epsilon_high: None,
            importance_sampling_level: ImportanceSamplingLevel::Token,
            loss_type: LossType::Dapo,
            scale_rewards: ScaleRewards::Group,
            mask_truncated_completions: false,
            reward_weights: None,
        }
    }
}

const GRPO_FIELD_HELP: &[FieldHelp] = &[
    ("output_dir", FieldKind::String, "Directory for checkpoints and logs."),
    ("learning_rate", FieldKind::Float, "Initial optimizer learning rate."),
    (
        "per_device_train_batch_size",
        FieldKind::Integer,
        "Completions per device per micro-batch.",
    ),
    (
        "gradient_accumulation_steps",
        FieldKind::Integer,
        "Micro-batches accumulated before each optimizer step.",
    ),
    ("num_train_epochs", FieldKind::Float, "Passes over the prompt dataset."),
    (
        "max_steps",
        FieldKind::OptionalInteger,
        "Total optimizer steps; overrides num_train_epochs when set.",
    ),
    ("logging_steps", FieldKind::Integer, "Optimizer steps between metric logs."),
    ("save_steps", FieldKind::Integer, "Optimizer steps between checkpoints."),
    ("seed", FieldKind::Integer, "Random seed for sampling and shuffling."),
    (
        "num_generations",
        FieldKind::Integer,
        "Completions sampled per prompt (group size).",
    ),
    (
        "generation_batch_size",
        FieldKind::OptionalInteger,
        "Completions generated per generation round. Exclusive with steps_per_generation.",
    ),
    (
        "steps_per_generation",
        FieldKind::OptionalInteger,
        "Optimizer micro-steps per generation round. Defaults to gradient_accumulation_steps.",
    ),
    (
        "max_prompt_length",
        FieldKind::OptionalInteger,
        "Prompt tokens kept (left-truncated). None keeps the full prompt.",
    ),
    ("max_completion_length", FieldKind::Integer, "Maximum generated tokens per completion."),
    ("temperature", FieldKind::Float, "Sampling temperature for generation."),
    ("top_p", FieldKind::Float, "Nucleus sampling probability mass."),
    ("top_k", FieldKind::OptionalInteger, "Top-k sampling cutoff. None disables it."),
    ("repetition_penalty", FieldKind::Float, "Penalty applied to repeated tokens."),
    (
        "beta",
        FieldKind::Float,
        "KL coefficient against the reference model. 0.0 skips loading the reference model.",
    ),
    (
        "num_iterations",
        FieldKind::Integer,
        "Optimization passes over each generated batch.",
    ),
    ("epsilon", FieldKind::Float, "Lower clipping bound offset for the importance ratio."),
    (
        "epsilon_high",
        FieldKind::OptionalFloat,
        "Upper clipping bound offset. Defaults to epsilon.",
    ),
    (
        "importance_sampling_level",
        FieldKind::Enum,
        "Importance ratio granularity: token or sequence.",
    ),
    (
        "loss_type",
        FieldKind::Enum,
        "Loss aggregation: grpo, bnpo, dr_grpo or dapo.",
    ),
    (
        "scale_rewards",
        FieldKind::Enum,
        "Reward std scaling population: group, batch or none.",
    ),
    (
        "mask_truncated_completions",
        FieldKind::Bool,
        "Exclude completions that hit max_completion_length from the loss.",
    ),
    (
        "reward_weights",
        FieldKind::FloatList,
        "Per reward function weights. None weights every function 1.0.",
    ),
];

impl GrpoConfig {
    /// Optimizer micro-steps per generation round.
    pub fn resolved_steps_per_generation(&self) -> usize {
        self.steps_per_generation
            .unwrap_or(self.gradient_accumulation_steps)
    }

    /// Completions generated per round, assuming a single training process.
    pub fn resolved_generation_batch_size(&self) -> usize {
        self.generation_batch_size.unwrap_or_else(|| {
            self.per_device_train_batch_size
                .saturating_mul(self.resolved_steps_per_generation())
        })
    }

    /// Checks every base field constraint.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        ensure_positive("learning_rate", self.learning_rate)?;
        ensure_nonzero_count(
            "per_device_train_batch_size",
            self.per_device_train_batch_size,
        )?;
        ensure_nonzero_count(
            "gradient_accumulation_steps",
            self.gradient_accumulation_steps,
        )?;
        ensure_positive("num_train_epochs", self.num_train_epochs)?;
        ensure_nonzero_count("logging_steps", self.logging_steps)?;
        ensure_nonzero_count("save_steps", self.save_steps)?;
        ensure_nonzero_count("num_iterations", self.num_iterations)?;
        ensure_nonzero_count("max_completion_length", self.max_completion_length)?;
        if let Some(max_prompt_length) = self.max_prompt_length {
            ensure_nonzero_count("max_prompt_length", max_prompt_length)?;
        }
        if let Some(top_k) = self.top_k {
            ensure_nonzero_count("top_k", top_k)?;
        }

        if self.num_generations < 2 {
            return Err(ConfigValidationError::TooFewGenerations {
                num_generations: self.num_generations,
            });
        }
        if self.generation_batch_size.is_some() && self.steps_per_generation.is_some() {
            return Err(ConfigValidationError::ConflictingGenerationSizing);
        }
        if let Some(steps) = self.steps_per_generation {
            ensure_nonzero_count("steps_per_generation", steps)?;
        }
        let generation_batch_size = self.resolved_generation_batch_size();
        ensure_nonzero_count("generation_batch_size", generation_batch_size)?;
        if generation_batch_size % self.num_generations != 0 {
            return Err(ConfigValidationError::IndivisibleGenerationBatch {
                generation_batch_size,
                num_generations: self.num_generations,
            });
        }

        ensure_positive("temperature", self.temperature)?;
        ensure_positive("top_p", self.top_p)?;
        if self.top_p > 1.0 {
            return Err(ConfigValidationError::OutOfRange {
                field: "top_p",
                value: self.top_p,
                expected: "a value in (0, 1]",
            });
        }
        ensure_positive("repetition_penalty", self.repetition_penalty)?;
        ensure_non_negative("beta", self.beta)?;
        ensure_non_negative("epsilon", self.epsilon)?;
        if let Some(epsilon_high) = self.epsilon_high {
            ensure_finite("epsilon_high", epsilon_high)?;
            if epsilon_high < self.epsilon {
                return Err(ConfigValidationError::OutOfRange {
                    field: "epsilon_high",
                    value: epsilon_high,
                    expected: "a value of at least epsilon",
                });
            }
        }
        if let Some(weights) = &self.reward_weights {
            if let Some(index) = weights.iter().position(|weight| !weight.is_finite()) {
                return Err(ConfigValidationError::RewardWeightsNonFinite { index });
            }
        }
        Ok(())
    }

    /// Help table for every base field.
    pub fn field_specs() -> Vec<FieldSpec> {
        let defaults = serde_json::to_value(Self::default()).unwrap_or_default();
        build_field_specs(GRPO_FIELD_HELP, &defaults)
    }
}

#[cfg(test)]
mod tests {
    use super::{GrpoConfig, ImportanceSamplingLevel, LossType, ScaleRewards};
    use crate::validation::ConfigValidationError;
    use serde_json::{json, Value};

    #[test]
    fn unit_grpo_config_defaults_match_documented_values() {
        let config = GrpoConfig::default();
        assert_eq!(config.output_dir, "trainer_output");
        assert_eq!(config.learning_rate, 1e-6);
        assert_eq!(config.per_device_train_batch_size, 8);
        assert_eq!(config.num_generations, 8);
        assert_eq!(config.max_prompt_length, Some(512));
        assert_eq!(config.max_completion_length, 256);
        assert_eq!(config.beta, 0.0);
        assert_eq!(config.epsilon, 0.2);
        assert_eq!(config.epsilon_high, None);
        assert_eq!(
            config.importance_sampling_level,
            ImportanceSamplingLevel::Token
        );
        assert_eq!(config.loss_type, LossType::Dapo);
        assert_eq!(config.scale_rewards, ScaleRewards::Group);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn regression_grpo_step_intervals_check_the_stored_value() {
        let large = GrpoConfig {
            logging_steps: usize::MAX,
            save_steps: usize::MAX,
            ..GrpoConfig::default()
        };
        assert!(large.validate().is_ok());

        let zero = GrpoConfig {
            save_steps: 0,
            ..GrpoConfig::default()
        };
        assert_eq!(
            zero.validate().expect_err("zero save_steps"),
            ConfigValidationError::ZeroCount {
                field: "save_steps"
            }
        );
    }

    #[test]
    fn unit_grpo_generation_sizing_falls_back_to_accumulation_steps() {
        let mut config = GrpoConfig {
            gradient_accumulation_steps: 4,
            ..GrpoConfig::default()
        };
        assert_eq!(config.resolved_steps_per_generation(), 4);
        assert_eq!(config.resolved_generation_batch_size(), 32);

        config.steps_per_generation = Some(2);
        assert_eq!(config.resolved_generation_batch_size(), 16);

        config.steps_per_generation = None;
        config.generation_batch_size = Some(24);
        assert_eq!(config.resolved_generation_batch_size(), 24);
    }

    #[test]
    fn regression_grpo_rejects_single_generation_groups() {
        let config = GrpoConfig {
            num_generations: 1,
            ..GrpoConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::TooFewGenerations { num_generations: 1 })
        );
    }

    #[test]
    fn regression_grpo_rejects_indivisible_generation_batch() {
        let config = GrpoConfig {
            per_device_train_batch_size: 6,
            num_generations: 4,
            ..GrpoConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::IndivisibleGenerationBatch {
                generation_batch_size: 6,
                num_generations: 4,
            })
        );
    }

    #[test]
    fn regression_grpo_rejects_conflicting_generation_sizing() {
        let config = GrpoConfig {
            generation_batch_size: Some(16),
            steps_per_generation: Some(2),
            ..GrpoConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::ConflictingGenerationSizing)
        );
    }

    #[test]
    fn unit_grpo_rejects_out_of_range_sampling_parameters() {
        let config = GrpoConfig {
            top_p: 1.5,
            ..GrpoConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::OutOfRange { field: "top_p", .. })
        ));

        let config = GrpoConfig {
            epsilon_high: Some(0.1),
            ..GrpoConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::OutOfRange {
                field: "epsilon_high",
                ..
            })
        ));

        let config = GrpoConfig {
            reward_weights: Some(vec![1.0, f64::NAN]),
            ..GrpoConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigValidationError::RewardWeightsNonFinite { index: 1 })
        );
    }

    #[test]
    fn unit_grpo_field_specs_cover_every_serialized_field() {
        let defaults = serde_json::to_value(GrpoConfig::default()).expect("serialize defaults");
        let object = defaults.as_object().expect("defaults serialize as object");
        let specs = GrpoConfig::field_specs();

        assert_eq!(specs.len(), object.len());
        for spec in &specs {
            assert!(object.contains_key(spec.name), "stale spec '{}'", spec.name);
        }
        let beta = specs
            .iter()
            .find(|spec| spec.name == "beta")
            .expect("beta spec");
        assert_eq!(beta.default, json!(0.0));
        let top_k = specs
            .iter()
            .find(|spec| spec.name == "top_k")
            .expect("top_k spec");
        assert_eq!(top_k.default, Value::Null);
    }
}
