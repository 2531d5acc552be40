//! Anchored Direct Preference Optimization (ADPO) trainer configuration.
//!
//! ADPO replaces PPO-style ratio clipping with an anchored listwise
//! distribution `p(i|S) = softmax((s_i - s_anchor_i) / tau)` over each group
//! of completions. The settings here extend [`GrpoConfig`] and are serialized
//! flat, so a config file mixes base and ADPO keys at the top level.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::anchor_update_mode::AnchorUpdateMode;
use crate::field_schema::{build_field_specs, FieldHelp, FieldKind, FieldSpec};
use crate::grpo_config::GrpoConfig;
use crate::overrides::apply_json_overrides;
use crate::validation::{
    ensure_non_negative, ensure_positive, ensure_unit_interval, ConfigValidationError,
};

/// Configuration for the ADPO trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdpoConfig {
    #[serde(flatten)]
    pub base: GrpoConfig,
    /// Base temperature for the anchored softmax. Lower is sharper.
    pub tau: f64,
    pub anchor_update_mode: AnchorUpdateMode,
    /// Retention coefficient when `anchor_update_mode` is `ema`.
    pub ema_alpha: f64,
    /// Anchor refresh threshold when `anchor_update_mode` is `kl_triggered`.
    pub kl_threshold: f64,
    pub use_q_centering: bool,
    /// Extra `KL(policy || anchor)` penalty. 0 is pure ADPO.
    pub beta_anchor_kl: f64,
    /// Temperature of the reward softmax `q = softmax(advantages / beta_reward)`.
    pub beta_reward: f64,
    pub drop_all_failed_prompts: bool,
    pub use_adaptive_tau: bool,
    pub adaptive_tau_alpha: f64,
    pub adaptive_tau_beta: f64,
    pub adaptive_tau_min: f64,
    pub adaptive_tau_max: f64,
}

impl Default for AdpoConfig {
    fn default() -> Self {
        Self {
            base: GrpoConfig::default(),
            tau: 1.0,
            anchor_update_mode: AnchorUpdateMode::OnPolicy,
            ema_alpha: 0.99,
            kl_threshold: 0.1,
            use_q_centering: true,
            beta_anchor_kl: 0.0,
            beta_reward: 0.5,
            drop_all_failed_prompts: false,
            use_adaptive_tau: false,
            adaptive_tau_alpha: 0.5,
            adaptive_tau_beta: 1.0,
            adaptive_tau_min: 0.1,
            adaptive_tau_max: 5.0,
        }
    }
}

const ADPO_FIELD_HELP: &[FieldHelp] = &[
    (
        "tau",
        FieldKind::Float,
        "Base temperature for the anchored softmax distribution.",
    ),
    (
        "anchor_update_mode",
        FieldKind::Enum,
        "Anchor refresh strategy: fixed, ema, kl_triggered or on_policy.",
    ),
    (
        "ema_alpha",
        FieldKind::Float,
        "EMA retention coefficient for the anchor (ema mode).",
    ),
    (
        "kl_threshold",
        FieldKind::Float,
        "KL divergence that triggers an anchor refresh (kl_triggered mode).",
    ),
    (
        "use_q_centering",
        FieldKind::Bool,
        "Whether to center advantages by group mean.",
    ),
    (
        "beta_anchor_kl",
        FieldKind::Float,
        "Additional KL penalty coefficient (on top of anchoring). 0 = pure ADPO.",
    ),
    (
        "beta_reward",
        FieldKind::Float,
        "Temperature for reward softmax (q computation). q = softmax(advantages / beta_reward).",
    ),
    (
        "drop_all_failed_prompts",
        FieldKind::Bool,
        "Whether to drop prompts where all generations have 0 reward.",
    ),
    (
        "use_adaptive_tau",
        FieldKind::Bool,
        "Enable adaptive temperature scaling based on entropy and reward.",
    ),
    (
        "adaptive_tau_alpha",
        FieldKind::Float,
        "Weight for entropy-based uncertainty term. Higher = more smoothing when uncertain.",
    ),
    (
        "adaptive_tau_beta",
        FieldKind::Float,
        "Weight for confidence-error penalty. Higher = stronger correction for confident mistakes.",
    ),
    ("adaptive_tau_min", FieldKind::Float, "Minimum allowed tau value."),
    ("adaptive_tau_max", FieldKind::Float, "Maximum allowed tau value."),
];

/// Non-fatal note about a combination of configuration values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigAdvisory {
    /// `beta > 0` loads a reference model next to the policy.
    ReferenceModelLoaded,
    /// `ema` mode with `ema_alpha == 1.0` never moves the anchor.
    FrozenEmaAnchor,
    /// Adaptive tau is on and the base `tau` sits outside its clamp bounds.
    BaseTauOutsideAdaptiveBounds,
}

impl ConfigAdvisory {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigAdvisory::ReferenceModelLoaded => "reference_model_loaded",
            ConfigAdvisory::FrozenEmaAnchor => "frozen_ema_anchor",
            ConfigAdvisory::BaseTauOutsideAdaptiveBounds => "base_tau_outside_adaptive_bounds",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ConfigAdvisory::ReferenceModelLoaded => {
                "beta > 0 loads a reference model; set beta=0.0 to keep anchoring memory-light"
            }
            ConfigAdvisory::FrozenEmaAnchor => {
                "anchor_update_mode=ema with ema_alpha=1.0 never moves the anchor; use fixed instead"
            }
            ConfigAdvisory::BaseTauOutsideAdaptiveBounds => {
                "tau lies outside [adaptive_tau_min, adaptive_tau_max]; adaptive tau will clamp it"
            }
        }
    }
}

impl std::fmt::Display for ConfigAdvisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.as_str(), self.message())
    }
}

impl AdpoConfig {
    /// Builds a config from flat JSON overrides on top of the defaults.
    #[tracing::instrument(level = "debug", skip(value))]
    pub fn from_json(value: &Value) -> anyhow::Result<Self> {
        let config = Self::default().with_overrides(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Returns a copy with `overrides` applied. Does not validate.
    pub fn with_overrides(&self, overrides: &Value) -> anyhow::Result<Self> {
        apply_json_overrides(self, overrides)
    }

    pub fn grpo(&self) -> &GrpoConfig {
        &self.base
    }

    pub fn grpo_mut(&mut self) -> &mut GrpoConfig {
        &mut self.base
    }

    /// Checks base constraints, then ADPO constraints.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        self.base.validate()?;

        ensure_positive("tau", self.tau)?;
        ensure_unit_interval("ema_alpha", self.ema_alpha)?;
        ensure_non_negative("kl_threshold", self.kl_threshold)?;
        ensure_non_negative("beta_anchor_kl", self.beta_anchor_kl)?;
        ensure_positive("beta_reward", self.beta_reward)?;
        ensure_non_negative("adaptive_tau_alpha", self.adaptive_tau_alpha)?;
        ensure_non_negative("adaptive_tau_beta", self.adaptive_tau_beta)?;
        ensure_positive("adaptive_tau_min", self.adaptive_tau_min)?;
        ensure_positive("adaptive_tau_max", self.adaptive_tau_max)?;
        if self.adaptive_tau_min > self.adaptive_tau_max {
            return Err(ConfigValidationError::InvertedTauBounds {
                min: self.adaptive_tau_min,
                max: self.adaptive_tau_max,
            });
        }
        Ok(())
    }

    pub fn advisories(&self) -> Vec<ConfigAdvisory> {
        let mut advisories = Vec::new();
        if self.base.beta > 0.0 {
            advisories.push(ConfigAdvisory::ReferenceModelLoaded);
        }
        if self.anchor_update_mode.uses_ema() && self.ema_alpha >= 1.0 {
            advisories.push(ConfigAdvisory::FrozenEmaAnchor);
        }
        if self.use_adaptive_tau
            && !(self.adaptive_tau_min..=self.adaptive_tau_max).contains(&self.tau)
        {
            advisories.push(ConfigAdvisory::BaseTauOutsideAdaptiveBounds);
        }
        advisories
    }

    /// Help table for base fields followed by ADPO fields.
    pub fn field_specs() -> Vec<FieldSpec> {
        let defaults = serde_json::to_value(Self::default()).unwrap_or_default();
        let mut specs = GrpoConfig::field_specs();
        specs.extend(build_field_specs(ADPO_FIELD_HELP, &defaults));
        specs
    }
}
