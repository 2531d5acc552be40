//! Anchor refresh strategies understood by the ADPO trainer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string does not name an anchor update mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid anchor update mode '{value}'; expected fixed|ema|kl_triggered|on_policy")]
pub struct ParseAnchorUpdateModeError {
    pub value: String,
}

/// Strategy used to refresh the anchor policy between optimizer steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnchorUpdateMode {
    /// Anchor stays at the initial policy for the whole run.
    Fixed,
    /// Anchor tracks the policy through an exponential moving average.
    Ema,
    /// Anchor is replaced once divergence from the policy passes `kl_threshold`.
    KlTriggered,
    /// Anchor is the policy that generated the current batch.
    #[default]
    OnPolicy,
}

impl AnchorUpdateMode {
    pub const ALL: [AnchorUpdateMode; 4] = [
        AnchorUpdateMode::Fixed,
        AnchorUpdateMode::Ema,
        AnchorUpdateMode::KlTriggered,
        AnchorUpdateMode::OnPolicy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AnchorUpdateMode::Fixed => "fixed",
            AnchorUpdateMode::Ema => "ema",
            AnchorUpdateMode::KlTriggered => "kl_triggered",
            AnchorUpdateMode::OnPolicy => "on_policy",
        }
    }

    /// Returns true when the mode reads `ema_alpha`.
    pub fn uses_ema(self) -> bool {
        matches!(self, AnchorUpdateMode::Ema)
    }

    /// Returns true when the mode reads `kl_threshold`.
    pub fn uses_kl_trigger(self) -> bool {
        matches!(self, AnchorUpdateMode::KlTriggered)
    }
}

impl std::fmt::Display for AnchorUpdateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AnchorUpdateMode {
    type Err = ParseAnchorUpdateModeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "fixed" => Ok(Self::Fixed),
            "ema" => Ok(Self::Ema),
            "kl_triggered" => Ok(Self::KlTriggered),
            "on_policy" => Ok(Self::OnPolicy),
            _ => Err(ParseAnchorUpdateModeError {
                value: value.to_string(),
            }),
        }
    }
}
