//! Adaptive temperature resolution for the anchored softmax.
//!
//! `tau_eff = tau * (1 + alpha * H + beta * (1 - H) * (1 - R))`, clamped to
//! `[adaptive_tau_min, adaptive_tau_max]`, where `H` is the normalized policy
//! entropy and `R` the normalized group reward. High entropy smooths the
//! target; low entropy paired with low reward (a confident mistake) smooths
//! it harder.

use anyhow::{bail, Result};

use crate::adpo_config::AdpoConfig;

/// Per-group signals consumed by adaptive tau, both expected in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveTauSignals {
    pub normalized_entropy: f64,
    pub normalized_reward: f64,
}

impl AdaptiveTauSignals {
    pub fn new(normalized_entropy: f64, normalized_reward: f64) -> Self {
        Self {
            normalized_entropy,
            normalized_reward,
        }
    }
}

impl AdpoConfig {
    /// Returns the temperature to use for one group.
    ///
    /// With adaptive tau disabled this is always `tau`. Signals outside
    /// `[0, 1]` are clamped; non-finite signals are rejected.
    pub fn resolve_tau(&self, signals: AdaptiveTauSignals) -> Result<f64> {
        if !self.use_adaptive_tau {
            return Ok(self.tau);
        }
        if !signals.normalized_entropy.is_finite() {
            bail!("adaptive tau normalized_entropy must be finite");
        }
        if !signals.normalized_reward.is_finite() {
            bail!("adaptive tau normalized_reward must be finite");
        }

        let entropy = signals.normalized_entropy.clamp(0.0, 1.0);
        let reward = signals.normalized_reward.clamp(0.0, 1.0);
        let uncertainty = self.adaptive_tau_alpha * entropy;
        let confident_error = self.adaptive_tau_beta * (1.0 - entropy) * (1.0 - reward);
        let scaled = self.tau * (1.0 + uncertainty + confident_error);
        if !scaled.is_finite() {
            bail!("adaptive tau produced a non-finite temperature");
        }

        let (min, max) = (self.adaptive_tau_min, self.adaptive_tau_max);
        if !(min.is_finite() && max.is_finite() && min <= max) {
            bail!(
                "adaptive tau bounds are invalid: adaptive_tau_min {min}, adaptive_tau_max {max}"
            );
        }
        let resolved = scaled.clamp(min, max);
        tracing::trace!(entropy, reward, scaled, resolved, "resolved adaptive tau");
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::AdaptiveTauSignals;
    use crate::adpo_config::AdpoConfig;
    use serde_json::json;

    fn adaptive() -> AdpoConfig {
        AdpoConfig {
            use_adaptive_tau: true,
            ..AdpoConfig::default()
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn unit_resolve_tau_returns_base_tau_when_disabled() {
        let config = AdpoConfig {
            tau: 0.8,
            ..AdpoConfig::default()
        };
        let tau = config
            .resolve_tau(AdaptiveTauSignals::new(f64::NAN, 0.0))
            .expect("disabled adaptive tau ignores signals");
        assert_eq!(tau, 0.8);
    }

    #[test]
    fn functional_resolve_tau_matches_reference_values() {
        let config = adaptive();
        let cases = [
            // (entropy, reward, expected)
            (0.2, 0.1, 1.82),
            (1.0, 0.0, 1.5),
            (0.0, 1.0, 1.0),
            (0.0, 0.0, 2.0),
            (0.5, 0.5, 1.5),
        ];
        for (entropy, reward, expected) in cases {
            let tau = config
                .resolve_tau(AdaptiveTauSignals::new(entropy, reward))
                .expect("finite signals");
            assert_close(tau, expected);
        }
    }

    #[test]
    fn functional_resolve_tau_clamps_to_configured_bounds() {
        let low = AdpoConfig {
            tau: 0.05,
            ..adaptive()
        };
        assert_close(
            low.resolve_tau(AdaptiveTauSignals::new(0.0, 1.0))
                .expect("finite"),
            0.1,
        );

        let high = AdpoConfig {
            tau: 4.0,
            ..adaptive()
        };
        assert_close(
            high.resolve_tau(AdaptiveTauSignals::new(0.0, 0.0))
                .expect("finite"),
            5.0,
        );
    }

    #[test]
    fn regression_resolve_tau_clamps_out_of_range_signals() {
        let config = adaptive();
        let clamped = config
            .resolve_tau(AdaptiveTauSignals::new(1.7, -3.0))
            .expect("finite");
        let boundary = config
            .resolve_tau(AdaptiveTauSignals::new(1.0, 0.0))
            .expect("finite");
        assert_close(clamped, boundary);
    }

    #[test]
    fn regression_resolve_tau_rejects_non_finite_signals() {
        let config = adaptive();
        let error = config
            .resolve_tau(AdaptiveTauSignals::new(0.5, f64::INFINITY))
            .expect_err("infinite reward must fail");
        assert!(error.to_string().contains("normalized_reward"));
    }

    #[test]
    fn regression_resolve_tau_rejects_inverted_bounds() {
        let config = AdpoConfig::default()
            .with_overrides(&json!({
                "use_adaptive_tau": true,
                "adaptive_tau_min": 2.0,
                "adaptive_tau_max": 1.0
            }))
            .expect("overrides apply without validation");
        let error = config
            .resolve_tau(AdaptiveTauSignals::new(0.5, 0.5))
            .expect_err("inverted bounds must fail");
        assert!(error.to_string().contains("adaptive tau bounds are invalid"));

        let nan_bound = AdpoConfig {
            adaptive_tau_max: f64::NAN,
            ..adaptive()
        };
        assert!(nan_bound
            .resolve_tau(AdaptiveTauSignals::new(0.5, 0.5))
            .is_err());
    }
}
