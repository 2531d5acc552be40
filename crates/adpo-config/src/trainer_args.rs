//! Shared interface over the base and extended trainer configurations.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::adpo_config::{AdpoConfig, ConfigAdvisory};
use crate::field_schema::FieldSpec;
use crate::grpo_config::GrpoConfig;
use crate::validation::ConfigValidationError;

/// Capabilities every trainer configuration exposes to loaders and the CLI.
pub trait TrainerArgs: Serialize + DeserializeOwned + Default + Clone {
    /// Short trainer identifier used in logs.
    const TRAINER_NAME: &'static str;

    /// Base group-relative settings carried by this config.
    fn grpo(&self) -> &GrpoConfig;

    fn validate(&self) -> Result<(), ConfigValidationError>;

    fn field_specs() -> Vec<FieldSpec>;

    fn advisories(&self) -> Vec<ConfigAdvisory> {
        Vec::new()
    }
}

impl TrainerArgs for GrpoConfig {
    const TRAINER_NAME: &'static str = "grpo";

    fn grpo(&self) -> &GrpoConfig {
        self
    }

    fn validate(&self) -> Result<(), ConfigValidationError> {
        GrpoConfig::validate(self)
    }

    fn field_specs() -> Vec<FieldSpec> {
        GrpoConfig::field_specs()
    }

    fn advisories(&self) -> Vec<ConfigAdvisory> {
        if self.beta > 0.0 {
            vec![ConfigAdvisory::ReferenceModelLoaded]
        } else {
            Vec::new()
        }
    }
}

impl TrainerArgs for AdpoConfig {
    const TRAINER_NAME: &'static str = "adpo";

    fn grpo(&self) -> &GrpoConfig {
        AdpoConfig::grpo(self)
    }

    fn validate(&self) -> Result<(), ConfigValidationError> {
        AdpoConfig::validate(self)
    }

    fn field_specs() -> Vec<FieldSpec> {
        AdpoConfig::field_specs()
    }

    fn advisories(&self) -> Vec<ConfigAdvisory> {
        AdpoConfig::advisories(self)
    }
}

#[cfg(test)]
mod tests {
    use super::TrainerArgs;
    use crate::{AdpoConfig, ConfigAdvisory, GrpoConfig};

    fn describe<T: TrainerArgs>(config: &T) -> (&'static str, usize, usize) {
        (
            T::TRAINER_NAME,
            config.grpo().num_generations,
            T::field_specs().len(),
        )
    }

    #[test]
    fn unit_trainer_args_expose_shared_base_settings() {
        let grpo = GrpoConfig::default();
        let adpo = AdpoConfig::default();
        let (grpo_name, grpo_generations, grpo_fields) = describe(&grpo);
        let (adpo_name, adpo_generations, adpo_fields) = describe(&adpo);

        assert_eq!(grpo_name, "grpo");
        assert_eq!(adpo_name, "adpo");
        assert_eq!(grpo_generations, adpo_generations);
        assert_eq!(adpo_fields, grpo_fields + 13);
    }

    #[test]
    fn unit_grpo_trainer_args_report_reference_model_advisory() {
        let config = GrpoConfig {
            beta: 0.04,
            ..GrpoConfig::default()
        };
        assert_eq!(
            TrainerArgs::advisories(&config),
            vec![ConfigAdvisory::ReferenceModelLoaded]
        );
        assert!(TrainerArgs::validate(&config).is_ok());
    }
}
