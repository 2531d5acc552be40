use adpo_config::{
    load_trainer_config, render_config, AdaptiveTauSignals, AdpoConfig, AnchorUpdateMode,
    ConfigFormat, ConfigValidationError, GrpoConfig, TrainerArgs,
};
use anyhow::Result;
use serde_json::json;
use tempfile::tempdir;

#[test]
fn integration_any_subset_of_overrides_keeps_base_fields_intact() -> Result<()> {
    let subsets = [
        json!({}),
        json!({ "tau": 0.8 }),
        json!({ "anchor_update_mode": "ema", "ema_alpha": 0.9 }),
        json!({ "use_adaptive_tau": true, "adaptive_tau_max": 3.0 }),
        json!({ "drop_all_failed_prompts": true, "beta_reward": 1.0, "use_q_centering": false }),
    ];

    for overrides in subsets {
        let config = AdpoConfig::from_json(&overrides)?;
        assert_eq!(config.base, GrpoConfig::default(), "{overrides}");
        for (key, value) in overrides.as_object().expect("object") {
            let encoded = serde_json::to_value(&config)?;
            assert_eq!(&encoded[key], value, "{key}");
        }
    }
    Ok(())
}

#[test]
fn integration_every_anchor_update_mode_loads_from_file() -> Result<()> {
    let dir = tempdir()?;
    for mode in AnchorUpdateMode::ALL {
        let path = dir.path().join(format!("{mode}.json"));
        std::fs::write(
            &path,
            json!({ "anchor_update_mode": mode.as_str() }).to_string(),
        )?;
        let config: AdpoConfig = load_trainer_config(&path)?;
        assert_eq!(config.anchor_update_mode, mode);
    }
    Ok(())
}

#[test]
fn integration_rendered_json_reloads_as_identical_config() -> Result<()> {
    let mut config = AdpoConfig {
        tau: 0.8,
        anchor_update_mode: AnchorUpdateMode::KlTriggered,
        kl_threshold: 0.05,
        use_adaptive_tau: true,
        ..AdpoConfig::default()
    };
    config.grpo_mut().epsilon_high = Some(0.28);
    config.grpo_mut().reward_weights = Some(vec![1.0, 0.5]);

    let dir = tempdir()?;
    let path = dir.path().join("adpo.json");
    std::fs::write(&path, render_config(&config, ConfigFormat::Json)?)?;
    let loaded: AdpoConfig = load_trainer_config(&path)?;
    assert_eq!(loaded, config);
    Ok(())
}

#[test]
fn integration_loaded_config_drives_adaptive_tau() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("adaptive.toml");
    std::fs::write(
        &path,
        "use_adaptive_tau = true\ntau = 2.0\nadaptive_tau_max = 3.0\n",
    )?;
    let config: AdpoConfig = load_trainer_config(&path)?;

    let smooth = config.resolve_tau(AdaptiveTauSignals::new(1.0, 1.0))?;
    assert!((smooth - 3.0).abs() < 1e-12);
    let sharp = config.resolve_tau(AdaptiveTauSignals::new(0.0, 1.0))?;
    assert!((sharp - 2.0).abs() < 1e-12);
    Ok(())
}

#[test]
fn integration_base_loader_rejects_adpo_only_fields() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("grpo.json");
    std::fs::write(&path, r#"{ "tau": 0.8 }"#).expect("write");

    let error = load_trainer_config::<GrpoConfig>(&path).expect_err("tau is not a base field");
    assert!(format!("{error:#}").contains("unknown config field 'tau'"));
}

#[test]
fn integration_validation_error_is_typed_through_the_trait() {
    let config = AdpoConfig {
        kl_threshold: -0.1,
        ..AdpoConfig::default()
    };
    let error = TrainerArgs::validate(&config).expect_err("negative threshold");
    assert!(matches!(
        error,
        ConfigValidationError::OutOfRange {
            field: "kl_threshold",
            ..
        }
    ));
}
