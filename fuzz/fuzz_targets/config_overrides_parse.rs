#![no_main]

use adpo_config::{parse_config_text, AdpoConfig, ConfigFormat};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);

    for format in [ConfigFormat::Json, ConfigFormat::Toml] {
        let Ok(overrides) = parse_config_text(&raw, format) else {
            continue;
        };
        assert!(overrides.is_object());

        let Ok(config) = AdpoConfig::default().with_overrides(&overrides) else {
            continue;
        };
        if config.validate().is_ok() {
            assert!(config.tau > 0.0);
            assert!((0.0..=1.0).contains(&config.ema_alpha));
            assert!(config.adaptive_tau_min <= config.adaptive_tau_max);
            assert!(config.base.num_generations >= 2);
            assert_eq!(
                config.base.resolved_generation_batch_size() % config.base.num_generations,
                0
            );
        }
    }
});
