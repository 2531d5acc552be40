use adpo_config::{AnchorUpdateMode, ConfigFormat};
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliAnchorUpdateMode {
    Fixed,
    Ema,
    #[value(name = "kl_triggered")]
    KlTriggered,
    #[value(name = "on_policy")]
    OnPolicy,
}

impl From<CliAnchorUpdateMode> for AnchorUpdateMode {
    fn from(value: CliAnchorUpdateMode) -> Self {
        match value {
            CliAnchorUpdateMode::Fixed => AnchorUpdateMode::Fixed,
            CliAnchorUpdateMode::Ema => AnchorUpdateMode::Ema,
            CliAnchorUpdateMode::KlTriggered => AnchorUpdateMode::KlTriggered,
            CliAnchorUpdateMode::OnPolicy => AnchorUpdateMode::OnPolicy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliConfigFormat {
    Json,
    Toml,
}

impl From<CliConfigFormat> for ConfigFormat {
    fn from(value: CliConfigFormat) -> Self {
        match value {
            CliConfigFormat::Json => ConfigFormat::Json,
            CliConfigFormat::Toml => ConfigFormat::Toml,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CliSchemaFormat {
    Table,
    Json,
}
