use adpo_config::{
    apply_key_value_overrides, read_config_overrides, render_config, render_field_table,
    AdpoConfig, FieldSpec, TrainerArgs,
};
use anyhow::{Context, Result};

use crate::cli_args::{Cli, CliCommand, ConfigSourceArgs};
use crate::cli_types::CliSchemaFormat;

pub(crate) fn run_cli(cli: Cli) -> Result<()> {
    let output = match cli.command {
        CliCommand::Show(args) => {
            let config = resolve_config(&args.source)?;
            render_config(&config, args.format.into())?
        }
        CliCommand::Validate(args) => render_validation_report(&resolve_config(&args.source)?),
        CliCommand::Schema(args) => render_schema(&AdpoConfig::field_specs(), args.format)?,
    };
    println!("{}", output.trim_end());
    Ok(())
}

/// Builds the effective config: defaults, then file, then `--set`, then flags.
#[tracing::instrument(level = "debug", skip(source))]
pub(crate) fn resolve_config(source: &ConfigSourceArgs) -> Result<AdpoConfig> {
    let mut config = AdpoConfig::default();
    if let Some(path) = &source.config {
        let overrides = read_config_overrides(path)?;
        config = config
            .with_overrides(&overrides)
            .with_context(|| format!("invalid config file {}", path.display()))?;
    }
    config = apply_key_value_overrides(&config, &source.set).context("invalid --set override")?;
    config = config
        .with_overrides(&source.flags.to_overrides())
        .context("invalid flag override")?;

    config.validate().context("effective config failed validation")?;
    for advisory in config.advisories() {
        tracing::warn!(
            trainer = AdpoConfig::TRAINER_NAME,
            advisory = advisory.as_str(),
            "{}",
            advisory.message()
        );
    }
    Ok(config)
}

fn render_validation_report(config: &AdpoConfig) -> String {
    let mut lines = vec![format!(
        "ok: {} config valid (anchor_update_mode={}, tau={})",
        AdpoConfig::TRAINER_NAME,
        config.anchor_update_mode,
        config.tau
    )];
    lines.extend(
        config
            .advisories()
            .into_iter()
            .map(|advisory| format!("advisory: {advisory}")),
    );
    lines.join("\n")
}

fn render_schema(specs: &[FieldSpec], format: CliSchemaFormat) -> Result<String> {
    match format {
        CliSchemaFormat::Table => Ok(render_field_table(specs)),
        CliSchemaFormat::Json => {
            serde_json::to_string_pretty(specs).context("failed to render schema as JSON")
        }
    }
}
