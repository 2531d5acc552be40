use std::path::PathBuf;

use adpo_config::AnchorUpdateMode;
use clap::{ArgAction, Args, Parser, Subcommand};
use serde_json::{json, Map, Value};

use crate::cli_types::{CliAnchorUpdateMode, CliConfigFormat, CliSchemaFormat};

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_f64(value: &str) -> Result<f64, String> {
    let parsed = value
        .parse::<f64>()
        .map_err(|error| format!("failed to parse float: {error}"))?;
    if !parsed.is_finite() || parsed <= 0.0 {
        return Err("value must be a finite number greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_non_negative_f64(value: &str) -> Result<f64, String> {
    let parsed = value
        .parse::<f64>()
        .map_err(|error| format!("failed to parse float: {error}"))?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err("value must be a finite number of at least 0".to_string());
    }
    Ok(parsed)
}

fn parse_unit_interval_f64(value: &str) -> Result<f64, String> {
    let parsed = parse_non_negative_f64(value)?;
    if parsed > 1.0 {
        return Err("value must be in range 0..=1".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "adpo",
    about = "Inspect and validate Anchored Direct Preference Optimization trainer configs",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Print the effective config after layering file, --set and flag overrides.
    Show(ShowArgs),
    /// Validate a config and print advisories.
    Validate(ValidateArgs),
    /// Print every field with its type, default and help text.
    Schema(SchemaArgs),
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub source: ConfigSourceArgs,

    #[arg(
        long,
        value_enum,
        default_value = "json",
        help = "Output encoding for the effective config."
    )]
    pub format: CliConfigFormat,
}

#[derive(Debug, Args)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub source: ConfigSourceArgs,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    #[arg(
        long,
        value_enum,
        default_value = "table",
        help = "Render the schema as an aligned table or a JSON array."
    )]
    pub format: CliSchemaFormat,
}

/// Layers applied on top of the defaults, lowest precedence first.
#[derive(Debug, Args)]
pub struct ConfigSourceArgs {
    #[arg(
        long,
        env = "ADPO_CONFIG",
        help = "Path to a .json or .toml file of flat config fields."
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long = "set",
        value_name = "KEY=VALUE",
        action = ArgAction::Append,
        help = "Override any field. VALUE is parsed as JSON and falls back to a string; string fields such as output_dir take VALUE verbatim. Repeatable."
    )]
    pub set: Vec<String>,

    #[command(flatten)]
    pub flags: AdpoOverrideFlags,
}

#[derive(Debug, Default, Args)]
pub struct AdpoOverrideFlags {
    #[arg(
        long,
        env = "ADPO_OUTPUT_DIR",
        help = "Directory for checkpoints and logs."
    )]
    pub output_dir: Option<String>,

    #[arg(
        long,
        env = "ADPO_LEARNING_RATE",
        value_parser = parse_positive_f64,
        help = "Initial optimizer learning rate."
    )]
    pub learning_rate: Option<f64>,

    #[arg(
        long,
        env = "ADPO_PER_DEVICE_TRAIN_BATCH_SIZE",
        value_parser = parse_positive_usize,
        help = "Completions per device per micro-batch."
    )]
    pub per_device_train_batch_size: Option<usize>,

    #[arg(
        long,
        env = "ADPO_GRADIENT_ACCUMULATION_STEPS",
        value_parser = parse_positive_usize,
        help = "Micro-batches accumulated before each optimizer step."
    )]
    pub gradient_accumulation_steps: Option<usize>,

    #[arg(
        long,
        env = "ADPO_NUM_GENERATIONS",
        value_parser = parse_positive_usize,
        help = "Completions sampled per prompt (group size)."
    )]
    pub num_generations: Option<usize>,

    #[arg(
        long,
        env = "ADPO_BETA",
        value_parser = parse_non_negative_f64,
        help = "KL coefficient against the reference model. 0.0 skips loading it."
    )]
    pub beta: Option<f64>,

    #[arg(long, env = "ADPO_SEED", help = "Random seed for sampling and shuffling.")]
    pub seed: Option<u64>,

    #[arg(
        long,
        env = "ADPO_TAU",
        value_parser = parse_positive_f64,
        help = "Base temperature for the anchored softmax distribution."
    )]
    pub tau: Option<f64>,

    #[arg(
        long,
        env = "ADPO_ANCHOR_UPDATE_MODE",
        value_enum,
        help = "Anchor refresh strategy."
    )]
    pub anchor_update_mode: Option<CliAnchorUpdateMode>,

    #[arg(
        long,
        env = "ADPO_EMA_ALPHA",
        value_parser = parse_unit_interval_f64,
        help = "EMA retention coefficient for the anchor (ema mode)."
    )]
    pub ema_alpha: Option<f64>,

    #[arg(
        long,
        env = "ADPO_KL_THRESHOLD",
        value_parser = parse_non_negative_f64,
        help = "KL divergence that triggers an anchor refresh (kl_triggered mode)."
    )]
    pub kl_threshold: Option<f64>,

    #[arg(
        long,
        env = "ADPO_USE_Q_CENTERING",
        action = ArgAction::Set,
        help = "Whether to center advantages by group mean."
    )]
    pub use_q_centering: Option<bool>,

    #[arg(
        long,
        env = "ADPO_BETA_ANCHOR_KL",
        value_parser = parse_non_negative_f64,
        help = "Additional KL penalty coefficient (on top of anchoring). 0 = pure ADPO."
    )]
    pub beta_anchor_kl: Option<f64>,

    #[arg(
        long,
        env = "ADPO_BETA_REWARD",
        value_parser = parse_positive_f64,
        help = "Temperature for reward softmax. q = softmax(advantages / beta_reward)."
    )]
    pub beta_reward: Option<f64>,

    #[arg(
        long,
        env = "ADPO_DROP_ALL_FAILED_PROMPTS",
        action = ArgAction::Set,
        help = "Whether to drop prompts where all generations have 0 reward."
    )]
    pub drop_all_failed_prompts: Option<bool>,

    #[arg(
        long,
        env = "ADPO_USE_ADAPTIVE_TAU",
        action = ArgAction::Set,
        help = "Enable adaptive temperature scaling based on entropy and reward."
    )]
    pub use_adaptive_tau: Option<bool>,

    #[arg(
        long,
        env = "ADPO_ADAPTIVE_TAU_ALPHA",
        value_parser = parse_non_negative_f64,
        help = "Weight for the entropy uncertainty term."
    )]
    pub adaptive_tau_alpha: Option<f64>,

    #[arg(
        long,
        env = "ADPO_ADAPTIVE_TAU_BETA",
        value_parser = parse_non_negative_f64,
        help = "Weight for the confidence-error penalty term."
    )]
    pub adaptive_tau_beta: Option<f64>,

    #[arg(
        long,
        env = "ADPO_ADAPTIVE_TAU_MIN",
        value_parser = parse_positive_f64,
        help = "Minimum allowed tau value."
    )]
    pub adaptive_tau_min: Option<f64>,

    #[arg(
        long,
        env = "ADPO_ADAPTIVE_TAU_MAX",
        value_parser = parse_positive_f64,
        help = "Maximum allowed tau value."
    )]
    pub adaptive_tau_max: Option<f64>,
}

impl AdpoOverrideFlags {
    /// Collects every flag that was set into a flat JSON override object.
    pub fn to_overrides(&self) -> Value {
        let mut fields = Map::new();
        let mut insert = |key: &str, value: Option<Value>| {
            if let Some(value) = value {
                fields.insert(key.to_string(), value);
            }
        };

        insert("output_dir", self.output_dir.as_ref().map(|dir| json!(dir)));
        insert("learning_rate", self.learning_rate.map(|value| json!(value)));
        insert(
            "per_device_train_batch_size",
            self.per_device_train_batch_size.map(|value| json!(value)),
        );
        insert(
            "gradient_accumulation_steps",
            self.gradient_accumulation_steps.map(|value| json!(value)),
        );
        insert("num_generations", self.num_generations.map(|value| json!(value)));
        insert("beta", self.beta.map(|value| json!(value)));
        insert("seed", self.seed.map(|value| json!(value)));
        insert("tau", self.tau.map(|value| json!(value)));
        insert(
            "anchor_update_mode",
            self.anchor_update_mode
                .map(|mode| json!(AnchorUpdateMode::from(mode).as_str())),
        );
        insert("ema_alpha", self.ema_alpha.map(|value| json!(value)));
        insert("kl_threshold", self.kl_threshold.map(|value| json!(value)));
        insert("use_q_centering", self.use_q_centering.map(|value| json!(value)));
        insert("beta_anchor_kl", self.beta_anchor_kl.map(|value| json!(value)));
        insert("beta_reward", self.beta_reward.map(|value| json!(value)));
        insert(
            "drop_all_failed_prompts",
            self.drop_all_failed_prompts.map(|value| json!(value)),
        );
        insert("use_adaptive_tau", self.use_adaptive_tau.map(|value| json!(value)));
        insert(
            "adaptive_tau_alpha",
            self.adaptive_tau_alpha.map(|value| json!(value)),
        );
        insert(
            "adaptive_tau_beta",
            self.adaptive_tau_beta.map(|value| json!(value)),
        );
        insert(
            "adaptive_tau_min",
            self.adaptive_tau_min.map(|value| json!(value)),
        );
        insert(
            "adaptive_tau_max",
            self.adaptive_tau_max.map(|value| json!(value)),
        );

        Value::Object(fields)
    }
}
