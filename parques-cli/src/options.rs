//! Match options shared by every command

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use parques_core::{BoardVariant, CapturePolicy, MatchConfig};

#[derive(Args, Clone, Debug)]
pub struct MatchOptions {
    /// Board variant: 4 or 6 seats
    #[arg(long, default_value = "4")]
    pub variant: String,

    /// Match config JSON file (overrides --variant)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Forced-capture rule: mandatory, advisory or blow
    #[arg(long)]
    pub capture_policy: Option<String>,
}

impl MatchOptions {
    /// Resolve the options into a validated match config
    pub fn to_match_config(&self) -> Result<MatchConfig> {
        let mut config = match &self.config {
            Some(path) => MatchConfig::load(path)
                .with_context(|| format!("Failed to load match config: {}", path.display()))?,
            None => MatchConfig::for_variant(parse_variant(&self.variant)?),
        };

        if let Some(policy) = &self.capture_policy {
            config.rules.capture_policy = parse_capture_policy(policy)?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_variant(s: &str) -> Result<BoardVariant> {
    BoardVariant::parse(s).with_context(|| format!("Unknown board variant '{}' (expected 4 or 6)", s))
}

fn parse_capture_policy(s: &str) -> Result<CapturePolicy> {
    match s.to_ascii_lowercase().as_str() {
        "mandatory" => Ok(CapturePolicy::Mandatory),
        "advisory" => Ok(CapturePolicy::Advisory),
        "blow" | "soplar" => Ok(CapturePolicy::Blow),
        other => anyhow::bail!("Unknown capture policy '{}'", other),
    }
}
