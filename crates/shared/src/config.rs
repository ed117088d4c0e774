use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let anthropic_api_key = env::var("ANTHROPIC_API_KEY").context(
            "ANTHROPIC_API_KEY not found.\n\n\
            To fix this, export ANTHROPIC_API_KEY or add it to a .env file\n\
            in the working directory.\n\n\
            Get your Anthropic API key from: https://console.anthropic.com/settings/keys",
        )?;

        Ok(Self { anthropic_api_key })
    }
}
