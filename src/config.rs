//! Configuration management for tallychain

use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub io: IoConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Deserialize)]
pub struct IoConfig {
    #[serde(default = "default_input_dir")]
    pub input_dir: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            input_dir: default_input_dir(),
            output_dir: default_output_dir(),
        }
    }
}

/// Tunable rules of the block validator. The cap and the timing rule are
/// fixed constants in the input fixtures, kept configurable because their
/// origin (protocol constant vs. test fixture) is ambiguous.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_max_block_transactions")]
    pub max_block_transactions: usize,
    /// When set, a block rejects any transaction whose timestamp postdates
    /// the block's creation time.
    #[serde(default = "default_require_transactions_before_block")]
    pub require_transactions_before_block: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_block_transactions: default_max_block_transactions(),
            require_transactions_before_block: default_require_transactions_before_block(),
        }
    }
}

pub fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    let config_str = fs::read_to_string("tally.toml").unwrap_or_default();
    let config: Config = if config_str.is_empty() {
        // Provide sane defaults when tally.toml is absent
        Config {
            io: IoConfig::default(),
            engine: EngineConfig::default(),
        }
    } else {
        toml::from_str(&config_str)?
    };

    // Validate critical values
    if config.io.input_dir.is_empty() {
        return Err("io.input_dir must be set in tally.toml".into());
    }

    if config.io.output_dir.is_empty() {
        return Err("io.output_dir must be set in tally.toml".into());
    }

    if config.engine.max_block_transactions == 0 {
        return Err("engine.max_block_transactions must be at least 1".into());
    }

    Ok(config)
}

fn default_input_dir() -> String {
    "input".to_string()
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_max_block_transactions() -> usize {
    20
}

fn default_require_transactions_before_block() -> bool {
    true
}
