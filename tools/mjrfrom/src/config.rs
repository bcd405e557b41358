use std::{env, fs, net::SocketAddr, path::Path};

use anyhow::{Context, Result};
use mjr::DemuxConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub log: Log,
    #[serde(default)]
    pub demux: DemuxConfig,
    #[serde(default)]
    pub output: Output,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Log {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    /// UDP destination for extracted packets. Nothing is sent when unset.
    #[serde(default)]
    pub target: Option<SocketAddr>,
    /// Pace packets by their timestamps instead of sending them as fast as
    /// the file is read.
    #[serde(default)]
    pub realtime: bool,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_log_level() -> String {
    env::var("LOG_LEVEL").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug".to_string()
        } else {
            "info".to_string()
        }
    })
}

fn default_chunk_size() -> usize {
    4096
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self {
            target: None,
            realtime: false,
            chunk_size: default_chunk_size(),
        }
    }
}

impl Config {
    /// Without a path the defaults apply; a path that cannot be read or parsed
    /// is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.output.chunk_size == 0 {
            anyhow::bail!("output.chunk_size must be greater than zero");
        }
        Ok(())
    }
}
