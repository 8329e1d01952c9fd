use std::time::Duration;

use serde::Deserialize;
use parley_core::error::{ParleyError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub version: u32,

    #[serde(default)]
    pub client: ClientSection,

    #[serde(default)]
    pub reaper: ReaperSection,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: 1,
            client: ClientSection::default(),
            reaper: ReaperSection::default(),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ParleyError::UnsupportedVersion);
        }
        self.client.validate()?;
        self.reaper.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientSection {
    /// Receive timeout used when the handshake reports none.
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            default_timeout_ms: default_timeout_ms(),
        }
    }
}

impl ClientSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=3_600_000).contains(&self.default_timeout_ms) {
            return Err(ParleyError::BadConfig(
                "client.default_timeout_ms must be between 1 and 3600000".into(),
            ));
        }
        Ok(())
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReaperSection {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,

    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
}

impl Default for ReaperSection {
    fn default() -> Self {
        Self {
            enabled: false,
            grace_period_ms: default_grace_period_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
        }
    }
}

impl ReaperSection {
    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.sweep_interval_ms < 10 {
            return Err(ParleyError::BadConfig(
                "reaper.sweep_interval_ms must be at least 10".into(),
            ));
        }
        if self.grace_period_ms <= self.sweep_interval_ms {
            return Err(ParleyError::BadConfig(
                "reaper.grace_period_ms must be greater than sweep_interval_ms".into(),
            ));
        }
        Ok(())
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

fn default_timeout_ms() -> u64 {
    30_000
}
fn default_grace_period_ms() -> u64 {
    600_000
}
fn default_sweep_interval_ms() -> u64 {
    10_000
}
