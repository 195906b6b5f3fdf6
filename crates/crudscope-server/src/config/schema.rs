use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;

use super::{ConfigError, Result};
use crate::instrument::SimulationPolicy;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub simulation: SimulationSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            simulation: SimulationSection::default(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(ConfigError::UnsupportedVersion(self.version));
        }
        self.server.validate()?;
        self.simulation.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            ConfigError::Invalid(format!("server.listen must be a valid SocketAddr: {e}"))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:3000".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationSection {
    #[serde(default = "default_simulation_enabled")]
    pub enabled: bool,

    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            enabled: default_simulation_enabled(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

impl SimulationSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=3600).contains(&self.max_delay_secs) {
            return Err(ConfigError::Invalid(
                "simulation.max_delay_secs must be between 1 and 3600".into(),
            ));
        }
        Ok(())
    }

    pub fn policy(&self) -> SimulationPolicy {
        SimulationPolicy {
            enabled: self.enabled,
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

fn default_simulation_enabled() -> bool {
    true
}
fn default_max_delay_secs() -> u64 {
    60
}
