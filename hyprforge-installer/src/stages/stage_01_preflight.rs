//! Root check, one-shot network probe, NTP.

use crate::errors::InstallError;
use crate::stages::CONFIG_TIMEOUT;
use anyhow::Result;
use hyprforge_hal::SystemHal;
use std::time::Duration;

pub const DEFAULT_PROBE_HOST: &str = "archlinux.org";
pub const DEFAULT_PROBE_PORT: u16 = 443;
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub host: String,
    pub port: u16,
}

impl Default for ProbeTarget {
    fn default() -> Self {
        Self {
            host: DEFAULT_PROBE_HOST.to_string(),
            port: DEFAULT_PROBE_PORT,
        }
    }
}

pub fn run(hal: &dyn SystemHal, probe: &ProbeTarget) -> Result<()> {
    if !hal.is_root() {
        return Err(InstallError::NotRoot.into());
    }
    log::info!("running as root");

    let host = format!("{}:{}", probe.host, probe.port);
    if !hal.network_reachable(&probe.host, probe.port, PROBE_TIMEOUT)? {
        return Err(InstallError::NoNetwork { host }.into());
    }
    log::info!("network reachable ({})", host);

    hal.command_status("timedatectl", &["set-ntp", "true"], CONFIG_TIMEOUT)?;
    Ok(())
}
