//   Copyright (c) 2024-2026 The Vessel Authors
//   All rights reserved.
//
//   Permission is hereby granted, free of charge, to any person obtaining a copy
//   of this software and associated documentation files (the "Software"), to deal
//   in the Software without restriction, including without limitation the rights
//   to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
//   copies of the Software, and to permit persons to whom the Software is
//   furnished to do so, subject to the following conditions:
//
//   The above copyright notice and this permission notice shall be included in all
//   copies or substantial portions of the Software.
//
//   THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
//   IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
//   FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
//   AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
//   LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
//   OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
//   SOFTWARE.

//! Server configuration (§6): an ini-style file plus environment/CLI
//! overrides, the way the original server's `akonadiserverrc` works.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;

use crate::error::{Result, VesselError};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub socket_path: PathBuf,
    pub payload_dir: PathBuf,
    pub recorder_path: PathBuf,
    /// Whether a cache-only fetch should still verify the cached
    /// payload is current against the resource before returning it.
    pub verify_cache: bool,
    /// How long the connection's notification fan-out batches
    /// committed transactions before flushing to subscribers.
    pub notification_batch_interval: Duration,
    /// Floor under any collection's configured check interval, so a
    /// misconfigured cache policy can't hammer a resource.
    pub scheduler_minimum_interval: Duration,
    pub scheduler_default_interval_secs: u64,
    /// Parts at or above this size are stored externally rather than
    /// inline in the arena (§3).
    pub external_payload_threshold: u64,
    pub idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            socket_path: PathBuf::from("/tmp/vessel.socket"),
            payload_dir: PathBuf::from("/tmp/vessel-payloads"),
            recorder_path: PathBuf::from("/tmp/vessel-changes.log"),
            verify_cache: true,
            notification_batch_interval: Duration::from_millis(500),
            scheduler_minimum_interval: Duration::from_secs(60),
            scheduler_default_interval_secs: 300,
            external_payload_threshold: 4096,
            idle_timeout: Duration::from_secs(180),
        }
    }
}

impl ServerConfig {
    /// Load from an ini file, falling back to defaults for any field
    /// the file leaves unset. A missing file is not an error — the
    /// server just runs with defaults, matching first-run behaviour.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = ServerConfig::default();
        if !path.exists() {
            return Ok(config);
        }
        let ini = Ini::load_from_file(path)
            .map_err(|e| VesselError::Protocol(format!("parsing config file {}: {e}", path.display())))?;

        if let Some(section) = ini.section(Some("General")) {
            if let Some(v) = section.get("SocketPath") {
                config.socket_path = PathBuf::from(v);
            }
            if let Some(v) = section.get("PayloadDir") {
                config.payload_dir = PathBuf::from(v);
            }
            if let Some(v) = section.get("RecorderPath") {
                config.recorder_path = PathBuf::from(v);
            }
            if let Some(v) = section.get("VerifyCache") {
                config.verify_cache = parse_bool(v, config.verify_cache);
            }
            if let Some(v) = section.get("NotificationBatchIntervalMs") {
                config.notification_batch_interval = parse_millis(v, config.notification_batch_interval);
            }
            if let Some(v) = section.get("ExternalPayloadThreshold") {
                config.external_payload_threshold = v.parse().unwrap_or(config.external_payload_threshold);
            }
            if let Some(v) = section.get("IdleTimeoutSecs") {
                config.idle_timeout = v
                    .parse()
                    .map(Duration::from_secs)
                    .unwrap_or(config.idle_timeout);
            }
        }

        if let Some(section) = ini.section(Some("Scheduler")) {
            if let Some(v) = section.get("MinimumIntervalSecs") {
                config.scheduler_minimum_interval = v
                    .parse()
                    .map(Duration::from_secs)
                    .unwrap_or(config.scheduler_minimum_interval);
            }
            if let Some(v) = section.get("DefaultIntervalSecs") {
                config.scheduler_default_interval_secs =
                    v.parse().unwrap_or(config.scheduler_default_interval_secs);
            }
        }

        Ok(config)
    }
}

fn parse_bool(v: &str, default: bool) -> bool {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_millis(v: &str, default: Duration) -> Duration {
    v.parse::<u64>().map(Duration::from_millis).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn falls_back_to_defaults_for_a_missing_file() {
        let config = ServerConfig::load("/nonexistent/path/vessel.conf").unwrap();
        assert_eq!(config.external_payload_threshold, 4096);
    }

    #[test]
    fn overrides_fields_present_in_the_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[General]\nSocketPath=/var/run/vessel.sock\nVerifyCache=false\n\n[Scheduler]\nDefaultIntervalSecs=120\n"
        )
        .unwrap();
        let config = ServerConfig::load(file.path()).unwrap();
        assert_eq!(config.socket_path, PathBuf::from("/var/run/vessel.sock"));
        assert!(!config.verify_cache);
        assert_eq!(config.scheduler_default_interval_secs, 120);
    }
}
