// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Application configuration.
//!
//! Loaded from a YAML file, with environment variable overrides so container
//! deployments can adjust per-pod settings without templating the file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::domain::flock::{FlockConfig, ReplicaInfo};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Flocks to create and start at process startup
    #[serde(default)]
    pub autostart: Vec<FlockConfig>,

    /// Webhook URL to post monkey failure alerts to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_hook: Option<String>,

    /// How many replicas of this process share the configured flocks
    #[serde(default = "default_replica_count")]
    pub replica_count: usize,

    /// Which shard this replica owns. When unset and more than one replica
    /// is configured, derived from the trailing `-N` of the hostname, the
    /// way StatefulSet pod names are numbered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replica_index: Option<usize>,
}

fn default_replica_count() -> usize {
    1
}

impl AppConfig {
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        Self::from_yaml_str(&raw)
            .with_context(|| format!("failed to parse config at {}", path.display()))
    }

    /// Load configuration from an explicit path, or empty defaults when no
    /// path is given, then apply environment overrides.
    pub fn load(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading configuration");
                Self::from_yaml_file(path)?
            }
            None => {
                tracing::info!("no configuration file given, using empty defaults");
                Self::default()
            }
        };
        config.apply_env_overrides();
        for flock in &config.autostart {
            flock
                .validate()
                .with_context(|| format!("invalid autostart flock {}", flock.name))?;
        }
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("MOBU_ALERT_HOOK") {
            self.alert_hook = Some(val);
        }
        if let Ok(val) = std::env::var("MOBU_REPLICA_COUNT") {
            match val.parse() {
                Ok(count) => self.replica_count = count,
                Err(_) => tracing::warn!(
                    value = %val,
                    "invalid MOBU_REPLICA_COUNT, ignoring"
                ),
            }
        }
        if let Ok(val) = std::env::var("MOBU_REPLICA_INDEX") {
            match val.parse() {
                Ok(index) => self.replica_index = Some(index),
                Err(_) => tracing::warn!(
                    value = %val,
                    "invalid MOBU_REPLICA_INDEX, ignoring"
                ),
            }
        }
    }

    /// Which shard of each configured flock this process runs.
    pub fn replica_info(&self) -> anyhow::Result<ReplicaInfo> {
        if self.replica_count <= 1 {
            return Ok(ReplicaInfo::default());
        }
        let index = match self.replica_index {
            Some(index) => index,
            None => {
                let host = hostname::get().context("failed to read hostname")?;
                let host = host.to_string_lossy();
                parse_hostname_index(&host).with_context(|| {
                    format!("hostname {host} has no numeric -N suffix to derive a replica index")
                })?
            }
        };
        Ok(ReplicaInfo::new(index, self.replica_count)?)
    }
}

fn parse_hostname_index(host: &str) -> Option<usize> {
    let (_, suffix) = host.rsplit_once('-')?;
    suffix.parse().ok()
}
