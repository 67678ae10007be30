// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! The pluggable unit of work a monkey drives.
//!
//! A business is one kind of repeated operation run against the target
//! platform. The monkey calls `startup` once per incarnation, then loops
//! calling `execute`, and finally calls `shutdown` and `close` when it stops
//! or restarts. Concrete businesses live in the infrastructure layer; this
//! module defines the contract plus the configuration and failure taxonomy
//! shared by all of them.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest remote-response excerpt carried in a failure record.
const MAX_RESPONSE_EXCERPT: usize = 200;

/// A classified failure from a business hook.
#[derive(Debug, Error)]
pub enum BusinessError {
    /// A remote call made by the business failed, including timeouts. These
    /// are expected under load and are candidates for alert deduplication.
    #[error("remote call failed: {message}")]
    Remote {
        message: String,
        /// Excerpt of the remote response body, when one was received.
        body: Option<String>,
    },

    /// The business ran to completion but the result was wrong.
    #[error("business assertion failed: {0}")]
    Assertion(String),

    /// Anything the business could not classify.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl BusinessError {
    /// Build a `Remote` error, truncating the response body to a loggable
    /// excerpt.
    pub fn remote(message: impl Into<String>, body: Option<&str>) -> Self {
        let body = body.map(|b| {
            let mut excerpt: String = b.chars().take(MAX_RESPONSE_EXCERPT).collect();
            if excerpt.len() < b.len() {
                excerpt.push_str("...");
            }
            excerpt
        });
        Self::Remote {
            message: message.into(),
            body,
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Remote { .. } => FailureKind::Remote,
            Self::Assertion(_) => FailureKind::Assertion,
            Self::Unexpected(_) => FailureKind::Unexpected,
        }
    }

    pub fn response_excerpt(&self) -> Option<&str> {
        match self {
            Self::Remote { body, .. } => body.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for BusinessError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {err}")
        } else {
            err.to_string()
        };
        Self::Remote {
            message,
            body: None,
        }
    }
}

/// Failure classification reported upward for alerting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Remote,
    Assertion,
    Unexpected,
}

/// One type of repeated operation against the target platform.
///
/// Hooks must be responsive to cancellation: the monkey drops an in-flight
/// `execute` future when it is told to stop, so a hook holding resources
/// across await points must be drop-safe and should release anything durable
/// in `shutdown` or `close`.
#[async_trait]
pub trait Business: Send {
    /// Type tag for status reporting.
    fn name(&self) -> &'static str;

    /// Run once per incarnation before the first iteration. Must be
    /// idempotent, since a failed startup is retried when restart-on-failure
    /// is configured.
    async fn startup(&mut self) -> Result<(), BusinessError> {
        Ok(())
    }

    /// Perform exactly one unit of work.
    async fn execute(&mut self) -> Result<(), BusinessError>;

    /// Clean up after the last iteration. Called once when the monkey stops
    /// or restarts; errors are logged by the caller, never propagated.
    async fn shutdown(&mut self) -> Result<(), BusinessError> {
        Ok(())
    }

    /// Release any resources acquired in `startup`, even if `execute` never
    /// ran successfully.
    async fn close(&mut self) {}
}

/// Options common to every business type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessOptions {
    /// How long to wait after an error before restarting
    #[serde(default = "default_error_idle_time", with = "humantime_serde")]
    pub error_idle_time: Duration,

    /// How long to pause between business executions. Zero disables the
    /// pause entirely.
    #[serde(default = "default_idle_time", with = "humantime_serde")]
    pub idle_time: Duration,
}

impl Default for BusinessOptions {
    fn default() -> Self {
        Self {
            error_idle_time: default_error_idle_time(),
            idle_time: default_idle_time(),
        }
    }
}

fn default_error_idle_time() -> Duration {
    Duration::from_secs(60)
}

fn default_idle_time() -> Duration {
    Duration::from_secs(60)
}

/// Options for the web-probe business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebProbeOptions {
    /// URL fetched once per iteration
    pub url: String,

    /// Per-request timeout, reported as a remote failure when exceeded
    #[serde(default = "default_probe_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(flatten)]
    pub general: BusinessOptions,
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Configuration for the empty-loop business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmptyLoopConfig {
    #[serde(default)]
    pub options: BusinessOptions,

    /// Restart the business after failure
    #[serde(default)]
    pub restart: bool,
}

/// Configuration for the web-probe business.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebProbeConfig {
    pub options: WebProbeOptions,

    /// Restart the business after failure
    #[serde(default)]
    pub restart: bool,
}

/// Tagged configuration selecting which business a flock runs.
///
/// Unknown type tags are rejected when the configuration is parsed, before
/// anything reaches a running monkey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BusinessConfig {
    EmptyLoop(EmptyLoopConfig),
    WebProbe(WebProbeConfig),
}

impl BusinessConfig {
    /// Type tag, matching the serialized `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyLoop(_) => "EmptyLoop",
            Self::WebProbe(_) => "WebProbe",
        }
    }

    pub fn restart(&self) -> bool {
        match self {
            Self::EmptyLoop(c) => c.restart,
            Self::WebProbe(c) => c.restart,
        }
    }

    /// The options shared by every business type.
    pub fn general_options(&self) -> &BusinessOptions {
        match self {
            Self::EmptyLoop(c) => &c.options,
            Self::WebProbe(c) => &c.options.general,
        }
    }
}
