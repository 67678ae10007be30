// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use serde_json::json;
use tracing::{error, info, warn};

use crate::domain::monkey::FailureInfo;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Destination for monkey failure notifications.
///
/// Alerting is best-effort: a sink must swallow its own errors, because an
/// alert failure must never affect the monkey loop that reported it.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn alert(&self, monkey: &str, flock: Option<&str>, failure: &FailureInfo);
}

/// Sink that drops every alert, used when no hook is configured.
pub struct NullAlertSink;

#[async_trait]
impl AlertSink for NullAlertSink {
    async fn alert(&self, _monkey: &str, _flock: Option<&str>, _failure: &FailureInfo) {
        info!("alert hook is not set, not sending alert");
    }
}

/// Sink that posts alerts to an incoming-webhook URL.
pub struct WebhookAlertSink {
    hook_url: String,
    client: reqwest::Client,
}

impl WebhookAlertSink {
    pub fn new(hook_url: String, client: reqwest::Client) -> Self {
        Self { hook_url, client }
    }
}

#[async_trait]
impl AlertSink for WebhookAlertSink {
    async fn alert(&self, monkey: &str, flock: Option<&str>, failure: &FailureInfo) {
        let time = failure.at.format(DATE_FORMAT);
        let flock = flock.unwrap_or("-");
        let text = format!(
            "{time} {flock}/{monkey} {kind:?}: {message}",
            kind = failure.kind,
            message = failure.message,
        );
        error!(monkey, flock, "alert: {text}");

        let result = self
            .client
            .post(&self.hook_url)
            .json(&json!({ "text": text }))
            .send()
            .await;
        match result {
            Ok(response) if !response.status().is_success() => {
                warn!(
                    status = %response.status(),
                    "error status sending alert to webhook"
                );
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "failed to send alert to webhook"),
        }
    }
}
