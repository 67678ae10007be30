// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use async_trait::async_trait;
use tracing::debug;

use crate::domain::business::{Business, BusinessError, WebProbeOptions};
use crate::domain::user::AuthenticatedUser;

/// Business that fetches one URL per iteration as the monkey's user.
///
/// A miniature of the remote-query workloads: each execution is a single
/// authenticated GET, with timeouts and error statuses classified as remote
/// failures so the restart policy and alerting can treat them uniformly.
pub struct WebProbe {
    options: WebProbeOptions,
    client: reqwest::Client,
    user: AuthenticatedUser,
}

impl WebProbe {
    pub fn new(options: WebProbeOptions, client: reqwest::Client, user: AuthenticatedUser) -> Self {
        Self {
            options,
            client,
            user,
        }
    }
}

#[async_trait]
impl Business for WebProbe {
    fn name(&self) -> &'static str {
        "WebProbe"
    }

    async fn execute(&mut self) -> Result<(), BusinessError> {
        let url = &self.options.url;
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.user.token)
            .timeout(self.options.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BusinessError::remote(
                format!("GET {url} returned {status}"),
                Some(&body),
            ));
        }
        debug!(user = self.user.username(), url = %url, "probe succeeded");
        Ok(())
    }
}
