// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::user::{AuthenticatedUser, User};

/// Mints credentials the monkeys run as.
///
/// Real deployments back this with the platform identity service; the
/// engine only needs the seam. Tokens are minted once per flock creation,
/// so implementations may be slow but should be idempotent per user.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn create_service_token(
        &self,
        user: &User,
        scopes: &[String],
    ) -> Result<AuthenticatedUser>;
}

/// Provider that fabricates opaque in-process tokens.
pub struct StaticTokenProvider;

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn create_service_token(
        &self,
        user: &User,
        scopes: &[String],
    ) -> Result<AuthenticatedUser> {
        Ok(AuthenticatedUser {
            user: user.clone(),
            scopes: scopes.to_vec(),
            token: format!("gt-{}", Uuid::new_v4()),
        })
    }
}
