// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use thiserror::Error;

/// Errors from flock and manager operations.
///
/// These propagate synchronously to the caller of the operation; failures
/// inside a running monkey never surface here, they become statistics
/// updates instead.
#[derive(Debug, Error)]
pub enum FlockError {
    #[error("flock {0} not found")]
    FlockNotFound(String),

    #[error("flock {0} already exists")]
    FlockExists(String),

    #[error("monkey {0} not found")]
    MonkeyNotFound(String),

    #[error("invalid flock configuration: {0}")]
    InvalidConfig(String),

    #[error("token service error: {0}")]
    TokenService(String),
}
