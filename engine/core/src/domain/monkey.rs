// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::business::FailureKind;
use crate::domain::user::AuthenticatedUser;

/// Lifecycle phase of a monkey.
///
/// `FailedStart` is entered when the business startup hook fails and the
/// monkey is waiting out its error idle time before retrying; it is reported
/// like any other failed iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonkeyState {
    Idle,
    Starting,
    Running,
    FailedStart,
    Stopping,
    Stopped,
}

/// Detail about the most recent failure of a monkey.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureInfo {
    /// When the failure happened
    pub at: DateTime<Utc>,

    /// Failure classification for downstream alerting
    pub kind: FailureKind,

    pub message: String,

    /// Excerpt of the remote response, when one was received
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_excerpt: Option<String>,
}

/// Rolling statistics for one monkey incarnation.
///
/// Counts are reset by a fresh external start, never by an internal
/// failure-triggered restart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonkeyStats {
    /// Number of successful executions
    pub success_count: u64,

    /// Number of failed executions, including failed startups
    pub failure_count: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_failure: Option<FailureInfo>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,
}

/// Point-in-time view of a running monkey, served by the status API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonkeyData {
    /// Name of the monkey
    pub name: String,

    /// Type of business the monkey runs
    pub business: String,

    /// Whether the monkey restarts its business after failure
    pub restart: bool,

    pub state: MonkeyState,

    pub stats: MonkeyStats,

    /// User as which the monkey is running
    pub user: AuthenticatedUser,
}
