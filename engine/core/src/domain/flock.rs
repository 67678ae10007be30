// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Flock configuration and summary models.
//!
//! A flock is a named set of monkeys that all run the same business as
//! different users. The configuration here is validated synchronously when a
//! flock is created; nothing invalid ever reaches a running monkey.

use std::ops::Range;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::business::BusinessConfig;
use crate::domain::error::FlockError;
use crate::domain::monkey::MonkeyData;
use crate::domain::user::{User, UserSpec};

/// Configuration for a flock of monkeys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlockConfig {
    /// Name of the flock
    pub name: String,

    /// How many monkeys to run, across all replicas
    pub count: usize,

    /// Explicit list of users to run as. The length of the list must equal
    /// `count`. Specify either this or `user_spec` but not both.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<User>>,

    /// Template to generate users. Specify either this or `users` but not
    /// both.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_spec: Option<UserSpec>,

    /// Token scopes, which must include every scope the business needs
    #[serde(default)]
    pub scopes: Vec<String>,

    /// Business every monkey in the flock runs
    pub business: BusinessConfig,

    /// How many monkeys to start concurrently, across all replicas. Requires
    /// `start_batch_wait`; when either is unset all monkeys start at once.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_batch_size: Option<usize>,

    /// How long to wait between start batches
    #[serde(default, skip_serializing_if = "Option::is_none", with = "humantime_serde")]
    pub start_batch_wait: Option<Duration>,
}

impl FlockConfig {
    /// Check that the agent count and identity source are consistent.
    pub fn validate(&self) -> Result<(), FlockError> {
        if self.count == 0 {
            return Err(FlockError::InvalidConfig(
                "count must be at least 1".to_string(),
            ));
        }
        match (&self.users, &self.user_spec) {
            (Some(_), Some(_)) => {
                return Err(FlockError::InvalidConfig(
                    "both users and user_spec provided".to_string(),
                ));
            }
            (None, None) => {
                return Err(FlockError::InvalidConfig(
                    "one of users or user_spec must be provided".to_string(),
                ));
            }
            (Some(users), None) => {
                if users.len() != self.count {
                    return Err(FlockError::InvalidConfig(format!(
                        "users list must contain {} elements",
                        self.count
                    )));
                }
            }
            (None, Some(_)) => {}
        }
        if self.start_batch_size == Some(0) {
            return Err(FlockError::InvalidConfig(
                "start_batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Which shard of a flock's monkeys this process runs.
///
/// Replicas are unaware of each other beyond this static partitioning; a
/// single-replica deployment is `ReplicaInfo::default()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicaInfo {
    pub index: usize,
    pub count: usize,
}

impl Default for ReplicaInfo {
    fn default() -> Self {
        Self { index: 0, count: 1 }
    }
}

impl ReplicaInfo {
    pub fn new(index: usize, count: usize) -> Result<Self, FlockError> {
        if count == 0 || index >= count {
            return Err(FlockError::InvalidConfig(format!(
                "replica index {index} out of range for {count} replicas"
            )));
        }
        Ok(Self { index, count })
    }

    /// The contiguous range of identity indices owned by this replica.
    ///
    /// Shards differ in size by at most one, with the remainder going to the
    /// lowest-indexed replicas, and together cover `0..total` exactly.
    pub fn shard(&self, total: usize) -> Range<usize> {
        let base = total / self.count;
        let rem = total % self.count;
        let start = self.index * base + self.index.min(rem);
        let len = base + usize::from(self.index < rem);
        start..start + len
    }
}

/// Information about a running flock.
#[derive(Debug, Clone, Serialize)]
pub struct FlockData {
    /// Name of the flock
    pub name: String,

    /// Configuration of the flock
    pub config: FlockConfig,

    /// Monkeys of the flock
    pub monkeys: Vec<MonkeyData>,
}

/// Summary statistics about a running flock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlockSummary {
    /// Name of the flock
    pub name: String,

    /// Type of business the flock is running
    pub business: String,

    /// When the flock was started, null if it has not started
    pub start_time: Option<DateTime<Utc>>,

    /// Number of monkeys in the flock on this replica
    pub monkey_count: usize,

    /// Total successes across the flock
    pub success_count: u64,

    /// Total failures across the flock
    pub failure_count: u64,
}
