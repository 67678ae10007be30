// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod business;
pub mod error;
pub mod flock;
pub mod monkey;
pub mod user;

pub use business::{
    Business, BusinessConfig, BusinessError, BusinessOptions, FailureKind,
};
pub use error::FlockError;
pub use flock::{FlockConfig, FlockData, FlockSummary, ReplicaInfo};
pub use monkey::{FailureInfo, MonkeyData, MonkeyState, MonkeyStats};
pub use user::{AuthenticatedUser, Group, User, UserSpec};
