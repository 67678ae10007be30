// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod flock;
pub mod manager;
pub mod monkey;

#[cfg(test)]
pub(crate) mod testing;

pub use flock::{Flock, FlockContext};
pub use manager::FlockManager;
pub use monkey::Monkey;
